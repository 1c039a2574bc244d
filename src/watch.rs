// watch.rs — reload icon settings when the config directory changes
//
// notify delivers events on its own thread; they are forwarded through a
// calloop channel so the reload runs on the event-loop thread with the yard.

use std::path::{Path, PathBuf};

use calloop::channel::{self, Channel, Sender};
use calloop::LoopHandle;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use crate::config::{Config, CONFIG_FILE};
use crate::display::DisplayServer;
use crate::yard::IconYard;

const DATABASE_FILE: &str = "icons.json";

#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error("watcher: {0}")]
    Notify(#[from] notify::Error),
    #[error("cannot register watcher channel: {0}")]
    Register(String),
}

/// Keeps the watcher alive; dropping it stops reloads.
pub struct ConfigWatcher {
    _watcher: RecommendedWatcher,
    dir: PathBuf,
}

impl ConfigWatcher {
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// Whether a filesystem event touches a file the icon settings are read from.
pub fn is_settings_event(event: &Event) -> bool {
    if matches!(event.kind, EventKind::Access(_)) {
        return false;
    }
    event.paths.iter().any(|p| is_settings_file(p))
}

fn is_settings_file(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    name == CONFIG_FILE || name == DATABASE_FILE || name.ends_with(".conf")
}

pub fn watch_config<D: DisplayServer + 'static>(
    handle: &LoopHandle<'static, IconYard<D>>,
    dir: &Path,
) -> Result<ConfigWatcher, WatchError> {
    let (tx, rx): (Sender<notify::Result<Event>>, Channel<notify::Result<Event>>) =
        channel::channel();

    let mut watcher = RecommendedWatcher::new(
        move |res| {
            let _ = tx.send(res);
        },
        notify::Config::default(),
    )?;
    watcher.watch(dir, RecursiveMode::NonRecursive)?;

    handle
        .insert_source(rx, |event, _, yard: &mut IconYard<D>| match event {
            channel::Event::Msg(Ok(ev)) if is_settings_event(&ev) => {
                tracing::info!("Icon settings changed on disk ({:?})", ev.paths);
                yard.reload(Config::load());
            }
            channel::Event::Msg(Ok(_)) => {}
            channel::Event::Msg(Err(e)) => tracing::warn!("Config watcher error: {e}"),
            channel::Event::Closed => tracing::debug!("Config watcher channel closed"),
        })
        .map_err(|e| WatchError::Register(e.to_string()))?;

    tracing::info!("Watching {} for icon settings changes", dir.display());
    Ok(ConfigWatcher {
        _watcher: watcher,
        dir: dir.to_path_buf(),
    })
}
