// main.rs — render an icon tile with the current settings to a PNG
//
//   trixie-icons [--instance NAME] [--class NAME] [--title TEXT]
//                [--image FILE] [--dock] [--tile icon|clip|drawer]
//                [--select] [--out FILE] [--watch]
//
// Runs the icon subsystem against the in-memory display. With --watch the
// preview is re-rendered whenever the config directory changes.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use calloop::EventLoop;

use trixie_icons::config::Config;
use trixie_icons::display::DisplayServer;
use trixie_icons::headless::HeadlessDisplay;
use trixie_icons::owner::ManagedWindow;
use trixie_icons::watch::watch_config;
use trixie_icons::{IconId, IconYard, Screen, TileKind};

const DEFAULT_OUT: &str = "icon-preview.png";

#[derive(Debug)]
struct Args {
    instance: Option<String>,
    class: Option<String>,
    title: Option<String>,
    image: Option<String>,
    tile: TileKind,
    out: PathBuf,
    dock: bool,
    select: bool,
    watch: bool,
}

impl Args {
    fn parse() -> Result<Self, String> {
        let mut args = Args {
            instance: None,
            class: None,
            title: None,
            image: None,
            tile: TileKind::Normal,
            out: PathBuf::from(DEFAULT_OUT),
            dock: false,
            select: false,
            watch: false,
        };
        let mut it = std::env::args().skip(1);
        while let Some(arg) = it.next() {
            let mut value = || it.next().ok_or_else(|| format!("{arg} needs a value"));
            match arg.as_str() {
                "--instance" => args.instance = Some(value()?),
                "--class" => args.class = Some(value()?),
                "--title" => args.title = Some(value()?),
                "--image" => args.image = Some(value()?),
                "--tile" => args.tile = TileKind::from_name(&value()?),
                "--out" => args.out = PathBuf::from(value()?),
                "--dock" => args.dock = true,
                "--select" => args.select = true,
                "--watch" => args.watch = true,
                other => return Err(format!("unknown argument `{other}`")),
            }
        }
        Ok(args)
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt().compact().init();

    let args = match Args::parse() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("trixie-icons: {e}");
            return ExitCode::from(2);
        }
    };

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load();
    let mut event_loop: EventLoop<'static, IconYard<HeadlessDisplay>> = EventLoop::try_new()?;

    let mut yard = IconYard::new(Screen::new(HeadlessDisplay::new(), &config));
    yard.set_loop_handle(event_loop.handle());

    let id = create_icon(&mut yard, &args)?;
    if let Some(file) = &args.image {
        if let Err(e) = yard.set_image_from_file(id, file) {
            tracing::warn!("Keeping resolved image: {e}");
        }
    }
    if args.select {
        yard.toggle_select(id);
    }
    drain_events(&mut yard);
    write_preview(&yard, id, &args.out)?;

    if !args.watch {
        return Ok(());
    }

    let _watcher = watch_config(&event_loop.handle(), &Config::config_dir())?;
    loop {
        event_loop.dispatch(Some(Duration::from_millis(500)), &mut yard)?;
        drain_events(&mut yard);
        write_preview(&yard, id, &args.out)?;
    }
}

fn create_icon(yard: &mut IconYard<HeadlessDisplay>, args: &Args) -> Result<IconId, trixie_icons::IconError> {
    if args.dock {
        return yard.create_for_dock(
            None,
            args.instance.as_deref(),
            args.class.as_deref(),
            args.tile,
        );
    }
    let mut window = ManagedWindow::new(args.instance.as_deref(), args.class.as_deref());
    window.icon_name = args.title.clone();
    yard.create_for_window(window.into_ref())
}

/// Deliver the exposes queued by invalidations.
fn drain_events(yard: &mut IconYard<HeadlessDisplay>) {
    while let Some(event) = yard.screen.display.next_event() {
        yard.handle_event(event);
    }
}

fn write_preview(
    yard: &IconYard<HeadlessDisplay>,
    id: IconId,
    out: &std::path::Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let window = yard.icon(id).map(|i| i.window()).ok_or("icon vanished")?;
    let canvas = yard.screen.display.canvas(window).ok_or("icon window vanished")?;
    canvas.save(out)?;
    tracing::info!("Wrote {}", out.display());
    Ok(())
}
