// yard.rs — every icon on one screen, plus the calloop plumbing they need
//
// The yard owns the screen context and the icons keyed by `IconId`. It routes
// window events to icons, delivers broker notifications to icons that are
// still alive, and owns the selection-animation timers.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use calloop::timer::{TimeoutAction, Timer};
use calloop::LoopHandle;
use image::RgbaImage;

use crate::broker::{Notification, SettingsFlags};
use crate::config::{Config, ThemeConfig};
use crate::database::IconDatabase;
use crate::display::{DisplayServer, IconEvent, WindowId};
use crate::error::IconError;
use crate::icon::{DockIdentity, Icon, IconId};
use crate::owner::OwnerRef;
use crate::screen::Screen;
use crate::store::store_icon;
use crate::theme::{Theme, TileKind};

/// Delay before the first selection-frame tick.
pub const SELECTION_FIRST_TICK: Duration = Duration::from_millis(10);
/// Interval between later ticks of the marching selection frame.
pub const SELECTION_CYCLE_DELAY: Duration = Duration::from_millis(200);

pub struct IconYard<D: DisplayServer + 'static> {
    pub screen: Screen<D>,
    icons: HashMap<IconId, Icon>,
    by_window: HashMap<WindowId, IconId>,
    next_id: u64,
    handle: Option<LoopHandle<'static, IconYard<D>>>,
}

impl<D: DisplayServer + 'static> IconYard<D> {
    pub fn new(screen: Screen<D>) -> Self {
        Self {
            screen,
            icons: HashMap::new(),
            by_window: HashMap::new(),
            next_id: 1,
            handle: None,
        }
    }

    /// Without a loop handle selection frames are drawn once, statically.
    pub fn set_loop_handle(&mut self, handle: LoopHandle<'static, IconYard<D>>) {
        self.handle = Some(handle);
    }

    pub fn loop_handle(&self) -> Option<&LoopHandle<'static, IconYard<D>>> {
        self.handle.as_ref()
    }

    fn alloc_id(&mut self) -> IconId {
        let id = IconId(self.next_id);
        self.next_id += 1;
        id
    }

    fn insert(&mut self, icon: Icon) -> IconId {
        let id = icon.id();
        self.by_window.insert(icon.window(), id);
        self.icons.insert(id, icon);
        id
    }

    // ── lifecycle ─────────────────────────────────────────────────────────────

    pub fn create_for_window(&mut self, owner: OwnerRef) -> Result<IconId, IconError> {
        let id = self.alloc_id();
        let icon = Icon::create_for_window(&mut self.screen, id, owner)?;
        Ok(self.insert(icon))
    }

    pub fn create_for_dock(
        &mut self,
        command: Option<&str>,
        instance: Option<&str>,
        class: Option<&str>,
        tile: TileKind,
    ) -> Result<IconId, IconError> {
        let id = self.alloc_id();
        let dock = DockIdentity {
            command: command.map(str::to_string),
            instance: instance.map(str::to_string),
            class: class.map(str::to_string),
        };
        let icon = Icon::create_for_dock(&mut self.screen, id, dock, tile)?;
        Ok(self.insert(icon))
    }

    /// Tear an icon down. Returns `false` if it was already gone.
    pub fn destroy(&mut self, id: IconId) -> bool {
        let Some(mut icon) = self.icons.remove(&id) else {
            return false;
        };
        self.by_window.remove(&icon.window());
        Self::cancel_selection_timer(self.handle.as_ref(), &mut icon);
        icon.destroy(&mut self.screen);
        true
    }

    pub fn icon(&self, id: IconId) -> Option<&Icon> {
        self.icons.get(&id)
    }

    pub(crate) fn icon_mut(&mut self, id: IconId) -> Option<&mut Icon> {
        self.icons.get_mut(&id)
    }

    pub fn icon_at(&self, window: WindowId) -> Option<IconId> {
        self.by_window.get(&window).copied()
    }

    pub fn len(&self) -> usize {
        self.icons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.icons.is_empty()
    }

    // ── per-icon operations ───────────────────────────────────────────────────

    pub fn update(&mut self, id: IconId) {
        if let Some(icon) = self.icons.get_mut(&id) {
            icon.update(&mut self.screen);
        }
    }

    pub fn paint(&mut self, id: IconId) {
        if let Some(icon) = self.icons.get(&id) {
            icon.paint(&mut self.screen);
        }
    }

    pub fn change_title(&mut self, id: IconId) {
        if let Some(icon) = self.icons.get_mut(&id) {
            icon.change_title();
            icon.paint(&mut self.screen);
        }
    }

    pub fn set_image_from_file(&mut self, id: IconId, file: &str) -> Result<(), IconError> {
        match self.icons.get_mut(&id) {
            Some(icon) => icon.set_image_from_file(&mut self.screen, file),
            None => Err(IconError::NoImage),
        }
    }

    pub fn set_highlighted(&mut self, id: IconId, flag: bool) {
        if let Some(icon) = self.icons.get_mut(&id) {
            icon.set_highlighted(&mut self.screen, flag);
        }
    }

    pub fn set_shadowed(&mut self, id: IconId, flag: bool) {
        if let Some(icon) = self.icons.get_mut(&id) {
            icon.set_shadowed(&mut self.screen, flag);
        }
    }

    pub fn set_mini_preview(&mut self, id: IconId, snapshot: &RgbaImage) {
        if let Some(icon) = self.icons.get_mut(&id) {
            icon.set_mini_preview(&mut self.screen, snapshot);
        }
    }

    /// Attach a dockapp window to a dock icon (or detach with `None`).
    pub fn set_icon_window(&mut self, id: IconId, window: Option<WindowId>) {
        if let Some(icon) = self.icons.get_mut(&id) {
            icon.set_foreign_window(&mut self.screen, window);
            icon.update(&mut self.screen);
        }
    }

    /// Persist the owner's client-supplied icon to the cache directory and
    /// record it in the database when the application has no icon there.
    pub fn store_icon(&mut self, id: IconId) -> Option<PathBuf> {
        let icon = self.icons.get(&id)?;
        let path = store_icon(icon, &self.screen.display, &self.screen.cache_dir)?;
        let (instance, class) = {
            let owner = icon.owner()?.borrow();
            (owner.instance.clone(), owner.class.clone())
        };
        self.screen
            .remember_icon(instance.as_deref(), class.as_deref(), &path);
        Some(path)
    }

    // ── selection ─────────────────────────────────────────────────────────────

    pub fn toggle_select(&mut self, id: IconId) {
        let Some(icon) = self.icons.get_mut(&id) else {
            return;
        };
        icon.selected = !icon.selected;

        if !icon.selected {
            Self::cancel_selection_timer(self.handle.as_ref(), icon);
            icon.invalidate(&mut self.screen);
            return;
        }

        icon.dash_step = 0;
        if self.screen.prefs.dont_blink || self.handle.is_none() {
            icon.draw_selection_frame(&mut self.screen);
        } else {
            self.arm_selection_timer(id);
        }
    }

    fn arm_selection_timer(&mut self, id: IconId) {
        let Some(handle) = &self.handle else {
            return;
        };
        let timer = Timer::from_duration(SELECTION_FIRST_TICK);
        match handle.insert_source(timer, move |_, _, yard: &mut IconYard<D>| {
            yard.cycle_selection(id)
        }) {
            Ok(token) => {
                if let Some(icon) = self.icons.get_mut(&id) {
                    icon.selection_timer = Some(token);
                }
            }
            Err(e) => tracing::warn!("Selection timer for {id:?}: {e}"),
        }
    }

    fn cancel_selection_timer(handle: Option<&LoopHandle<'static, Self>>, icon: &mut Icon) {
        if let (Some(token), Some(handle)) = (icon.selection_timer.take(), handle) {
            handle.remove(token);
        }
    }

    fn cycle_selection(&mut self, id: IconId) -> TimeoutAction {
        let Some(icon) = self.icons.get_mut(&id) else {
            return TimeoutAction::Drop;
        };
        if !icon.selected {
            icon.selection_timer = None;
            return TimeoutAction::Drop;
        }
        icon.dash_step -= 1;
        icon.draw_selection_frame(&mut self.screen);
        TimeoutAction::ToDuration(SELECTION_CYCLE_DELAY)
    }

    // ── events ────────────────────────────────────────────────────────────────

    /// Route a window-system event to the icon owning its window.
    pub fn handle_event(&mut self, event: IconEvent) {
        match event {
            IconEvent::Expose { window } => self.expose(window),
            IconEvent::ButtonPress(press) => {
                let Some(id) = self.icon_at(press.window) else {
                    return;
                };
                let has_owner = self.icons.get(&id).is_some_and(|i| i.owner().is_some());
                if has_owner {
                    self.mouse_down(id, &press);
                } else {
                    tracing::debug!("Press on dock icon {id:?} left to the dock");
                }
            }
            IconEvent::ButtonRelease(_) | IconEvent::Motion(_) => {}
        }
    }

    pub(crate) fn expose(&mut self, window: WindowId) {
        if let Some(id) = self.icon_at(window) {
            self.paint(id);
        }
    }

    // ── live settings ─────────────────────────────────────────────────────────

    /// Deliver `note` to every subscribed icon that is still alive.
    pub fn publish(&mut self, note: Notification) {
        for id in self.screen.broker.recipients(note.topic()) {
            if let Some(icon) = self.icons.get_mut(&id) {
                icon.on_notification(&mut self.screen, note);
            }
        }
    }

    /// Apply a freshly loaded configuration and notify the icons.
    pub fn reload(&mut self, config: Config) {
        let theme = Theme::new(&config.theme, config.icons.icon_size);
        let database = IconDatabase::load(&config.database_path());
        self.apply(config, theme, database);
    }

    pub fn apply(&mut self, config: Config, theme: Theme, database: IconDatabase) {
        let (flags, tiles_changed) = diff_theme(&self.screen.theme_config, &config.theme);
        let resized = config.icons.icon_size != self.screen.prefs.icon_size;
        let titles_changed = config.icons.show_titles != self.screen.prefs.show_titles;
        if config.icons.default_icon != self.screen.prefs.default_icon || resized {
            self.screen.default_image.reset();
        }

        self.screen.cache_dir = config.cache_dir();
        self.screen.database_path = config.database_path();
        self.screen.prefs = config.icons;
        self.screen.theme_config = config.theme;
        self.screen.theme = theme;
        self.screen.database = database;
        tracing::info!("Icon settings reloaded (flags {flags:?}, tiles changed: {tiles_changed})");

        // A geometry change fully updates every icon, which subsumes both
        // notifications.
        if resized || titles_changed {
            let edge = self.screen.prefs.icon_size;
            let show_titles = self.screen.prefs.show_titles;
            for icon in self.icons.values_mut() {
                icon.resize(&mut self.screen, edge);
                if icon.owner().is_some() {
                    icon.set_show_title(show_titles);
                }
                icon.update(&mut self.screen);
                icon.invalidate(&mut self.screen);
            }
            tracing::debug!("Resized {} icons to {edge}px", self.icons.len());
            return;
        }

        if !flags.is_empty() {
            self.publish(Notification::AppearanceSettingsChanged(flags));
        }
        if tiles_changed {
            self.publish(Notification::TileSettingsChanged);
        }
    }
}

/// Which appearance categories differ, and whether clip/drawer tiles changed.
pub fn diff_theme(old: &ThemeConfig, new: &ThemeConfig) -> (SettingsFlags, bool) {
    let mut flags = SettingsFlags::empty();
    if old.icon_back != new.icon_back || old.title_back != new.title_back {
        flags |= SettingsFlags::TEXTURE;
    }
    if old.title_font != new.title_font || old.title_font_size != new.title_font_size {
        flags |= SettingsFlags::FONT;
    }
    if old.title_color != new.title_color || old.select_color != new.select_color {
        flags |= SettingsFlags::COLOR;
    }
    let tiles = old.clip_back != new.clip_back || old.drawer_back != new.drawer_back;
    (flags, tiles)
}
