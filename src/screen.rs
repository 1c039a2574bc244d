// screen.rs — per-screen context shared by every icon
//
// Holds the display connection, preferences, the rendered theme, the icon
// database, the shared default image and the notification broker. One per
// screen; icons borrow it for every operation instead of reaching for
// globals.

use std::path::{Path, PathBuf};

use crate::broker::Broker;
use crate::config::{Config, IconPreferences, ThemeConfig};
use crate::database::{identity_key, IconDatabase};
use crate::display::{DisplayServer, WindowId};
use crate::icon_image::{DefaultImageSlot, IconImage};
use crate::interaction::ClickTracker;
use crate::theme::Theme;

/// Decides whether an owner (by instance name) ignores tile-settings
/// notifications.
pub type TileExemption = Box<dyn Fn(&IconPreferences, Option<&str>) -> bool>;

/// Exempt the owner whose instance equals `exempt_instance`.
pub fn default_tile_exemption(prefs: &IconPreferences, instance: Option<&str>) -> bool {
    match (instance, prefs.exempt_instance.as_deref()) {
        (Some(instance), Some(exempt)) => instance == exempt,
        _ => false,
    }
}

pub struct Screen<D: DisplayServer> {
    pub display: D,
    pub prefs: IconPreferences,
    pub theme_config: ThemeConfig,
    pub theme: Theme,
    pub database: IconDatabase,
    /// Where `database` is saved when an entry is added.
    pub database_path: PathBuf,
    pub default_image: DefaultImageSlot,
    pub broker: Broker,
    /// Where client-supplied icons are persisted.
    pub cache_dir: PathBuf,
    pub clicks: ClickTracker,
    /// The window manager is in a modal state; gestures are ignored.
    pub modal: bool,
    tile_exemption: TileExemption,
}

impl<D: DisplayServer> Screen<D> {
    pub fn new(display: D, config: &Config) -> Self {
        let theme = Theme::new(&config.theme, config.icons.icon_size);
        let database = IconDatabase::load(&config.database_path());
        Self::with_parts(display, config, theme, database)
    }

    pub fn with_parts(display: D, config: &Config, theme: Theme, database: IconDatabase) -> Self {
        Self {
            display,
            prefs: config.icons.clone(),
            theme_config: config.theme.clone(),
            theme,
            database,
            database_path: config.database_path(),
            default_image: DefaultImageSlot::default(),
            broker: Broker::new(),
            cache_dir: config.cache_dir(),
            clicks: ClickTracker::default(),
            modal: false,
            tile_exemption: Box::new(default_tile_exemption),
        }
    }

    pub fn root(&self) -> WindowId {
        self.display.root()
    }

    pub fn icon_size(&self) -> u32 {
        self.prefs.icon_size
    }

    /// Shared default image, created on first use.
    pub fn default_image(&mut self) -> IconImage {
        self.default_image.get(
            self.prefs.default_icon.as_deref(),
            &self.database,
            self.prefs.icon_size,
        )
    }

    /// Make `path` the database icon for an application that has none yet.
    pub fn remember_icon(&mut self, instance: Option<&str>, class: Option<&str>, path: &Path) {
        if self.database.lookup(instance, class, None).is_some() {
            return;
        }
        let Some(key) = identity_key(instance, class) else {
            return;
        };
        self.database.insert(key, path);
        if let Err(e) = self.database.save(&self.database_path) {
            tracing::warn!("Could not save {}: {e}", self.database_path.display());
        }
    }

    pub fn set_tile_exemption(&mut self, exemption: TileExemption) {
        self.tile_exemption = exemption;
    }

    pub fn is_tile_exempt(&self, instance: Option<&str>) -> bool {
        (self.tile_exemption)(&self.prefs, instance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::TitleFont;
    use crate::headless::HeadlessDisplay;

    fn screen() -> Screen<HeadlessDisplay> {
        let config = Config::default();
        let theme = Theme::with_font(&config.theme, 64, TitleFont::fallback(8.0));
        Screen::with_parts(HeadlessDisplay::new(), &config, theme, IconDatabase::default())
    }

    #[test]
    fn default_exemption_matches_configured_instance() {
        let s = screen();
        assert!(s.is_tile_exempt(Some("trixie")));
        assert!(!s.is_tile_exempt(Some("xterm")));
        assert!(!s.is_tile_exempt(None));
    }

    #[test]
    fn exemption_is_replaceable() {
        let mut s = screen();
        s.set_tile_exemption(Box::new(|_, instance| instance.is_some_and(|i| i.starts_with("dock"))));
        assert!(s.is_tile_exempt(Some("dockbar")));
        assert!(!s.is_tile_exempt(Some("trixie")));
    }

    #[test]
    fn default_image_is_shared() {
        let mut s = screen();
        let a = s.default_image();
        let b = s.default_image();
        assert!(a.shares(&b));
    }
}
