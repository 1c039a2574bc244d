// icon.rs — icon state and lifecycle
//
// An `Icon` is created for a managed window or for a dock/clip slot, lives as
// long as its owner and is torn down exactly once by `destroy` (which takes
// it by value). Rendering is always resolve → composite → install → paint;
// title text and the selection frame are drawn directly on every paint.

use std::path::{Path, PathBuf};

use image::imageops::{self, FilterType};
use image::RgbaImage;
use smithay::utils::{Logical, Point, Rectangle, Size};

use crate::broker::{Notification, SettingsFlags, Subscription, Topic};
use crate::display::{rect, DisplayServer, RectStyle, SurfaceId, WindowId};
use crate::dockapp::ForeignWindow;
use crate::error::IconError;
use crate::icon_image::{load_icon_file, IconImage};
use crate::owner::OwnerRef;
use crate::resolve::database_image;
use crate::screen::Screen;
use crate::theme::TileKind;
use crate::tile::{composite, layout_title, TileRequest};
use crate::util::absolute_path_for_file;

/// Margin around the scaled window snapshot in a mini preview.
pub const MINIPREVIEW_BORDER: u32 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IconId(pub u64);

/// Identity of a dock/clip icon, which has no window to ask.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DockIdentity {
    pub command: Option<String>,
    pub instance: Option<String>,
    pub class: Option<String>,
}

#[derive(Debug)]
pub struct Icon {
    id: IconId,
    window: WindowId,
    owner: Option<OwnerRef>,
    dock: DockIdentity,
    geometry: Rectangle<i32, Logical>,

    pub(crate) tile_kind: TileKind,
    /// Image driving the composite; `None` for dockapps.
    pub(crate) image: Option<IconImage>,
    /// Image picked by the user or the database, with its file.
    user_image: Option<(PathBuf, IconImage)>,
    foreign: Option<ForeignWindow>,

    surface: Option<SurfaceId>,
    mini_preview: Option<SurfaceId>,

    pub(crate) selected: bool,
    highlighted: bool,
    shadowed: bool,
    show_title: bool,
    title: Option<String>,

    pub(crate) selection_timer: Option<calloop::RegistrationToken>,
    pub(crate) dash_step: i32,

    subscriptions: Vec<Subscription>,
}

impl Icon {
    // ── construction ──────────────────────────────────────────────────────────

    fn create_core<D: DisplayServer>(
        screen: &mut Screen<D>,
        id: IconId,
        at: Point<i32, Logical>,
    ) -> Result<Self, IconError> {
        let size = screen.icon_size() as i32;
        let geometry = rect(at.x, at.y, size, size);
        let window = screen.display.create_icon_window(geometry)?;
        screen.display.set_dock_window_type(window);

        Ok(Self {
            id,
            window,
            owner: None,
            dock: DockIdentity::default(),
            geometry,
            tile_kind: TileKind::Normal,
            image: None,
            user_image: None,
            foreign: None,
            surface: None,
            mini_preview: None,
            selected: false,
            highlighted: false,
            shadowed: false,
            show_title: false,
            title: None,
            selection_timer: None,
            dash_step: 0,
            subscriptions: Vec::with_capacity(2),
        })
    }

    fn subscribe<D: DisplayServer>(&mut self, screen: &Screen<D>) {
        for topic in [Topic::AppearanceSettingsChanged, Topic::TileSettingsChanged] {
            if let Some(sub) = screen.broker.subscribe(topic, self.id) {
                self.subscriptions.push(sub);
            }
        }
    }

    /// Miniwindow icon for a managed window.
    pub fn create_for_window<D: DisplayServer>(
        screen: &mut Screen<D>,
        id: IconId,
        owner: OwnerRef,
    ) -> Result<Self, IconError> {
        let (at, foreign, title, instance, class) = {
            let o = owner.borrow();
            (
                o.icon_position,
                o.icon_window_hint(),
                o.title(),
                o.instance.clone(),
                o.class.clone(),
            )
        };

        let mut icon = Self::create_core(screen, id, at)?;
        icon.foreign = foreign.map(ForeignWindow::new);
        icon.show_title = screen.prefs.show_titles;
        icon.title = title;
        icon.user_image = database_image(screen, instance.as_deref(), class.as_deref(), None);
        icon.owner = Some(owner);

        icon.update(screen);
        icon.subscribe(screen);
        tracing::debug!("Icon {id:?} created for {:?}.{:?}", instance, class);
        Ok(icon)
    }

    /// Free-standing icon for a dock or clip slot.
    pub fn create_for_dock<D: DisplayServer>(
        screen: &mut Screen<D>,
        id: IconId,
        dock: DockIdentity,
        tile_kind: TileKind,
    ) -> Result<Self, IconError> {
        let mut icon = Self::create_core(screen, id, (0, 0).into())?;
        icon.tile_kind = tile_kind;
        icon.user_image = database_image(
            screen,
            dock.instance.as_deref(),
            dock.class.as_deref(),
            dock.command.as_deref(),
        );
        icon.dock = dock;

        icon.update(screen);
        icon.subscribe(screen);
        tracing::debug!("Dock icon {id:?} created ({:?})", icon.tile_kind);
        Ok(icon)
    }

    // ── teardown ──────────────────────────────────────────────────────────────

    /// Release everything the icon holds. The selection timer must already
    /// have been cancelled by whoever scheduled it.
    pub fn destroy<D: DisplayServer>(mut self, screen: &mut Screen<D>) {
        debug_assert!(self.selection_timer.is_none(), "selection timer still armed");
        self.subscriptions.clear();

        if let Some(foreign) = self.foreign.take() {
            let at = self
                .owner
                .as_ref()
                .map(|o| o.borrow().icon_position)
                .unwrap_or_default();
            let root = screen.root();
            foreign.release(&mut screen.display, root, at);
        }
        if let Some(surface) = self.surface.take() {
            screen.display.free_surface(surface);
        }
        if let Some(preview) = self.mini_preview.take() {
            screen.display.free_surface(preview);
        }
        self.title = None;
        self.image = None;
        self.user_image = None;
        screen.display.destroy_window(self.window);
        tracing::debug!("Icon {:?} destroyed", self.id);
    }

    // ── accessors ─────────────────────────────────────────────────────────────

    pub fn id(&self) -> IconId {
        self.id
    }

    pub fn window(&self) -> WindowId {
        self.window
    }

    pub fn owner(&self) -> Option<&OwnerRef> {
        self.owner.as_ref()
    }

    pub fn dock_identity(&self) -> &DockIdentity {
        &self.dock
    }

    pub fn geometry(&self) -> Rectangle<i32, Logical> {
        self.geometry
    }

    pub fn tile_kind(&self) -> TileKind {
        self.tile_kind
    }

    pub fn image(&self) -> Option<&IconImage> {
        self.image.as_ref()
    }

    pub fn user_image(&self) -> Option<&IconImage> {
        self.user_image.as_ref().map(|(_, image)| image)
    }

    pub fn image_file(&self) -> Option<&Path> {
        self.user_image.as_ref().map(|(path, _)| path.as_path())
    }

    pub fn foreign_window(&self) -> Option<WindowId> {
        self.foreign.as_ref().map(ForeignWindow::window)
    }

    pub fn is_dockapp(&self) -> bool {
        self.foreign.is_some()
    }

    pub fn surface(&self) -> Option<SurfaceId> {
        self.surface
    }

    pub fn mini_preview(&self) -> Option<SurfaceId> {
        self.mini_preview
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    pub fn is_highlighted(&self) -> bool {
        self.highlighted
    }

    pub fn is_shadowed(&self) -> bool {
        self.shadowed
    }

    pub fn shows_title(&self) -> bool {
        self.show_title
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn is_subscribed(&self) -> bool {
        !self.subscriptions.is_empty()
    }

    pub(crate) fn set_position(&mut self, at: Point<i32, Logical>) {
        self.geometry.loc = at;
    }

    /// Follow a change of the configured icon edge. The caller re-renders.
    pub(crate) fn resize<D: DisplayServer>(&mut self, screen: &mut Screen<D>, edge: u32) {
        let size: Size<i32, Logical> = (edge as i32, edge as i32).into();
        if self.geometry.size == size {
            return;
        }
        self.geometry.size = size;
        screen.display.resize_window(self.window, size);
    }

    /// Attach (or detach) a dockapp window supplied by the dock.
    pub(crate) fn set_foreign_window<D: DisplayServer>(
        &mut self,
        screen: &mut Screen<D>,
        window: Option<WindowId>,
    ) {
        if self.foreign_window() == window {
            return;
        }
        if let Some(old) = self.foreign.take() {
            let root = screen.display.root();
            old.release(&mut screen.display, root, self.geometry.loc);
        }
        self.foreign = window.map(ForeignWindow::new);
    }

    // ── title ─────────────────────────────────────────────────────────────────

    /// Recompute the title from the owner's name hints.
    pub fn change_title(&mut self) {
        let Some(owner) = &self.owner else {
            return;
        };
        let title = owner.borrow().title();
        self.title = title;
    }

    pub fn set_show_title(&mut self, flag: bool) {
        self.show_title = flag;
    }

    // ── image ─────────────────────────────────────────────────────────────────

    /// Load `file` (looked up in the image search path) as the icon's image.
    ///
    /// On failure nothing changes.
    pub fn set_image_from_file<D: DisplayServer>(
        &mut self,
        screen: &mut Screen<D>,
        file: &str,
    ) -> Result<(), IconError> {
        let path = absolute_path_for_file(&screen.prefs.image_paths, file)
            .ok_or_else(|| IconError::NotFound(file.to_string()))?;
        let image = load_icon_file(&path, screen.icon_size())?;

        tracing::debug!("Icon {:?} image ← {}", self.id, path.display());
        self.image = Some(image.clone());
        self.user_image = Some((path, image));
        self.render(screen);
        Ok(())
    }

    /// Re-resolve the image and redraw everything.
    pub fn update<D: DisplayServer>(&mut self, screen: &mut Screen<D>) {
        self.resolve_image(screen);
        self.render(screen);
    }

    /// Composite the current state, install it as the background and paint.
    pub fn render<D: DisplayServer>(&mut self, screen: &mut Screen<D>) {
        let request = if self.foreign.is_some() {
            TileRequest {
                kind: TileKind::Normal,
                show_title: false,
                image: None,
                shadowed: false,
                highlighted: false,
            }
        } else {
            TileRequest {
                kind: self.tile_kind,
                show_title: self.show_title,
                image: self.image.as_ref(),
                shadowed: self.shadowed,
                highlighted: self.highlighted,
            }
        };
        let tile = composite(&request, &screen.theme, screen.icon_size());

        match screen.display.upload_surface(&tile) {
            Ok(surface) => {
                screen.display.set_background(self.window, surface);
                if let Some(old) = self.surface.replace(surface) {
                    screen.display.free_surface(old);
                }
            }
            Err(e) => tracing::warn!("Error rendering icon {:?}: {e}", self.id),
        }

        if let Some(foreign) = &mut self.foreign {
            foreign.embed(
                &mut screen.display,
                self.window,
                screen.prefs.icon_size,
                screen.prefs.cmd_modifier,
            );
        }

        self.paint(screen);
    }

    // ── painting ──────────────────────────────────────────────────────────────

    /// Redraw the direct-drawn layer: title and selection frame.
    pub fn paint<D: DisplayServer>(&self, screen: &mut Screen<D>) {
        screen.display.clear_window(self.window);

        if let (true, Some(title)) = (self.show_title, self.title.as_deref()) {
            let layout = layout_title(
                &screen.theme.title_font,
                title,
                screen.icon_size(),
                self.geometry.size.w,
            );
            screen.display.draw_string(
                self.window,
                layout.at,
                &layout.text,
                &screen.theme.title_font,
                screen.theme.title_color,
            );
        }

        if self.selected {
            self.draw_selection_frame(screen);
        }
    }

    pub(crate) fn draw_selection_frame<D: DisplayServer>(&self, screen: &mut Screen<D>) {
        let size = self.geometry.size;
        screen.display.draw_rectangle(
            self.window,
            rect(0, 0, size.w - 1, size.h - 1),
            RectStyle {
                color: screen.theme.select_color,
                dash_offset: Some(self.dash_step),
            },
        );
    }

    pub(crate) fn invalidate<D: DisplayServer>(&self, screen: &mut Screen<D>) {
        let size = self.geometry.size;
        screen
            .display
            .clear_area(self.window, rect(0, 0, size.w, size.h), true);
    }

    // ── decoration state ──────────────────────────────────────────────────────

    pub fn set_highlighted<D: DisplayServer>(&mut self, screen: &mut Screen<D>, flag: bool) {
        if self.highlighted == flag {
            return;
        }
        self.highlighted = flag;
        self.render(screen);
    }

    pub fn set_shadowed<D: DisplayServer>(&mut self, screen: &mut Screen<D>, flag: bool) {
        if self.shadowed == flag {
            return;
        }
        self.shadowed = flag;
        self.render(screen);
    }

    /// Keep a smooth-scaled snapshot of the window for hover previews.
    pub fn set_mini_preview<D: DisplayServer>(&mut self, screen: &mut Screen<D>, snapshot: &RgbaImage) {
        let edge = screen
            .prefs
            .minipreview_size
            .saturating_sub(2 * MINIPREVIEW_BORDER)
            .max(1);
        let scaled = imageops::resize(snapshot, edge, edge, FilterType::CatmullRom);
        match screen.display.upload_surface(&scaled) {
            Ok(surface) => {
                if let Some(old) = self.mini_preview.replace(surface) {
                    screen.display.free_surface(old);
                }
            }
            Err(e) => tracing::warn!("Mini preview for icon {:?}: {e}", self.id),
        }
    }

    // ── live settings ─────────────────────────────────────────────────────────

    pub fn on_notification<D: DisplayServer>(&mut self, screen: &mut Screen<D>, note: Notification) {
        match note {
            Notification::AppearanceSettingsChanged(flags) => {
                if flags.intersects(SettingsFlags::TEXTURE | SettingsFlags::FONT) {
                    if self.image.is_some() {
                        self.render(screen);
                    } else {
                        self.update(screen);
                    }
                }
                self.invalidate(screen);
            }
            Notification::TileSettingsChanged => {
                let instance = self
                    .owner
                    .as_ref()
                    .and_then(|o| o.borrow().instance.clone());
                if self.owner.is_some() && screen.is_tile_exempt(instance.as_deref()) {
                    tracing::debug!("Icon {:?} exempt from tile change", self.id);
                    return;
                }
                self.render(screen);
                screen.display.clear_area(self.window, rect(0, 0, 1, 1), true);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::database::IconDatabase;
    use crate::font::TitleFont;
    use crate::display::IconEvent;
    use crate::headless::{HeadlessDisplay, Op};
    use crate::owner::ManagedWindow;
    use crate::theme::Theme;
    use image::Rgba;

    fn screen_with(db: IconDatabase, config: Config) -> Screen<HeadlessDisplay> {
        let theme = Theme::with_font(&config.theme, config.icons.icon_size, TitleFont::fallback(8.0));
        Screen::with_parts(HeadlessDisplay::new(), &config, theme, db)
    }

    fn screen() -> Screen<HeadlessDisplay> {
        screen_with(IconDatabase::default(), Config::default())
    }

    fn owner(instance: &str, class: &str) -> OwnerRef {
        ManagedWindow::new(Some(instance), Some(class)).into_ref()
    }

    fn write_png(dir: &Path, name: &str, w: u32, h: u32, color: [u8; 4]) -> PathBuf {
        let path = dir.join(name);
        RgbaImage::from_pixel(w, h, Rgba(color)).save(&path).unwrap();
        path
    }

    #[test]
    fn window_icon_without_sources_uses_shared_default() {
        let mut s = screen();
        let a = Icon::create_for_window(&mut s, IconId(1), owner("a", "A")).unwrap();
        let b = Icon::create_for_window(&mut s, IconId(2), owner("b", "B")).unwrap();
        assert!(a.image().unwrap().shares(b.image().unwrap()));
        assert!(s.display.is_dock_type(a.window()));
        assert!(a.is_subscribed());
        assert_eq!(s.broker.len(), 4);
    }

    #[test]
    fn pixmap_hint_beats_database_then_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let db_file = write_png(dir.path(), "xterm.png", 32, 32, [0, 0, 255, 255]);
        let mut db = IconDatabase::default();
        db.insert("xterm.XTerm", db_file.display().to_string());
        let mut s = screen_with(db, Config::default());

        let pixmap = s
            .display
            .add_drawable(RgbaImage::from_pixel(16, 16, Rgba([255, 0, 0, 255])));
        let o = owner("xterm", "XTerm");
        o.borrow_mut().hints.icon_pixmap = Some(pixmap);

        let mut icon = Icon::create_for_window(&mut s, IconId(1), o.clone()).unwrap();
        assert_eq!(icon.image().unwrap().width(), 16);
        assert_eq!(icon.image_file(), Some(db_file.as_path()));

        // The pixmap disappears: the hint is pruned and the database file wins.
        s.display.remove_drawable(pixmap);
        icon.update(&mut s);
        assert_eq!(icon.image().unwrap().width(), 32);
        assert_eq!(o.borrow().hints.icon_pixmap, None);
    }

    #[test]
    fn oversized_pixmap_is_validated() {
        let mut s = screen();
        let pixmap = s.display.add_drawable(RgbaImage::new(400, 100));
        let o = owner("a", "A");
        o.borrow_mut().hints.icon_pixmap = Some(pixmap);
        let icon = Icon::create_for_window(&mut s, IconId(1), o).unwrap();
        let img = icon.image().unwrap();
        assert_eq!((img.width(), img.height()), (61, 15));
    }

    #[test]
    fn protocol_icon_is_retained_not_copied() {
        let mut s = screen();
        let o = owner("a", "A");
        let net = IconImage::new(RgbaImage::new(24, 24));
        o.borrow_mut().net_icon_image = Some(net.clone());
        let icon = Icon::create_for_window(&mut s, IconId(1), o).unwrap();
        assert!(icon.image().unwrap().shares(&net));
    }

    #[test]
    fn update_is_idempotent() {
        let mut s = screen();
        let o = owner("a", "A");
        o.borrow_mut().net_icon_name = Some("Terminal".into());
        let mut icon = Icon::create_for_window(&mut s, IconId(1), o).unwrap();

        let first = s.display.surface(icon.surface().unwrap()).unwrap().clone();
        icon.update(&mut s);
        let second = s.display.surface(icon.surface().unwrap()).unwrap().clone();
        assert_eq!(first, second);
        // The previous surface was released, not leaked.
        assert_eq!(s.display.live_surfaces(), 1);
    }

    #[test]
    fn failed_upload_keeps_previous_surface() {
        let mut s = screen();
        let mut icon = Icon::create_for_window(&mut s, IconId(1), owner("a", "A")).unwrap();
        let before = icon.surface();
        s.display.fail_uploads = true;
        icon.set_highlighted(&mut s, true);
        assert_eq!(icon.surface(), before);
        assert!(icon.is_highlighted());
    }

    #[test]
    fn title_is_drawn_on_paint() {
        let mut s = screen();
        let o = owner("a", "A");
        o.borrow_mut().icon_name = Some("xterm".into());
        let icon = Icon::create_for_window(&mut s, IconId(1), o).unwrap();
        assert_eq!(icon.title(), Some("xterm"));
        // fallback 8 px font: 5 px per char → 25 px, centred in 64.
        assert!(s.display.ops().contains(&Op::DrawString {
            window: icon.window(),
            at: (19, 1).into(),
            text: "xterm".into(),
        }));
    }

    #[test]
    fn change_title_follows_owner() {
        let mut s = screen();
        let o = owner("a", "A");
        o.borrow_mut().net_wm_name = Some("old".into());
        let mut icon = Icon::create_for_window(&mut s, IconId(1), o.clone()).unwrap();
        o.borrow_mut().net_icon_name = Some("new".into());
        icon.change_title();
        assert_eq!(icon.title(), Some("new"));
    }

    #[test]
    fn set_image_from_file() {
        let dir = tempfile::tempdir().unwrap();
        write_png(dir.path(), "custom.png", 40, 40, [0, 255, 0, 255]);
        let mut config = Config::default();
        config.icons.image_paths = vec![dir.path().to_path_buf()];
        let mut s = screen_with(IconDatabase::default(), config);

        let mut icon = Icon::create_for_window(&mut s, IconId(1), owner("a", "A")).unwrap();
        let before = icon.image().cloned();

        assert!(matches!(
            icon.set_image_from_file(&mut s, "missing.png"),
            Err(IconError::NotFound(_))
        ));
        assert!(icon.image().unwrap().shares(before.as_ref().unwrap()));

        icon.set_image_from_file(&mut s, "custom.png").unwrap();
        assert_eq!(icon.image().unwrap().width(), 40);
        assert_eq!(icon.image_file(), Some(dir.path().join("custom.png").as_path()));
    }

    #[test]
    fn dock_icon_uses_command_lookup_and_no_title() {
        let dir = tempfile::tempdir().unwrap();
        let file = write_png(dir.path(), "htop.png", 20, 20, [1, 2, 3, 255]);
        let mut db = IconDatabase::default();
        db.insert("htop", file.display().to_string());
        let mut s = screen_with(db, Config::default());

        let dock = DockIdentity {
            command: Some("/usr/bin/htop -d 5".into()),
            ..DockIdentity::default()
        };
        let icon = Icon::create_for_dock(&mut s, IconId(1), dock, TileKind::Clip).unwrap();
        assert_eq!(icon.image().unwrap().width(), 20);
        assert_eq!(icon.geometry().loc, (0, 0).into());
        assert_eq!(icon.tile_kind(), TileKind::Clip);
        assert!(!icon.shows_title());
        assert!(icon.owner().is_none());
    }

    #[test]
    fn dockapp_is_embedded_instead_of_image() {
        let mut s = screen();
        let app = s.display.add_client_window((48, 48).into(), true);
        let o = owner("wmclock", "DockApp");
        o.borrow_mut().hints.icon_window = Some(app);
        o.borrow_mut().net_icon_image = Some(IconImage::new(RgbaImage::new(8, 8)));

        let icon = Icon::create_for_window(&mut s, IconId(1), o).unwrap();
        assert!(icon.is_dockapp());
        assert!(icon.image().is_none());
        assert_eq!(s.display.parent_of(app), Some((icon.window(), (8, 8).into())));
        // Plain icon tile behind the dockapp.
        let bg = s.display.surface(icon.surface().unwrap()).unwrap();
        assert_eq!(bg, &s.theme.icon_tile);
    }

    #[test]
    fn destroy_releases_dockapp_at_owner_position() {
        let mut s = screen();
        let app = s.display.add_client_window((48, 48).into(), false);
        let o = owner("wmclock", "DockApp");
        o.borrow_mut().hints.icon_window = Some(app);
        o.borrow_mut().icon_position = (300, 40).into();

        let icon = Icon::create_for_window(&mut s, IconId(1), o).unwrap();
        let window = icon.window();
        icon.destroy(&mut s);

        let root = s.display.root();
        assert_eq!(s.display.parent_of(app), Some((root, (300, 40).into())));
        assert!(!s.display.window_exists(window));
        assert!(s.broker.is_empty());
        assert_eq!(s.display.live_surfaces(), 0);
    }

    #[test]
    fn highlight_and_shadow_render_only_on_change() {
        let mut s = screen();
        let mut icon = Icon::create_for_window(&mut s, IconId(1), owner("a", "A")).unwrap();
        s.display.clear_ops();
        icon.set_highlighted(&mut s, false);
        icon.set_shadowed(&mut s, false);
        assert!(s.display.ops().is_empty());

        icon.set_shadowed(&mut s, true);
        assert!(s.display.ops().iter().any(|op| matches!(op, Op::Upload(_))));
    }

    #[test]
    fn mini_preview_replaces_previous() {
        let mut s = screen();
        let mut icon = Icon::create_for_window(&mut s, IconId(1), owner("a", "A")).unwrap();
        icon.set_mini_preview(&mut s, &RgbaImage::new(800, 600));
        let first = icon.mini_preview().unwrap();
        assert_eq!(s.display.surface(first).unwrap().dimensions(), (96, 96));

        icon.set_mini_preview(&mut s, &RgbaImage::new(10, 10));
        assert_ne!(icon.mini_preview(), Some(first));
        assert!(s.display.surface(first).is_none());
    }

    #[test]
    fn appearance_change_rerenders_and_invalidates() {
        let mut s = screen();
        let mut icon = Icon::create_for_window(&mut s, IconId(1), owner("a", "A")).unwrap();
        s.display.clear_ops();

        icon.on_notification(&mut s, Notification::AppearanceSettingsChanged(SettingsFlags::COLOR));
        assert!(!s.display.ops().iter().any(|op| matches!(op, Op::Upload(_))));
        assert!(s.display.ops().iter().any(|op| matches!(op, Op::ClearArea { expose: true, .. })));
        assert_eq!(
            s.display.next_event(),
            Some(IconEvent::Expose { window: icon.window() })
        );

        s.display.clear_ops();
        icon.on_notification(&mut s, Notification::AppearanceSettingsChanged(SettingsFlags::FONT));
        assert!(s.display.ops().iter().any(|op| matches!(op, Op::Upload(_))));
    }

    #[test]
    fn tile_change_skips_exempt_owner() {
        let mut s = screen();
        let mut own = Icon::create_for_window(&mut s, IconId(1), owner("trixie", "Trixie")).unwrap();
        let mut other = Icon::create_for_window(&mut s, IconId(2), owner("xterm", "XTerm")).unwrap();
        s.display.clear_ops();

        own.on_notification(&mut s, Notification::TileSettingsChanged);
        assert!(s.display.ops().is_empty());

        other.on_notification(&mut s, Notification::TileSettingsChanged);
        assert!(s.display.ops().contains(&Op::ClearArea {
            window: other.window(),
            area: rect(0, 0, 1, 1),
            expose: true,
        }));
    }

    #[test]
    fn legacy_pixmap_mask_applied() {
        let mut s = screen();
        let pixmap = s.display.add_drawable(RgbaImage::from_pixel(4, 4, Rgba([9, 9, 9, 255])));
        let mask = s.display.add_drawable(RgbaImage::new(4, 4));
        let o = owner("a", "A");
        o.borrow_mut().hints.icon_pixmap = Some(pixmap);
        o.borrow_mut().hints.icon_mask = Some(mask);
        let icon = Icon::create_for_window(&mut s, IconId(1), o).unwrap();
        assert_eq!(icon.image().unwrap().pixels().get_pixel(0, 0)[3], 0);
    }
}
