// display.rs — the windowing-system seam
//
// Everything the icon subsystem asks of the display server goes through
// `DisplayServer`: window creation and stacking, reparenting foreign windows,
// surface upload, direct drawing, pointer grabs and the blocking event fetch
// used by the drag loop. `HeadlessDisplay` (headless.rs) is the in-memory
// implementation used by tests and the preview binary.

use image::{Rgba, RgbaImage};
use smithay::utils::{Logical, Point, Rectangle, Size};
use thiserror::Error;

use crate::config::Modifier;
use crate::font::TitleFont;

// ── handles ───────────────────────────────────────────────────────────────────

/// A top-level or child window known to the display server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowId(pub u32);

/// A client-owned pixmap (legacy icon hints).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DrawableId(pub u32);

/// A server-side surface produced from a composited tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cursor {
    Arrow,
    Move,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DisplayError {
    #[error("cannot convert {w}x{h} image to a surface")]
    Conversion { w: u32, h: u32 },
}

pub fn rect(x: i32, y: i32, w: i32, h: i32) -> Rectangle<i32, Logical> {
    Rectangle {
        loc: (x, y).into(),
        size: (w, h).into(),
    }
}

// ── input ─────────────────────────────────────────────────────────────────────

pub const BUTTON_PRIMARY: u32 = 1;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModifierState {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub logo: bool,
}

impl ModifierState {
    pub fn shift() -> Self {
        Self {
            shift: true,
            ..Self::default()
        }
    }

    pub fn with(modifier: Modifier) -> Self {
        let mut state = Self::default();
        match modifier {
            Modifier::Super => state.logo = true,
            Modifier::Alt => state.alt = true,
            Modifier::Ctrl => state.ctrl = true,
        }
        state
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonEvent {
    pub window: WindowId,
    pub button: u32,
    /// Position relative to `window`.
    pub pos: Point<i32, Logical>,
    pub root: Point<i32, Logical>,
    pub modifiers: ModifierState,
    /// Server timestamp in milliseconds.
    pub time: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotionEvent {
    pub window: WindowId,
    pub pos: Point<i32, Logical>,
    pub root: Point<i32, Logical>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconEvent {
    ButtonPress(ButtonEvent),
    ButtonRelease(ButtonEvent),
    Motion(MotionEvent),
    Expose { window: WindowId },
}

// ── drawing ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RectStyle {
    pub color: Rgba<u8>,
    /// `Some(offset)` draws a dashed outline starting at `offset`.
    pub dash_offset: Option<i32>,
}

// ── the seam ──────────────────────────────────────────────────────────────────

pub trait DisplayServer {
    fn root(&self) -> WindowId;

    fn create_icon_window(
        &mut self,
        geometry: Rectangle<i32, Logical>,
    ) -> Result<WindowId, DisplayError>;
    fn destroy_window(&mut self, window: WindowId);
    /// Tag `window` with the dock window type so external compositors treat
    /// it as a panel-like surface.
    fn set_dock_window_type(&mut self, window: WindowId);

    fn move_window(&mut self, window: WindowId, to: Point<i32, Logical>);
    fn resize_window(&mut self, window: WindowId, size: Size<i32, Logical>);
    fn raise_window(&mut self, window: WindowId);
    fn lower_window(&mut self, window: WindowId);
    fn map_window(&mut self, window: WindowId);
    fn unmap_window(&mut self, window: WindowId);
    fn reparent_window(&mut self, window: WindowId, parent: WindowId, at: Point<i32, Logical>);
    fn set_border_width(&mut self, window: WindowId, width: u32);
    fn add_to_save_set(&mut self, window: WindowId);

    fn window_size(&self, window: WindowId) -> Option<Size<i32, Logical>>;
    /// Whether the client selected button-press events on `window`.
    fn selects_button_press(&self, window: WindowId) -> bool;
    fn grab_button(&mut self, window: WindowId, button: u32, modifier: Modifier, cursor: Cursor);

    fn drawable_size(&self, drawable: DrawableId) -> Option<Size<i32, Logical>>;
    /// Read back a client pixmap, applying `mask` as alpha when given.
    fn capture_drawable(&self, drawable: DrawableId, mask: Option<DrawableId>)
        -> Option<RgbaImage>;

    fn upload_surface(&mut self, image: &RgbaImage) -> Result<SurfaceId, DisplayError>;
    fn free_surface(&mut self, surface: SurfaceId);
    fn set_background(&mut self, window: WindowId, surface: SurfaceId);

    fn clear_window(&mut self, window: WindowId);
    /// Clear `area`; with `expose` set the server queues an expose event.
    fn clear_area(&mut self, window: WindowId, area: Rectangle<i32, Logical>, expose: bool);
    fn draw_string(
        &mut self,
        window: WindowId,
        at: Point<i32, Logical>,
        text: &str,
        font: &TitleFont,
        color: Rgba<u8>,
    );
    fn draw_rectangle(&mut self, window: WindowId, rect: Rectangle<i32, Logical>, style: RectStyle);

    fn grab_pointer(&mut self, window: WindowId) -> bool;
    fn change_pointer_grab(&mut self, cursor: Cursor);
    fn ungrab_pointer(&mut self);
    /// Block until the next pointer or expose event. `None` means the event
    /// source is gone.
    fn next_event(&mut self) -> Option<IconEvent>;
}
