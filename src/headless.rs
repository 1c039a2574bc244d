// headless.rs — in-memory DisplayServer
//
// Keeps windows, client pixmaps and uploaded surfaces in plain maps, paints
// onto per-window canvases, logs every request as an `Op`, and serves input
// from a scripted queue. Backs the unit tests and the preview binary.

use std::collections::{HashMap, HashSet, VecDeque};

use image::{Rgba, RgbaImage};
use smithay::utils::{Logical, Point, Rectangle, Size};

use crate::config::Modifier;
use crate::display::{
    Cursor, DisplayError, DisplayServer, DrawableId, IconEvent, RectStyle, SurfaceId, WindowId,
};
use crate::font::{blend, TitleFont};

const ROOT: WindowId = WindowId(1);
/// Dash pattern used for dashed rectangles: on, off.
const DASH: (i32, i32) = (4, 4);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    CreateWindow(WindowId),
    DestroyWindow(WindowId),
    SetDockType(WindowId),
    Move { window: WindowId, to: Point<i32, Logical> },
    Resize { window: WindowId, size: Size<i32, Logical> },
    Raise(WindowId),
    Lower(WindowId),
    Map(WindowId),
    Unmap(WindowId),
    Reparent { window: WindowId, parent: WindowId, at: Point<i32, Logical> },
    SetBorder { window: WindowId, width: u32 },
    SaveSet(WindowId),
    GrabButton { window: WindowId, button: u32, modifier: Modifier },
    Upload(SurfaceId),
    FreeSurface(SurfaceId),
    SetBackground { window: WindowId, surface: SurfaceId },
    ClearWindow(WindowId),
    ClearArea { window: WindowId, area: Rectangle<i32, Logical>, expose: bool },
    DrawString { window: WindowId, at: Point<i32, Logical>, text: String },
    DrawRect { window: WindowId, rect: Rectangle<i32, Logical>, style: RectStyle },
    GrabPointer(WindowId),
    ChangeGrab(Cursor),
    Ungrab,
}

#[derive(Debug)]
struct WindowState {
    parent: WindowId,
    geometry: Rectangle<i32, Logical>,
    mapped: bool,
    border: u32,
    dock_type: bool,
    selects_press: bool,
    background: Option<SurfaceId>,
    canvas: RgbaImage,
}

#[derive(Debug)]
pub struct HeadlessDisplay {
    next_id: u32,
    windows: HashMap<WindowId, WindowState>,
    save_set: HashSet<WindowId>,
    drawables: HashMap<DrawableId, RgbaImage>,
    surfaces: HashMap<SurfaceId, RgbaImage>,
    events: VecDeque<IconEvent>,
    ops: Vec<Op>,
    pointer_grab: Option<WindowId>,
    ungrabs: usize,
    /// Make every surface upload fail (conversion failure).
    pub fail_uploads: bool,
}

impl Default for HeadlessDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessDisplay {
    pub fn new() -> Self {
        Self {
            next_id: ROOT.0 + 1,
            windows: HashMap::new(),
            save_set: HashSet::new(),
            drawables: HashMap::new(),
            surfaces: HashMap::new(),
            events: VecDeque::new(),
            ops: Vec::new(),
            pointer_grab: None,
            ungrabs: 0,
            fail_uploads: false,
        }
    }

    fn alloc(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    // ── scripting ─────────────────────────────────────────────────────────────

    /// A top-level window owned by some other client (dockapps).
    pub fn add_client_window(&mut self, size: Size<i32, Logical>, selects_press: bool) -> WindowId {
        let id = WindowId(self.alloc());
        self.windows.insert(
            id,
            WindowState {
                parent: ROOT,
                geometry: Rectangle { loc: (0, 0).into(), size },
                mapped: true,
                border: 1,
                dock_type: false,
                selects_press,
                background: None,
                canvas: RgbaImage::new(size.w.max(0) as u32, size.h.max(0) as u32),
            },
        );
        id
    }

    /// A client pixmap (legacy icon hint or mask).
    pub fn add_drawable(&mut self, image: RgbaImage) -> DrawableId {
        let id = DrawableId(self.alloc());
        self.drawables.insert(id, image);
        id
    }

    pub fn remove_drawable(&mut self, drawable: DrawableId) {
        self.drawables.remove(&drawable);
    }

    pub fn push_event(&mut self, event: IconEvent) {
        self.events.push_back(event);
    }

    // ── inspection ────────────────────────────────────────────────────────────

    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    pub fn clear_ops(&mut self) {
        self.ops.clear();
    }

    pub fn ungrab_count(&self) -> usize {
        self.ungrabs
    }

    pub fn pointer_grab(&self) -> Option<WindowId> {
        self.pointer_grab
    }

    pub fn window_exists(&self, window: WindowId) -> bool {
        self.windows.contains_key(&window)
    }

    pub fn position(&self, window: WindowId) -> Option<Point<i32, Logical>> {
        self.windows.get(&window).map(|w| w.geometry.loc)
    }

    pub fn parent_of(&self, window: WindowId) -> Option<(WindowId, Point<i32, Logical>)> {
        self.windows.get(&window).map(|w| (w.parent, w.geometry.loc))
    }

    pub fn is_mapped(&self, window: WindowId) -> bool {
        self.windows.get(&window).is_some_and(|w| w.mapped)
    }

    pub fn in_save_set(&self, window: WindowId) -> bool {
        self.save_set.contains(&window)
    }

    pub fn border_width(&self, window: WindowId) -> Option<u32> {
        self.windows.get(&window).map(|w| w.border)
    }

    pub fn is_dock_type(&self, window: WindowId) -> bool {
        self.windows.get(&window).is_some_and(|w| w.dock_type)
    }

    pub fn background(&self, window: WindowId) -> Option<SurfaceId> {
        self.windows.get(&window).and_then(|w| w.background)
    }

    pub fn surface(&self, surface: SurfaceId) -> Option<&RgbaImage> {
        self.surfaces.get(&surface)
    }

    pub fn live_surfaces(&self) -> usize {
        self.surfaces.len()
    }

    /// What the window currently shows: background plus direct drawing.
    pub fn canvas(&self, window: WindowId) -> Option<&RgbaImage> {
        self.windows.get(&window).map(|w| &w.canvas)
    }

    fn reset_canvas(&mut self, window: WindowId) {
        let Some(state) = self.windows.get_mut(&window) else {
            return;
        };
        let (w, h) = (state.geometry.size.w.max(0) as u32, state.geometry.size.h.max(0) as u32);
        state.canvas = match state.background.and_then(|s| self.surfaces.get(&s)) {
            Some(bg) => bg.clone(),
            None => RgbaImage::new(w, h),
        };
    }
}

fn dash_on(index: i32, offset: i32) -> bool {
    (index + offset).rem_euclid(DASH.0 + DASH.1) < DASH.0
}

impl DisplayServer for HeadlessDisplay {
    fn root(&self) -> WindowId {
        ROOT
    }

    fn create_icon_window(&mut self, geometry: Rectangle<i32, Logical>) -> Result<WindowId, DisplayError> {
        let id = WindowId(self.alloc());
        self.windows.insert(
            id,
            WindowState {
                parent: ROOT,
                geometry,
                mapped: false,
                border: 0,
                dock_type: false,
                selects_press: true,
                background: None,
                canvas: RgbaImage::new(geometry.size.w.max(0) as u32, geometry.size.h.max(0) as u32),
            },
        );
        self.ops.push(Op::CreateWindow(id));
        Ok(id)
    }

    fn destroy_window(&mut self, window: WindowId) {
        self.windows.remove(&window);
        self.save_set.remove(&window);
        if self.pointer_grab == Some(window) {
            self.pointer_grab = None;
        }
        self.ops.push(Op::DestroyWindow(window));
    }

    fn set_dock_window_type(&mut self, window: WindowId) {
        if let Some(w) = self.windows.get_mut(&window) {
            w.dock_type = true;
        }
        self.ops.push(Op::SetDockType(window));
    }

    fn move_window(&mut self, window: WindowId, to: Point<i32, Logical>) {
        if let Some(w) = self.windows.get_mut(&window) {
            w.geometry.loc = to;
        }
        self.ops.push(Op::Move { window, to });
    }

    fn resize_window(&mut self, window: WindowId, size: Size<i32, Logical>) {
        if let Some(w) = self.windows.get_mut(&window) {
            w.geometry.size = size;
        }
        self.reset_canvas(window);
        self.ops.push(Op::Resize { window, size });
    }

    fn raise_window(&mut self, window: WindowId) {
        self.ops.push(Op::Raise(window));
    }

    fn lower_window(&mut self, window: WindowId) {
        self.ops.push(Op::Lower(window));
    }

    fn map_window(&mut self, window: WindowId) {
        if let Some(w) = self.windows.get_mut(&window) {
            w.mapped = true;
        }
        self.ops.push(Op::Map(window));
    }

    fn unmap_window(&mut self, window: WindowId) {
        if let Some(w) = self.windows.get_mut(&window) {
            w.mapped = false;
        }
        self.ops.push(Op::Unmap(window));
    }

    fn reparent_window(&mut self, window: WindowId, parent: WindowId, at: Point<i32, Logical>) {
        if let Some(w) = self.windows.get_mut(&window) {
            w.parent = parent;
            w.geometry.loc = at;
        }
        self.ops.push(Op::Reparent { window, parent, at });
    }

    fn set_border_width(&mut self, window: WindowId, width: u32) {
        if let Some(w) = self.windows.get_mut(&window) {
            w.border = width;
        }
        self.ops.push(Op::SetBorder { window, width });
    }

    fn add_to_save_set(&mut self, window: WindowId) {
        self.save_set.insert(window);
        self.ops.push(Op::SaveSet(window));
    }

    fn window_size(&self, window: WindowId) -> Option<Size<i32, Logical>> {
        self.windows.get(&window).map(|w| w.geometry.size)
    }

    fn selects_button_press(&self, window: WindowId) -> bool {
        self.windows.get(&window).is_some_and(|w| w.selects_press)
    }

    fn grab_button(&mut self, window: WindowId, button: u32, modifier: Modifier, _cursor: Cursor) {
        self.ops.push(Op::GrabButton {
            window,
            button,
            modifier,
        });
    }

    fn drawable_size(&self, drawable: DrawableId) -> Option<Size<i32, Logical>> {
        self.drawables
            .get(&drawable)
            .map(|img| (img.width() as i32, img.height() as i32).into())
    }

    fn capture_drawable(&self, drawable: DrawableId, mask: Option<DrawableId>) -> Option<RgbaImage> {
        let mut image = self.drawables.get(&drawable)?.clone();
        if let Some(mask) = mask.and_then(|m| self.drawables.get(&m)) {
            for (x, y, px) in image.enumerate_pixels_mut() {
                let opaque = mask
                    .get_pixel_checked(x, y)
                    .is_some_and(|m| m[0] != 0 || m[1] != 0 || m[2] != 0);
                px[3] = if opaque { px[3] } else { 0 };
            }
        }
        Some(image)
    }

    fn upload_surface(&mut self, image: &RgbaImage) -> Result<SurfaceId, DisplayError> {
        if self.fail_uploads {
            return Err(DisplayError::Conversion {
                w: image.width(),
                h: image.height(),
            });
        }
        let id = SurfaceId(self.alloc());
        self.surfaces.insert(id, image.clone());
        self.ops.push(Op::Upload(id));
        Ok(id)
    }

    fn free_surface(&mut self, surface: SurfaceId) {
        let removed = self.surfaces.remove(&surface);
        debug_assert!(removed.is_some(), "surface {surface:?} freed twice");
        self.ops.push(Op::FreeSurface(surface));
    }

    fn set_background(&mut self, window: WindowId, surface: SurfaceId) {
        if let Some(w) = self.windows.get_mut(&window) {
            w.background = Some(surface);
        }
        self.ops.push(Op::SetBackground { window, surface });
    }

    fn clear_window(&mut self, window: WindowId) {
        self.reset_canvas(window);
        self.ops.push(Op::ClearWindow(window));
    }

    fn clear_area(&mut self, window: WindowId, area: Rectangle<i32, Logical>, expose: bool) {
        let bg = self
            .windows
            .get(&window)
            .and_then(|w| w.background)
            .and_then(|s| self.surfaces.get(&s))
            .cloned();
        if let Some(state) = self.windows.get_mut(&window) {
            for y in area.loc.y.max(0)..(area.loc.y + area.size.h) {
                for x in area.loc.x.max(0)..(area.loc.x + area.size.w) {
                    let (x, y) = (x as u32, y as u32);
                    if x >= state.canvas.width() || y >= state.canvas.height() {
                        continue;
                    }
                    let px = bg
                        .as_ref()
                        .and_then(|b| b.get_pixel_checked(x, y).copied())
                        .unwrap_or(Rgba([0, 0, 0, 0]));
                    state.canvas.put_pixel(x, y, px);
                }
            }
        }
        self.ops.push(Op::ClearArea {
            window,
            area,
            expose,
        });
        if expose && self.windows.contains_key(&window) {
            self.events.push_back(IconEvent::Expose { window });
        }
    }

    fn draw_string(
        &mut self,
        window: WindowId,
        at: Point<i32, Logical>,
        text: &str,
        font: &TitleFont,
        color: Rgba<u8>,
    ) {
        if let Some(w) = self.windows.get_mut(&window) {
            font.rasterize(&mut w.canvas, at, text, color);
        }
        self.ops.push(Op::DrawString {
            window,
            at,
            text: text.to_string(),
        });
    }

    fn draw_rectangle(&mut self, window: WindowId, rect: Rectangle<i32, Logical>, style: RectStyle) {
        if let Some(w) = self.windows.get_mut(&window) {
            let (x0, y0) = (rect.loc.x, rect.loc.y);
            let (x1, y1) = (x0 + rect.size.w, y0 + rect.size.h);
            // Walk the outline clockwise so the dash pattern is continuous.
            let outline = (x0..x1)
                .map(|x| (x, y0))
                .chain((y0..y1).map(|y| (x1, y)))
                .chain((x0 + 1..=x1).rev().map(|x| (x, y1)))
                .chain((y0 + 1..=y1).rev().map(|y| (x0, y)));
            for (i, (x, y)) in outline.enumerate() {
                if let Some(offset) = style.dash_offset {
                    if !dash_on(i as i32, offset) {
                        continue;
                    }
                }
                if x < 0 || y < 0 {
                    continue;
                }
                if let Some(px) = w.canvas.get_pixel_mut_checked(x as u32, y as u32) {
                    *px = blend(*px, style.color, style.color[3]);
                }
            }
        }
        self.ops.push(Op::DrawRect {
            window,
            rect,
            style,
        });
    }

    fn grab_pointer(&mut self, window: WindowId) -> bool {
        if self.pointer_grab.is_some() {
            return false;
        }
        self.pointer_grab = Some(window);
        self.ops.push(Op::GrabPointer(window));
        true
    }

    fn change_pointer_grab(&mut self, cursor: Cursor) {
        self.ops.push(Op::ChangeGrab(cursor));
    }

    fn ungrab_pointer(&mut self) {
        self.pointer_grab = None;
        self.ungrabs += 1;
        self.ops.push(Op::Ungrab);
    }

    fn next_event(&mut self) -> Option<IconEvent> {
        self.events.pop_front()
    }
}
