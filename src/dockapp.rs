// dockapp.rs — foreign windows embedded in an icon
//
// A dockapp's window belongs to another client. The icon only decides where
// it sits: reparent, centre, map, and hand it back to the root on teardown.

use smithay::utils::{Logical, Point};

use crate::config::Modifier;
use crate::display::{Cursor, DisplayServer, WindowId, BUTTON_PRIMARY};

#[derive(Debug, PartialEq, Eq)]
pub struct ForeignWindow {
    window: WindowId,
    embedded_in: Option<WindowId>,
}

impl ForeignWindow {
    pub fn new(window: WindowId) -> Self {
        Self {
            window,
            embedded_in: None,
        }
    }

    pub fn window(&self) -> WindowId {
        self.window
    }

    pub fn is_embedded(&self) -> bool {
        self.embedded_in.is_some()
    }

    /// Put the window inside `host`, centred on an `icon_size` tile.
    ///
    /// When the client listens for button presses a passive grab is placed on
    /// the host so the whole tile can still start a drag.
    pub fn embed<D: DisplayServer>(
        &mut self,
        display: &mut D,
        host: WindowId,
        icon_size: u32,
        cmd_modifier: Modifier,
    ) {
        let size = display
            .window_size(self.window)
            .unwrap_or_else(|| (icon_size as i32, icon_size as i32).into());
        let at: Point<i32, Logical> = (
            (icon_size as i32 - size.w) / 2,
            (icon_size as i32 - size.h) / 2,
        )
            .into();

        display.set_border_width(self.window, 0);
        display.reparent_window(self.window, host, at);
        display.map_window(self.window);
        display.add_to_save_set(self.window);

        if display.selects_button_press(self.window) {
            display.grab_button(host, BUTTON_PRIMARY, cmd_modifier, Cursor::Arrow);
        }

        if self.embedded_in != Some(host) {
            tracing::debug!(
                "Dockapp {:?} ({}x{}) embedded in {host:?} at {},{}",
                self.window,
                size.w,
                size.h,
                at.x,
                at.y
            );
        }
        self.embedded_in = Some(host);
    }

    /// Unmap and give the window back to `root` at `at`.
    pub fn release<D: DisplayServer>(self, display: &mut D, root: WindowId, at: Point<i32, Logical>) {
        display.unmap_window(self.window);
        display.reparent_window(self.window, root, at);
        tracing::debug!("Dockapp {:?} released to root at {},{}", self.window, at.x, at.y);
    }
}
