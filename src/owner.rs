// owner.rs — the managed window an icon represents
//
// The window manager keeps one `ManagedWindow` per client. Icons read its
// identity and icon hints, and talk back only through `OwnerMessage` so the
// icon never writes the window's fields directly.

use std::cell::RefCell;
use std::rc::Rc;

use smithay::utils::{Logical, Point};

use crate::display::{DrawableId, WindowId};
use crate::icon_image::IconImage;

pub type OwnerRef = Rc<RefCell<ManagedWindow>>;

/// Icon-related fields of the legacy window-manager hints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LegacyIconHints {
    pub icon_pixmap: Option<DrawableId>,
    pub icon_mask: Option<DrawableId>,
    pub icon_window: Option<WindowId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnerMessage {
    /// The icon was dragged; store the new icon position.
    IconMoved { x: i32, y: i32 },
    /// Restore the window from its icon.
    Deiconify,
    SetSelected(bool),
    /// Ask the layout collaborator to rearrange icons.
    ArrangeIcons,
}

#[derive(Debug, Default)]
pub struct ManagedWindow {
    pub client: Option<WindowId>,
    pub instance: Option<String>,
    pub class: Option<String>,
    /// Command line that started the client, if known.
    pub command: Option<String>,

    pub net_icon_name: Option<String>,
    pub icon_name: Option<String>,
    pub net_wm_name: Option<String>,

    pub hints: LegacyIconHints,
    /// Decoded protocol icon (already size-validated).
    pub net_icon_image: Option<IconImage>,

    pub icon_position: Point<i32, Logical>,
    pub always_user_icon: bool,

    /// This window is its application's main (group leader) window.
    pub is_main_window: bool,
    /// The application already shows an app icon.
    pub app_has_app_icon: bool,

    pub selected: bool,
    pub icon_moved: bool,
    pub iconified: bool,

    /// Requests for other collaborators (deiconify, arrange), in order.
    pending: Vec<OwnerMessage>,
}

impl ManagedWindow {
    pub fn new(instance: Option<&str>, class: Option<&str>) -> Self {
        Self {
            instance: instance.map(str::to_string),
            class: class.map(str::to_string),
            iconified: true,
            ..Self::default()
        }
    }

    pub fn into_ref(self) -> OwnerRef {
        Rc::new(RefCell::new(self))
    }

    /// Icon title: protocol icon name, then legacy icon name, then window name.
    pub fn title(&self) -> Option<String> {
        if let Some(name) = self.net_icon_name.as_deref().filter(|n| !n.is_empty()) {
            return Some(name.to_string());
        }
        self.icon_name
            .clone()
            .or_else(|| self.net_wm_name.clone())
    }

    /// The legacy icon-window hint, unless honouring it would take the
    /// window away from the application's own app icon.
    pub fn icon_window_hint(&self) -> Option<WindowId> {
        let window = self.hints.icon_window?;
        if self.is_main_window && self.app_has_app_icon {
            tracing::debug!("Not stealing icon window {window:?} from app icon");
            return None;
        }
        Some(window)
    }

    pub fn receive(&mut self, msg: OwnerMessage) {
        tracing::debug!("Owner {:?} ← {msg:?}", self.instance);
        match msg {
            OwnerMessage::IconMoved { x, y } => {
                self.icon_position = (x, y).into();
                self.icon_moved = true;
            }
            OwnerMessage::SetSelected(flag) => self.selected = flag,
            OwnerMessage::Deiconify => {
                self.iconified = false;
                self.pending.push(msg);
            }
            OwnerMessage::ArrangeIcons => self.pending.push(msg),
        }
    }

    /// Drain requests meant for the rest of the window manager.
    pub fn take_pending(&mut self) -> Vec<OwnerMessage> {
        std::mem::take(&mut self.pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_fallback_order() {
        let mut w = ManagedWindow::new(Some("xterm"), Some("XTerm"));
        assert_eq!(w.title(), None);
        w.net_wm_name = Some("bash — xterm".into());
        assert_eq!(w.title().as_deref(), Some("bash — xterm"));
        w.icon_name = Some("xterm".into());
        assert_eq!(w.title().as_deref(), Some("xterm"));
        w.net_icon_name = Some(String::new());
        assert_eq!(w.title().as_deref(), Some("xterm"));
        w.net_icon_name = Some("Terminal".into());
        assert_eq!(w.title().as_deref(), Some("Terminal"));
    }

    #[test]
    fn icon_window_steal_guard() {
        let mut w = ManagedWindow::new(Some("wmclock"), Some("DockApp"));
        w.hints.icon_window = Some(WindowId(40));
        assert_eq!(w.icon_window_hint(), Some(WindowId(40)));

        w.is_main_window = true;
        assert_eq!(w.icon_window_hint(), Some(WindowId(40)));
        w.app_has_app_icon = true;
        assert_eq!(w.icon_window_hint(), None);
    }

    #[test]
    fn messages_update_state() {
        let mut w = ManagedWindow::new(None, Some("XTerm"));
        w.receive(OwnerMessage::IconMoved { x: 10, y: 20 });
        assert_eq!(w.icon_position, (10, 20).into());
        assert!(w.icon_moved);

        w.receive(OwnerMessage::SetSelected(true));
        assert!(w.selected);

        w.receive(OwnerMessage::ArrangeIcons);
        w.receive(OwnerMessage::Deiconify);
        assert!(!w.iconified);
        assert_eq!(
            w.take_pending(),
            vec![OwnerMessage::ArrangeIcons, OwnerMessage::Deiconify]
        );
        assert!(w.take_pending().is_empty());
    }
}
