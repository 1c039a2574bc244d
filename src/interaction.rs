// interaction.rs — press/drag/release handling for miniwindow icons
//
// A press grabs the pointer and then pulls events straight from the display
// until the pressing button is released:
//
//   WaitingForThreshold ──motion ≥ threshold──▶ Dragging ──release──▶ done
//          │                                                     ▲
//          └──────────────────────release────────────────────────┘
//
// Expose events that arrive while the grab is held are painted immediately.
// A double click short-circuits the whole gesture.

use smithay::utils::{Logical, Point};

use crate::display::{ButtonEvent, Cursor, DisplayServer, IconEvent, MotionEvent, WindowId, BUTTON_PRIMARY};
use crate::icon::IconId;
use crate::owner::OwnerMessage;
use crate::yard::IconYard;

// ── double click ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default)]
pub struct ClickTracker {
    last: Option<(WindowId, u32, u32)>,
}

impl ClickTracker {
    /// Record `press`; true when it completes a double click.
    ///
    /// A completed double click resets the tracker, so a third press starts
    /// a new pair.
    pub fn register(&mut self, press: &ButtonEvent, delay_ms: u32) -> bool {
        let double = matches!(
            self.last,
            Some((window, button, time))
                if window == press.window
                    && button == press.button
                    && press.time.wrapping_sub(time) <= delay_ms
        );
        self.last = if double {
            None
        } else {
            Some((press.window, press.button, press.time))
        };
        double
    }
}

// ── drag gesture ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragState {
    WaitingForThreshold,
    Dragging,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionOutcome {
    /// Below the threshold; jitter.
    Ignored,
    /// Threshold crossed: switch the grab cursor and move.
    StartDrag(Point<i32, Logical>),
    Move(Point<i32, Logical>),
}

#[derive(Debug, Clone, Copy)]
pub struct DragGesture {
    button: u32,
    /// Press position inside the icon window.
    grab: Point<i32, Logical>,
    position: Point<i32, Logical>,
    threshold: i32,
    state: DragState,
}

impl DragGesture {
    pub fn new(press: &ButtonEvent, start: Point<i32, Logical>, threshold: i32) -> Self {
        Self {
            button: press.button,
            grab: press.pos,
            position: start,
            threshold,
            state: DragState::WaitingForThreshold,
        }
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    pub fn position(&self) -> Point<i32, Logical> {
        self.position
    }

    pub fn has_dragged(&self) -> bool {
        self.state == DragState::Dragging
    }

    pub fn motion(&mut self, motion: &MotionEvent) -> MotionOutcome {
        let started = match self.state {
            DragState::Dragging => false,
            DragState::WaitingForThreshold => {
                let dx = (self.grab.x - motion.pos.x).abs();
                let dy = (self.grab.y - motion.pos.y).abs();
                if dx < self.threshold && dy < self.threshold {
                    return MotionOutcome::Ignored;
                }
                self.state = DragState::Dragging;
                true
            }
        };
        self.position = motion.root - self.grab;
        if started {
            MotionOutcome::StartDrag(self.position)
        } else {
            MotionOutcome::Move(self.position)
        }
    }

    /// Only the button that started the gesture ends it.
    pub fn ends_with(&self, release: &ButtonEvent) -> bool {
        release.button == self.button
    }
}

// ── the gesture loop ──────────────────────────────────────────────────────────

impl<D: DisplayServer + 'static> IconYard<D> {
    /// Handle a press on a miniwindow icon through to the matching release.
    pub fn mouse_down(&mut self, id: IconId, press: &ButtonEvent) {
        let Some(icon) = self.icon(id) else {
            return;
        };
        let window = icon.window();
        let Some(owner) = icon.owner().cloned() else {
            debug_assert!(false, "mouse_down on icon {id:?} without an owner");
            tracing::warn!("Ignoring press on ownerless icon {id:?}");
            return;
        };

        if self.screen.modal {
            return;
        }

        let delay = self.screen.prefs.double_click_delay;
        if self.screen.clicks.register(press, delay) {
            tracing::debug!("Double click on icon {id:?}");
            owner.borrow_mut().receive(OwnerMessage::Deiconify);
            return;
        }

        if press.button == BUTTON_PRIMARY {
            if self.screen.prefs.cmd_modifier.is_held(&press.modifiers) {
                self.screen.display.lower_window(window);
            } else {
                self.screen.display.raise_window(window);
            }
            if press.modifiers.shift {
                self.toggle_select(id);
                let selected = self.icon(id).is_some_and(|i| i.is_selected());
                owner.borrow_mut().receive(OwnerMessage::SetSelected(selected));
            }
        }

        if !self.screen.display.grab_pointer(window) {
            tracing::debug!("Pointer grab for icon {id:?} failed");
        }

        let start = owner.borrow().icon_position;
        let mut gesture = DragGesture::new(press, start, self.screen.prefs.move_threshold);

        loop {
            let Some(event) = self.screen.display.next_event() else {
                tracing::warn!("Event source gone during icon drag, releasing");
                break;
            };
            match event {
                IconEvent::Expose { window } => self.expose(window),
                IconEvent::Motion(motion) => match gesture.motion(&motion) {
                    MotionOutcome::Ignored => {}
                    MotionOutcome::StartDrag(to) => {
                        self.screen.display.change_pointer_grab(Cursor::Move);
                        self.move_icon(id, to);
                    }
                    MotionOutcome::Move(to) => self.move_icon(id, to),
                },
                IconEvent::ButtonPress(_) => {}
                IconEvent::ButtonRelease(release) => {
                    if gesture.ends_with(&release) {
                        break;
                    }
                }
            }
        }

        let end = gesture.position();
        self.move_icon(id, end);
        if end != start {
            owner
                .borrow_mut()
                .receive(OwnerMessage::IconMoved { x: end.x, y: end.y });
        }
        self.screen.display.ungrab_pointer();

        if self.screen.prefs.auto_arrange {
            owner.borrow_mut().receive(OwnerMessage::ArrangeIcons);
        }
        // Sub-threshold jitter still counts as a click; only a started drag
        // suppresses activation.
        if self.screen.prefs.single_click && !gesture.has_dragged() {
            owner.borrow_mut().receive(OwnerMessage::Deiconify);
        }
    }

    fn move_icon(&mut self, id: IconId, to: Point<i32, Logical>) {
        let Some(window) = self.icon(id).map(|i| i.window()) else {
            return;
        };
        self.screen.display.move_window(window, to);
        if let Some(icon) = self.icon_mut(id) {
            icon.set_position(to);
        }
    }
}
