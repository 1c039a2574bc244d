// broker.rs — topic-based notification registry for live settings changes
//
// Icons hold a `Subscription` per topic. Dropping it removes the registration,
// so an icon is registered from construction until it is dropped and never
// twice. The broker only answers "who is subscribed to this topic"; the yard
// delivers each notification to the icons that are still alive.

use std::cell::RefCell;
use std::ops::BitOr;
use std::rc::{Rc, Weak};

use crate::icon::IconId;

// ── settings flags ────────────────────────────────────────────────────────────

/// Which appearance categories changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SettingsFlags(u8);

impl SettingsFlags {
    pub const TEXTURE: Self = Self(1 << 0);
    pub const FONT: Self = Self(1 << 1);
    pub const COLOR: Self = Self(1 << 2);

    pub const fn empty() -> Self {
        Self(0)
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// True when any bit of `other` is set in `self`.
    pub fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }
}

impl BitOr for SettingsFlags {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for SettingsFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

// ── topics ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    AppearanceSettingsChanged,
    TileSettingsChanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notification {
    AppearanceSettingsChanged(SettingsFlags),
    TileSettingsChanged,
}

impl Notification {
    pub fn topic(&self) -> Topic {
        match self {
            Notification::AppearanceSettingsChanged(_) => Topic::AppearanceSettingsChanged,
            Notification::TileSettingsChanged => Topic::TileSettingsChanged,
        }
    }
}

// ── broker ────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct Registry {
    entries: Vec<(Topic, IconId)>,
}

#[derive(Debug, Clone, Default)]
pub struct Broker {
    registry: Rc<RefCell<Registry>>,
}

impl Broker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `observer` for `topic`.
    ///
    /// Returns `None` if that pair is already registered.
    pub fn subscribe(&self, topic: Topic, observer: IconId) -> Option<Subscription> {
        let mut reg = self.registry.borrow_mut();
        if reg.entries.contains(&(topic, observer)) {
            tracing::warn!("Icon {observer:?} already subscribed to {topic:?}");
            return None;
        }
        reg.entries.push((topic, observer));
        Some(Subscription {
            registry: Rc::downgrade(&self.registry),
            topic,
            observer,
        })
    }

    /// Observers of `topic`, in registration order.
    pub fn recipients(&self, topic: Topic) -> Vec<IconId> {
        self.registry
            .borrow()
            .entries
            .iter()
            .filter(|(t, _)| *t == topic)
            .map(|(_, id)| *id)
            .collect()
    }

    pub fn is_subscribed(&self, topic: Topic, observer: IconId) -> bool {
        self.registry.borrow().entries.contains(&(topic, observer))
    }

    pub fn len(&self) -> usize {
        self.registry.borrow().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Scoped registration; removed from the broker when dropped.
#[derive(Debug)]
pub struct Subscription {
    registry: Weak<RefCell<Registry>>,
    topic: Topic,
    observer: IconId,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        let mut reg = registry.borrow_mut();
        let before = reg.entries.len();
        reg.entries
            .retain(|entry| *entry != (self.topic, self.observer));
        debug_assert_eq!(before, reg.entries.len() + 1, "subscription removed twice");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscription_is_scoped() {
        let broker = Broker::new();
        let sub = broker.subscribe(Topic::TileSettingsChanged, IconId(1)).unwrap();
        assert!(broker.is_subscribed(Topic::TileSettingsChanged, IconId(1)));
        drop(sub);
        assert!(broker.is_empty());
    }

    #[test]
    fn duplicate_registration_refused() {
        let broker = Broker::new();
        let _a = broker.subscribe(Topic::TileSettingsChanged, IconId(1)).unwrap();
        assert!(broker.subscribe(Topic::TileSettingsChanged, IconId(1)).is_none());
        assert_eq!(broker.len(), 1);
    }

    #[test]
    fn recipients_per_topic() {
        let broker = Broker::new();
        let _a = broker.subscribe(Topic::AppearanceSettingsChanged, IconId(1));
        let _b = broker.subscribe(Topic::TileSettingsChanged, IconId(1));
        let _c = broker.subscribe(Topic::AppearanceSettingsChanged, IconId(2));
        assert_eq!(
            broker.recipients(Topic::AppearanceSettingsChanged),
            vec![IconId(1), IconId(2)]
        );
        assert_eq!(broker.recipients(Topic::TileSettingsChanged), vec![IconId(1)]);
    }

    #[test]
    fn subscription_outliving_broker_is_harmless() {
        let broker = Broker::new();
        let sub = broker.subscribe(Topic::TileSettingsChanged, IconId(7)).unwrap();
        drop(broker);
        drop(sub);
    }

    #[test]
    fn flags() {
        let f = SettingsFlags::TEXTURE | SettingsFlags::COLOR;
        assert!(f.intersects(SettingsFlags::TEXTURE | SettingsFlags::FONT));
        assert!(!f.intersects(SettingsFlags::FONT));
        assert!(SettingsFlags::empty().is_empty());
        assert_eq!(
            Notification::AppearanceSettingsChanged(f).topic(),
            Topic::AppearanceSettingsChanged
        );
    }
}
