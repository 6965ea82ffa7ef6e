//! Notification events published to topic subscribers.
//!
//! Every topic carries [`Notification`]: either a slot-level
//! [`NotificationEvent`] or a space-level [`SpaceAvailabilitySummary`].
//! Both are immutable once constructed and field-stable on the wire.

pub mod slot;
pub mod space;

use serde::{Deserialize, Serialize};

pub use slot::{NotificationEvent, SlotAction};
pub use space::SpaceAvailabilitySummary;

/// Union of everything a topic can carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Notification {
    /// A slot lifecycle transition.
    Slot(NotificationEvent),
    /// A space availability summary.
    Space(SpaceAvailabilitySummary),
}

impl Notification {
    /// The action carried by either variant.
    pub fn action(&self) -> SlotAction {
        match self {
            Notification::Slot(event) => event.action,
            Notification::Space(summary) => summary.action,
        }
    }

    /// The slot event, if this is one.
    pub fn as_slot(&self) -> Option<&NotificationEvent> {
        match self {
            Notification::Slot(event) => Some(event),
            Notification::Space(_) => None,
        }
    }

    /// The space summary, if this is one.
    pub fn as_space(&self) -> Option<&SpaceAvailabilitySummary> {
        match self {
            Notification::Space(summary) => Some(summary),
            Notification::Slot(_) => None,
        }
    }
}

impl From<NotificationEvent> for Notification {
    fn from(event: NotificationEvent) -> Self {
        Notification::Slot(event)
    }
}

impl From<SpaceAvailabilitySummary> for Notification {
    fn from(summary: SpaceAvailabilitySummary) -> Self {
        Notification::Space(summary)
    }
}

/// Current wall-clock time in epoch milliseconds.
pub(crate) fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
