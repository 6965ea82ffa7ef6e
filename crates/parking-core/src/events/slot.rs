//! Slot-level lifecycle events.

use serde::{Deserialize, Serialize};

use crate::types::id::{SlotId, SpaceId, UserId};

use super::now_millis;

/// What happened to a slot (or space) to produce an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SlotAction {
    /// A temporary hold was granted.
    Reserved,
    /// The slot was booked.
    Booked,
    /// The holder released the slot.
    Released,
    /// The hold expired without being booked or released.
    Timeout,
    /// A reservation attempt was rejected.
    NotAvailable,
    /// A space's availability count changed.
    AvailabilityUpdate,
    /// A space's availability at subscription time.
    InitialStatus,
}

/// The wire unit published for every slot state transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationEvent {
    /// Slot the event is about.
    pub slot_id: SlotId,
    /// Space the slot belongs to.
    pub space_id: SpaceId,
    /// Whether observers should now treat the slot as free.
    pub available: bool,
    /// Transition that produced the event.
    pub action: SlotAction,
    /// Holder or booker, only for `RESERVED` and `BOOKED`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    /// Holder's display name, only for `RESERVED`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    /// Epoch milliseconds.
    pub timestamp: i64,
}

impl NotificationEvent {
    fn bare(slot_id: SlotId, space_id: SpaceId, available: bool, action: SlotAction) -> Self {
        Self {
            slot_id,
            space_id,
            available,
            action,
            user_id: None,
            user_name: None,
            timestamp: now_millis(),
        }
    }

    /// A hold was granted to `user_id`.
    pub fn reserved(slot_id: SlotId, space_id: SpaceId, user_id: UserId, user_name: &str) -> Self {
        Self {
            user_id: Some(user_id),
            user_name: Some(user_name.to_string()),
            ..Self::bare(slot_id, space_id, false, SlotAction::Reserved)
        }
    }

    /// The slot was booked by `user_id`.
    pub fn booked(slot_id: SlotId, space_id: SpaceId, user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
            ..Self::bare(slot_id, space_id, false, SlotAction::Booked)
        }
    }

    /// The hold was released by its holder.
    pub fn released(slot_id: SlotId, space_id: SpaceId) -> Self {
        Self::bare(slot_id, space_id, true, SlotAction::Released)
    }

    /// The hold expired.
    pub fn timeout(slot_id: SlotId, space_id: SpaceId) -> Self {
        Self::bare(slot_id, space_id, true, SlotAction::Timeout)
    }

    /// A reservation attempt was rejected. Sent to the requester only.
    pub fn not_available(slot_id: SlotId, space_id: SpaceId) -> Self {
        Self::bare(slot_id, space_id, false, SlotAction::NotAvailable)
    }
}
