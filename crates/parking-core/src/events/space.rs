//! Space-level availability summaries.

use serde::{Deserialize, Serialize};

use crate::types::id::SpaceId;

use super::now_millis;
use super::slot::SlotAction;

/// Derived availability of a space. Recomputed on demand, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpaceAvailabilitySummary {
    /// Space the summary is about.
    pub space_id: SpaceId,
    /// Slots that are free in the directory and not held.
    pub available_slots: u32,
    /// All slots the directory lists for the space.
    pub total_slots: u32,
    /// `AVAILABILITY_UPDATE` or `INITIAL_STATUS`.
    pub action: SlotAction,
    /// Epoch milliseconds.
    pub timestamp: i64,
}

impl SpaceAvailabilitySummary {
    /// Creates a summary stamped with the current time.
    pub fn new(space_id: SpaceId, available_slots: u32, total_slots: u32, action: SlotAction) -> Self {
        Self {
            space_id,
            available_slots,
            total_slots,
            action,
            timestamp: now_millis(),
        }
    }
}
