//! Slot directory trait: the authoritative record of slot availability.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::result::AppResult;
use crate::types::id::{SlotId, SpaceId};

/// Availability of a single slot as recorded by the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotAvailability {
    /// The slot.
    pub slot_id: SlotId,
    /// The space the slot belongs to.
    pub space_id: SpaceId,
    /// `false` once a booking has been finalized.
    pub available: bool,
}

/// Read/write access to the slot directory.
///
/// Calls may be slow or fail. The coordinator never holds a store lock
/// across them and treats a failed availability lookup as "unavailable".
#[async_trait]
pub trait SlotDirectory: Send + Sync + 'static {
    /// Looks up a slot. `None` when the directory does not know it.
    async fn slot(&self, slot_id: SlotId) -> AppResult<Option<SlotAvailability>>;

    /// Whether the slot exists and is currently offerable.
    async fn is_available(&self, slot_id: SlotId) -> AppResult<bool> {
        Ok(self.slot(slot_id).await?.is_some_and(|slot| slot.available))
    }

    /// Flags the slot as no longer available after a booking is finalized.
    async fn mark_unavailable(&self, slot_id: SlotId) -> AppResult<()>;

    /// Lists every slot belonging to a space.
    async fn list_slots(&self, space_id: SpaceId) -> AppResult<Vec<SlotAvailability>>;
}
