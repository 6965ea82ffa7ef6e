//! In-memory slot directory for single-node deployments and tests.

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::{info, warn};

use parking_core::config::SpaceInventory;
use parking_core::error::AppError;
use parking_core::result::AppResult;
use parking_core::traits::slot_directory::{SlotAvailability, SlotDirectory};
use parking_core::types::id::{SlotId, SpaceId};

/// Slot availability held in memory.
#[derive(Debug, Default)]
pub struct MemorySlotDirectory {
    /// Slot ID → availability.
    slots: DashMap<SlotId, SlotAvailability>,
    /// Space ID → slot IDs in insertion order.
    by_space: DashMap<SpaceId, Vec<SlotId>>,
}

impl MemorySlotDirectory {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self {
            slots: DashMap::new(),
            by_space: DashMap::new(),
        }
    }

    /// Builds a directory from configured inventory.
    pub fn from_inventory(inventory: &[SpaceInventory]) -> Self {
        let directory = Self::new();
        for space in inventory {
            for slot_id in &space.slots {
                let available = !space.booked.contains(slot_id);
                directory.add_slot(*slot_id, space.space_id, available);
            }
            info!(
                space_id = %space.space_id,
                slots = space.slots.len(),
                booked = space.booked.len(),
                "Seeded parking space"
            );
        }
        directory
    }

    /// Adds (or replaces) a slot.
    pub fn add_slot(&self, slot_id: SlotId, space_id: SpaceId, available: bool) {
        let previous = self.slots.insert(
            slot_id,
            SlotAvailability {
                slot_id,
                space_id,
                available,
            },
        );

        if let Some(previous) = previous {
            if previous.space_id == space_id {
                return;
            }
            warn!(slot_id = %slot_id, from = %previous.space_id, to = %space_id, "Slot moved between spaces");
            if let Some(mut ids) = self.by_space.get_mut(&previous.space_id) {
                ids.retain(|id| *id != slot_id);
            }
        }

        self.by_space.entry(space_id).or_default().push(slot_id);
    }

    /// Returns a slot to service after departure.
    pub fn mark_available(&self, slot_id: SlotId) -> AppResult<()> {
        let mut slot = self
            .slots
            .get_mut(&slot_id)
            .ok_or_else(|| AppError::not_found(format!("Slot {slot_id} not found")))?;
        slot.available = true;
        Ok(())
    }

    /// Number of slots known to the directory.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }
}

#[async_trait]
impl SlotDirectory for MemorySlotDirectory {
    async fn slot(&self, slot_id: SlotId) -> AppResult<Option<SlotAvailability>> {
        Ok(self.slots.get(&slot_id).map(|entry| entry.value().clone()))
    }

    async fn mark_unavailable(&self, slot_id: SlotId) -> AppResult<()> {
        let mut slot = self
            .slots
            .get_mut(&slot_id)
            .ok_or_else(|| AppError::not_found(format!("Slot {slot_id} not found")))?;
        slot.available = false;
        Ok(())
    }

    async fn list_slots(&self, space_id: SpaceId) -> AppResult<Vec<SlotAvailability>> {
        let ids = self
            .by_space
            .get(&space_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default();

        Ok(ids
            .iter()
            .filter_map(|id| self.slots.get(id).map(|entry| entry.value().clone()))
            .collect())
    }
}
