//! Slot inventory used to seed the in-memory slot directory.

use serde::{Deserialize, Serialize};

use crate::types::id::{SlotId, SpaceId};

/// The slots of one parking space.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpaceInventory {
    /// The space.
    pub space_id: SpaceId,
    /// Every slot in the space.
    #[serde(default)]
    pub slots: Vec<SlotId>,
    /// Slots already booked at startup.
    #[serde(default)]
    pub booked: Vec<SlotId>,
}
