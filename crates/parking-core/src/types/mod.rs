//! Shared domain types.

pub mod id;
pub mod topic;

pub use id::{BookingRef, SlotId, SpaceId, UserId};
pub use topic::Topic;
