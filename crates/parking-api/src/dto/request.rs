//! Request DTOs with validation.

use serde::{Deserialize, Serialize};
use validator::Validate;

use parking_core::types::id::{SpaceId, UserId};

/// Body of `POST /api/slots/{slotId}/reserve`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ReserveSlotRequest {
    /// Space the slot belongs to.
    pub space_id: SpaceId,
    /// Requesting user.
    pub user_id: UserId,
    /// Requesting user's display name.
    #[validate(length(min = 1, max = 200, message = "userName is required"))]
    pub user_name: String,
    /// Hold duration in minutes.
    #[serde(default)]
    #[validate(range(min = 1, message = "reservationTimeoutMinutes must be positive"))]
    pub reservation_timeout_minutes: Option<u64>,
}

/// Body of `POST /api/slots/{slotId}/release`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseSlotRequest {
    /// Space the slot belongs to.
    pub space_id: SpaceId,
    /// When present, only this user's hold is released.
    #[serde(default)]
    pub user_id: Option<UserId>,
}

/// Body of `POST /api/slots/{slotId}/book`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BookSlotRequest {
    /// Space the slot belongs to.
    pub space_id: SpaceId,
    /// Booking user.
    pub user_id: UserId,
}
