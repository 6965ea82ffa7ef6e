//! Response DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use parking_core::types::id::{BookingRef, SlotId, SpaceId, UserId};
use parking_realtime::metrics::MetricsSnapshot;
use parking_reservation::coordinator::BookingConfirmation;
use parking_reservation::store::Reservation;

/// Standard success response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the request was successful.
    pub success: bool,
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Creates a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// An active hold.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationResponse {
    /// Held slot.
    pub slot_id: SlotId,
    /// Space the slot belongs to.
    pub space_id: SpaceId,
    /// Holder.
    pub user_id: UserId,
    /// Holder's display name.
    pub user_name: String,
    /// When the hold was granted.
    pub reserved_at: DateTime<Utc>,
    /// When the hold lapses unless booked or released.
    pub expires_at: DateTime<Utc>,
    /// Hold duration in seconds.
    pub ttl_seconds: u64,
}

impl From<Reservation> for ReservationResponse {
    fn from(r: Reservation) -> Self {
        Self {
            expires_at: r.expires_at(),
            ttl_seconds: r.ttl.as_secs(),
            slot_id: r.slot_id,
            space_id: r.space_id,
            user_id: r.user_id,
            user_name: r.user_name,
            reserved_at: r.reserved_at,
        }
    }
}

/// A finalized booking.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingResponse {
    /// Booking store reference.
    pub booking_ref: BookingRef,
    /// Booked slot.
    pub slot_id: SlotId,
    /// Space the slot belongs to.
    pub space_id: SpaceId,
}

impl From<BookingConfirmation> for BookingResponse {
    fn from(c: BookingConfirmation) -> Self {
        Self {
            booking_ref: c.booking_ref,
            slot_id: c.slot_id,
            space_id: c.space_id,
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// `ok` while the coordinator accepts reservations, `stopping` otherwise.
    pub status: String,
    /// Server version.
    pub version: String,
    /// Seconds since startup.
    pub uptime_seconds: u64,
    /// Active holds.
    pub active_reservations: usize,
    /// Outstanding expiry timers.
    pub pending_timers: usize,
    /// Realtime counters.
    pub realtime: MetricsSnapshot,
}
