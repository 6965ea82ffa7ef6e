//! Booking store trait: the durable record of completed bookings.

use async_trait::async_trait;

use crate::result::AppResult;
use crate::types::id::{BookingRef, SlotId, SpaceId, UserId};

/// Persists finalized bookings.
#[async_trait]
pub trait BookingStore: Send + Sync + 'static {
    /// Records a booking and returns its reference.
    async fn record(
        &self,
        slot_id: SlotId,
        space_id: SpaceId,
        user_id: UserId,
    ) -> AppResult<BookingRef>;

    /// Removes a booking recorded by [`BookingStore::record`].
    ///
    /// Used to compensate when the directory write that follows a recorded
    /// booking fails.
    async fn cancel(&self, booking_ref: BookingRef) -> AppResult<()>;
}
