//! In-memory booking store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::{info, warn};

use parking_core::result::AppResult;
use parking_core::traits::booking_store::BookingStore;
use parking_core::types::id::{BookingRef, SlotId, SpaceId, UserId};

/// A finalized booking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingRecord {
    /// Reference handed back to the caller.
    pub booking_ref: BookingRef,
    /// Booked slot.
    pub slot_id: SlotId,
    /// Space of the booked slot.
    pub space_id: SpaceId,
    /// Booking user.
    pub user_id: UserId,
    /// When the booking was recorded.
    pub booked_at: DateTime<Utc>,
}

/// Bookings held in memory.
#[derive(Debug, Default)]
pub struct MemoryBookingStore {
    bookings: DashMap<BookingRef, BookingRecord>,
}

impl MemoryBookingStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            bookings: DashMap::new(),
        }
    }

    /// Looks up a booking.
    pub fn get(&self, booking_ref: &BookingRef) -> Option<BookingRecord> {
        self.bookings.get(booking_ref).map(|entry| entry.value().clone())
    }

    /// Bookings made for a slot.
    pub fn for_slot(&self, slot_id: SlotId) -> Vec<BookingRecord> {
        self.bookings
            .iter()
            .filter(|entry| entry.value().slot_id == slot_id)
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Number of bookings recorded.
    pub fn len(&self) -> usize {
        self.bookings.len()
    }

    /// Whether no booking has been recorded.
    pub fn is_empty(&self) -> bool {
        self.bookings.is_empty()
    }
}

#[async_trait]
impl BookingStore for MemoryBookingStore {
    async fn record(
        &self,
        slot_id: SlotId,
        space_id: SpaceId,
        user_id: UserId,
    ) -> AppResult<BookingRef> {
        let record = BookingRecord {
            booking_ref: BookingRef::new(),
            slot_id,
            space_id,
            user_id,
            booked_at: Utc::now(),
        };
        let booking_ref = record.booking_ref;
        self.bookings.insert(booking_ref, record);

        info!(booking_ref = %booking_ref, slot_id = %slot_id, user_id = %user_id, "Booking recorded");
        Ok(booking_ref)
    }

    async fn cancel(&self, booking_ref: BookingRef) -> AppResult<()> {
        if self.bookings.remove(&booking_ref).is_none() {
            warn!(booking_ref = %booking_ref, "Attempted to cancel unknown booking");
        }
        Ok(())
    }
}
