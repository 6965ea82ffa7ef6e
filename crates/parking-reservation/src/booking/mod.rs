//! Booking store implementations.

pub mod memory;

pub use memory::{BookingRecord, MemoryBookingStore};
