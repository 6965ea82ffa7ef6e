//! # parking-reservation
//!
//! Temporary slot holds for the parking service:
//!
//! - Atomic per-slot hold store
//! - Cancellable expiry timers
//! - The coordinator that drives reserve, release, book, and timeout
//! - In-memory slot directory and booking store

pub mod booking;
pub mod coordinator;
pub mod directory;
pub mod locks;
pub mod scheduler;
pub mod store;

pub use booking::MemoryBookingStore;
pub use coordinator::{
    BookRequest, BookingConfirmation, ReleaseRequest, ReservationCoordinator, ReserveRequest,
};
pub use directory::MemorySlotDirectory;
pub use locks::KeyedLocks;
pub use scheduler::ExpiryScheduler;
pub use store::{Holder, Reservation, ReservationStore};
