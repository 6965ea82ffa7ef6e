//! Collaborator contracts defined in `parking-core` and implemented by
//! other crates.

pub mod booking_store;
pub mod broadcaster;
pub mod slot_directory;

pub use booking_store::BookingStore;
pub use broadcaster::{Broadcaster, NotificationStream};
pub use slot_directory::{SlotAvailability, SlotDirectory};
