//! Slot directory implementations.

pub mod memory;

pub use memory::MemorySlotDirectory;
