//! Pub/sub transports behind the broadcaster.

pub mod memory_pubsub;

pub use memory_pubsub::MemoryPubSub;
