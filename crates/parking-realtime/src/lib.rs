//! # parking-realtime
//!
//! Real-time delivery for the parking service. Provides:
//!
//! - In-memory topic pub/sub over Tokio broadcast channels
//! - The [`RealtimeBroadcaster`] the coordinator publishes through
//! - Per-connection subscription forwarding for WebSocket clients
//! - The WebSocket message protocol and engine metrics

pub mod bridge;
pub mod broadcaster;
pub mod connection;
pub mod message;
pub mod metrics;
pub mod server;

pub use broadcaster::RealtimeBroadcaster;
pub use connection::handle::ConnectionHandle;
pub use server::RealtimeEngine;
