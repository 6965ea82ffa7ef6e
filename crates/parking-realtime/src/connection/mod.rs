//! WebSocket connection state.

pub mod handle;

pub use handle::{ConnectionHandle, ConnectionId};
