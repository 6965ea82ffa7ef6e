//! WebSocket message protocol.

pub mod serializer;
pub mod types;

pub use types::{InboundMessage, OutboundMessage, RequestKind};
