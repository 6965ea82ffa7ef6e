//! HTTP and WebSocket handlers.

pub mod health;
pub mod reservation;
pub mod space;
pub mod ws;
