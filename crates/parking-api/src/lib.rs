//! # parking-api
//!
//! HTTP API layer for the parking service built on Axum.
//!
//! Provides the slot reservation endpoints, space availability, health,
//! the WebSocket upgrade, middleware (CORS, request logging), extractors,
//! DTOs, and server wiring.

pub mod app;
pub mod dto;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::{build_state, build_state_with, run_server};
pub use router::build_router;
pub use state::AppState;
