//! Application state shared across all handlers and middleware.

use std::sync::Arc;
use std::time::Instant;

use parking_core::config::AppConfig;
use parking_realtime::server::RealtimeEngine;
use parking_reservation::coordinator::ReservationCoordinator;

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Reservation coordinator (shared by HTTP and WebSocket entry points)
    pub coordinator: ReservationCoordinator,
    /// WebSocket realtime engine
    pub realtime: Arc<RealtimeEngine>,
    /// When the state was built, for uptime reporting
    pub started_at: Instant,
}
