//! Health check handler.

use axum::Json;
use axum::extract::State;

use crate::dto::response::{ApiResponse, HealthResponse};
use crate::state::AppState;

/// GET /api/health
pub async fn health(State(state): State<AppState>) -> Json<ApiResponse<HealthResponse>> {
    let status = if state.coordinator.is_running() {
        "ok"
    } else {
        "stopping"
    };

    Json(ApiResponse::ok(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        active_reservations: state.coordinator.active_count(),
        pending_timers: state.coordinator.pending_timers(),
        realtime: state.realtime.metrics.snapshot(),
    }))
}
