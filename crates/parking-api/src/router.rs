//! Route definitions for the parking HTTP API.
//!
//! REST routes are mounted under `/api`; the WebSocket endpoint lives at
//! `/ws`. Every handler receives `AppState` through Axum's `State` extractor.

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware;
use crate::middleware::cors::build_cors_layer;
use crate::state::AppState;

/// Build the complete Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .merge(slot_routes())
        .merge(space_routes())
        .merge(health_routes());

    let ws_routes = Router::new().route("/ws", get(handlers::ws::ws_upgrade));

    let cors = build_cors_layer(&state.config.server.cors);

    Router::new()
        .nest("/api", api_routes)
        .merge(ws_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(axum_middleware::from_fn(middleware::logging::request_logging))
        .with_state(state)
}

/// Slot reservation lifecycle
fn slot_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/slots/{slot_id}/reserve",
            post(handlers::reservation::reserve_slot),
        )
        .route(
            "/slots/{slot_id}/release",
            post(handlers::reservation::release_slot),
        )
        .route(
            "/slots/{slot_id}/book",
            post(handlers::reservation::book_slot),
        )
        .route(
            "/slots/{slot_id}/reservation",
            get(handlers::reservation::get_reservation),
        )
}

/// Space availability
fn space_routes() -> Router<AppState> {
    Router::new().route(
        "/spaces/{space_id}/availability",
        get(handlers::space::space_availability),
    )
}

/// Health check (no auth required)
fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health::health))
}
