//! Application builder: wires collaborators, coordinator, realtime engine,
//! and router into a running server.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use tracing::info;

use parking_core::config::AppConfig;
use parking_core::error::AppError;
use parking_core::result::AppResult;
use parking_core::traits::{BookingStore, Broadcaster, SlotDirectory};
use parking_realtime::server::RealtimeEngine;
use parking_reservation::booking::MemoryBookingStore;
use parking_reservation::coordinator::ReservationCoordinator;
use parking_reservation::directory::MemorySlotDirectory;

use crate::router::build_router;
use crate::state::AppState;

/// Builds a started application state over the in-memory directory seeded
/// from `config.inventory` and an in-memory booking store.
pub fn build_state(config: AppConfig) -> AppResult<AppState> {
    let directory = Arc::new(MemorySlotDirectory::from_inventory(&config.inventory));
    let bookings = Arc::new(MemoryBookingStore::new());
    build_state_with(config, directory, bookings)
}

/// Builds a started application state over the given collaborators.
pub fn build_state_with(
    config: AppConfig,
    directory: Arc<dyn SlotDirectory>,
    bookings: Arc<dyn BookingStore>,
) -> AppResult<AppState> {
    let realtime = Arc::new(RealtimeEngine::new(&config.realtime));
    let broadcaster: Arc<dyn Broadcaster> = realtime.broadcaster.clone();

    let coordinator =
        ReservationCoordinator::new(&config.reservation, directory, bookings, broadcaster);
    coordinator.start()?;

    Ok(AppState {
        config: Arc::new(config),
        coordinator,
        realtime,
        started_at: Instant::now(),
    })
}

/// Runs the parking server until `shutdown` resolves, then stops the
/// coordinator and the realtime engine.
pub async fn run_server<F>(config: AppConfig, shutdown: F) -> AppResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = config.server.bind_address();
    let state = build_state(config)?;
    let app = build_router(state.clone());

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

    info!(address = %addr, "Parking server listening");

    let coordinator = state.coordinator.clone();
    let realtime = Arc::clone(&state.realtime);
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.await;
            info!("Shutdown signal received, starting graceful shutdown");
            coordinator.stop();
            if let Err(e) = realtime.shutdown().await {
                tracing::error!(error = %e, "Realtime engine shutdown failed");
            }
        })
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    info!("Parking server shut down gracefully");
    Ok(())
}
