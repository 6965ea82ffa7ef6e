//! Top-level real-time engine that ties together all subsystems.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tracing::info;

use parking_core::config::RealtimeConfig;
use parking_core::result::AppResult;

use crate::bridge::MemoryPubSub;
use crate::broadcaster::RealtimeBroadcaster;
use crate::connection::handle::ConnectionHandle;
use crate::message::types::OutboundMessage;
use crate::metrics::EngineMetrics;

/// Central real-time engine: pub/sub, broadcaster, and connection lifecycle.
#[derive(Clone)]
pub struct RealtimeEngine {
    /// Topic pub/sub.
    pub pubsub: Arc<MemoryPubSub>,
    /// Broadcaster handed to the reservation coordinator.
    pub broadcaster: Arc<RealtimeBroadcaster>,
    /// Metrics collector.
    pub metrics: Arc<EngineMetrics>,
    config: RealtimeConfig,
    /// Shutdown signal sender.
    shutdown_tx: broadcast::Sender<()>,
}

impl std::fmt::Debug for RealtimeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeEngine").finish()
    }
}

impl RealtimeEngine {
    /// Creates a new real-time engine.
    pub fn new(config: &RealtimeConfig) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        let metrics = Arc::new(EngineMetrics::new());
        let pubsub = Arc::new(MemoryPubSub::new(config.channel_buffer_size));
        let broadcaster = Arc::new(RealtimeBroadcaster::new(
            Arc::clone(&pubsub),
            Arc::clone(&metrics),
        ));

        info!(
            channel_buffer_size = config.channel_buffer_size,
            "Real-time engine initialized"
        );

        Self {
            pubsub,
            broadcaster,
            metrics,
            config: config.clone(),
            shutdown_tx,
        }
    }

    /// Registers a new WebSocket connection.
    pub fn open_connection(&self) -> (Arc<ConnectionHandle>, mpsc::Receiver<OutboundMessage>) {
        self.metrics.connection_opened();
        ConnectionHandle::new(
            self.config.channel_buffer_size,
            self.config.max_subscriptions_per_connection,
            Arc::clone(&self.metrics),
        )
    }

    /// Tears down a connection's subscriptions.
    pub fn close_connection(&self, handle: &ConnectionHandle) {
        handle.mark_dead();
        handle.detach_all();
        self.metrics.connection_closed();
    }

    /// Returns a shutdown receiver for graceful shutdown coordination.
    pub fn shutdown_receiver(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// Initiates a graceful shutdown of the real-time engine.
    pub async fn shutdown(&self) -> AppResult<()> {
        info!("Shutting down real-time engine");

        // Signal connection loops to stop
        let _ = self.shutdown_tx.send(());

        self.broadcaster.close().await;

        info!("Real-time engine shut down");
        Ok(())
    }
}
