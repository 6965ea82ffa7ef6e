//! Realtime engine metrics.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Engine-level metrics counters.
#[derive(Debug)]
pub struct EngineMetrics {
    /// Total notifications published
    pub notifications_published: AtomicU64,
    /// Total subscriber deliveries (one publish may reach many)
    pub notifications_delivered: AtomicU64,
    /// Total publishes that failed
    pub publish_failures: AtomicU64,
    /// Total notifications skipped by lagging subscribers
    pub notifications_lagged: AtomicU64,
    /// Total connections established
    pub connections_total: AtomicU64,
    /// Connections currently open
    pub connections_active: AtomicU64,
    /// Total subscribe operations
    pub subscriptions_total: AtomicU64,
    /// Total inbound WebSocket messages
    pub messages_received: AtomicU64,
    /// Total outbound WebSocket messages
    pub messages_sent: AtomicU64,
}

impl EngineMetrics {
    /// Create new zeroed metrics
    pub fn new() -> Self {
        Self {
            notifications_published: AtomicU64::new(0),
            notifications_delivered: AtomicU64::new(0),
            publish_failures: AtomicU64::new(0),
            notifications_lagged: AtomicU64::new(0),
            connections_total: AtomicU64::new(0),
            connections_active: AtomicU64::new(0),
            subscriptions_total: AtomicU64::new(0),
            messages_received: AtomicU64::new(0),
            messages_sent: AtomicU64::new(0),
        }
    }

    /// Record a publish that reached `receivers` subscribers
    pub fn record_publish(&self, receivers: usize) {
        self.notifications_published.fetch_add(1, Ordering::Relaxed);
        self.notifications_delivered
            .fetch_add(receivers as u64, Ordering::Relaxed);
    }

    /// Record a failed publish
    pub fn record_publish_failure(&self) {
        self.publish_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record notifications a subscriber skipped
    pub fn record_lagged(&self, skipped: u64) {
        self.notifications_lagged
            .fetch_add(skipped, Ordering::Relaxed);
    }

    /// Record a connection opening
    pub fn connection_opened(&self) {
        self.connections_total.fetch_add(1, Ordering::Relaxed);
        self.connections_active.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a connection closing
    pub fn connection_closed(&self) {
        let _ = self
            .connections_active
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1));
    }

    /// Increment the subscribe counter
    pub fn inc_subscriptions(&self) {
        self.subscriptions_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment the inbound message counter
    pub fn inc_received(&self) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment the outbound message counter
    pub fn inc_sent(&self) {
        self.messages_sent.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            notifications_published: self.notifications_published.load(Ordering::Relaxed),
            notifications_delivered: self.notifications_delivered.load(Ordering::Relaxed),
            publish_failures: self.publish_failures.load(Ordering::Relaxed),
            notifications_lagged: self.notifications_lagged.load(Ordering::Relaxed),
            connections_total: self.connections_total.load(Ordering::Relaxed),
            connections_active: self.connections_active.load(Ordering::Relaxed),
            subscriptions_total: self.subscriptions_total.load(Ordering::Relaxed),
            messages_received: self.messages_received.load(Ordering::Relaxed),
            messages_sent: self.messages_sent.load(Ordering::Relaxed),
        }
    }
}

impl Default for EngineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Serializable metrics snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    /// Total notifications published
    pub notifications_published: u64,
    /// Total subscriber deliveries
    pub notifications_delivered: u64,
    /// Total failed publishes
    pub publish_failures: u64,
    /// Total notifications skipped by lagging subscribers
    pub notifications_lagged: u64,
    /// Total connections ever established
    pub connections_total: u64,
    /// Connections currently open
    pub connections_active: u64,
    /// Total subscribe operations
    pub subscriptions_total: u64,
    /// Total inbound messages
    pub messages_received: u64,
    /// Total outbound messages
    pub messages_sent: u64,
}
