//! The [`Broadcaster`] backed by in-memory pub/sub.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use futures::stream;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, warn};

use parking_core::error::AppError;
use parking_core::events::Notification;
use parking_core::result::AppResult;
use parking_core::traits::{Broadcaster, NotificationStream};
use parking_core::types::topic::Topic;

use crate::bridge::MemoryPubSub;
use crate::metrics::EngineMetrics;

/// Publishes notifications through [`MemoryPubSub`] and counts them.
#[derive(Debug)]
pub struct RealtimeBroadcaster {
    pubsub: Arc<MemoryPubSub>,
    metrics: Arc<EngineMetrics>,
    closed: AtomicBool,
}

impl RealtimeBroadcaster {
    /// Creates a broadcaster over an existing pub/sub.
    pub fn new(pubsub: Arc<MemoryPubSub>, metrics: Arc<EngineMetrics>) -> Self {
        Self {
            pubsub,
            metrics,
            closed: AtomicBool::new(false),
        }
    }

    /// Stops accepting publishes and ends every subscriber stream.
    pub async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        let topics = self.pubsub.close_all().await;
        debug!(topics, "Broadcaster closed");
    }

    /// Whether [`RealtimeBroadcaster::close`] has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Broadcaster for RealtimeBroadcaster {
    async fn publish(&self, topic: &Topic, notification: Notification) -> AppResult<()> {
        if self.is_closed() {
            self.metrics.record_publish_failure();
            return Err(AppError::broadcast_failed(format!(
                "Broadcaster is closed, dropped notification for '{topic}'"
            )));
        }

        let receivers = self.pubsub.publish(topic, notification).await;
        self.metrics.record_publish(receivers);
        debug!(topic = %topic, receivers, "Notification published");
        Ok(())
    }

    async fn subscribe(&self, topic: &Topic) -> AppResult<NotificationStream> {
        if self.is_closed() {
            return Err(AppError::service_unavailable("Broadcaster is closed"));
        }

        let rx = self.pubsub.subscribe(topic).await;
        self.metrics.inc_subscriptions();
        Ok(receiver_stream(*topic, rx, Arc::clone(&self.metrics)))
    }
}

/// Adapts a broadcast receiver into a stream that skips over lag.
fn receiver_stream(
    topic: Topic,
    rx: broadcast::Receiver<Notification>,
    metrics: Arc<EngineMetrics>,
) -> NotificationStream {
    Box::pin(stream::unfold(rx, move |mut rx| {
        let metrics = Arc::clone(&metrics);
        async move {
            loop {
                match rx.recv().await {
                    Ok(notification) => return Some((notification, rx)),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(topic = %topic, skipped, "Subscriber lagged, skipping missed notifications");
                        metrics.record_lagged(skipped);
                    }
                    Err(RecvError::Closed) => return None,
                }
            }
        }
    }))
}
