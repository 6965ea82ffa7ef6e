//! Individual WebSocket connection handle.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tracing::{debug, warn};
use uuid::Uuid;

use parking_core::error::AppError;
use parking_core::result::AppResult;
use parking_core::traits::NotificationStream;
use parking_core::types::topic::Topic;

use crate::message::types::OutboundMessage;
use crate::metrics::EngineMetrics;

/// Unique connection identifier
pub type ConnectionId = Uuid;

/// A handle to a single WebSocket connection.
///
/// Holds the sender channel for pushing messages to the client and one
/// forwarding task per subscribed topic.
#[derive(Debug)]
pub struct ConnectionHandle {
    /// Unique connection ID
    pub id: ConnectionId,
    /// Sender for outbound messages
    sender: mpsc::Sender<OutboundMessage>,
    /// Topic → forwarding task
    subscriptions: Mutex<HashMap<Topic, AbortHandle>>,
    /// Subscription cap
    max_subscriptions: usize,
    metrics: Arc<EngineMetrics>,
    /// Whether the connection is still alive
    alive: AtomicBool,
}

impl ConnectionHandle {
    /// Create a new connection handle and the receiver its socket writer
    /// drains.
    pub fn new(
        buffer: usize,
        max_subscriptions: usize,
        metrics: Arc<EngineMetrics>,
    ) -> (Arc<Self>, mpsc::Receiver<OutboundMessage>) {
        let (sender, receiver) = mpsc::channel(buffer.max(1));
        let handle = Arc::new(Self {
            id: Uuid::new_v4(),
            sender,
            subscriptions: Mutex::new(HashMap::new()),
            max_subscriptions,
            metrics,
            alive: AtomicBool::new(true),
        });
        (handle, receiver)
    }

    /// Send an outbound message to this connection
    pub fn send(&self, msg: OutboundMessage) -> bool {
        if !self.is_alive() {
            return false;
        }
        match self.sender.try_send(msg) {
            Ok(()) => {
                self.metrics.inc_sent();
                true
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(conn_id = %self.id, "Connection send buffer full, dropping message");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.mark_dead();
                false
            }
        }
    }

    /// Whether the connection may take another subscription to `topic`.
    pub fn can_subscribe(&self, topic: &Topic) -> AppResult<()> {
        let subscriptions = self.lock_subscriptions();
        if subscriptions.contains_key(topic) || subscriptions.len() < self.max_subscriptions {
            Ok(())
        } else {
            Err(AppError::validation(format!(
                "Subscription limit of {} reached",
                self.max_subscriptions
            )))
        }
    }

    /// Forwards `stream` to the client as `event` messages until the topic
    /// is detached or the connection goes away.
    ///
    /// Re-attaching a topic replaces the previous forwarder.
    pub fn attach(&self, topic: Topic, mut stream: NotificationStream) -> AppResult<()> {
        self.can_subscribe(&topic)?;

        let sender = self.sender.clone();
        let metrics = Arc::clone(&self.metrics);
        let conn_id = self.id;
        let task = tokio::spawn(async move {
            while let Some(payload) = stream.next().await {
                if sender.send(OutboundMessage::Event { topic, payload }).await.is_err() {
                    break;
                }
                metrics.inc_sent();
            }
            debug!(conn_id = %conn_id, topic = %topic, "Topic forwarder finished");
        });

        if let Some(previous) = self
            .lock_subscriptions()
            .insert(topic, task.abort_handle())
        {
            previous.abort();
        }
        Ok(())
    }

    /// Stops forwarding `topic`. Returns `false` if it was not subscribed.
    pub fn detach(&self, topic: &Topic) -> bool {
        match self.lock_subscriptions().remove(topic) {
            Some(task) => {
                task.abort();
                true
            }
            None => false,
        }
    }

    /// Stops every forwarder, returning how many were running.
    pub fn detach_all(&self) -> usize {
        let mut subscriptions = self.lock_subscriptions();
        let count = subscriptions.len();
        for (_, task) in subscriptions.drain() {
            task.abort();
        }
        count
    }

    /// Topics currently forwarded.
    pub fn topics(&self) -> Vec<Topic> {
        self.lock_subscriptions().keys().copied().collect()
    }

    /// Check if connection is alive
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    /// Mark connection as dead
    pub fn mark_dead(&self) {
        self.alive.store(false, Ordering::SeqCst);
    }

    fn lock_subscriptions(&self) -> MutexGuard<'_, HashMap<Topic, AbortHandle>> {
        self.subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for ConnectionHandle {
    fn drop(&mut self) {
        self.detach_all();
    }
}
