//! In-memory pub/sub for single-node deployments.

use std::collections::HashMap;

use tokio::sync::RwLock;
use tokio::sync::broadcast;

use parking_core::events::Notification;
use parking_core::types::topic::Topic;

/// In-memory pub/sub implementation.
#[derive(Debug)]
pub struct MemoryPubSub {
    /// Topic → broadcast sender
    topics: RwLock<HashMap<Topic, broadcast::Sender<Notification>>>,
    /// Buffer size for topic channels
    buffer_size: usize,
}

impl MemoryPubSub {
    /// Create a new in-memory pub/sub
    pub fn new(buffer_size: usize) -> Self {
        Self {
            topics: RwLock::new(HashMap::new()),
            buffer_size: buffer_size.max(1),
        }
    }

    /// Publish a notification to a topic, returning how many subscribers
    /// received it. A topic nobody has subscribed to yields zero.
    pub async fn publish(&self, topic: &Topic, notification: Notification) -> usize {
        let topics = self.topics.read().await;
        match topics.get(topic) {
            Some(tx) => tx.send(notification).unwrap_or(0),
            None => 0,
        }
    }

    /// Subscribe to a topic, returns a receiver
    pub async fn subscribe(&self, topic: &Topic) -> broadcast::Receiver<Notification> {
        let mut topics = self.topics.write().await;
        let tx = topics
            .entry(*topic)
            .or_insert_with(|| broadcast::channel(self.buffer_size).0);
        tx.subscribe()
    }

    /// Number of live receivers on a topic.
    pub async fn subscriber_count(&self, topic: &Topic) -> usize {
        self.topics
            .read()
            .await
            .get(topic)
            .map_or(0, broadcast::Sender::receiver_count)
    }

    /// Number of topics that have ever been subscribed to.
    pub async fn topic_count(&self) -> usize {
        self.topics.read().await.len()
    }

    /// Drops every topic channel. Outstanding receivers observe the channel
    /// as closed.
    pub async fn close_all(&self) -> usize {
        let mut topics = self.topics.write().await;
        let count = topics.len();
        topics.clear();
        count
    }
}
