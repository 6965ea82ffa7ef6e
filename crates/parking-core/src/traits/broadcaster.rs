//! Broadcaster trait: the pub/sub transport carrying notifications.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use crate::events::Notification;
use crate::result::AppResult;
use crate::types::topic::Topic;

/// A lazy, unbounded stream of notifications for one topic.
pub type NotificationStream = Pin<Box<dyn Stream<Item = Notification> + Send + 'static>>;

/// Publishes notifications to topics and hands out subscriber streams.
#[async_trait]
pub trait Broadcaster: Send + Sync + 'static {
    /// Publishes one notification to one topic.
    ///
    /// A failure here is reported to the caller for logging only; it must
    /// never undo the transition that produced the notification.
    async fn publish(&self, topic: &Topic, notification: Notification) -> AppResult<()>;

    /// Subscribes to a topic. Only notifications published after this call
    /// returns are delivered.
    async fn subscribe(&self, topic: &Topic) -> AppResult<NotificationStream>;
}
