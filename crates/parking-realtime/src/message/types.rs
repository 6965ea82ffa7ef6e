//! Inbound and outbound WebSocket message type definitions.

use serde::{Deserialize, Serialize};

use parking_core::events::{Notification, NotificationEvent};
use parking_core::types::id::{SlotId, SpaceId, UserId};
use parking_core::types::topic::Topic;

/// Messages sent by the client to the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum InboundMessage {
    /// Place a temporary hold on a slot.
    Reserve {
        /// Slot to hold.
        slot_id: SlotId,
        /// Space the slot belongs to.
        space_id: SpaceId,
        /// Requesting user.
        user_id: UserId,
        /// Requesting user's display name.
        user_name: String,
        /// Hold duration in minutes; the server default when absent.
        #[serde(default)]
        reservation_timeout_minutes: Option<u64>,
    },
    /// Release a hold.
    Release {
        /// Slot to release.
        slot_id: SlotId,
        /// Space the slot belongs to.
        space_id: SpaceId,
        /// When present, only this user's hold is released.
        #[serde(default)]
        user_id: Option<UserId>,
    },
    /// Subscribe to a topic.
    Subscribe {
        /// Topic string, e.g. `space/10`.
        topic: String,
    },
    /// Unsubscribe from a topic.
    Unsubscribe {
        /// Topic string.
        topic: String,
    },
    /// Keepalive.
    Ping,
}

/// Which request an [`OutboundMessage::Ack`] acknowledges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    /// A reserve request.
    Reserve,
    /// A release request.
    Release,
}

/// Messages sent by the server to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum OutboundMessage {
    /// Subscription confirmed.
    Subscribed {
        /// Topic subscribed to.
        topic: Topic,
    },
    /// Unsubscription confirmed.
    Unsubscribed {
        /// Topic left.
        topic: Topic,
    },
    /// A notification delivered on a subscribed topic.
    Event {
        /// Topic the notification was published to.
        topic: Topic,
        /// The notification itself.
        payload: Notification,
    },
    /// A reserve or release request succeeded.
    Ack {
        /// Request acknowledged.
        request: RequestKind,
        /// Slot the request targeted.
        slot_id: SlotId,
        /// Hold expiry in epoch milliseconds, for reserve acks.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        expires_at: Option<i64>,
    },
    /// A reserve or release request was refused.
    Rejected {
        /// Error code, e.g. `ALREADY_RESERVED`.
        code: String,
        /// Error description.
        message: String,
        /// `NOT_AVAILABLE` event for rejected reservations. Only the
        /// requesting connection ever sees it.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        event: Option<NotificationEvent>,
    },
    /// Malformed or unsupported message.
    Error {
        /// Error code.
        code: String,
        /// Error description.
        message: String,
    },
    /// Keepalive reply.
    Pong {
        /// Server timestamp, epoch milliseconds.
        timestamp: i64,
    },
}
