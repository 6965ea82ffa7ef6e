//! Real-time notification configuration.

use serde::{Deserialize, Serialize};

/// Pub/sub and WebSocket settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Buffer size of each topic's broadcast channel.
    #[serde(default = "default_channel_buffer")]
    pub channel_buffer_size: usize,
    /// Maximum topic subscriptions per WebSocket connection.
    #[serde(default = "default_max_subscriptions")]
    pub max_subscriptions_per_connection: usize,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            channel_buffer_size: default_channel_buffer(),
            max_subscriptions_per_connection: default_max_subscriptions(),
        }
    }
}

fn default_channel_buffer() -> usize {
    256
}

fn default_max_subscriptions() -> usize {
    50
}
