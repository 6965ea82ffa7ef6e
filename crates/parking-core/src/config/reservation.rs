//! Reservation hold configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::result::AppResult;

/// Temporary hold settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationConfig {
    /// TTL applied when a request does not name one.
    #[serde(default = "default_ttl_minutes")]
    pub default_ttl_minutes: u64,
    /// Upper bound accepted for a per-request TTL.
    #[serde(default = "default_max_ttl_minutes")]
    pub max_ttl_minutes: u64,
}

impl Default for ReservationConfig {
    fn default() -> Self {
        Self {
            default_ttl_minutes: default_ttl_minutes(),
            max_ttl_minutes: default_max_ttl_minutes(),
        }
    }
}

impl ReservationConfig {
    /// The default hold duration.
    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_minutes * 60)
    }

    /// Converts a requested timeout in minutes into a hold duration.
    ///
    /// `None` falls back to the default; values outside
    /// `1..=max_ttl_minutes` are rejected.
    pub fn ttl_from_minutes(&self, minutes: Option<u64>) -> AppResult<Duration> {
        match minutes {
            None => Ok(self.default_ttl()),
            Some(m) if (1..=self.max_ttl_minutes).contains(&m) => {
                Ok(Duration::from_secs(m * 60))
            }
            Some(m) => Err(AppError::validation(format!(
                "reservationTimeoutMinutes must be between 1 and {}, got {m}",
                self.max_ttl_minutes
            ))),
        }
    }
}

fn default_ttl_minutes() -> u64 {
    5
}

fn default_max_ttl_minutes() -> u64 {
    60
}
