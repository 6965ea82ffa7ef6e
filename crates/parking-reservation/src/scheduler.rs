//! Per-hold expiry timers.
//!
//! Each timer is a spawned task racing a sleep against a cancellation
//! token. Tokens are children of one root token, so stopping the scheduler
//! cancels every outstanding timer at once.
//!
//! Cancellation is best-effort: a timer whose sleep has already elapsed may
//! still run its callback after `cancel` returns. Callbacks must re-check
//! that the hold they target still exists.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use parking_core::types::id::SlotId;

/// Handle to one scheduled expiry.
#[derive(Debug, Clone)]
pub struct ExpiryHandle {
    /// Slot the timer releases.
    pub slot_id: SlotId,
    /// Generation of the hold the timer was scheduled for.
    pub generation: u64,
    token: CancellationToken,
}

impl ExpiryHandle {
    /// Requests that the callback not run.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Schedules and cancels hold expiry callbacks.
#[derive(Debug)]
pub struct ExpiryScheduler {
    /// Parent of every timer token.
    root: CancellationToken,
    /// Outstanding timer per slot.
    timers: Arc<DashMap<SlotId, ExpiryHandle>>,
}

impl ExpiryScheduler {
    /// Creates a scheduler with no timers.
    pub fn new() -> Self {
        Self {
            root: CancellationToken::new(),
            timers: Arc::new(DashMap::new()),
        }
    }

    /// Runs `on_expire` once `after` has elapsed unless cancelled first.
    ///
    /// Replaces (and cancels) any timer still registered for the slot, so a
    /// slot never has more than one outstanding timer. Must be called from
    /// within a Tokio runtime.
    pub fn schedule_release<F, Fut>(
        &self,
        slot_id: SlotId,
        generation: u64,
        after: Duration,
        on_expire: F,
    ) -> ExpiryHandle
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let token = self.root.child_token();
        let handle = ExpiryHandle {
            slot_id,
            generation,
            token: token.clone(),
        };

        if let Some(previous) = self.timers.insert(slot_id, handle.clone()) {
            previous.cancel();
        }

        let timers = Arc::clone(&self.timers);
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    timers.remove_if(&slot_id, |_, current| current.generation == generation);
                    debug!(slot_id = %slot_id, generation, "Expiry timer cancelled");
                }
                _ = tokio::time::sleep(after) => {
                    timers.remove_if(&slot_id, |_, current| current.generation == generation);
                    debug!(slot_id = %slot_id, generation, "Expiry timer fired");
                    on_expire().await;
                }
            }
        });

        handle
    }

    /// Cancels the timer scheduled for this hold, if it is still registered.
    ///
    /// Returns `false` when no matching timer was outstanding (already fired,
    /// already cancelled, or superseded). Safe to call in every case.
    pub fn cancel(&self, slot_id: SlotId, generation: u64) -> bool {
        match self
            .timers
            .remove_if(&slot_id, |_, current| current.generation == generation)
        {
            Some((_, handle)) => {
                handle.cancel();
                true
            }
            None => false,
        }
    }

    /// Number of timers that have neither fired nor been cancelled.
    pub fn pending(&self) -> usize {
        self.timers.len()
    }

    /// Cancels every outstanding timer. Timers scheduled afterwards are
    /// cancelled immediately.
    pub fn shutdown(&self) -> usize {
        self.root.cancel();
        let count = self.timers.len();
        self.timers.clear();
        count
    }

    /// Whether [`ExpiryScheduler::shutdown`] has been called.
    pub fn is_shut_down(&self) -> bool {
        self.root.is_cancelled()
    }
}

impl Default for ExpiryScheduler {
    fn default() -> Self {
        Self::new()
    }
}
