//! In-memory table of active holds, keyed by slot.
//!
//! Every operation is atomic per slot: the map is sharded, so operations on
//! different slots never wait on each other, and `insert_if_absent` /
//! `remove_if` run under the owning shard's lock.

use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::time::Instant;

use parking_core::types::id::{SlotId, SpaceId, UserId};

/// An ephemeral, exclusive, time-bounded hold on a slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reservation {
    /// The held slot. Unique key of the store.
    pub slot_id: SlotId,
    /// Space the slot belongs to, used for topic addressing.
    pub space_id: SpaceId,
    /// Holder.
    pub user_id: UserId,
    /// Holder's display name.
    pub user_name: String,
    /// Monotonic creation instant.
    pub created_at: Instant,
    /// Process-unique sequence number identifying this particular hold.
    ///
    /// Two holds on the same slot separated by a release never share a
    /// generation, even if their `created_at` instants coincide.
    pub generation: u64,
    /// Wall-clock creation time, for display.
    pub reserved_at: DateTime<Utc>,
    /// Duration until auto-release.
    pub ttl: Duration,
}

impl Reservation {
    /// Wall-clock instant the hold will expire at.
    pub fn expires_at(&self) -> DateTime<Utc> {
        chrono::Duration::from_std(self.ttl)
            .ok()
            .and_then(|ttl| self.reserved_at.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

/// Which hold a conditional removal is allowed to remove.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Holder {
    /// Whatever hold is present.
    Any,
    /// Only a hold owned by this user.
    User(UserId),
    /// Only the hold with this generation.
    Generation(u64),
}

impl Holder {
    fn matches(&self, reservation: &Reservation) -> bool {
        match self {
            Holder::Any => true,
            Holder::User(user_id) => reservation.user_id == *user_id,
            Holder::Generation(generation) => reservation.generation == *generation,
        }
    }
}

/// Slot → active hold.
#[derive(Debug, Default)]
pub struct ReservationStore {
    holds: DashMap<SlotId, Reservation>,
}

impl ReservationStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            holds: DashMap::new(),
        }
    }

    /// Inserts the hold unless the slot is already held.
    ///
    /// On conflict the current holder is returned unchanged.
    pub fn insert_if_absent(&self, reservation: Reservation) -> Result<(), Reservation> {
        match self.holds.entry(reservation.slot_id) {
            Entry::Occupied(existing) => Err(existing.get().clone()),
            Entry::Vacant(slot) => {
                slot.insert(reservation);
                Ok(())
            }
        }
    }

    /// Removes the hold on `slot_id` if it matches `holder`.
    pub fn remove_if(&self, slot_id: SlotId, holder: Holder) -> Option<Reservation> {
        self.holds
            .remove_if(&slot_id, |_, reservation| holder.matches(reservation))
            .map(|(_, reservation)| reservation)
    }

    /// Returns a copy of the hold on `slot_id`.
    pub fn get(&self, slot_id: SlotId) -> Option<Reservation> {
        self.holds.get(&slot_id).map(|entry| entry.value().clone())
    }

    /// Whether `slot_id` is currently held.
    pub fn contains(&self, slot_id: SlotId) -> bool {
        self.holds.contains_key(&slot_id)
    }

    /// Number of active holds.
    pub fn len(&self) -> usize {
        self.holds.len()
    }

    /// Whether no hold is active.
    pub fn is_empty(&self) -> bool {
        self.holds.is_empty()
    }

    /// Copies of every active hold, ordered by slot.
    pub fn snapshot(&self) -> Vec<Reservation> {
        let mut holds: Vec<Reservation> = self
            .holds
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        holds.sort_by_key(|r| r.slot_id);
        holds
    }

    /// Drops every hold, returning how many were discarded.
    pub fn clear(&self) -> usize {
        let count = self.holds.len();
        self.holds.clear();
        count
    }
}
