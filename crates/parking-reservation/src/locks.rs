//! Async mutexes keyed by slot or space.
//!
//! An entry exists only while its lock is held or awaited. Releasing the
//! last guard removes the entry, so keys that were only ever rejected do
//! not accumulate.

use std::hash::Hash;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// A sharded map of per-key async locks.
#[derive(Debug)]
pub struct KeyedLocks<K: Eq + Hash> {
    locks: DashMap<K, Arc<Mutex<()>>>,
}

impl<K: Eq + Hash + Copy> KeyedLocks<K> {
    /// Creates an empty lock table.
    pub fn new() -> Self {
        Self {
            locks: DashMap::new(),
        }
    }

    /// Waits for exclusive access to `key`.
    pub async fn lock(&self, key: K) -> KeyedGuard<'_, K> {
        // Cloned under the shard lock, so a concurrent prune sees the extra
        // reference and keeps the entry.
        let lock = Arc::clone(self.locks.entry(key).or_default().value());
        let guard = lock.lock_owned().await;
        KeyedGuard {
            locks: &self.locks,
            key,
            guard: Some(guard),
        }
    }

    /// Number of keys currently locked or awaited.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    /// Whether no key is locked or awaited.
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }

    /// Forgets every entry. Guards still alive keep working.
    pub fn clear(&self) {
        self.locks.clear();
    }
}

impl<K: Eq + Hash + Copy> Default for KeyedLocks<K> {
    fn default() -> Self {
        Self::new()
    }
}

/// Exclusive access to one key. Dropping it releases the lock and prunes
/// the entry when nobody else is waiting.
#[derive(Debug)]
pub struct KeyedGuard<'a, K: Eq + Hash> {
    locks: &'a DashMap<K, Arc<Mutex<()>>>,
    key: K,
    guard: Option<OwnedMutexGuard<()>>,
}

impl<K: Eq + Hash> Drop for KeyedGuard<'_, K> {
    fn drop(&mut self) {
        drop(self.guard.take());
        self.locks
            .remove_if(&self.key, |_, lock| Arc::strong_count(lock) == 1);
    }
}
