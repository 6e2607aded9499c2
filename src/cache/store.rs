//! Cache Store Module
//!
//! Main cache engine: sharded HashMap storage with TTL expiration checked on
//! read and pending evictions registered for the reaper on write.

use std::collections::HashMap;
use std::fmt;
use std::hash::BuildHasher;
use std::sync::Arc;
use std::time::Duration;

use ahash::RandomState;
use parking_lot::RwLock;
use tracing::debug;

use crate::cache::stats::StatsRecorder;
use crate::cache::{CacheEntry, CacheStats};
use crate::clock::Clock;
use crate::error::{CacheError, Result};
use crate::reaper::{EvictionHandle, EvictionQueue, PendingEviction};

type Shard<V> = RwLock<HashMap<String, CacheEntry<V>>>;

// == Cache Store ==
/// Thread-safe cache storage with TTL support.
///
/// Each key lives in exactly one shard, and every operation on a key holds
/// that shard's lock, so operations on the same key are linearized while
/// operations on keys in different shards proceed independently.
///
/// Lock order is shard, then eviction queue.
pub struct CacheStore<V> {
    /// Key-value storage split across independently locked maps
    shards: Box<[Shard<V>]>,
    /// Picks the shard for a key
    hasher: RandomState,
    /// Pending evictions consumed by the reaper
    evictions: EvictionQueue,
    /// Source of `now` for every TTL computation
    clock: Arc<dyn Clock>,
    /// Activity counters
    stats: StatsRecorder,
}

impl<V> CacheStore<V> {
    // == Constructor ==
    /// Creates a new CacheStore.
    ///
    /// # Arguments
    /// * `shard_count` - Number of shards (values below 1 are treated as 1)
    /// * `clock` - Time source for expiration
    pub fn new(shard_count: usize, clock: Arc<dyn Clock>) -> Self {
        let shards = (0..shard_count.max(1))
            .map(|_| RwLock::new(HashMap::new()))
            .collect();

        Self {
            shards,
            hasher: RandomState::new(),
            evictions: EvictionQueue::new(),
            clock,
            stats: StatsRecorder::default(),
        }
    }

    fn shard(&self, key: &str) -> &Shard<V> {
        let index = BuildHasher::hash_one(&self.hasher, key) % self.shards.len() as u64;
        &self.shards[index as usize]
    }

    // == Set ==
    /// Stores a key-value pair that expires `ttl` from now.
    ///
    /// If the key already exists, the entry is replaced and its pending
    /// eviction cancelled before the new one is registered.
    ///
    /// # Errors
    /// `InvalidArgument` if `ttl` is zero or `now + ttl` overflows. The
    /// store is left unchanged.
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Duration) -> Result<()> {
        let key = key.into();

        if ttl.is_zero() {
            return Err(CacheError::InvalidArgument(format!(
                "TTL for key '{}' must be greater than zero",
                key
            )));
        }

        let now = self.clock.now();
        let expires_at = now.checked_add(ttl).ok_or_else(|| {
            CacheError::InvalidArgument(format!("TTL of {:?} for key '{}' is too large", ttl, key))
        })?;

        let handle = EvictionHandle::new();
        let mut entries = self.shard(&key).write();

        let entry = CacheEntry::new(value, now, expires_at, handle.clone());
        if let Some(previous) = entries.insert(key.clone(), entry) {
            previous.handle.cancel();
            self.evictions.note_cancelled();
            self.stats.record_overwrite();
        }

        // Still under the shard lock: the old eviction is already cancelled
        self.evictions.schedule(key, expires_at, handle);

        Ok(())
    }

    // == Get ==
    /// Retrieves a value by key.
    ///
    /// Returns `None` if the key is absent or expired. An expired entry is
    /// removed on the spot.
    pub fn get(&self, key: &str) -> Option<V>
    where
        V: Clone,
    {
        let now = self.clock.now();
        let shard = self.shard(key);

        {
            let entries = shard.read();
            match entries.get(key) {
                None => {
                    self.stats.record_miss();
                    return None;
                }
                Some(entry) if !entry.is_expired(now) => {
                    self.stats.record_hit();
                    return Some(entry.value.clone());
                }
                Some(_) => {}
            }
        }

        // Re-check under the write lock: the entry may have been replaced or
        // removed since the read lock was released
        let mut entries = shard.write();
        match entries.get(key).map(|entry| entry.is_expired(now)) {
            Some(true) => {
                if let Some(expired) = entries.remove(key) {
                    expired.handle.cancel();
                    self.evictions.note_cancelled();
                }
                self.stats.record_lazy_expiration();
                self.stats.record_miss();
                debug!(key, "Lazily evicted expired entry");
                None
            }
            Some(false) => {
                self.stats.record_hit();
                entries.get(key).map(|entry| entry.value.clone())
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    // == TTL ==
    /// Remaining lifetime of a live entry, or `None` if absent or expired.
    ///
    /// Read-only: never removes anything.
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        let now = self.clock.now();
        let entries = self.shard(key).read();
        entries
            .get(key)
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| entry.ttl_remaining(now))
    }

    // == Clear ==
    /// Removes every entry and invalidates every outstanding eviction.
    ///
    /// Returns the number of entries removed.
    pub fn clear(&self) -> usize {
        let mut removed = 0;

        for shard in self.shards.iter() {
            let mut entries = shard.write();
            removed += entries.len();
            for (_, entry) in entries.drain() {
                entry.handle.cancel();
            }
        }

        // Evictions registered by sets racing with this clear are not
        // cancelled and survive the purge
        let purged = self.evictions.purge_cancelled();
        self.stats.record_clear();
        debug!(removed, purged, "Cache cleared");

        removed
    }

    // == Evict If Current ==
    /// Fires a pending eviction.
    ///
    /// Removes the entry only if the eviction has not been cancelled and the
    /// stored entry is the very one it was scheduled for (same handle, same
    /// `expires_at`). Anything else is a no-op. Returns whether an entry
    /// was removed.
    pub fn evict_if_current(&self, pending: &PendingEviction) -> bool {
        let mut entries = self.shard(&pending.key).write();

        let current = entries.get(&pending.key).is_some_and(|entry| {
            !pending.is_cancelled()
                && entry.handle.same_as(&pending.handle)
                && entry.expires_at == pending.expires_at
        });

        if current {
            entries.remove(&pending.key);
            self.stats.record_reaped_expiration();
            debug!(key = %pending.key, "Reaped expired entry");
        }

        current
    }

    // == Accessors ==
    /// Current reading of the store's clock.
    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    /// Queue of pending evictions the reaper consumes.
    pub(crate) fn evictions(&self) -> &EvictionQueue {
        &self.evictions
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot(self.len())
    }

    // == Length ==
    /// Returns the number of stored entries, including expired ones not yet
    /// removed.
    pub fn len(&self) -> usize {
        self.shards.iter().map(|shard| shard.read().len()).sum()
    }

    // == Is Empty ==
    /// Returns true if no entries are stored, expired or not.
    pub fn is_empty(&self) -> bool {
        self.shards.iter().all(|shard| shard.read().is_empty())
    }
}

impl<V> fmt::Debug for CacheStore<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheStore")
            .field("shards", &self.shards.len())
            .field("entries", &self.len())
            .field("pending_evictions", &self.evictions.len())
            .finish()
    }
}
