//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use std::time::Duration;

use crate::reaper::EvictionHandle;

// == Cache Entry ==
/// Represents a single cache entry with value and metadata.
///
/// Timestamps are readings of the store's clock.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// Insertion time
    pub created_at: Duration,
    /// Absolute expiration time, `created_at + ttl`
    pub expires_at: Duration,
    /// Shared with the pending eviction registered for this entry
    pub(crate) handle: EvictionHandle,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new cache entry.
    ///
    /// # Arguments
    /// * `value` - The value to store
    /// * `created_at` - Current clock reading
    /// * `expires_at` - Clock reading at which the entry stops being visible
    /// * `handle` - Cancellation handle of this entry's pending eviction
    pub fn new(
        value: V,
        created_at: Duration,
        expires_at: Duration,
        handle: EvictionHandle,
    ) -> Self {
        Self {
            value,
            created_at,
            expires_at,
            handle,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired at `now`.
    ///
    /// An entry is expired once `now >= expires_at`.
    pub fn is_expired(&self, now: Duration) -> bool {
        now >= self.expires_at
    }

    // == Time To Live ==
    /// Remaining lifetime at `now`, zero once expired.
    pub fn ttl_remaining(&self, now: Duration) -> Duration {
        self.expires_at.saturating_sub(now)
    }
}
