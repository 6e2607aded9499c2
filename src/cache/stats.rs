//! Cache Statistics Module
//!
//! Tracks cache activity: hits, misses, and the two expiration paths.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// == Cache Stats ==
/// Point-in-time snapshot of cache activity.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Number of successful cache retrievals
    pub hits: u64,
    /// Number of retrievals that found nothing live (absent or expired)
    pub misses: u64,
    /// Entries removed by a read that found them expired
    pub lazy_expirations: u64,
    /// Entries removed by the reaper
    pub reaped_expirations: u64,
    /// `set` calls that replaced an existing entry
    pub overwrites: u64,
    /// Number of `clear` calls
    pub clears: u64,
    /// Current number of entries in the cache
    pub total_entries: usize,
}

impl CacheStats {
    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// Total entries removed through either expiration path.
    pub fn expirations(&self) -> u64 {
        self.lazy_expirations + self.reaped_expirations
    }
}

// == Stats Recorder ==
/// Lock-free counters updated by the store.
#[derive(Debug, Default)]
pub(crate) struct StatsRecorder {
    hits: AtomicU64,
    misses: AtomicU64,
    lazy_expirations: AtomicU64,
    reaped_expirations: AtomicU64,
    overwrites: AtomicU64,
    clears: AtomicU64,
}

impl StatsRecorder {
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_lazy_expiration(&self) {
        self.lazy_expirations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_reaped_expiration(&self) {
        self.reaped_expirations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_overwrite(&self) {
        self.overwrites.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_clear(&self) {
        self.clears.fetch_add(1, Ordering::Relaxed);
    }

    // == Snapshot ==
    /// Copies the counters into a `CacheStats`.
    pub fn snapshot(&self, total_entries: usize) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            lazy_expirations: self.lazy_expirations.load(Ordering::Relaxed),
            reaped_expirations: self.reaped_expirations.load(Ordering::Relaxed),
            overwrites: self.overwrites.load(Ordering::Relaxed),
            clears: self.clears.load(Ordering::Relaxed),
            total_entries,
        }
    }
}
