//! Pending Eviction Module
//!
//! A scheduled removal of one entry, plus the cancellation handle shared
//! between that removal and the entry it targets.

use std::cmp::Ordering as CmpOrdering;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

// == Eviction Handle ==
/// Shared cancellation flag linking an entry to its pending eviction.
///
/// Cloning yields another reference to the same flag.
#[derive(Debug, Clone, Default)]
pub struct EvictionHandle {
    cancelled: Arc<AtomicBool>,
}

impl EvictionHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Invalidates the eviction. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// True when both handles refer to the same flag.
    pub fn same_as(&self, other: &EvictionHandle) -> bool {
        Arc::ptr_eq(&self.cancelled, &other.cancelled)
    }
}

// == Pending Eviction ==
/// A one-shot task that removes `key` at `expires_at`, unless invalidated.
///
/// Only the key is held, never the entry itself.
#[derive(Debug, Clone)]
pub struct PendingEviction {
    pub key: String,
    pub expires_at: Duration,
    /// Tie-breaker so evictions due at the same instant fire in schedule order
    pub seq: u64,
    pub handle: EvictionHandle,
}

impl PendingEviction {
    pub fn is_cancelled(&self) -> bool {
        self.handle.is_cancelled()
    }

    /// Returns true once `now` has reached the deadline.
    pub fn is_due(&self, now: Duration) -> bool {
        now >= self.expires_at
    }
}

impl PartialEq for PendingEviction {
    fn eq(&self, other: &Self) -> bool {
        self.expires_at == other.expires_at && self.seq == other.seq
    }
}

impl Eq for PendingEviction {}

impl PartialOrd for PendingEviction {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

impl Ord for PendingEviction {
    fn cmp(&self, other: &Self) -> CmpOrdering {
        self.expires_at
            .cmp(&other.expires_at)
            .then(self.seq.cmp(&other.seq))
    }
}
