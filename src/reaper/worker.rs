//! Reaper Worker
//!
//! Fires due pending evictions against the store.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::cache::CacheStore;

// == Reaper ==
/// Removes expired entries from a [`CacheStore`] without waiting for a read.
///
/// Firing is idempotent: an eviction whose entry is gone, replaced, or
/// cleared does nothing.
pub struct Reaper<V> {
    store: Arc<CacheStore<V>>,
}

impl<V> Clone for Reaper<V> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<V> Reaper<V> {
    pub fn new(store: Arc<CacheStore<V>>) -> Self {
        Self { store }
    }

    // == Run Due ==
    /// Fires every eviction due at the store's current time.
    ///
    /// Returns the number of entries actually removed.
    pub fn run_due(&self) -> usize {
        let now = self.store.now();
        let due = self.store.evictions().pop_due(now);
        let fired = due.len();

        let removed = due
            .iter()
            .filter(|pending| self.store.evict_if_current(pending))
            .count();

        if fired > 0 {
            debug!(fired, removed, "Reaper pass complete");
        }

        removed
    }

    // == Time Until Next ==
    /// How long until the earliest queued eviction is due.
    ///
    /// `Some(Duration::ZERO)` means something is due now; `None` means the
    /// queue is empty.
    pub fn time_until_next(&self) -> Option<Duration> {
        let now = self.store.now();
        self.store
            .evictions()
            .next_deadline()
            .map(|deadline| deadline.saturating_sub(now))
    }

    /// Number of queued evictions, including cancelled ones not yet dropped.
    pub fn pending(&self) -> usize {
        self.store.evictions().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn setup() -> (Reaper<String>, Arc<CacheStore<String>>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let store = Arc::new(CacheStore::new(4, clock.clone()));
        (Reaper::new(store.clone()), store, clock)
    }

    #[test]
    fn test_run_due_removes_only_expired() {
        let (reaper, store, clock) = setup();
        store.set("short", "a".to_string(), Duration::from_secs(1)).unwrap();
        store.set("long", "b".to_string(), Duration::from_secs(60)).unwrap();

        assert_eq!(reaper.run_due(), 0);

        clock.advance(Duration::from_secs(1));
        assert_eq!(reaper.run_due(), 1);
        assert_eq!(store.len(), 1);
        assert_eq!(reaper.pending(), 1);
    }

    #[test]
    fn test_run_due_skips_refreshed_entry() {
        let (reaper, store, clock) = setup();
        store.set("k", "v1".to_string(), Duration::from_secs(1)).unwrap();

        clock.advance(Duration::from_millis(500));
        store.set("k", "v2".to_string(), Duration::from_secs(5)).unwrap();

        clock.advance(Duration::from_millis(700));
        assert_eq!(reaper.run_due(), 0);
        assert_eq!(store.get("k"), Some("v2".to_string()));
    }

    #[test]
    fn test_run_due_is_idempotent() {
        let (reaper, store, clock) = setup();
        store.set("k", "v".to_string(), Duration::from_secs(1)).unwrap();

        clock.advance(Duration::from_secs(2));
        assert_eq!(reaper.run_due(), 1);
        assert_eq!(reaper.run_due(), 0);
        assert!(store.is_empty());
    }

    #[test]
    fn test_time_until_next() {
        let (reaper, store, clock) = setup();
        assert_eq!(reaper.time_until_next(), None);

        store.set("k", "v".to_string(), Duration::from_secs(3)).unwrap();
        clock.advance(Duration::from_secs(1));
        assert_eq!(reaper.time_until_next(), Some(Duration::from_secs(2)));

        clock.advance(Duration::from_secs(5));
        assert_eq!(reaper.time_until_next(), Some(Duration::ZERO));
    }
}
