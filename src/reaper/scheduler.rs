//! Eviction Scheduler Module
//!
//! Min-heap of pending evictions keyed by deadline.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tracing::debug;

use crate::reaper::{EvictionHandle, PendingEviction};

/// Below this many queued evictions the heap is never compacted.
const COMPACT_MIN_LEN: usize = 64;

// == Eviction Queue ==
/// Deadline-ordered queue of pending evictions.
///
/// The earliest deadline sits at the top of the heap. Cancelled evictions
/// are compacted away once they make up more than half of it, so the heap
/// stays proportional to the number of live entries.
#[derive(Debug, Default)]
pub struct EvictionQueue {
    heap: Mutex<BinaryHeap<Reverse<PendingEviction>>>,
    next_seq: AtomicU64,
    /// Cancellations reported since the last purge; an estimate
    cancelled: AtomicUsize,
}

impl EvictionQueue {
    // == Constructor ==
    pub fn new() -> Self {
        Self::default()
    }

    // == Schedule ==
    /// Registers a removal of `key` at `expires_at`, tied to `handle`.
    pub fn schedule(&self, key: String, expires_at: Duration, handle: EvictionHandle) {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        let mut heap = self.heap.lock();
        heap.push(Reverse(PendingEviction {
            key,
            expires_at,
            seq,
            handle,
        }));

        let cancelled = self.cancelled.load(Ordering::Relaxed);
        if heap.len() >= COMPACT_MIN_LEN && cancelled * 2 > heap.len() {
            let before = heap.len();
            heap.retain(|Reverse(p)| !p.is_cancelled());
            self.cancelled.store(0, Ordering::Relaxed);
            debug!(dropped = before - heap.len(), "Compacted eviction queue");
        }
    }

    // == Note Cancelled ==
    /// Records that one queued eviction's handle was cancelled.
    pub fn note_cancelled(&self) {
        self.cancelled.fetch_add(1, Ordering::Relaxed);
    }

    // == Pop Due ==
    /// Removes and returns every eviction whose deadline is at or before `now`.
    ///
    /// Cancelled evictions are dropped here rather than returned.
    pub fn pop_due(&self, now: Duration) -> Vec<PendingEviction> {
        let mut heap = self.heap.lock();
        let mut due = Vec::new();

        while heap.peek().is_some_and(|Reverse(p)| p.is_due(now)) {
            if let Some(Reverse(pending)) = heap.pop() {
                if pending.is_cancelled() {
                    let _ = self.cancelled.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| {
                        n.checked_sub(1)
                    });
                } else {
                    due.push(pending);
                }
            }
        }

        due
    }

    // == Next Deadline ==
    /// Deadline of the earliest queued eviction, cancelled or not.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.heap.lock().peek().map(|Reverse(p)| p.expires_at)
    }

    // == Purge Cancelled ==
    /// Drops every cancelled eviction. Returns how many were dropped.
    pub fn purge_cancelled(&self) -> usize {
        let mut heap = self.heap.lock();
        let before = heap.len();
        heap.retain(|Reverse(p)| !p.is_cancelled());
        self.cancelled.store(0, Ordering::Relaxed);
        before - heap.len()
    }

    // == Length ==
    /// Number of queued evictions, including cancelled ones not yet dropped.
    pub fn len(&self) -> usize {
        self.heap.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn test_queue_new() {
        let queue = EvictionQueue::new();
        assert!(queue.is_empty());
        assert_eq!(queue.next_deadline(), None);
    }

    #[test]
    fn test_pop_due_in_deadline_order() {
        let queue = EvictionQueue::new();
        queue.schedule("c".to_string(), ms(300), EvictionHandle::new());
        queue.schedule("a".to_string(), ms(100), EvictionHandle::new());
        queue.schedule("b".to_string(), ms(200), EvictionHandle::new());

        assert_eq!(queue.next_deadline(), Some(ms(100)));

        let due = queue.pop_due(ms(250));
        let keys: Vec<&str> = due.iter().map(|p| p.key.as_str()).collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.next_deadline(), Some(ms(300)));
    }

    #[test]
    fn test_pop_due_nothing_due() {
        let queue = EvictionQueue::new();
        queue.schedule("a".to_string(), ms(100), EvictionHandle::new());

        assert!(queue.pop_due(ms(99)).is_empty());
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_pop_due_skips_cancelled() {
        let queue = EvictionQueue::new();
        let stale = EvictionHandle::new();
        queue.schedule("k".to_string(), ms(100), stale.clone());
        queue.schedule("k".to_string(), ms(500), EvictionHandle::new());
        stale.cancel();

        assert!(queue.pop_due(ms(100)).is_empty());
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_same_deadline_fires_in_schedule_order() {
        let queue = EvictionQueue::new();
        queue.schedule("first".to_string(), ms(100), EvictionHandle::new());
        queue.schedule("second".to_string(), ms(100), EvictionHandle::new());

        let due = queue.pop_due(ms(100));
        assert_eq!(due[0].key, "first");
        assert_eq!(due[1].key, "second");
    }

    #[test]
    fn test_schedule_compacts_cancelled_evictions() {
        let queue = EvictionQueue::new();
        let mut previous: Option<EvictionHandle> = None;

        for _ in 0..10_000 {
            if let Some(old) = previous.take() {
                old.cancel();
                queue.note_cancelled();
            }
            let handle = EvictionHandle::new();
            queue.schedule("hot".to_string(), ms(3_600_000), handle.clone());
            previous = Some(handle);
        }

        assert!(queue.len() <= COMPACT_MIN_LEN, "queue grew to {}", queue.len());
        assert_eq!(queue.pop_due(ms(3_600_000)).len(), 1);
    }

    #[test]
    fn test_schedule_keeps_small_queue_intact() {
        let queue = EvictionQueue::new();
        for i in 0..10 {
            let handle = EvictionHandle::new();
            handle.cancel();
            queue.note_cancelled();
            queue.schedule(format!("k{}", i), ms(100), handle);
        }

        assert_eq!(queue.len(), 10);
    }

    #[test]
    fn test_purge_cancelled_keeps_live() {
        let queue = EvictionQueue::new();
        let cancelled = EvictionHandle::new();
        queue.schedule("old".to_string(), ms(100), cancelled.clone());
        queue.schedule("new".to_string(), ms(100), EvictionHandle::new());
        cancelled.cancel();

        assert_eq!(queue.purge_cancelled(), 1);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.pop_due(ms(100))[0].key, "new");
    }
}
