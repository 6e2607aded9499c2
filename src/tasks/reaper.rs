//! Reaper Task
//!
//! Background task that drives a [`Reaper`] in real time.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::reaper::Reaper;

/// Shortest sleep between passes, so a zero interval cannot spin.
const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Spawns a background task that removes expired entries as they fall due.
///
/// Each pass sleeps until the earliest pending eviction is due, but never
/// longer than `max_interval`, then fires everything due. An entry whose
/// deadline is earlier than the current sleep is picked up on the next pass
/// at the latest; reads never see it in the meantime.
///
/// # Arguments
/// * `reaper` - Reaper bound to the cache store
/// * `max_interval` - Upper bound on the sleep between passes
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during shutdown.
///
/// # Example
/// ```ignore
/// let cache: TtlCache<String> = TtlCache::new(&Config::default());
/// let handle = spawn_reaper_task(cache.reaper(), Duration::from_secs(1));
/// // Later, during shutdown:
/// handle.abort();
/// ```
pub fn spawn_reaper_task<V>(reaper: Reaper<V>, max_interval: Duration) -> JoinHandle<()>
where
    V: Send + Sync + 'static,
{
    let max_interval = max_interval.max(MIN_INTERVAL);

    tokio::spawn(async move {
        info!(?max_interval, "Starting reaper task");

        loop {
            let wait = reaper
                .time_until_next()
                .map_or(max_interval, |until| until.min(max_interval))
                .max(MIN_INTERVAL);
            tokio::time::sleep(wait).await;

            let removed = reaper.run_due();
            if removed > 0 {
                info!("Reaper: removed {} expired entries", removed);
            } else {
                debug!("Reaper: no expired entries found");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::cache::CacheStore;
    use crate::clock::{ManualClock, SystemClock};

    #[tokio::test]
    async fn test_reaper_task_removes_expired_entries() {
        let clock = Arc::new(ManualClock::new());
        let store = Arc::new(CacheStore::new(4, clock.clone()));
        store
            .set("expire_soon", "value".to_string(), Duration::from_secs(1))
            .unwrap();

        let handle = spawn_reaper_task(Reaper::new(store.clone()), Duration::from_millis(10));

        clock.advance(Duration::from_secs(2));
        tokio::time::sleep(Duration::from_millis(200)).await;

        // Checked via len, not get, so lazy eviction cannot be what removed it
        assert!(store.is_empty(), "Expired entry should have been reaped");
        assert_eq!(store.stats().reaped_expirations, 1);

        handle.abort();
    }

    #[tokio::test]
    async fn test_reaper_task_preserves_valid_entries() {
        let clock = Arc::new(ManualClock::new());
        let store = Arc::new(CacheStore::new(4, clock.clone()));
        store
            .set("long_lived", "value".to_string(), Duration::from_secs(3600))
            .unwrap();

        let handle = spawn_reaper_task(Reaper::new(store.clone()), Duration::from_millis(10));

        clock.advance(Duration::from_secs(60));
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(store.get("long_lived"), Some("value".to_string()));

        handle.abort();
    }

    #[tokio::test]
    async fn test_reaper_task_sleeps_until_deadline() {
        let store = Arc::new(CacheStore::new(4, Arc::new(SystemClock::new())));
        store
            .set("short", "value".to_string(), Duration::from_millis(50))
            .unwrap();

        // Interval far longer than the TTL: removal must come from the deadline
        let handle = spawn_reaper_task(Reaper::new(store.clone()), Duration::from_secs(30));

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(store.is_empty(), "Entry should be reaped at its deadline");

        handle.abort();
    }

    #[tokio::test]
    async fn test_reaper_task_can_be_aborted() {
        let store: Arc<CacheStore<String>> =
            Arc::new(CacheStore::new(4, Arc::new(ManualClock::new())));

        let handle = spawn_reaper_task(Reaper::new(store), Duration::from_secs(1));

        // Abort immediately
        handle.abort();

        // Wait a bit and verify task is finished
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished(), "Task should be finished after abort");
    }
}
