//! TTL Cache Facade
//!
//! The handle callers hold: `get`, `set` and `clear` over a shared store.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::cache::{CacheStats, CacheStore};
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::reaper::Reaper;
use crate::tasks::spawn_reaper_task;

/// In-process key-value cache with per-entry TTL.
///
/// Cloning is cheap and every clone shares the same store. Construct one
/// instance and hand it to the consumers that need it.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use ttl_cache::{Config, TtlCache};
///
/// let cache: TtlCache<String> = TtlCache::new(&Config::default());
/// cache.set("greeting", "hello".to_string(), Duration::from_secs(30)).unwrap();
/// assert_eq!(cache.get("greeting"), Some("hello".to_string()));
///
/// cache.clear();
/// assert_eq!(cache.get("greeting"), None);
/// ```
pub struct TtlCache<V> {
    store: Arc<CacheStore<V>>,
    default_ttl: Duration,
    reaper_interval: Duration,
}

impl<V> Clone for TtlCache<V> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            default_ttl: self.default_ttl,
            reaper_interval: self.reaper_interval,
        }
    }
}

impl<V> TtlCache<V> {
    /// Creates a cache driven by the system's monotonic clock.
    pub fn new(config: &Config) -> Self {
        Self::with_clock(config, Arc::new(SystemClock::new()))
    }

    /// Creates a cache driven by `clock`.
    pub fn with_clock(config: &Config, clock: Arc<dyn Clock>) -> Self {
        Self {
            store: Arc::new(CacheStore::new(config.shard_count, clock)),
            default_ttl: config.default_ttl(),
            reaper_interval: config.reaper_interval(),
        }
    }

    /// Returns the value stored under `key`, or `None` if absent or expired.
    pub fn get(&self, key: &str) -> Option<V>
    where
        V: Clone,
    {
        self.store.get(key)
    }

    /// Stores `value` under `key` for `ttl`, replacing any previous entry.
    ///
    /// # Errors
    /// `InvalidArgument` if `ttl` is zero.
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Duration) -> Result<()> {
        self.store.set(key, value, ttl)
    }

    /// Like [`set`](Self::set), with the TTL given in (possibly fractional)
    /// seconds.
    ///
    /// # Errors
    /// `InvalidArgument` if `ttl_seconds` is not a finite number above zero.
    pub fn set_secs(&self, key: impl Into<String>, value: V, ttl_seconds: f64) -> Result<()> {
        let key = key.into();
        if !ttl_seconds.is_finite() || ttl_seconds <= 0.0 {
            return Err(CacheError::InvalidArgument(format!(
                "TTL for key '{}' must be a positive number of seconds, got {}",
                key, ttl_seconds
            )));
        }

        let ttl = Duration::try_from_secs_f64(ttl_seconds).map_err(|e| {
            CacheError::InvalidArgument(format!("TTL for key '{}' is out of range: {}", key, e))
        })?;
        self.store.set(key, value, ttl)
    }

    /// Stores `value` under `key` for the configured default TTL.
    pub fn set_default(&self, key: impl Into<String>, value: V) -> Result<()> {
        self.store.set(key, value, self.default_ttl)
    }

    /// Removes every entry. Any eviction scheduled before the call is
    /// invalidated by the time it returns.
    pub fn clear(&self) {
        self.store.clear();
    }

    /// Remaining lifetime of `key`, or `None` if absent or expired.
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        self.store.ttl(key)
    }

    /// A reaper bound to this cache's store.
    pub fn reaper(&self) -> Reaper<V> {
        Reaper::new(Arc::clone(&self.store))
    }

    /// Spawns the background reaper with the configured interval.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn_reaper(&self) -> JoinHandle<()>
    where
        V: Send + Sync + 'static,
    {
        spawn_reaper_task(self.reaper(), self.reaper_interval)
    }

    /// Snapshot of hit/miss/expiration counters and the current entry count.
    pub fn stats(&self) -> CacheStats {
        self.store.stats()
    }

    /// Number of stored entries, including expired ones not yet removed.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Returns true if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use tokio_test::{assert_err, assert_ok};

    fn test_cache() -> (TtlCache<String>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        (TtlCache::with_clock(&Config::default(), clock.clone()), clock)
    }

    #[test]
    fn test_set_and_get() {
        let (cache, _) = test_cache();

        assert_ok!(cache.set("test_key", "test_value".to_string(), Duration::from_secs(1)));
        assert_eq!(cache.get("test_key"), Some("test_value".to_string()));
    }

    #[test]
    fn test_clones_share_store() {
        let (cache, _) = test_cache();
        let other = cache.clone();

        cache.set("shared", "v".to_string(), Duration::from_secs(1)).unwrap();
        assert_eq!(other.get("shared"), Some("v".to_string()));

        other.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_set_secs_fractional() {
        let (cache, clock) = test_cache();
        assert_ok!(cache.set_secs("k", "v".to_string(), 0.5));

        clock.advance(Duration::from_millis(499));
        assert!(cache.get("k").is_some());

        clock.advance(Duration::from_millis(1));
        assert_eq!(cache.get("k"), None);
    }

    #[test]
    fn test_set_secs_rejects_non_positive() {
        let (cache, _) = test_cache();

        for ttl in [0.0, -1.0, f64::NAN, f64::INFINITY, f64::MAX] {
            let err = assert_err!(cache.set_secs("k", "v".to_string(), ttl));
            assert!(matches!(err, CacheError::InvalidArgument(_)));
        }
        assert!(cache.is_empty());
    }

    #[test]
    fn test_set_default_uses_configured_ttl() {
        let clock = Arc::new(ManualClock::new());
        let config = Config {
            default_ttl: 10,
            ..Config::default()
        };
        let cache: TtlCache<String> = TtlCache::with_clock(&config, clock.clone());

        assert_ok!(cache.set_default("k", "v".to_string()));
        assert_eq!(cache.ttl("k"), Some(Duration::from_secs(10)));

        clock.advance(Duration::from_secs(10));
        assert_eq!(cache.get("k"), None);
    }

    #[test]
    fn test_reaper_handle() {
        let (cache, clock) = test_cache();
        cache.set("k", "v".to_string(), Duration::from_secs(1)).unwrap();

        clock.advance(Duration::from_secs(1));
        assert_eq!(cache.reaper().run_due(), 1);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_spawn_reaper() {
        let clock = Arc::new(ManualClock::new());
        let config = Config {
            reaper_interval_ms: 10,
            ..Config::default()
        };
        let cache: TtlCache<String> = TtlCache::with_clock(&config, clock.clone());
        cache.set("k", "v".to_string(), Duration::from_secs(1)).unwrap();

        let handle = cache.spawn_reaper();
        clock.advance(Duration::from_secs(5));
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert!(cache.is_empty());
        handle.abort();
    }

    #[test]
    fn test_len_counts_expired_until_removed() {
        let (cache, clock) = test_cache();
        assert!(cache.is_empty());

        cache.set("k", "v".to_string(), Duration::from_secs(1)).unwrap();
        clock.advance(Duration::from_secs(2));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.stats().total_entries, 1);

        assert_eq!(cache.get("k"), None);
        assert_eq!(cache.len(), 0);
        assert!(cache.is_empty());
    }
}
