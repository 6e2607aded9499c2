//! Configuration Module
//!
//! Handles loading cache configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// TTL in seconds applied by `set_default`
    pub default_ttl: u64,
    /// Upper bound in milliseconds on how long the reaper sleeps between passes
    pub reaper_interval_ms: u64,
    /// Number of independently locked shards in the store
    pub shard_count: usize,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_TTL` - Default TTL in seconds, above 0 (default: 3600)
    /// - `REAPER_INTERVAL_MS` - Max reaper sleep in milliseconds (default: 1000)
    /// - `CACHE_SHARDS` - Shard count, at least 1 (default: 16)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let mut default_ttl = env_or("CACHE_TTL", defaults.default_ttl);
        if default_ttl == 0 {
            warn!(
                "CACHE_TTL=0 would reject every set_default, using {}s",
                defaults.default_ttl
            );
            default_ttl = defaults.default_ttl;
        }

        Self {
            default_ttl,
            reaper_interval_ms: env_or("REAPER_INTERVAL_MS", defaults.reaper_interval_ms),
            shard_count: env_or("CACHE_SHARDS", defaults.shard_count).max(1),
        }
    }

    /// Default TTL as a `Duration`.
    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl)
    }

    /// Reaper interval as a `Duration`.
    pub fn reaper_interval(&self) -> Duration {
        Duration::from_millis(self.reaper_interval_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_ttl: 3600,
            reaper_interval_ms: 1000,
            shard_count: 16,
        }
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
