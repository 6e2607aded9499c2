//! TTL Cache shell
//!
//! Reads commands from stdin, one per line, and runs them against a single
//! in-process cache.

use tokio::io;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ttl_cache::repl::{serve, spawn_line_reader};
use ttl_cache::{Config, TtlCache};

/// Entry point for the cache shell.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging (stderr)
/// 2. Load configuration from environment variables
/// 3. Create the cache and start the background reaper
/// 4. Serve commands until EOF, `quit`, or Ctrl+C
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ttl_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::from_env();
    info!(
        "Configuration loaded: default_ttl={}s, reaper_interval={}ms, shards={}",
        config.default_ttl, config.reaper_interval_ms, config.shard_count
    );

    let cache: TtlCache<String> = TtlCache::new(&config);
    let reaper_handle = cache.spawn_reaper();

    // Stdin is read on its own thread so Ctrl+C never waits on a pending read
    let mut lines = spawn_line_reader(std::io::BufReader::new(std::io::stdin()));
    let mut stdout = io::stdout();

    tokio::select! {
        result = serve(&cache, &mut lines, &mut stdout) => result?,
        _ = signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    reaper_handle.abort();
    warn!("Reaper task aborted");

    Ok(())
}
