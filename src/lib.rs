//! TTL Cache - A small in-process key-value cache
//!
//! Entries expire after a per-entry time-to-live. Expired entries are never
//! returned by reads, and a background reaper removes them even if nothing
//! reads them again.

pub mod api;
pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod reaper;
pub mod repl;
pub mod tasks;

pub use api::TtlCache;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use error::{CacheError, Result};
pub use tasks::spawn_reaper_task;
