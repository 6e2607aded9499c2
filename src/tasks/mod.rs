//! Background Tasks Module
//!
//! Contains background tasks that run for the lifetime of a cache.
//!
//! # Tasks
//! - Reaper: fires pending evictions as their deadlines pass

mod reaper;

pub use reaper::spawn_reaper_task;
