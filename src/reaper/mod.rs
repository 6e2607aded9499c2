//! Reaper Module
//!
//! Proactively removes expired entries, even ones that are never read again.
//!
//! Every `set` registers a [`PendingEviction`] in the store's
//! [`EvictionQueue`]; the [`Reaper`] pops the due ones and fires them
//! against the store.

mod pending;
mod scheduler;
mod worker;

pub use pending::{EvictionHandle, PendingEviction};
pub use scheduler::EvictionQueue;
pub use worker::Reaper;
