//! API Module
//!
//! Public surface of the cache.
//!
//! # Operations
//! - `get` - Retrieve a live value by key
//! - `set` - Store a value with a TTL
//! - `clear` - Remove every entry

pub mod cache;

pub use cache::TtlCache;
