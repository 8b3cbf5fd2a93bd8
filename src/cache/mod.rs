//! Cache Module
//!
//! Provides an in-memory cache with per-entry TTL and lazy, read-driven
//! expiration.

mod entry;
mod list;
mod stats;
mod store;


// Re-export public types
pub use entry::CacheEntry;
pub use stats::CacheStats;
pub use store::TtlCache;
