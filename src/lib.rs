//! Lazy TTL Cache - an in-process key/value cache with per-entry TTL
//!
//! Expired entries are reclaimed lazily by reads; there is no background task.
//!
//! ```
//! use std::time::Duration;
//! use lazy_ttl_cache::TtlCache;
//!
//! let cache: TtlCache<String, u32> = TtlCache::new();
//! cache.put("answer".to_string(), 42, Duration::from_secs(30));
//! assert_eq!(cache.get("answer"), 42);
//! assert_eq!(cache.get("missing"), 0);
//! ```

pub mod cache;
pub mod clock;
pub mod config;
pub mod error;

pub use cache::{CacheStats, TtlCache};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{CacheConfig, SoakConfig};
pub use error::ConfigError;
