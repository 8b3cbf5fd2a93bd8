//! Configuration Module
//!
//! The configuration record consumed when a cache is constructed, plus the
//! workload settings of the soak binary. Both can be loaded from environment
//! variables.

use std::env;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::clock::{Clock, SystemClock};
use crate::error::{ConfigError, Result};

/// Environment variable toggling TTL refresh on successful reads.
pub const ENV_REFRESH_ON_READ: &str = "TTL_CACHE_REFRESH_ON_READ";

// == Cache Config ==
/// Settings fixed for the lifetime of a cache.
#[derive(Clone)]
pub struct CacheConfig {
    /// Extend an entry's expiration to now + TTL on every successful read
    pub refresh_on_read: bool,
    /// Time source for writes, sweeps and refreshes
    pub clock: Arc<dyn Clock>,
}

impl CacheConfig {
    /// Creates the default configuration: system clock, refresh on read.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the time source.
    pub fn with_clock<C: Clock + 'static>(mut self, clock: C) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Sets whether reads extend an entry's expiration.
    pub fn refresh_on_read(mut self, enabled: bool) -> Self {
        self.refresh_on_read = enabled;
        self
    }

    /// Loads the configuration from process environment variables.
    ///
    /// # Environment Variables
    /// - `TTL_CACHE_REFRESH_ON_READ` - bool (default: true)
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Loads the configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let refresh_on_read = match lookup(ENV_REFRESH_ON_READ) {
            Some(raw) => parse_bool(ENV_REFRESH_ON_READ, &raw)?,
            None => true,
        };

        Ok(Self::default().refresh_on_read(refresh_on_read))
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            refresh_on_read: true,
            clock: Arc::new(SystemClock),
        }
    }
}

impl fmt::Debug for CacheConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheConfig")
            .field("refresh_on_read", &self.refresh_on_read)
            .finish_non_exhaustive()
    }
}

// == Soak Config ==
/// Workload parameters for the soak binary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SoakConfig {
    /// Number of concurrent worker tasks
    pub workers: usize,
    /// Size of the key space the workers draw from
    pub keys: usize,
    /// Operations issued by each worker
    pub ops_per_worker: usize,
    /// TTL in milliseconds given to every write
    pub ttl_ms: u64,
    /// Pause between two operations of one worker, in milliseconds
    pub op_interval_ms: u64,
}

impl SoakConfig {
    /// Loads the workload from process environment variables.
    ///
    /// # Environment Variables
    /// - `SOAK_WORKERS` - worker tasks (default: 4)
    /// - `SOAK_KEYS` - key space size (default: 64)
    /// - `SOAK_OPS_PER_WORKER` - operations per worker (default: 1000)
    /// - `SOAK_TTL_MS` - entry TTL in milliseconds (default: 50)
    /// - `SOAK_OP_INTERVAL_MS` - pause between operations (default: 1)
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Loads the workload through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let config = Self {
            workers: parse_or(&lookup, "SOAK_WORKERS", defaults.workers)?,
            keys: parse_or(&lookup, "SOAK_KEYS", defaults.keys)?,
            ops_per_worker: parse_or(&lookup, "SOAK_OPS_PER_WORKER", defaults.ops_per_worker)?,
            ttl_ms: parse_or(&lookup, "SOAK_TTL_MS", defaults.ttl_ms)?,
            op_interval_ms: parse_or(&lookup, "SOAK_OP_INTERVAL_MS", defaults.op_interval_ms)?,
        };

        if config.workers == 0 {
            return Err(ConfigError::OutOfRange {
                name: "SOAK_WORKERS".to_string(),
                reason: "at least one worker is required".to_string(),
            });
        }
        if config.keys == 0 {
            return Err(ConfigError::OutOfRange {
                name: "SOAK_KEYS".to_string(),
                reason: "the key space cannot be empty".to_string(),
            });
        }

        Ok(config)
    }

    /// TTL given to every write.
    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }

    /// Pause between two operations of one worker.
    pub fn op_interval(&self) -> Duration {
        Duration::from_millis(self.op_interval_ms)
    }
}

impl Default for SoakConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            keys: 64,
            ops_per_worker: 1000,
            ttl_ms: 50,
            op_interval_ms: 1,
        }
    }
}

// == Parsing Helpers ==
fn parse_or<F, T>(lookup: &F, name: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
            name: name.to_string(),
            value: raw,
        }),
        None => Ok(default),
    }
}

fn parse_bool(name: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            name: name.to_string(),
            value: raw.to_string(),
        }),
    }
}
