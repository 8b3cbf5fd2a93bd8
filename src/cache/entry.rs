//! Cache Entry Module
//!
//! Defines the payload of a single cache entry with its TTL bookkeeping.

use std::time::{Duration, Instant};

/// Horizon used when `now + ttl` does not fit in an [`Instant`].
const FAR_FUTURE: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

// == Cache Entry ==
/// A key/value pair with the TTL it was last given and its absolute deadline.
#[derive(Debug, Clone)]
pub struct CacheEntry<K, V> {
    /// The lookup key, kept so a sweep can clear the index slot
    pub key: K,
    /// The stored value
    pub value: V,
    /// Duration assigned by the last write
    pub ttl: Duration,
    /// Instant after which the entry is expired
    pub expiration: Instant,
}

impl<K, V> CacheEntry<K, V> {
    // == Constructor ==
    /// Creates an entry expiring `ttl` after `now`.
    pub fn new(key: K, value: V, ttl: Duration, now: Instant) -> Self {
        Self {
            key,
            value,
            ttl,
            expiration: deadline(now, ttl),
        }
    }

    // == Retime ==
    /// Moves the deadline to `now` + the stored TTL.
    pub fn retime(&mut self, now: Instant) {
        self.expiration = deadline(now, self.ttl);
    }

    // == Expiry Checks ==
    /// True once `now` is strictly past the deadline; used by the sweep.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        self.expiration < now
    }

    /// True while the deadline is strictly after `now`; used by lookups.
    ///
    /// An entry whose deadline equals `now` is neither live nor swept yet.
    pub fn is_live_at(&self, now: Instant) -> bool {
        self.expiration > now
    }
}

// == Utility Functions ==
/// Returns `now + ttl`, saturating at a far-future horizon.
pub fn deadline(now: Instant, ttl: Duration) -> Instant {
    now.checked_add(ttl)
        .or_else(|| now.checked_add(FAR_FUTURE))
        .unwrap_or(now)
}
