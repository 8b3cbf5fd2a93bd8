//! Cache Store Module
//!
//! The TTL cache: a hash index over an expiration-ordered list, with expired
//! entries reclaimed lazily by reads instead of a background task.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::cache::list::{ExpiryList, SlotId};
use crate::cache::{CacheEntry, CacheStats};
use crate::clock::Clock;
use crate::config::CacheConfig;

type EvictionCallback<K, V> = Box<dyn FnMut(K, V) + Send>;

// == Cache State ==
/// Everything guarded by the cache lock.
struct CacheState<K, V> {
    /// Key to list slot
    index: HashMap<K, SlotId>,
    /// Entries by ascending expiration
    list: ExpiryList<K, V>,
    on_evicted: Option<EvictionCallback<K, V>>,
    stats: CacheStats,
}

impl<K, V> CacheState<K, V>
where
    K: Hash + Eq,
{
    // == Sweep ==
    /// Evicts entries from the head while their deadline is strictly before
    /// `now`. Stops at the first live entry since the list is sorted.
    fn sweep(&mut self, now: Instant) -> usize {
        let mut removed = 0;

        while let Some(id) = self.list.head() {
            if !self.list.get(id).is_some_and(|entry| entry.is_expired_at(now)) {
                break;
            }

            self.list.unlink(id);
            let Some(entry) = self.list.release(id) else {
                break;
            };
            self.index.remove(&entry.key);
            self.stats.record_eviction();
            removed += 1;

            if let Some(callback) = self.on_evicted.as_mut() {
                callback(entry.key, entry.value);
            }
        }

        if removed > 0 {
            self.stats.set_total_entries(self.index.len());
            trace!(removed, remaining = self.index.len(), "lazy sweep evicted expired entries");
        }
        removed
    }

    /// Moves an already-retimed entry to its new place in the list.
    fn reposition(&mut self, id: SlotId) {
        self.list.unlink(id);
        self.list.insert_sorted(id);
    }
}

// == TTL Cache ==
/// A key/value cache where every entry carries its own TTL.
///
/// There is no background cleanup. Every [`get`](Self::get) first sweeps
/// expired entries off the front of the expiration order, so memory held by
/// an expired entry is only reclaimed once some later read happens on the
/// same cache, for any key. [`put`](Self::put) never sweeps.
///
/// A single lock serializes every operation, so one instance can be shared
/// across threads behind an `Arc`.
///
/// # Eviction callback
/// The callback registered with [`on_evicted`](Self::on_evicted) runs on the
/// reading thread *while the cache lock is held*. It must not call back into
/// the same cache (that deadlocks) and should return quickly, since every
/// other caller waits on it.
pub struct TtlCache<K, V> {
    state: Mutex<CacheState<K, V>>,
    clock: Arc<dyn Clock>,
    refresh_on_read: bool,
}

impl<K, V> TtlCache<K, V>
where
    K: Hash + Eq + Clone,
{
    // == Constructor ==
    /// Creates an empty cache on the system clock with refresh on read.
    pub fn new() -> Self {
        Self::with_config(CacheConfig::default())
    }

    /// Creates an empty cache from an explicit configuration.
    pub fn with_config(config: CacheConfig) -> Self {
        Self {
            state: Mutex::new(CacheState {
                index: HashMap::new(),
                list: ExpiryList::new(),
                on_evicted: None,
                stats: CacheStats::new(),
            }),
            clock: config.clock,
            refresh_on_read: config.refresh_on_read,
        }
    }

    // == Get ==
    /// Returns the value stored under `key`, or `V::default()` when the key
    /// is absent or expired.
    ///
    /// Before the lookup, expired entries are swept from the cache and passed
    /// to the eviction callback. With refresh on read enabled, a hit pushes
    /// the entry's deadline to now + its TTL.
    pub fn get<Q>(&self, key: &Q) -> V
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: Clone + Default,
    {
        let mut guard = self.state.lock();
        let now = self.clock.now();
        let state = &mut *guard;

        state.sweep(now);

        let live = state
            .index
            .get(key)
            .copied()
            .filter(|id| state.list.get(*id).is_some_and(|entry| entry.is_live_at(now)));
        let Some(id) = live else {
            state.stats.record_miss();
            return V::default();
        };

        if self.refresh_on_read {
            if let Some(entry) = state.list.get_mut(id) {
                entry.retime(now);
            }
            state.reposition(id);
        }

        state.stats.record_hit();
        state
            .list
            .get(id)
            .map(|entry| entry.value.clone())
            .unwrap_or_default()
    }

    // == Put ==
    /// Stores `value` under `key`, expiring `ttl` from now.
    ///
    /// Overwriting an existing key replaces its value and TTL in place; the
    /// old value is dropped without an eviction callback.
    pub fn put(&self, key: K, value: V, ttl: Duration) {
        let mut guard = self.state.lock();
        let now = self.clock.now();
        let state = &mut *guard;

        match state.index.get(&key).copied() {
            Some(id) => {
                if let Some(entry) = state.list.get_mut(id) {
                    entry.value = value;
                    entry.ttl = ttl;
                    entry.retime(now);
                }
                state.reposition(id);
                state.stats.record_overwrite();
            }
            None => {
                let id = state
                    .list
                    .allocate(CacheEntry::new(key.clone(), value, ttl, now));
                state.index.insert(key, id);
                state.list.insert_sorted(id);
            }
        }

        state.stats.set_total_entries(state.index.len());
    }

    // == On Evicted ==
    /// Registers the function called for each entry the sweep removes,
    /// replacing any previous one. Not called for overwrites.
    ///
    /// See the type-level docs: the callback runs under the cache lock.
    pub fn on_evicted<F>(&self, callback: F)
    where
        F: FnMut(K, V) + Send + 'static,
    {
        let mut state = self.state.lock();
        let replaced = state.on_evicted.replace(Box::new(callback)).is_some();
        debug!(replaced, "eviction callback registered");
    }

    // == Length ==
    /// Number of resident entries, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.state.lock().index.len()
    }

    /// Returns true if no entry is resident.
    pub fn is_empty(&self) -> bool {
        self.state.lock().list.is_empty()
    }

    // == Stats ==
    /// Returns a snapshot of the cache counters.
    pub fn stats(&self) -> CacheStats {
        let state = self.state.lock();
        let mut stats = state.stats.clone();
        stats.set_total_entries(state.index.len());
        stats
    }

    /// Whether reads extend the deadline of the entry they hit.
    pub fn refresh_on_read(&self) -> bool {
        self.refresh_on_read
    }

    /// Keys in expiration order, earliest first.
    #[cfg(test)]
    pub(crate) fn keys_by_expiration(&self) -> Vec<K> {
        self.state.lock().list.iter().map(|e| e.key.clone()).collect()
    }

    /// Panics if the list is unsorted or disagrees with the index.
    #[cfg(test)]
    pub(crate) fn assert_invariants(&self) {
        let state = self.state.lock();
        let entries: Vec<&CacheEntry<K, V>> = state.list.iter().collect();

        for pair in entries.windows(2) {
            assert!(
                pair[0].expiration <= pair[1].expiration,
                "expiry list out of order"
            );
        }

        assert_eq!(entries.len(), state.index.len(), "list and index sizes differ");
        assert_eq!(state.list.len(), state.index.len(), "arena holds unlinked entries");
        for entry in &entries {
            let id = state.index.get(&entry.key).copied();
            assert!(id.is_some(), "listed key missing from index");
            let indexed_key = id.and_then(|id| state.list.get(id)).map(|e| &e.key);
            assert!(indexed_key == Some(&entry.key), "index points at another slot");
        }
    }
}

impl<K, V> Default for TtlCache<K, V>
where
    K: Hash + Eq + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> fmt::Debug for TtlCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("TtlCache")
            .field("entries", &state.index.len())
            .field("refresh_on_read", &self.refresh_on_read)
            .field("has_eviction_callback", &state.on_evicted.is_some())
            .finish()
    }
}
