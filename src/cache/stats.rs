//! Cache Statistics Module
//!
//! Counts lookups, expirations and overwrites seen by a cache.

use serde::Serialize;

// == Cache Stats ==
/// Snapshot of a cache's counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Reads that returned a live value
    pub hits: u64,
    /// Reads that found nothing live (absent or expired)
    pub misses: u64,
    /// Entries removed by the lazy sweep
    pub evictions: u64,
    /// Writes that replaced an existing entry
    pub overwrites: u64,
    /// Entries currently resident, including expired ones not yet swept
    pub total_entries: usize,
}

impl CacheStats {
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 before any read.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    pub fn record_overwrite(&mut self) {
        self.overwrites += 1;
    }

    pub fn set_total_entries(&mut self, count: usize) {
        self.total_entries = count;
    }
}
