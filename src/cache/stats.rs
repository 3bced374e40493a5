//! Cache Statistics Module
//!
//! Tracks backend activity: lookups hit or missed, writes and removals.

use serde::Serialize;

// == Cache Stats ==
/// Tracks cache performance metrics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Number of lookups that found a value
    pub hits: u64,
    /// Number of lookups that found nothing
    pub misses: u64,
    /// Number of successful writes
    pub writes: u64,
    /// Number of conditional inserts rejected because the key existed
    pub conflicts: u64,
    /// Number of entries removed
    pub removals: u64,
    /// Current number of entries in the cache
    pub total_entries: usize,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
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

    pub fn record_write(&mut self) {
        self.writes += 1;
    }

    pub fn record_conflict(&mut self) {
        self.conflicts += 1;
    }

    pub fn record_removal(&mut self) {
        self.removals += 1;
    }

    // == Update Entry Count ==
    /// Updates the total entries count.
    pub fn set_total_entries(&mut self, count: usize) {
        self.total_entries = count;
    }
}
