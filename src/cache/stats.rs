//! Cache Statistics Module
//!
//! Tracks handle activity: reads, writes, updates and removals.

use serde::Serialize;

// == Cache Stats ==
/// Counters maintained by a cache handle with statistics enabled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Reads that found a live entry
    pub hits: u64,
    /// Reads that found nothing (absent or expired)
    pub misses: u64,
    /// Unconditional writes
    pub puts: u64,
    /// Successful add-if-absent writes
    pub adds: u64,
    /// Successful read-modify-write updates
    pub updates: u64,
    /// Caller-driven removals
    pub removes: u64,
    /// Entries evicted by the store for capacity
    pub evictions: u64,
    /// Entries removed because they expired
    pub expirations: u64,
    /// Current number of entries in the store
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
    /// Returns hits / (hits + misses), or 0.0 if no reads have been made.
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

    pub fn record_put(&mut self) {
        self.puts += 1;
    }

    pub fn record_add(&mut self) {
        self.adds += 1;
    }

    pub fn record_update(&mut self) {
        self.updates += 1;
    }

    pub fn record_remove(&mut self) {
        self.removes += 1;
    }

    pub fn record_evictions(&mut self, count: usize) {
        self.evictions += count as u64;
    }

    pub fn record_expirations(&mut self, count: usize) {
        self.expirations += count as u64;
    }

    // == Update Entry Count ==
    /// Updates the total entries count.
    pub fn set_total_entries(&mut self, count: usize) {
        self.total_entries = count;
    }
}
