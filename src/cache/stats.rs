//! Cache Statistics Module
//!
//! Tracks fetch outcomes, evictions and the size of both record maps.

use serde::Serialize;

// == Cache Stats ==
/// Snapshot of cache activity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Fetches served from an existing record
    pub hits: u64,
    /// Fetches that invoked the producer
    pub misses: u64,
    /// Hits served from an unreferenced record that became referenced again
    pub reactivations: u64,
    /// Records discarded because they expired (lazily on fetch or by the sweep loop)
    pub evictions: u64,
    /// Producer calls that failed
    pub producer_errors: u64,
    /// Records with at least one live handle
    pub reachable_entries: usize,
    /// Records with no live handle, pending grace period or expiry
    pub unreachable_entries: usize,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of records held.
    pub fn total_entries(&self) -> usize {
        self.reachable_entries + self.unreachable_entries
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if nothing was fetched yet.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub(crate) fn record_hit(&mut self, reactivated: bool) {
        self.hits += 1;
        if reactivated {
            self.reactivations += 1;
        }
    }

    pub(crate) fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub(crate) fn record_evictions(&mut self, count: usize) {
        self.evictions += count as u64;
    }

    pub(crate) fn record_producer_error(&mut self) {
        self.producer_errors += 1;
    }
}
