//! Cache Statistics Module
//!
//! Tracks authorization hits, misses, expirations and evictions.

use serde::Serialize;

// == Cache Stats ==
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Authorization lookups answered from the cache
    pub hits: u64,
    /// Authorization lookups that found nothing live
    pub misses: u64,
    /// Authorization entries dropped because their expiry passed
    pub expirations: u64,
    /// Authorization entries dropped by the LRU bound
    pub evictions: u64,
    /// App nodes dropped by the optional report-branch bound
    pub report_evictions: u64,
    /// Authorization entries currently held
    pub authorize_entries: usize,
    /// Transactions currently held on the report branch
    pub report_transactions: usize,
}

impl CacheStats {
    // == Constructor ==
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
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

    pub fn record_expirations(&mut self, count: usize) {
        self.expirations += count as u64;
    }

    pub fn record_evictions(&mut self, count: usize) {
        self.evictions += count as u64;
    }

    pub fn record_report_evictions(&mut self, count: usize) {
        self.report_evictions += count as u64;
    }
}
