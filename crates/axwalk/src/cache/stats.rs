/*! Cache counters. */

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

#[derive(Debug, Default)]
pub(super) struct CacheStats {
  pub(super) hits: AtomicU64,
  pub(super) misses: AtomicU64,
  pub(super) inserts: AtomicU64,
  pub(super) updates: AtomicU64,
  pub(super) evictions: AtomicU64,
  pub(super) expired: AtomicU64,
  pub(super) clone_failures: AtomicU64,
  pub(super) dropped_promotions: AtomicU64,
}

impl CacheStats {
  pub(super) fn bump(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
  }

  pub(super) fn add(counter: &AtomicU64, n: usize) {
    counter.fetch_add(n as u64, Ordering::Relaxed);
  }

  pub(super) fn snapshot(&self, size: usize) -> CacheStatsSnapshot {
    let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
    CacheStatsSnapshot {
      hits: load(&self.hits),
      misses: load(&self.misses),
      inserts: load(&self.inserts),
      updates: load(&self.updates),
      evictions: load(&self.evictions),
      expired: load(&self.expired),
      clone_failures: load(&self.clone_failures),
      dropped_promotions: load(&self.dropped_promotions),
      size,
    }
  }
}

/// Point-in-time cache statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStatsSnapshot {
  pub hits: u64,
  pub misses: u64,
  pub inserts: u64,
  pub updates: u64,
  pub evictions: u64,
  pub expired: u64,
  pub clone_failures: u64,
  /// Recency promotions lost because the buffer was full.
  pub dropped_promotions: u64,
  pub size: usize,
}

impl CacheStatsSnapshot {
  #[allow(clippy::cast_precision_loss)]
  pub fn hit_rate(&self) -> f64 {
    let total = self.hits + self.misses;
    if total == 0 {
      0.0
    } else {
      self.hits as f64 / total as f64
    }
  }
}
