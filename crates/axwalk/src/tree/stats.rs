/*! Per-build traversal counters. */

use std::sync::atomic::{AtomicUsize, Ordering};

use serde::Serialize;

#[derive(Debug, Default)]
pub(super) struct TreeStats {
  visited: AtomicUsize,
  max_depth_seen: AtomicUsize,
  non_interactive: AtomicUsize,
  leaves: AtomicUsize,
  depth_limited: AtomicUsize,
  filtered_out: AtomicUsize,
  info_errors: AtomicUsize,
  children_errors: AtomicUsize,
  parallel_expansions: AtomicUsize,
  sequential_expansions: AtomicUsize,
}

impl TreeStats {
  pub(super) fn visit(&self, depth: usize) {
    self.visited.fetch_add(1, Ordering::Relaxed);
    self.max_depth_seen.fetch_max(depth, Ordering::Relaxed);
  }

  pub(super) fn non_interactive(&self) {
    self.non_interactive.fetch_add(1, Ordering::Relaxed);
  }

  pub(super) fn leaf(&self) {
    self.leaves.fetch_add(1, Ordering::Relaxed);
  }

  pub(super) fn depth_limited(&self) {
    self.depth_limited.fetch_add(1, Ordering::Relaxed);
  }

  pub(super) fn filtered_out(&self) {
    self.filtered_out.fetch_add(1, Ordering::Relaxed);
  }

  pub(super) fn info_error(&self) {
    self.info_errors.fetch_add(1, Ordering::Relaxed);
  }

  pub(super) fn children_error(&self) {
    self.children_errors.fetch_add(1, Ordering::Relaxed);
  }

  pub(super) fn expansion(&self, parallel: bool) {
    let counter = if parallel {
      &self.parallel_expansions
    } else {
      &self.sequential_expansions
    };
    counter.fetch_add(1, Ordering::Relaxed);
  }

  pub(super) fn snapshot(&self) -> TreeStatsSnapshot {
    let load = |c: &AtomicUsize| c.load(Ordering::Relaxed);
    TreeStatsSnapshot {
      visited: load(&self.visited),
      max_depth_seen: load(&self.max_depth_seen),
      non_interactive: load(&self.non_interactive),
      leaves: load(&self.leaves),
      depth_limited: load(&self.depth_limited),
      filtered_out: load(&self.filtered_out),
      info_errors: load(&self.info_errors),
      children_errors: load(&self.children_errors),
      parallel_expansions: load(&self.parallel_expansions),
      sequential_expansions: load(&self.sequential_expansions),
    }
  }
}

/// Counters from one tree build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[allow(missing_docs)]
pub struct TreeStatsSnapshot {
  pub visited: usize,
  pub max_depth_seen: usize,
  /// Content nodes that were not expanded.
  pub non_interactive: usize,
  /// Interactive leaves whose children were not fetched.
  pub leaves: usize,
  /// Nodes at the depth limit whose children were not fetched.
  pub depth_limited: usize,
  pub filtered_out: usize,
  pub info_errors: usize,
  pub children_errors: usize,
  pub parallel_expansions: usize,
  pub sequential_expansions: usize,
}
