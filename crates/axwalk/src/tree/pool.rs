/*!
Reusable children buffers and node ids for tree builds.

Builds allocate one children `Vec` per expanded node. Released trees hand those
buffers back here so the next build can reuse them. Oversized buffers are dropped
rather than pooled.
*/

use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam::queue::ArrayQueue;

use super::{NodeId, TreeNode};

/// Buffers kept for reuse.
const POOL_SLOTS: usize = 256;

/// Buffers that grew past this capacity are not pooled.
const MAX_POOLED_CAPACITY: usize = 64;

/// Lock-free pool shared by concurrent builds.
pub struct NodePool<H> {
  buffers: ArrayQueue<Vec<TreeNode<H>>>,
  next_id: AtomicU64,
}

impl<H> std::fmt::Debug for NodePool<H> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("NodePool")
      .field("pooled", &self.buffers.len())
      .finish_non_exhaustive()
  }
}

impl<H> Default for NodePool<H> {
  fn default() -> Self {
    Self::new()
  }
}

impl<H> NodePool<H> {
  pub fn new() -> Self {
    Self {
      buffers: ArrayQueue::new(POOL_SLOTS),
      next_id: AtomicU64::new(1),
    }
  }

  /// Identifier for a new node, unique within this pool.
  pub(crate) fn next_id(&self) -> NodeId {
    NodeId(self.next_id.fetch_add(1, Ordering::Relaxed))
  }

  /// Empty buffer with room for at least `capacity` children.
  pub(crate) fn children_buffer(&self, capacity: usize) -> Vec<TreeNode<H>> {
    match self.buffers.pop() {
      Some(mut buffer) => {
        buffer.reserve(capacity);
        buffer
      }
      None => Vec::with_capacity(capacity),
    }
  }

  /// Return an emptied children buffer.
  pub(crate) fn recycle(&self, buffer: Vec<TreeNode<H>>) {
    if !buffer.is_empty() {
      log::error!("Refusing to pool a non-empty children buffer");
      return;
    }
    if buffer.capacity() == 0 || buffer.capacity() > MAX_POOLED_CAPACITY {
      return;
    }
    if let Err(rejected) = self.buffers.push(buffer) {
      // Full pool: the buffer is freed.
      drop(rejected);
    }
  }

  /// Buffers currently available for reuse.
  pub fn pooled(&self) -> usize {
    self.buffers.len()
  }
}
