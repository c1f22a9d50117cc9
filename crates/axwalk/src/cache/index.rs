/*!
Storage for the info cache.

Entries live in a generational slab. Three views index them:

- hash buckets: `hash -> [slot]`, resolved with the bridge's identity check
- an intrusive LRU list (`prev`/`next` slot links), most recent at the head
- a binary min-heap of slots ordered by expiry, each entry tracking its heap index

Evicting from the LRU leaves the slot in the heap as a ghost (`removed = true`,
handle taken). Ghosts are freed when they surface at the heap top, so eviction
never pays for a heap removal. A sweep that finds the heap past twice the
capacity rebuilds it from the live entries.

All methods assume the caller holds the cache's write lock (or read lock for the
`&self` lookups).
*/

#![allow(clippy::indexing_slicing)] // slot and heap indices are maintained by this module

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use crate::types::ElementInfo;

/// Slot reference that stays valid only until the slot is reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct EntryRef {
  slot: usize,
  generation: u32,
}

#[derive(Debug)]
pub(super) struct Entry<H> {
  pub(super) info: Arc<ElementInfo>,
  pub(super) key: u64,
  pub(super) handle: Option<H>,
  pub(super) removed: bool,
  pub(super) expires_at: Instant,
  prev: Option<usize>,
  next: Option<usize>,
  heap_index: Option<usize>,
}

#[derive(Debug)]
struct Slot<H> {
  generation: u32,
  entry: Option<Entry<H>>,
}

/// Handles and counts produced by an expiry sweep.
#[derive(Debug)]
pub(super) struct Sweep<H> {
  pub(super) released: Vec<H>,
  pub(super) expired: usize,
  pub(super) ghosts: usize,
}

#[derive(Debug)]
pub(super) struct CacheIndex<H> {
  buckets: HashMap<u64, Vec<usize>>,
  slots: Vec<Slot<H>>,
  free: Vec<usize>,
  head: Option<usize>,
  tail: Option<usize>,
  lru_len: usize,
  heap: Vec<usize>,
  capacity: usize,
}

impl<H> CacheIndex<H> {
  pub(super) fn with_capacity(capacity: usize) -> Self {
    Self {
      buckets: HashMap::with_capacity(capacity),
      slots: Vec::with_capacity(capacity),
      free: Vec::new(),
      head: None,
      tail: None,
      lru_len: 0,
      heap: Vec::with_capacity(capacity),
      capacity,
    }
  }

  /// Live entries (the LRU length).
  pub(super) const fn len(&self) -> usize {
    self.lru_len
  }

  pub(super) fn entry(&self, slot: usize) -> Option<&Entry<H>> {
    self.slots.get(slot).and_then(|s| s.entry.as_ref())
  }

  /// Live entry for `key` whose handle satisfies `same`.
  pub(super) fn find(&self, key: u64, mut same: impl FnMut(&H) -> bool) -> Option<usize> {
    self.buckets.get(&key)?.iter().copied().find(|&slot| {
      self
        .entry(slot)
        .and_then(|e| if e.removed { None } else { e.handle.as_ref() })
        .is_some_and(&mut same)
    })
  }

  pub(super) fn entry_ref(&self, slot: usize) -> EntryRef {
    EntryRef {
      slot,
      generation: self.slots[slot].generation,
    }
  }

  /// Slot behind `r` if it still holds the same live entry.
  pub(super) fn resolve(&self, r: EntryRef) -> Option<usize> {
    let slot = self.slots.get(r.slot)?;
    let live = slot.generation == r.generation && slot.entry.as_ref().is_some_and(|e| !e.removed);
    live.then_some(r.slot)
  }

  /// Insert a new live entry at the LRU head.
  pub(super) fn insert(&mut self, key: u64, handle: H, info: Arc<ElementInfo>, expires_at: Instant) -> usize {
    let entry = Entry {
      info,
      key,
      handle: Some(handle),
      removed: false,
      expires_at,
      prev: None,
      next: None,
      heap_index: None,
    };
    let slot = match self.free.pop() {
      Some(slot) => {
        self.slots[slot].entry = Some(entry);
        slot
      }
      None => {
        self.slots.push(Slot {
          generation: 0,
          entry: Some(entry),
        });
        self.slots.len() - 1
      }
    };
    self.push_front(slot);
    self.lru_len += 1;
    self.heap_push(slot);
    self.buckets.entry(key).or_default().push(slot);
    slot
  }

  /// Replace info and expiry of a live entry, move it to the LRU head and re-heapify.
  pub(super) fn refresh(&mut self, slot: usize, info: Arc<ElementInfo>, expires_at: Instant) {
    let heap_index = {
      let Some(entry) = self.slots[slot].entry.as_mut() else {
        return;
      };
      entry.info = info;
      entry.expires_at = expires_at;
      entry.heap_index
    };
    self.touch(slot);
    match heap_index {
      Some(index) => self.heap_fix(index),
      None => {
        log::warn!("Cache entry missing from expiration heap; re-inserting");
        self.heap_push(slot);
      }
    }
  }

  /// Move a live entry to the LRU head.
  pub(super) fn touch(&mut self, slot: usize) {
    if self.head == Some(slot) {
      return;
    }
    self.unlink(slot);
    self.push_front(slot);
  }

  /// Detach the least recently used entry and return its handle.
  pub(super) fn evict_lru(&mut self) -> Option<H> {
    let slot = self.tail?;
    self.detach(slot)
  }

  /// Remove a live entry from the buckets and LRU, leaving a ghost in the heap.
  pub(super) fn detach(&mut self, slot: usize) -> Option<H> {
    let key = {
      let entry = self.slots[slot].entry.as_mut()?;
      if entry.removed {
        return None;
      }
      entry.removed = true;
      entry.key
    };
    self.unlink(slot);
    self.lru_len -= 1;
    if let Some(bucket) = self.buckets.get_mut(&key) {
      bucket.retain(|&s| s != slot);
      if bucket.is_empty() {
        self.buckets.remove(&key);
      }
    }
    let entry = self.slots[slot].entry.as_mut()?;
    let handle = entry.handle.take();
    if entry.heap_index.is_none() {
      self.free_slot(slot);
    }
    handle
  }

  /// Pop ghosts and expired entries off the heap top, stopping at the first live
  /// unexpired entry.
  pub(super) fn sweep_expired(&mut self, now: Instant) -> Sweep<H> {
    let mut sweep = Sweep {
      released: Vec::new(),
      expired: 0,
      ghosts: 0,
    };
    if self.heap.len() > 2 * self.capacity.max(1) {
      sweep.ghosts += self.compact_heap();
    }
    while let Some(&top) = self.heap.first() {
      let (removed, expires_at) = match self.entry(top) {
        Some(e) => (e.removed, e.expires_at),
        None => {
          log::error!("Expiration heap references an empty slot");
          self.heap_pop();
          continue;
        }
      };
      if removed {
        self.heap_pop();
        self.free_slot(top);
        sweep.ghosts += 1;
        continue;
      }
      if now <= expires_at {
        break;
      }
      self.heap_pop();
      if let Some(handle) = self.detach(top) {
        sweep.released.push(handle);
      }
      self.free_slot(top);
      sweep.expired += 1;
    }
    sweep
  }

  /// Empty every view and hand back all held handles.
  pub(super) fn drain(&mut self) -> Vec<H> {
    let handles = self
      .slots
      .drain(..)
      .filter_map(|s| s.entry.and_then(|e| e.handle))
      .collect();
    self.buckets.clear();
    self.free.clear();
    self.heap.clear();
    self.head = None;
    self.tail = None;
    self.lru_len = 0;
    handles
  }

  /// `(bucket entries, lru length, live heap entries)`.
  #[cfg(test)]
  pub(super) fn view_sizes(&self) -> (usize, usize, usize) {
    let buckets = self.buckets.values().map(Vec::len).sum();
    let live_heap = self
      .heap
      .iter()
      .filter(|&&s| self.entry(s).is_some_and(|e| !e.removed))
      .count();
    (buckets, self.lru_len, live_heap)
  }

  fn free_slot(&mut self, slot: usize) {
    let s = &mut self.slots[slot];
    if s.entry.take().is_some() {
      s.generation = s.generation.wrapping_add(1);
      self.free.push(slot);
    }
  }

  // === LRU links ===

  fn push_front(&mut self, slot: usize) {
    let old_head = self.head;
    if let Some(entry) = self.slots[slot].entry.as_mut() {
      entry.prev = None;
      entry.next = old_head;
    }
    if let Some(h) = old_head {
      if let Some(entry) = self.slots[h].entry.as_mut() {
        entry.prev = Some(slot);
      }
    }
    self.head = Some(slot);
    if self.tail.is_none() {
      self.tail = Some(slot);
    }
  }

  fn unlink(&mut self, slot: usize) {
    let Some((prev, next)) = self.slots[slot].entry.as_mut().map(|e| (e.prev.take(), e.next.take()))
    else {
      return;
    };
    match prev {
      Some(p) => {
        if let Some(entry) = self.slots[p].entry.as_mut() {
          entry.next = next;
        }
      }
      None => self.head = next,
    }
    match next {
      Some(n) => {
        if let Some(entry) = self.slots[n].entry.as_mut() {
          entry.prev = prev;
        }
      }
      None => self.tail = prev,
    }
  }

  // === Expiration heap ===

  /// Free every ghost in the heap and re-heapify the live entries. Returns the
  /// number of ghosts freed.
  fn compact_heap(&mut self) -> usize {
    let mut ghosts = 0;
    for slot in std::mem::take(&mut self.heap) {
      if self.entry(slot).is_some_and(|e| !e.removed) {
        self.heap.push(slot);
      } else {
        self.free_slot(slot);
        ghosts += 1;
      }
    }
    for position in 0..self.heap.len() {
      self.set_heap_index(position);
    }
    for position in (0..self.heap.len() / 2).rev() {
      self.sift_down(position);
    }
    ghosts
  }

  fn expiry(&self, slot: usize) -> Option<Instant> {
    self.entry(slot).map(|e| e.expires_at)
  }

  fn heap_less(&self, a: usize, b: usize) -> bool {
    self.expiry(self.heap[a]) < self.expiry(self.heap[b])
  }

  fn set_heap_index(&mut self, position: usize) {
    let slot = self.heap[position];
    if let Some(entry) = self.slots[slot].entry.as_mut() {
      entry.heap_index = Some(position);
    }
  }

  fn heap_swap(&mut self, a: usize, b: usize) {
    self.heap.swap(a, b);
    self.set_heap_index(a);
    self.set_heap_index(b);
  }

  fn heap_push(&mut self, slot: usize) {
    self.heap.push(slot);
    let position = self.heap.len() - 1;
    self.set_heap_index(position);
    self.sift_up(position);
  }

  fn heap_pop(&mut self) -> Option<usize> {
    if self.heap.is_empty() {
      return None;
    }
    let last = self.heap.len() - 1;
    self.heap_swap(0, last);
    let slot = self.heap.pop()?;
    if let Some(entry) = self.slots[slot].entry.as_mut() {
      entry.heap_index = None;
    }
    if !self.heap.is_empty() {
      self.sift_down(0);
    }
    Some(slot)
  }

  fn heap_fix(&mut self, position: usize) {
    if !self.sift_up(position) {
      self.sift_down(position);
    }
  }

  /// Returns whether the element moved.
  fn sift_up(&mut self, mut position: usize) -> bool {
    let start = position;
    while position > 0 {
      let parent = (position - 1) / 2;
      if !self.heap_less(position, parent) {
        break;
      }
      self.heap_swap(position, parent);
      position = parent;
    }
    position != start
  }

  fn sift_down(&mut self, mut position: usize) {
    let len = self.heap.len();
    loop {
      let left = 2 * position + 1;
      if left >= len {
        break;
      }
      let right = left + 1;
      let smallest = if right < len && self.heap_less(right, left) {
        right
      } else {
        left
      };
      if !self.heap_less(smallest, position) {
        break;
      }
      self.heap_swap(position, smallest);
      position = smallest;
    }
  }
}
