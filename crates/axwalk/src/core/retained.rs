/*!
Handles behind the most recently returned elements.

Each `clickable_elements` call replaces the previous generation. The table releases
what it holds when replaced, when cleared and when dropped.
*/

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::platform::Bridge;
use crate::types::{DomainElement, ElementId};

/// Retained handles keyed by element id. Ids derive from the bridge hash, so a
/// bucket can hold distinct elements whose hashes collide.
pub(super) struct RetainedElements<B: Bridge> {
  bridge: Arc<B>,
  handles: Mutex<HashMap<ElementId, Vec<B::Handle>>>,
}

impl<B: Bridge> RetainedElements<B> {
  pub(super) fn new(bridge: Arc<B>) -> Self {
    Self {
      bridge,
      handles: Mutex::new(HashMap::new()),
    }
  }

  /// Take ownership of a new generation, releasing the previous one.
  ///
  /// An element the bridge reports as the same as one already taken is dropped
  /// from the result and its handle released.
  pub(super) fn replace(&self, collected: Vec<(DomainElement, B::Handle)>) -> Vec<DomainElement> {
    let mut next: HashMap<ElementId, Vec<B::Handle>> = HashMap::with_capacity(collected.len());
    let mut elements = Vec::with_capacity(collected.len());
    let mut duplicates = Vec::new();
    for (element, handle) in collected {
      let bucket = next.entry(element.id.clone()).or_default();
      if bucket.iter().any(|held| self.bridge.same_element(held, &handle)) {
        duplicates.push(handle);
        continue;
      }
      bucket.push(handle);
      elements.push(element);
    }

    let previous = std::mem::replace(&mut *self.handles.lock(), next);
    if !duplicates.is_empty() {
      log::debug!("Dropped {} duplicate elements", duplicates.len());
    }
    for handle in duplicates.into_iter().chain(previous.into_values().flatten()) {
      self.bridge.release(handle);
    }
    elements
  }

  pub(super) fn clear(&self) -> usize {
    let previous = std::mem::take(&mut *self.handles.lock());
    let mut count = 0;
    for handle in previous.into_values().flatten() {
      self.bridge.release(handle);
      count += 1;
    }
    count
  }

  pub(super) fn len(&self) -> usize {
    self.handles.lock().values().map(Vec::len).sum()
  }
}

impl<B: Bridge> Drop for RetainedElements<B> {
  fn drop(&mut self) {
    self.clear();
  }
}
