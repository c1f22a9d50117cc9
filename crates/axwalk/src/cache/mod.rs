/*!
Bounded, TTL-expiring cache of element info keyed by element identity.

```ignore
let cache = InfoCache::new(Arc::clone(&bridge), CacheConfig::default());
if cache.get(&handle).is_none() {
  cache.set(&handle, Arc::new(bridge.info(&handle)?));
}
```

- Capacity is enforced with LRU eviction before every insert.
- Expiry is per role class: long TTL for static controls and content, short TTL for
  everything else. A background thread sweeps expired entries on a fixed tick.
- The cache owns one cloned handle per entry and releases it on eviction, expiry,
  `clear` and `stop`. Bridge clone/release calls never run under the cache lock;
  only the local identity checks (`hash`, `same_element`) do.
- Reads take the shared lock. Recency promotion from reads is queued in a bounded
  buffer and applied by the next writer; promotions are dropped when it is full.
*/

mod index;
mod stats;

pub use stats::CacheStatsSnapshot;

use std::fmt;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crossbeam::channel::{self, Sender};
use crossbeam::queue::ArrayQueue;
use parking_lot::{Mutex, RwLock};

use crate::config::CacheConfig;
use crate::platform::Bridge;
use crate::types::ElementInfo;
use index::{CacheIndex, EntryRef};
use stats::CacheStats;

/// Capacity of the read-side promotion buffer.
const PROMOTION_BUFFER_SIZE: usize = 64;

struct CacheState<H> {
  stopped: bool,
  index: CacheIndex<H>,
}

struct Shared<B: Bridge> {
  bridge: Arc<B>,
  config: CacheConfig,
  state: RwLock<CacheState<B::Handle>>,
  promotions: ArrayQueue<EntryRef>,
  stats: CacheStats,
}

/// Background sweeper. Dropping it stops and joins the thread.
struct CleanupWorker {
  stop: Option<Sender<()>>,
  thread: Option<JoinHandle<()>>,
}

impl Drop for CleanupWorker {
  fn drop(&mut self) {
    drop(self.stop.take());
    if let Some(thread) = self.thread.take() {
      if thread.join().is_err() {
        log::error!("Cache cleanup thread panicked");
      }
    }
  }
}

/// Element-info cache with LRU capacity and per-role TTL expiry.
pub struct InfoCache<B: Bridge> {
  shared: Arc<Shared<B>>,
  cleanup: Mutex<Option<CleanupWorker>>,
}

impl<B: Bridge> fmt::Debug for InfoCache<B> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("InfoCache")
      .field("config", &self.shared.config)
      .field("stats", &self.stats())
      .finish_non_exhaustive()
  }
}

impl<B: Bridge> InfoCache<B> {
  /// Create a cache and start its cleanup thread.
  pub fn new(bridge: Arc<B>, config: CacheConfig) -> Self {
    let shared = Arc::new(Shared {
      bridge,
      state: RwLock::new(CacheState {
        stopped: false,
        index: CacheIndex::with_capacity(config.max_size),
      }),
      config,
      promotions: ArrayQueue::new(PROMOTION_BUFFER_SIZE),
      stats: CacheStats::default(),
    });
    let cleanup = spawn_cleanup(&shared);
    Self {
      shared,
      cleanup: Mutex::new(cleanup),
    }
  }

  /// Cached info for `handle`, if present and unexpired.
  pub fn get(&self, handle: &B::Handle) -> Option<Arc<ElementInfo>> {
    let shared = &*self.shared;
    let key = shared.bridge.hash(handle);
    let now = Instant::now();

    {
      let state = shared.state.read();
      if state.stopped {
        CacheStats::bump(&shared.stats.misses);
        return None;
      }
      let Some(slot) = state.index.find(key, |c| shared.bridge.same_element(handle, c)) else {
        CacheStats::bump(&shared.stats.misses);
        return None;
      };
      if let Some(entry) = state.index.entry(slot).filter(|e| now <= e.expires_at) {
        let info = Arc::clone(&entry.info);
        if shared.promotions.push(state.index.entry_ref(slot)).is_err() {
          CacheStats::bump(&shared.stats.dropped_promotions);
        }
        CacheStats::bump(&shared.stats.hits);
        return Some(info);
      }
    }

    // Expired under the read lock: re-check under the write lock.
    let (info, expired) = {
      let mut state = shared.state.write();
      if state.stopped {
        (None, None)
      } else {
        shared.apply_promotions(&mut state.index);
        match state.index.find(key, |c| shared.bridge.same_element(handle, c)) {
          None => (None, None),
          Some(slot) => {
            let fresh = state
              .index
              .entry(slot)
              .filter(|e| now <= e.expires_at)
              .map(|e| Arc::clone(&e.info));
            match fresh {
              Some(info) => {
                state.index.touch(slot);
                (Some(info), None)
              }
              None => (None, state.index.detach(slot)),
            }
          }
        }
      }
    };

    if let Some(h) = expired {
      CacheStats::bump(&shared.stats.expired);
      shared.bridge.release(h);
    }
    if info.is_some() {
      CacheStats::bump(&shared.stats.hits);
    } else {
      CacheStats::bump(&shared.stats.misses);
    }
    info
  }

  /// Store info for `handle`, replacing any existing entry for the same element.
  ///
  /// The cache keeps its own clone of the handle; the caller's handle is not retained.
  pub fn set(&self, handle: &B::Handle, info: Arc<ElementInfo>) {
    let shared = &*self.shared;
    if shared.state.read().stopped {
      return;
    }
    let key = shared.bridge.hash(handle);
    let expires_at = Instant::now() + shared.config.ttl_for(&info.role);

    let mut owned = match shared.bridge.clone_handle(handle) {
      Ok(clone) => Some(clone),
      Err(e) => {
        CacheStats::bump(&shared.stats.clone_failures);
        log::debug!("Not caching element info, handle clone failed: {e}");
        None
      }
    };

    let mut released = Vec::new();
    {
      let mut state = shared.state.write();
      if !state.stopped {
        shared.apply_promotions(&mut state.index);
        if let Some(slot) = state.index.find(key, |c| shared.bridge.same_element(handle, c)) {
          state.index.refresh(slot, info, expires_at);
          CacheStats::bump(&shared.stats.updates);
        } else if let Some(clone) = owned.take() {
          let max_size = shared.config.max_size.max(1);
          while state.index.len() >= max_size {
            match state.index.evict_lru() {
              Some(evicted) => {
                released.push(evicted);
                CacheStats::bump(&shared.stats.evictions);
              }
              None => break,
            }
          }
          state.index.insert(key, clone, info, expires_at);
          CacheStats::bump(&shared.stats.inserts);
        }
      }
    }

    released.extend(owned);
    for h in released {
      shared.bridge.release(h);
    }
  }

  /// Number of live entries.
  pub fn size(&self) -> usize {
    let state = self.shared.state.read();
    if state.stopped {
      0
    } else {
      state.index.len()
    }
  }

  /// Drop every entry, releasing the cached handles.
  pub fn clear(&self) {
    let handles = {
      let mut state = self.shared.state.write();
      while self.shared.promotions.pop().is_some() {}
      state.index.drain()
    };
    log::debug!("Info cache cleared ({} handles released)", handles.len());
    for h in handles {
      self.shared.bridge.release(h);
    }
  }

  /// Stop the cleanup thread and release everything. Later calls are no-ops and
  /// `get` misses.
  pub fn stop(&self) {
    let handles = {
      let mut state = self.shared.state.write();
      if state.stopped {
        return;
      }
      state.stopped = true;
      while self.shared.promotions.pop().is_some() {}
      state.index.drain()
    };
    drop(self.cleanup.lock().take());
    log::debug!("Info cache stopped ({} handles released)", handles.len());
    for h in handles {
      self.shared.bridge.release(h);
    }
  }

  pub fn is_stopped(&self) -> bool {
    self.shared.state.read().stopped
  }

  /// Run one expiry sweep now. Returns the number of entries expired.
  pub fn purge_expired(&self) -> usize {
    self.shared.purge_expired(Instant::now())
  }

  pub fn stats(&self) -> CacheStatsSnapshot {
    self.shared.stats.snapshot(self.size())
  }

  #[cfg(test)]
  fn view_sizes(&self) -> (usize, usize, usize) {
    self.shared.state.read().index.view_sizes()
  }
}

impl<B: Bridge> Drop for InfoCache<B> {
  fn drop(&mut self) {
    self.stop();
  }
}

impl<B: Bridge> Shared<B> {
  fn apply_promotions(&self, index: &mut CacheIndex<B::Handle>) {
    while let Some(r) = self.promotions.pop() {
      if let Some(slot) = index.resolve(r) {
        index.touch(slot);
      }
    }
  }

  fn purge_expired(&self, now: Instant) -> usize {
    let sweep = {
      let mut state = self.state.write();
      if state.stopped {
        return 0;
      }
      self.apply_promotions(&mut state.index);
      state.index.sweep_expired(now)
    };
    let expired = sweep.expired;
    for h in sweep.released {
      self.bridge.release(h);
    }
    if expired > 0 || sweep.ghosts > 0 {
      CacheStats::add(&self.stats.expired, expired);
      let size = self.state.read().index.len();
      log::debug!(
        "Info cache sweep: expired={expired} ghosts={} size={size} stats={:?}",
        sweep.ghosts,
        self.stats.snapshot(size)
      );
    }
    expired
  }
}

fn spawn_cleanup<B: Bridge>(shared: &Arc<Shared<B>>) -> Option<CleanupWorker> {
  let (stop_tx, stop_rx) = channel::bounded::<()>(0);
  let ticker = channel::tick(shared.config.cleanup_interval());
  let worker = Arc::clone(shared);

  let spawned = thread::Builder::new()
    .name("axwalk-cache-cleanup".into())
    .spawn(move || loop {
      crossbeam::select! {
        recv(ticker) -> _ => {
          worker.purge_expired(Instant::now());
        }
        recv(stop_rx) -> _ => break,
      }
    });

  match spawned {
    Ok(thread) => Some(CleanupWorker {
      stop: Some(stop_tx),
      thread: Some(thread),
    }),
    Err(e) => {
      log::error!("Failed to spawn cache cleanup thread, expiry is lazy only: {e}");
      None
    }
  }
}
