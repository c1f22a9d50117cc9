/*!
`clickable_elements`: runs the planned surfaces concurrently and merges them.

At most [`MAX_CONCURRENT_SURFACES`] surfaces query the platform at once. The first
failure (in completion order) is kept while the remaining surfaces finish. A
stale-element failure still returns the surfaces that succeeded; any other
failure releases every collected handle and is returned.
*/

use std::thread;

use crossbeam::channel::{bounded, Receiver, Sender};
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use super::convert::{release_collected, Collected};
use super::surfaces::Surface;
use super::{check_cancel, Navigator, Settings};
use crate::platform::Bridge;
use crate::types::{AxError, AxResult, DomainElement, ElementFilter};

pub(super) const MAX_CONCURRENT_SURFACES: usize = 3;

/// Counting semaphore over a bounded channel of tokens.
struct Semaphore {
  tokens: Receiver<()>,
  returns: Sender<()>,
}

impl Semaphore {
  fn new(permits: usize) -> Self {
    let (returns, tokens) = bounded(permits);
    for _ in 0..permits {
      // Cannot fail: the channel has room for every permit.
      let _ = returns.send(());
    }
    Self { tokens, returns }
  }

  fn acquire(&self) -> Permit<'_> {
    // Cannot disconnect while `self` holds the sender.
    let _ = self.tokens.recv();
    Permit(self)
  }
}

struct Permit<'a>(&'a Semaphore);

impl Drop for Permit<'_> {
  fn drop(&mut self) {
    let _ = self.0.returns.send(());
  }
}

impl<B: Bridge> Navigator<B> {
  /// Clickable elements of the frontmost window and of the surfaces `filter` enables.
  ///
  /// Handles behind the previous call's elements are released first; the handles
  /// behind the returned elements are held until the next call,
  /// [`Navigator::forget_elements`] or [`Navigator::shutdown`]. Elements reported
  /// by two surfaces are returned once.
  pub fn clickable_elements(
    &self,
    filter: &ElementFilter,
    cancel: &CancellationToken,
  ) -> AxResult<Vec<DomainElement>> {
    check_cancel(cancel)?;
    let released = self.retained.clear();
    if released > 0 {
      log::debug!("Released {released} elements from the previous query");
    }

    let settings = self.settings_snapshot();
    let surfaces = Surface::plan(filter, self.bridge.mission_control_active());
    let collected = self.run_surfaces(&surfaces, filter, &settings, cancel)?;

    let elements = self.retained.replace(collected);
    log::debug!(
      "Found {} clickable elements across {} surfaces, {:?}",
      elements.len(),
      surfaces.len(),
      self.cache.stats()
    );
    Ok(elements)
  }

  fn run_surfaces(
    &self,
    surfaces: &[Surface],
    filter: &ElementFilter,
    settings: &Settings,
    cancel: &CancellationToken,
  ) -> AxResult<Collected<B::Handle>> {
    let semaphore = Semaphore::new(MAX_CONCURRENT_SURFACES);
    let slots: Vec<Mutex<Option<Collected<B::Handle>>>> =
      surfaces.iter().map(|_| Mutex::new(None)).collect();
    let first_error: Mutex<Option<AxError>> = Mutex::new(None);

    thread::scope(|scope| {
      for (surface, slot) in surfaces.iter().zip(&slots) {
        let semaphore = &semaphore;
        let first_error = &first_error;
        let run = move || {
          let _permit = semaphore.acquire();
          if cancel.is_cancelled() {
            first_error.lock().get_or_insert(AxError::Cancelled);
            return;
          }
          match self.query_surface(surface, filter, settings, cancel) {
            Ok(collected) => *slot.lock() = Some(collected),
            Err(e) => {
              log::warn!("Surface {surface} failed: {e}");
              first_error
                .lock()
                .get_or_insert_with(|| e.context(format!("failed to get elements from {surface}")));
            }
          }
        };
        let spawned = thread::Builder::new()
          .name("axwalk-surface".into())
          .spawn_scoped(scope, run);
        if let Err(e) = spawned {
          first_error
            .lock()
            .get_or_insert_with(|| AxError::Internal(format!("failed to spawn surface query: {e}")));
        }
      }
    });

    let merged: Collected<B::Handle> = slots
      .into_iter()
      .filter_map(Mutex::into_inner)
      .flatten()
      .collect();

    if cancel.is_cancelled() {
      release_collected(&*self.bridge, merged);
      return Err(AxError::Cancelled);
    }
    match first_error.into_inner() {
      Some(e) if matches!(e.root(), AxError::ElementInvalidated(_)) => {
        log::warn!("Returning partial results: {e}");
        Ok(merged)
      }
      Some(e) => {
        release_collected(&*self.bridge, merged);
        Err(e)
      }
      None => Ok(merged),
    }
  }
}
