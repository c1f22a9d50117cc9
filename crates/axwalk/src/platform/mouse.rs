/*!
Left-button state shared across actions.

A `mouse_down` leaves the button held until a matching `mouse_up`. Any action that
needs a clean button state (right/middle click, scroll) releases a held button first.
*/

use parking_lot::Mutex;

use super::Bridge;
use crate::types::{AxError, AxResult, Point};

#[derive(Debug, Default, Clone, Copy)]
struct Held {
  down: bool,
  position: Option<Point>,
}

/// Whether the left button is currently held by us, and where it went down.
#[derive(Debug, Default)]
pub struct MouseState {
  held: Mutex<Held>,
}

impl MouseState {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn set_left_down(&self, point: Point) {
    *self.held.lock() = Held {
      down: true,
      position: Some(point),
    };
  }

  pub fn clear(&self) {
    *self.held.lock() = Held::default();
  }

  pub fn is_left_down(&self) -> bool {
    self.held.lock().down
  }

  pub fn last_down_position(&self) -> Option<Point> {
    self.held.lock().position
  }

  /// Release a held left button at the point it went down.
  ///
  /// The state is cleared even when the release event fails.
  pub fn ensure_mouse_up<B: Bridge>(&self, bridge: &B) -> AxResult<()> {
    let held = std::mem::take(&mut *self.held.lock());
    if !held.down {
      return Ok(());
    }
    let point = held.position.unwrap_or_else(|| bridge.cursor_position());
    log::debug!("Releasing held left button at ({}, {})", point.x, point.y);
    bridge
      .left_mouse_up(point)
      .map_err(|e| AxError::from(e).context("failed to release held mouse button"))
  }
}
