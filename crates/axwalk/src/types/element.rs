/*!
Element snapshots.

`ElementInfo` is what the platform reports about a single node. It is immutable once
built and shared behind `Arc` between tree nodes and the info cache.

`DomainElement` is the flattened descriptor handed to the overlay.
*/

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::{Bounds, ElementId, Point, ProcessId};
use crate::a11y::Role;

/// Attributes fetched from a platform element.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementInfo {
  pub position: Point,
  pub width: f64,
  pub height: f64,
  pub title: Option<String>,
  pub role: Role,
  pub role_description: Option<String>,
  pub enabled: bool,
  pub focused: bool,
  pub pid: Option<ProcessId>,
}

impl ElementInfo {
  /// Info with the given role and frame, enabled and unfocused.
  pub fn new(role: Role, bounds: Bounds) -> Self {
    Self {
      position: Point::new(bounds.x, bounds.y),
      width: bounds.w,
      height: bounds.h,
      role,
      enabled: true,
      ..Self::default()
    }
  }

  #[must_use]
  pub fn with_title(mut self, title: impl Into<String>) -> Self {
    self.title = Some(title.into());
    self
  }

  #[must_use]
  pub fn with_role_description(mut self, description: impl Into<String>) -> Self {
    self.role_description = Some(description.into());
    self
  }

  #[must_use]
  pub const fn with_pid(mut self, pid: ProcessId) -> Self {
    self.pid = Some(pid);
    self
  }

  pub fn bounds(&self) -> Bounds {
    Bounds::new(self.position.x, self.position.y, self.width, self.height)
  }
}

/// Clickable element descriptor returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DomainElement {
  pub id: ElementId,
  pub bounds: Bounds,
  /// Platform role string, e.g. `AXButton`.
  pub role: String,
  pub title: Option<String>,
  pub description: Option<String>,
  pub clickable: bool,
}

impl DomainElement {
  /// Point that actions targeting this element should land on.
  pub fn target_point(&self) -> Point {
    self.bounds.center()
  }
}
