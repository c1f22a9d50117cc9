/*! Geometry types for screen coordinates. */

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Rectangle bounds in screen coordinates (origin top-left).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, TS)]
#[ts(export)]
pub struct Bounds {
  pub x: f64,
  pub y: f64,
  pub w: f64,
  pub h: f64,
}

impl Bounds {
  pub const fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
    Self { x, y, w, h }
  }

  /// Bounds spanning two corners, `(min_x, min_y)` to `(max_x, max_y)`.
  pub fn from_corners(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
    Self {
      x: min_x,
      y: min_y,
      w: max_x - min_x,
      h: max_y - min_y,
    }
  }

  pub fn max_x(&self) -> f64 {
    self.x + self.w
  }

  pub fn max_y(&self) -> f64 {
    self.y + self.h
  }

  pub fn area(&self) -> f64 {
    if self.is_empty() {
      0.0
    } else {
      self.w * self.h
    }
  }

  /// Zero or negative width/height.
  pub fn is_empty(&self) -> bool {
    self.w <= 0.0 || self.h <= 0.0
  }

  /// Check if two rectangles share a region of positive area.
  ///
  /// Touching edges do not count as overlap, and an empty rectangle overlaps nothing.
  pub fn overlaps(&self, other: &Bounds) -> bool {
    !self.is_empty()
      && !other.is_empty()
      && self.x < other.max_x()
      && other.x < self.max_x()
      && self.y < other.max_y()
      && other.y < self.max_y()
  }

  /// Check if a point is contained within these bounds.
  pub fn contains(&self, point: Point) -> bool {
    point.x >= self.x && point.x <= self.max_x() && point.y >= self.y && point.y <= self.max_y()
  }

  pub fn center(&self) -> Point {
    Point::new(self.x + self.w / 2.0, self.y + self.h / 2.0)
  }
}

/// A 2D point in screen coordinates.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, TS)]
#[ts(export)]
pub struct Point {
  pub x: f64,
  pub y: f64,
}

impl Point {
  pub const fn new(x: f64, y: f64) -> Self {
    Self { x, y }
  }

  /// Offset this point by a delta.
  pub fn offset(&self, dx: f64, dy: f64) -> Self {
    Self::new(self.x + dx, self.y + dy)
  }
}

/// Width and height pair used for minimum-size filtering.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, TS)]
#[ts(export)]
pub struct Size {
  pub w: f64,
  pub h: f64,
}

impl Size {
  pub const fn new(w: f64, h: f64) -> Self {
    Self { w, h }
  }

  /// True when `bounds` is at least this large in both dimensions.
  pub fn fits(&self, bounds: &Bounds) -> bool {
    bounds.w >= self.w && bounds.h >= self.h
  }
}

impl Default for Size {
  fn default() -> Self {
    Self::new(1.0, 1.0)
  }
}


#[cfg(test)]
mod proptests {
  use super::*;
  use proptest::prelude::*;

  fn coord() -> impl Strategy<Value = f64> {
    -10000.0..10000.0f64
  }

  fn dimension() -> impl Strategy<Value = f64> {
    0.0..5000.0f64
  }

  proptest! {
    /// Overlap is symmetric
    #[test]
    fn overlaps_symmetric(
      x1 in coord(), y1 in coord(), w1 in dimension(), h1 in dimension(),
      x2 in coord(), y2 in coord(), w2 in dimension(), h2 in dimension(),
    ) {
      let a = Bounds::new(x1, y1, w1, h1);
      let b = Bounds::new(x2, y2, w2, h2);
      prop_assert_eq!(a.overlaps(&b), b.overlaps(&a));
    }

    /// A non-empty rectangle overlaps itself and contains its own center
    #[test]
    fn non_empty_overlaps_self(x in coord(), y in coord(), w in 1.0..5000.0f64, h in 1.0..5000.0f64) {
      let bounds = Bounds::new(x, y, w, h);
      prop_assert!(bounds.overlaps(&bounds));
      prop_assert!(bounds.contains(bounds.center()));
    }
  }
}
