/*!
Recursive quadrant subdivision for pointer targeting.

Each selection narrows the active area to one quarter of the previous one until
a quarter would fall below `min_size` or `max_depth` selections have been made.
Coordinates are whole pixels: halves are floored.

```ignore
let mut grid = QuadGrid::new(screen, 25.0, 10);
let (center, complete) = grid.select(Quadrant::TopLeft);
```
*/

#![allow(missing_docs)]

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::types::{Bounds, Point};

/// One of the four divisions of the active area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum Quadrant {
  TopLeft,
  TopRight,
  BottomLeft,
  BottomRight,
}

impl Quadrant {
  pub const ALL: [Self; 4] = [
    Self::TopLeft,
    Self::TopRight,
    Self::BottomLeft,
    Self::BottomRight,
  ];

  /// Quadrant for a position in a four-key mapping such as `"uijk"`.
  pub fn from_key(keys: &str, key: char) -> Option<Self> {
    if keys.chars().count() != Self::ALL.len() {
      return None;
    }
    let lower = key.to_ascii_lowercase();
    keys
      .chars()
      .position(|k| k.to_ascii_lowercase() == lower)
      .and_then(|i| Self::ALL.get(i).copied())
  }
}

/// Default key mapping, in [`Quadrant::ALL`] order.
pub const DEFAULT_KEYS: &str = "uijk";

fn half(length: f64) -> f64 {
  (length / 2.0).floor()
}

fn center_of(bounds: &Bounds) -> Point {
  Point::new(bounds.x + half(bounds.w), bounds.y + half(bounds.h))
}

/// Selection state over a fixed initial area.
#[derive(Debug, Clone)]
pub struct QuadGrid {
  initial: Bounds,
  current: Bounds,
  min_size: f64,
  max_depth: usize,
  history: Vec<Bounds>,
}

impl QuadGrid {
  pub fn new(bounds: Bounds, min_size: f64, max_depth: usize) -> Self {
    Self {
      initial: bounds,
      current: bounds,
      min_size,
      max_depth,
      history: Vec::with_capacity(max_depth),
    }
  }

  /// The four quarters of the active area, in [`Quadrant::ALL`] order.
  pub fn divide(&self) -> [Bounds; 4] {
    let Bounds { x, y, w, h } = self.current;
    let mid_x = x + half(w);
    let mid_y = y + half(h);
    let (max_x, max_y) = (x + w, y + h);
    [
      Bounds::from_corners(x, y, mid_x, mid_y),
      Bounds::from_corners(mid_x, y, max_x, mid_y),
      Bounds::from_corners(x, mid_y, mid_x, max_y),
      Bounds::from_corners(mid_x, mid_y, max_x, max_y),
    ]
  }

  pub fn quadrant_bounds(&self, quadrant: Quadrant) -> Bounds {
    let [top_left, top_right, bottom_left, bottom_right] = self.divide();
    match quadrant {
      Quadrant::TopLeft => top_left,
      Quadrant::TopRight => top_right,
      Quadrant::BottomLeft => bottom_left,
      Quadrant::BottomRight => bottom_right,
    }
  }

  pub fn quadrant_center(&self, quadrant: Quadrant) -> Point {
    center_of(&self.quadrant_bounds(quadrant))
  }

  /// Whether another selection would narrow the area.
  pub fn can_divide(&self) -> bool {
    self.depth() < self.max_depth
      && half(self.current.w) >= self.min_size
      && half(self.current.h) >= self.min_size
  }

  /// Narrow to `quadrant`. Returns its centre and whether selection is complete.
  ///
  /// When the area cannot be divided, the centre of the quadrant is returned
  /// without narrowing.
  pub fn select(&mut self, quadrant: Quadrant) -> (Point, bool) {
    let selected = self.quadrant_bounds(quadrant);
    if !self.can_divide() {
      return (center_of(&selected), true);
    }
    self.history.push(self.current);
    self.current = selected;
    (center_of(&selected), !self.can_divide())
  }

  /// Undo the last selection. Returns false when nothing was selected.
  pub fn backtrack(&mut self) -> bool {
    match self.history.pop() {
      Some(previous) => {
        self.current = previous;
        true
      }
      None => false,
    }
  }

  pub fn reset(&mut self) {
    self.current = self.initial;
    self.history.clear();
  }

  pub fn is_complete(&self) -> bool {
    !self.can_divide()
  }

  pub const fn current_bounds(&self) -> Bounds {
    self.current
  }

  pub fn current_center(&self) -> Point {
    center_of(&self.current)
  }

  pub fn depth(&self) -> usize {
    self.history.len()
  }

  pub fn has_history(&self) -> bool {
    !self.history.is_empty()
  }
}
