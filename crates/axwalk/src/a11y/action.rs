/*!
Pointer actions the overlay can perform at a screen point.
*/

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::types::AxError;

/// Action to perform at a point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum ActionKind {
  LeftClick,
  RightClick,
  MiddleClick,
  MouseDown,
  MouseUp,
  MoveMouse,
  MoveMouseRelative,
  Scroll,
}

impl ActionKind {
  /// Every action kind, in declaration order.
  pub const ALL: [Self; 8] = [
    Self::LeftClick,
    Self::RightClick,
    Self::MiddleClick,
    Self::MouseDown,
    Self::MouseUp,
    Self::MoveMouse,
    Self::MoveMouseRelative,
    Self::Scroll,
  ];

  pub const fn as_str(self) -> &'static str {
    match self {
      Self::LeftClick => "left_click",
      Self::RightClick => "right_click",
      Self::MiddleClick => "middle_click",
      Self::MouseDown => "mouse_down",
      Self::MouseUp => "mouse_up",
      Self::MoveMouse => "move_mouse",
      Self::MoveMouseRelative => "move_mouse_relative",
      Self::Scroll => "scroll",
    }
  }

  pub const fn is_click(self) -> bool {
    matches!(self, Self::LeftClick | Self::RightClick | Self::MiddleClick)
  }

  /// Press or release of the left button, held across calls.
  pub const fn is_mouse_button(self) -> bool {
    matches!(self, Self::MouseDown | Self::MouseUp)
  }

  pub const fn is_move_mouse(self) -> bool {
    matches!(self, Self::MoveMouse | Self::MoveMouseRelative)
  }

  pub const fn is_scroll(self) -> bool {
    matches!(self, Self::Scroll)
  }
}

impl fmt::Display for ActionKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for ActionKind {
  type Err = AxError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Self::ALL
      .into_iter()
      .find(|kind| kind.as_str() == s)
      .ok_or_else(|| AxError::InvalidInput(format!("unknown action: {s}")))
  }
}

/// Physical mouse button for click primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
  Left,
  Right,
  Middle,
}

impl ActionKind {
  /// Button a click action presses, if any.
  pub const fn click_button(self) -> Option<MouseButton> {
    match self {
      Self::LeftClick => Some(MouseButton::Left),
      Self::RightClick => Some(MouseButton::Right),
      Self::MiddleClick => Some(MouseButton::Middle),
      _ => None,
    }
  }
}
