/*!
Pointer actions (write to OS).
*/

use tokio_util::sync::CancellationToken;

use super::{check_cancel, Navigator};
use crate::a11y::ActionKind;
use crate::platform::{Bridge, BridgeError};
use crate::types::{AxError, AxResult, Bounds, DomainElement, Point};

fn action_error(action: ActionKind, err: BridgeError) -> AxError {
  match err {
    BridgeError::PermissionDenied => AxError::PermissionDenied,
    other => AxError::ActionFailed {
      action,
      reason: other.to_string(),
    },
  }
}

impl<B: Bridge> Navigator<B> {
  /// Perform a pointer action at a screen point.
  ///
  /// Right and middle clicks release a held left button first. `MoveMouseRelative`
  /// expects the already resolved absolute point. `Scroll` is rejected; use
  /// [`Navigator::scroll`].
  pub fn perform_action(
    &self,
    action: ActionKind,
    point: Point,
    cancel: &CancellationToken,
  ) -> AxResult<()> {
    check_cancel(cancel)?;
    log::info!("Performing {action} at ({}, {})", point.x, point.y);
    let bridge = &*self.bridge;
    let restore = self.settings.read().restore_cursor;

    match action {
      ActionKind::LeftClick | ActionKind::RightClick | ActionKind::MiddleClick => {
        let Some(button) = action.click_button() else {
          return Err(AxError::Internal(format!("{action} has no mouse button")));
        };
        if action != ActionKind::LeftClick {
          self.mouse.ensure_mouse_up(bridge)?;
        }
        bridge
          .click(button, point, restore)
          .map_err(|e| action_error(action, e))
      }
      ActionKind::MouseDown => {
        self.mouse.set_left_down(point);
        bridge.left_mouse_down(point).map_err(|e| {
          self.mouse.clear();
          action_error(action, e)
        })
      }
      ActionKind::MouseUp => {
        self.mouse.clear();
        bridge
          .left_mouse_up(point)
          .map_err(|e| action_error(action, e))
      }
      ActionKind::MoveMouse | ActionKind::MoveMouseRelative => {
        bridge.move_cursor(point, false);
        Ok(())
      }
      ActionKind::Scroll => Err(AxError::InvalidInput(
        "scroll is not a point action, use scroll(dx, dy)".into(),
      )),
    }
  }

  /// Perform a pointer action at the centre of an element.
  pub fn perform_action_on_element(
    &self,
    element: &DomainElement,
    action: ActionKind,
    cancel: &CancellationToken,
  ) -> AxResult<()> {
    self.perform_action(action, element.target_point(), cancel)
  }

  /// Scroll at the cursor by line deltas, releasing a held left button first.
  pub fn scroll(&self, dx: i32, dy: i32, cancel: &CancellationToken) -> AxResult<()> {
    check_cancel(cancel)?;
    self.mouse.ensure_mouse_up(&*self.bridge)?;
    self
      .bridge
      .scroll(dx, dy)
      .map_err(|e| action_error(ActionKind::Scroll, e))
  }

  /// Move the cursor, optionally without animated movement.
  pub fn move_cursor(
    &self,
    point: Point,
    bypass_smooth: bool,
    cancel: &CancellationToken,
  ) -> AxResult<()> {
    check_cancel(cancel)?;
    self.bridge.move_cursor(point, bypass_smooth);
    Ok(())
  }

  /// Current cursor position in screen coordinates.
  pub fn cursor_position(&self, cancel: &CancellationToken) -> AxResult<Point> {
    check_cancel(cancel)?;
    Ok(self.bridge.cursor_position())
  }

  /// Bounds of the screen holding the cursor.
  pub fn screen_bounds(&self, cancel: &CancellationToken) -> AxResult<Bounds> {
    check_cancel(cancel)?;
    Ok(self.bridge.active_screen_bounds())
  }

  /// Whether a `MouseDown` is waiting for its `MouseUp`.
  pub fn is_left_mouse_down(&self) -> bool {
    self.mouse.is_left_down()
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use super::super::test_support::{desktop, navigator};
  use super::*;
  use crate::a11y::MouseButton;
  use crate::platform::mock::RecordedInput;
  use crate::types::{ElementId, ErrorCode};

  fn at(x: f64, y: f64) -> Point {
    Point::new(x, y)
  }

  mod click_tests {
    use super::*;

    #[test]
    fn clicks_map_to_buttons() {
      let bridge = desktop();
      let nav = navigator(&bridge);
      let cancel = CancellationToken::new();
      nav.perform_action(ActionKind::LeftClick, at(1.0, 2.0), &cancel).unwrap();
      nav.perform_action(ActionKind::RightClick, at(3.0, 4.0), &cancel).unwrap();
      nav.perform_action(ActionKind::MiddleClick, at(5.0, 6.0), &cancel).unwrap();
      assert_eq!(
        bridge.inputs(),
        vec![
          RecordedInput::Click(MouseButton::Left, at(1.0, 2.0), false),
          RecordedInput::Click(MouseButton::Right, at(3.0, 4.0), false),
          RecordedInput::Click(MouseButton::Middle, at(5.0, 6.0), false),
        ]
      );
    }

    #[test]
    fn restore_cursor_setting_is_passed_through() {
      let bridge = desktop();
      let nav = Navigator::builder(Arc::clone(&bridge))
        .restore_cursor_position(true)
        .build()
        .unwrap();
      nav
        .perform_action(ActionKind::LeftClick, at(1.0, 1.0), &CancellationToken::new())
        .unwrap();
      assert_eq!(
        bridge.inputs(),
        vec![RecordedInput::Click(MouseButton::Left, at(1.0, 1.0), true)]
      );
    }

    #[test]
    fn right_click_releases_held_button_first() {
      let bridge = desktop();
      let nav = navigator(&bridge);
      let cancel = CancellationToken::new();
      nav.perform_action(ActionKind::MouseDown, at(10.0, 10.0), &cancel).unwrap();
      assert!(nav.is_left_mouse_down());
      nav.perform_action(ActionKind::RightClick, at(20.0, 20.0), &cancel).unwrap();
      assert!(!nav.is_left_mouse_down());
      assert_eq!(
        bridge.inputs(),
        vec![
          RecordedInput::LeftDown(at(10.0, 10.0)),
          RecordedInput::LeftUp(at(10.0, 10.0)),
          RecordedInput::Click(MouseButton::Right, at(20.0, 20.0), false),
        ]
      );
    }

    #[test]
    fn element_actions_target_the_centre() {
      let bridge = desktop();
      let nav = navigator(&bridge);
      let element = DomainElement {
        id: ElementId::from_hash(1),
        bounds: Bounds::new(10.0, 20.0, 100.0, 40.0),
        role: "AXButton".into(),
        title: None,
        description: None,
        clickable: true,
      };
      nav
        .perform_action_on_element(&element, ActionKind::LeftClick, &CancellationToken::new())
        .unwrap();
      assert_eq!(
        bridge.inputs(),
        vec![RecordedInput::Click(MouseButton::Left, at(60.0, 40.0), false)]
      );
    }
  }

  mod drag_tests {
    use super::*;

    #[test]
    fn mouse_down_move_up() {
      let bridge = desktop();
      let nav = navigator(&bridge);
      let cancel = CancellationToken::new();
      nav.perform_action(ActionKind::MouseDown, at(0.0, 0.0), &cancel).unwrap();
      nav.perform_action(ActionKind::MoveMouse, at(50.0, 50.0), &cancel).unwrap();
      nav.perform_action(ActionKind::MouseUp, at(50.0, 50.0), &cancel).unwrap();
      assert!(!nav.is_left_mouse_down());
      assert_eq!(
        bridge.inputs(),
        vec![
          RecordedInput::LeftDown(at(0.0, 0.0)),
          RecordedInput::Move(at(50.0, 50.0), false),
          RecordedInput::LeftUp(at(50.0, 50.0)),
        ]
      );
    }

    #[test]
    fn failed_mouse_down_leaves_button_released() {
      let bridge = desktop();
      bridge.fail_inputs(Some(BridgeError::Failed("event tap refused".into())));
      let nav = navigator(&bridge);
      let err = nav
        .perform_action(ActionKind::MouseDown, at(0.0, 0.0), &CancellationToken::new())
        .unwrap_err();
      assert_eq!(err.code(), ErrorCode::ActionFailed);
      assert!(!nav.is_left_mouse_down());
    }

    #[test]
    fn relative_move_goes_to_resolved_point() {
      let bridge = desktop();
      let nav = navigator(&bridge);
      let cancel = CancellationToken::new();
      let target = nav.cursor_position(&cancel).unwrap().offset(15.0, -5.0);
      nav.perform_action(ActionKind::MoveMouseRelative, target, &cancel).unwrap();
      assert_eq!(nav.cursor_position(&cancel).unwrap(), at(15.0, -5.0));
    }
  }

  mod scroll_tests {
    use super::*;

    #[test]
    fn scroll_kind_is_rejected_as_point_action() {
      let nav = navigator(&desktop());
      let err = nav
        .perform_action(ActionKind::Scroll, at(0.0, 0.0), &CancellationToken::new())
        .unwrap_err();
      assert_eq!(err.code(), ErrorCode::InvalidInput);
    }

    #[test]
    fn scroll_releases_held_button() {
      let bridge = desktop();
      let nav = navigator(&bridge);
      let cancel = CancellationToken::new();
      nav.perform_action(ActionKind::MouseDown, at(5.0, 5.0), &cancel).unwrap();
      nav.scroll(0, -3, &cancel).unwrap();
      assert_eq!(
        bridge.inputs(),
        vec![
          RecordedInput::LeftDown(at(5.0, 5.0)),
          RecordedInput::LeftUp(at(5.0, 5.0)),
          RecordedInput::Scroll(0, -3),
        ]
      );
    }

    #[test]
    fn permission_loss_is_not_an_action_failure() {
      let bridge = desktop();
      bridge.fail_inputs(Some(BridgeError::PermissionDenied));
      let nav = navigator(&bridge);
      let err = nav.scroll(1, 1, &CancellationToken::new()).unwrap_err();
      assert_eq!(err.code(), ErrorCode::AccessibilityDenied);
    }
  }

  mod cursor_tests {
    use super::*;

    #[test]
    fn move_cursor_and_screen_bounds() {
      let bridge = desktop();
      let nav = navigator(&bridge);
      let cancel = CancellationToken::new();
      nav.move_cursor(at(100.0, 200.0), true, &cancel).unwrap();
      assert_eq!(bridge.inputs(), vec![RecordedInput::Move(at(100.0, 200.0), true)]);
      assert_eq!(
        nav.screen_bounds(&cancel).unwrap(),
        Bounds::new(0.0, 0.0, 1440.0, 900.0)
      );
    }

    #[test]
    fn cancelled_actions_send_nothing() {
      let bridge = desktop();
      let nav = navigator(&bridge);
      let cancel = CancellationToken::new();
      cancel.cancel();
      assert!(nav
        .perform_action(ActionKind::LeftClick, at(0.0, 0.0), &cancel)
        .unwrap_err()
        .is_cancelled());
      assert!(nav.scroll(0, 1, &cancel).unwrap_err().is_cancelled());
      assert!(bridge.inputs().is_empty());
    }
  }
}
