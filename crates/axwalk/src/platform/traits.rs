/*!
Platform abstraction traits.

The bridge is the only way core code touches the operating system. Handles are
opaque, manually managed references: every handle a bridge method returns is owned
by the caller until it is passed back to [`Bridge::release`] exactly once.
*/

use crate::a11y::MouseButton;
use crate::types::{Bounds, ElementInfo, Point};

/// Failure reported by a bridge call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BridgeError {
  /// The process lacks accessibility trust. Fatal to the whole operation.
  #[error("Accessibility permissions not granted")]
  PermissionDenied,

  /// The element disappeared between discovery and use.
  #[error("Element no longer exists")]
  ElementInvalidated,

  /// The target application did not answer in time.
  #[error("Transient failure: {0}")]
  Transient(String),

  #[error("Bridge call failed: {0}")]
  Failed(String),
}

impl BridgeError {
  /// Errors confined to the element the call was made for.
  pub const fn is_skippable(&self) -> bool {
    !matches!(self, Self::PermissionDenied)
  }
}

/// Result type for bridge calls.
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Accessibility and input primitives provided by the host platform.
///
/// Implementations must be callable from many threads at once. Every method
/// returning a handle transfers ownership of one reference to the caller.
pub trait Bridge: Send + Sync + 'static {
  /// Opaque element reference.
  type Handle: Send + Sync + 'static;

  /// Application element of the focused application.
  fn focused_app(&self) -> BridgeResult<Self::Handle>;

  /// Focused window of the frontmost application.
  fn frontmost_window(&self) -> BridgeResult<Self::Handle>;

  /// Application element for a running application, by bundle identifier.
  fn app_by_bundle_id(&self, bundle_id: &str) -> BridgeResult<Self::Handle>;

  /// Menu bar element of an application.
  fn menu_bar(&self, app: &Self::Handle) -> BridgeResult<Self::Handle>;

  /// Child elements. List, table and outline elements report visible rows only.
  fn children(&self, handle: &Self::Handle) -> BridgeResult<Vec<Self::Handle>>;

  /// Attribute snapshot of an element.
  fn info(&self, handle: &Self::Handle) -> BridgeResult<ElementInfo>;

  /// Bundle identifier of the application owning the element.
  fn bundle_id(&self, handle: &Self::Handle) -> Option<String>;

  /// Identity hash. Equal for two handles to the same element.
  ///
  /// Must be answered locally, without a round trip to the target application.
  fn hash(&self, handle: &Self::Handle) -> u64;

  /// Identity comparison. Must be answered locally.
  fn same_element(&self, a: &Self::Handle, b: &Self::Handle) -> bool;

  /// Acquire an additional reference to the same element.
  fn clone_handle(&self, handle: &Self::Handle) -> BridgeResult<Self::Handle>;

  /// Give a reference back to the platform.
  fn release(&self, handle: Self::Handle);

  /// Whether the element advertises a press action.
  fn has_click_action(&self, handle: &Self::Handle) -> bool;

  fn permissions_granted(&self) -> bool;

  /// Whether the system window-overview mode is showing.
  fn mission_control_active(&self) -> bool;

  /// Bounds of the screen holding the cursor.
  fn active_screen_bounds(&self) -> Bounds;

  fn cursor_position(&self) -> Point;

  fn click(&self, button: MouseButton, point: Point, restore_cursor: bool) -> BridgeResult<()>;

  fn left_mouse_down(&self, point: Point) -> BridgeResult<()>;

  fn left_mouse_up(&self, point: Point) -> BridgeResult<()>;

  /// Scroll at the cursor by line deltas.
  fn scroll(&self, dx: i32, dy: i32) -> BridgeResult<()>;

  /// Move the cursor, optionally skipping animated movement.
  fn move_cursor(&self, point: Point, bypass_smooth: bool);
}
