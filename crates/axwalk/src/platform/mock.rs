/*!
In-memory bridge for tests.

Models an element graph keyed by numeric element ids. Every handle handed out is
tracked by serial number, so tests can assert that each acquisition is released
exactly once.
*/

#![allow(clippy::unwrap_used, clippy::expect_used, dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use super::{Bridge, BridgeError, BridgeResult};
use crate::a11y::{MouseButton, Role};
use crate::types::{Bounds, ElementInfo, Point};

/// Handle to a mock element. Deliberately not `Clone`: copies go through the bridge.
#[derive(Debug)]
pub(crate) struct MockHandle {
  element: u64,
  serial: u64,
}

impl MockHandle {
  pub(crate) const fn element(&self) -> u64 {
    self.element
  }
}

/// Top-level lookups that can be made to fail.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum Surface {
  FocusedApp,
  FrontmostWindow,
  MenuBar,
  App(String),
}

/// Input primitive issued through the bridge.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum RecordedInput {
  Click(MouseButton, Point, bool),
  LeftDown(Point),
  LeftUp(Point),
  Scroll(i32, i32),
  Move(Point, bool),
}

#[derive(Debug, Clone)]
struct Node {
  info: ElementInfo,
  children: Vec<u64>,
  clickable: bool,
  hidden: bool,
  bundle: Option<String>,
  info_error: Option<BridgeError>,
  children_error: Option<BridgeError>,
}

#[derive(Debug, Default)]
struct Graph {
  nodes: HashMap<u64, Node>,
  hashes: HashMap<u64, u64>,
  focused_app: Option<u64>,
  frontmost_window: Option<u64>,
  apps: HashMap<String, u64>,
  menu_bars: HashMap<u64, u64>,
  surface_errors: HashMap<Surface, BridgeError>,
}

type ChildrenHook = Arc<dyn Fn(u64) + Send + Sync>;

pub(crate) struct MockBridge {
  graph: RwLock<Graph>,
  next_serial: AtomicU64,
  live: Mutex<HashMap<u64, u64>>,
  acquired: AtomicUsize,
  released: AtomicUsize,
  double_releases: AtomicUsize,
  children_calls: Mutex<HashMap<u64, usize>>,
  info_calls: AtomicUsize,
  fail_clones: AtomicBool,
  mission_control: AtomicBool,
  permissions: AtomicBool,
  cursor: Mutex<Point>,
  inputs: Mutex<Vec<RecordedInput>>,
  input_error: Mutex<Option<BridgeError>>,
  children_hook: Mutex<Option<ChildrenHook>>,
}

impl std::fmt::Debug for MockBridge {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("MockBridge")
      .field("acquired", &self.acquired())
      .field("released", &self.released())
      .finish_non_exhaustive()
  }
}

/// Shorthand for element info in tests.
pub(crate) fn info(role: Role, x: f64, y: f64, w: f64, h: f64) -> ElementInfo {
  ElementInfo::new(role, Bounds::new(x, y, w, h))
}

impl MockBridge {
  pub(crate) fn new() -> Self {
    Self {
      graph: RwLock::new(Graph::default()),
      next_serial: AtomicU64::new(1),
      live: Mutex::new(HashMap::new()),
      acquired: AtomicUsize::new(0),
      released: AtomicUsize::new(0),
      double_releases: AtomicUsize::new(0),
      children_calls: Mutex::new(HashMap::new()),
      info_calls: AtomicUsize::new(0),
      fail_clones: AtomicBool::new(false),
      mission_control: AtomicBool::new(false),
      permissions: AtomicBool::new(true),
      cursor: Mutex::new(Point::new(0.0, 0.0)),
      inputs: Mutex::new(Vec::new()),
      input_error: Mutex::new(None),
      children_hook: Mutex::new(None),
    }
  }

  // === Graph setup ===

  pub(crate) fn insert(&self, id: u64, info: ElementInfo) -> u64 {
    self.graph.write().nodes.insert(
      id,
      Node {
        info,
        children: Vec::new(),
        clickable: true,
        hidden: false,
        bundle: None,
        info_error: None,
        children_error: None,
      },
    );
    id
  }

  pub(crate) fn set_children(&self, parent: u64, children: &[u64]) {
    self.node_mut(parent, |n| n.children = children.to_vec());
  }

  pub(crate) fn set_clickable(&self, id: u64, clickable: bool) {
    self.node_mut(id, |n| n.clickable = clickable);
  }

  /// Rows hidden from a list/table/outline parent.
  pub(crate) fn set_hidden(&self, id: u64) {
    self.node_mut(id, |n| n.hidden = true);
  }

  pub(crate) fn set_bundle(&self, id: u64, bundle: &str) {
    self.node_mut(id, |n| n.bundle = Some(bundle.to_string()));
  }

  pub(crate) fn set_hash(&self, id: u64, hash: u64) {
    self.graph.write().hashes.insert(id, hash);
  }

  pub(crate) fn fail_info(&self, id: u64, err: BridgeError) {
    self.node_mut(id, |n| n.info_error = Some(err));
  }

  pub(crate) fn fail_children(&self, id: u64, err: BridgeError) {
    self.node_mut(id, |n| n.children_error = Some(err));
  }

  pub(crate) fn remove(&self, id: u64) {
    self.graph.write().nodes.remove(&id);
  }

  pub(crate) fn set_info(&self, id: u64, info: ElementInfo) {
    self.node_mut(id, |n| n.info = info);
  }

  pub(crate) fn set_focused_app(&self, id: u64) {
    self.graph.write().focused_app = Some(id);
  }

  pub(crate) fn set_frontmost_window(&self, id: u64) {
    self.graph.write().frontmost_window = Some(id);
  }

  pub(crate) fn register_app(&self, bundle: &str, id: u64) {
    self.graph.write().apps.insert(bundle.to_string(), id);
    self.set_bundle(id, bundle);
  }

  pub(crate) fn set_menu_bar(&self, app: u64, menu_bar: u64) {
    self.graph.write().menu_bars.insert(app, menu_bar);
  }

  pub(crate) fn fail_surface(&self, surface: Surface, err: BridgeError) {
    self.graph.write().surface_errors.insert(surface, err);
  }

  pub(crate) fn set_mission_control(&self, active: bool) {
    self.mission_control.store(active, Ordering::SeqCst);
  }

  pub(crate) fn set_permissions(&self, granted: bool) {
    self.permissions.store(granted, Ordering::SeqCst);
  }

  pub(crate) fn fail_clones(&self, fail: bool) {
    self.fail_clones.store(fail, Ordering::SeqCst);
  }

  pub(crate) fn fail_inputs(&self, err: Option<BridgeError>) {
    *self.input_error.lock() = err;
  }

  pub(crate) fn set_cursor(&self, point: Point) {
    *self.cursor.lock() = point;
  }

  /// Run `hook` with the element id before each `children` call.
  pub(crate) fn on_children(&self, hook: impl Fn(u64) + Send + Sync + 'static) {
    *self.children_hook.lock() = Some(Arc::new(hook));
  }

  fn node_mut(&self, id: u64, f: impl FnOnce(&mut Node)) {
    let mut graph = self.graph.write();
    let node = graph.nodes.get_mut(&id).expect("unknown mock element");
    f(node);
  }

  // === Handles and counters ===

  /// Acquire a handle directly, as a test owning a root would.
  pub(crate) fn handle(&self, id: u64) -> MockHandle {
    self.acquire(id)
  }

  fn acquire(&self, element: u64) -> MockHandle {
    let serial = self.next_serial.fetch_add(1, Ordering::SeqCst);
    self.live.lock().insert(serial, element);
    self.acquired.fetch_add(1, Ordering::SeqCst);
    MockHandle { element, serial }
  }

  pub(crate) fn acquired(&self) -> usize {
    self.acquired.load(Ordering::SeqCst)
  }

  pub(crate) fn released(&self) -> usize {
    self.released.load(Ordering::SeqCst)
  }

  /// Handles acquired and not yet released.
  pub(crate) fn outstanding(&self) -> usize {
    self.live.lock().len()
  }

  /// Element ids of outstanding handles, sorted.
  pub(crate) fn outstanding_elements(&self) -> Vec<u64> {
    let mut elements: Vec<u64> = self.live.lock().values().copied().collect();
    elements.sort_unstable();
    elements
  }

  pub(crate) fn double_releases(&self) -> usize {
    self.double_releases.load(Ordering::SeqCst)
  }

  pub(crate) fn children_calls(&self, id: u64) -> usize {
    self.children_calls.lock().get(&id).copied().unwrap_or(0)
  }

  pub(crate) fn info_calls(&self) -> usize {
    self.info_calls.load(Ordering::SeqCst)
  }

  pub(crate) fn inputs(&self) -> Vec<RecordedInput> {
    self.inputs.lock().clone()
  }

  fn surface_error(&self, surface: &Surface) -> Option<BridgeError> {
    self.graph.read().surface_errors.get(surface).cloned()
  }

  fn record(&self, input: RecordedInput) -> BridgeResult<()> {
    if let Some(err) = self.input_error.lock().clone() {
      return Err(err);
    }
    self.inputs.lock().push(input);
    Ok(())
  }
}

impl Bridge for MockBridge {
  type Handle = MockHandle;

  fn focused_app(&self) -> BridgeResult<MockHandle> {
    if let Some(err) = self.surface_error(&Surface::FocusedApp) {
      return Err(err);
    }
    let id = self.graph.read().focused_app;
    id.map(|id| self.acquire(id))
      .ok_or_else(|| BridgeError::Failed("no focused application".into()))
  }

  fn frontmost_window(&self) -> BridgeResult<MockHandle> {
    if let Some(err) = self.surface_error(&Surface::FrontmostWindow) {
      return Err(err);
    }
    let id = self.graph.read().frontmost_window;
    id.map(|id| self.acquire(id))
      .ok_or_else(|| BridgeError::Failed("no frontmost window".into()))
  }

  fn app_by_bundle_id(&self, bundle_id: &str) -> BridgeResult<MockHandle> {
    if let Some(err) = self.surface_error(&Surface::App(bundle_id.to_string())) {
      return Err(err);
    }
    let id = self.graph.read().apps.get(bundle_id).copied();
    id.map(|id| self.acquire(id))
      .ok_or_else(|| BridgeError::Failed(format!("application {bundle_id} not running")))
  }

  fn menu_bar(&self, app: &MockHandle) -> BridgeResult<MockHandle> {
    if let Some(err) = self.surface_error(&Surface::MenuBar) {
      return Err(err);
    }
    let id = self.graph.read().menu_bars.get(&app.element).copied();
    id.map(|id| self.acquire(id))
      .ok_or_else(|| BridgeError::Failed("application has no menu bar".into()))
  }

  fn children(&self, handle: &MockHandle) -> BridgeResult<Vec<MockHandle>> {
    *self.children_calls.lock().entry(handle.element).or_insert(0) += 1;
    let hook = self.children_hook.lock().clone();
    if let Some(hook) = hook {
      hook(handle.element);
    }
    let ids = {
      let graph = self.graph.read();
      let node = graph
        .nodes
        .get(&handle.element)
        .ok_or(BridgeError::ElementInvalidated)?;
      if let Some(err) = &node.children_error {
        return Err(err.clone());
      }
      let rows_only = node.info.role.is_row_collection();
      node
        .children
        .iter()
        .copied()
        .filter(|id| !rows_only || graph.nodes.get(id).is_some_and(|c| !c.hidden))
        .collect::<Vec<_>>()
    };
    Ok(ids.into_iter().map(|id| self.acquire(id)).collect())
  }

  fn info(&self, handle: &MockHandle) -> BridgeResult<ElementInfo> {
    self.info_calls.fetch_add(1, Ordering::SeqCst);
    let graph = self.graph.read();
    let node = graph
      .nodes
      .get(&handle.element)
      .ok_or(BridgeError::ElementInvalidated)?;
    match &node.info_error {
      Some(err) => Err(err.clone()),
      None => Ok(node.info.clone()),
    }
  }

  fn bundle_id(&self, handle: &MockHandle) -> Option<String> {
    self
      .graph
      .read()
      .nodes
      .get(&handle.element)
      .and_then(|n| n.bundle.clone())
  }

  fn hash(&self, handle: &MockHandle) -> u64 {
    self
      .graph
      .read()
      .hashes
      .get(&handle.element)
      .copied()
      .unwrap_or(handle.element)
  }

  fn same_element(&self, a: &MockHandle, b: &MockHandle) -> bool {
    a.element == b.element
  }

  fn clone_handle(&self, handle: &MockHandle) -> BridgeResult<MockHandle> {
    if self.fail_clones.load(Ordering::SeqCst) {
      return Err(BridgeError::Transient("retain failed".into()));
    }
    Ok(self.acquire(handle.element))
  }

  fn release(&self, handle: MockHandle) {
    if self.live.lock().remove(&handle.serial).is_some() {
      self.released.fetch_add(1, Ordering::SeqCst);
    } else {
      self.double_releases.fetch_add(1, Ordering::SeqCst);
    }
  }

  fn has_click_action(&self, handle: &MockHandle) -> bool {
    self
      .graph
      .read()
      .nodes
      .get(&handle.element)
      .is_some_and(|n| n.clickable)
  }

  fn permissions_granted(&self) -> bool {
    self.permissions.load(Ordering::SeqCst)
  }

  fn mission_control_active(&self) -> bool {
    self.mission_control.load(Ordering::SeqCst)
  }

  fn active_screen_bounds(&self) -> Bounds {
    Bounds::new(0.0, 0.0, 1440.0, 900.0)
  }

  fn cursor_position(&self) -> Point {
    *self.cursor.lock()
  }

  fn click(&self, button: MouseButton, point: Point, restore_cursor: bool) -> BridgeResult<()> {
    self.record(RecordedInput::Click(button, point, restore_cursor))
  }

  fn left_mouse_down(&self, point: Point) -> BridgeResult<()> {
    self.record(RecordedInput::LeftDown(point))
  }

  fn left_mouse_up(&self, point: Point) -> BridgeResult<()> {
    self.record(RecordedInput::LeftUp(point))
  }

  fn scroll(&self, dx: i32, dy: i32) -> BridgeResult<()> {
    self.record(RecordedInput::Scroll(dx, dy))
  }

  fn move_cursor(&self, point: Point, bypass_smooth: bool) {
    self.set_cursor(point);
    self.inputs.lock().push(RecordedInput::Move(point, bypass_smooth));
  }
}
