/*!
Core navigator instance: owns the info cache, settings and the handles behind
returned elements.

# Module Structure

- `mod.rs` - Navigator struct, construction, settings
- `queries.rs` - `clickable_elements()` orchestration across surfaces
- `surfaces.rs` - per-surface sub-queries (frontmost window, menu bar, dock, ...)
- `convert.rs` - kept tree nodes to domain elements, post-filtering
- `actions.rs` - `perform_action()`, `scroll()`, cursor control (write to OS)
- `retained.rs` - handles of the most recently returned elements

# Example

```ignore
let navigator = Navigator::builder(bridge).config(config).build()?;
let cancel = CancellationToken::new();

let elements = navigator.clickable_elements(&ElementFilter::default(), &cancel)?;
navigator.perform_action_on_element(&elements[0], ActionKind::LeftClick, &cancel)?;
```
*/

mod actions;
mod convert;
mod queries;
mod retained;
mod surfaces;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;

use crate::a11y::RoleSet;
use crate::cache::{CacheStatsSnapshot, InfoCache};
use crate::config::{AppOverride, Config, TreeConfig};
use crate::platform::{Bridge, MouseState};
use crate::tree::NodePool;
use crate::types::{AxError, AxResult};
use retained::RetainedElements;

/// Settings that can change while the navigator is running.
#[derive(Debug, Clone)]
pub(crate) struct Settings {
  pub(crate) clickable_roles: RoleSet,
  pub(crate) excluded_bundles: HashSet<String>,
  pub(crate) ignore_click_check: HashSet<String>,
  pub(crate) app_overrides: HashMap<String, AppOverride>,
  pub(crate) tree: TreeConfig,
  pub(crate) restore_cursor: bool,
}

impl Settings {
  fn from_config(config: &Config) -> Self {
    Self {
      clickable_roles: config.clickable_roles.clone(),
      excluded_bundles: config.excluded_bundles.iter().cloned().collect(),
      ignore_click_check: config
        .bundles_to_ignore_clickable_check
        .iter()
        .cloned()
        .collect(),
      app_overrides: config.app_overrides.clone(),
      tree: config.tree,
      restore_cursor: config.action.restore_cursor_position,
    }
  }
}

/// Keyboard-navigation core: finds clickable elements and drives the pointer.
///
/// Clone is cheap (Arc bumps) - share freely across threads.
pub struct Navigator<B: Bridge> {
  bridge: Arc<B>,
  cache: Arc<InfoCache<B>>,
  pool: Arc<NodePool<B::Handle>>,
  settings: Arc<RwLock<Settings>>,
  mouse: Arc<MouseState>,
  retained: Arc<RetainedElements<B>>,
}

impl<B: Bridge> Clone for Navigator<B> {
  fn clone(&self) -> Self {
    Self {
      bridge: Arc::clone(&self.bridge),
      cache: Arc::clone(&self.cache),
      pool: Arc::clone(&self.pool),
      settings: Arc::clone(&self.settings),
      mouse: Arc::clone(&self.mouse),
      retained: Arc::clone(&self.retained),
    }
  }
}

impl<B: Bridge> std::fmt::Debug for Navigator<B> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Navigator")
      .field("cache_size", &self.cache.size())
      .field("retained", &self.retained.len())
      .finish_non_exhaustive()
  }
}

/// Builder for configuring a Navigator instance.
///
/// # Example
///
/// ```ignore
/// let navigator = Navigator::builder(bridge)
///     .config(Config::from_json(&json)?)
///     .restore_cursor_position(true)
///     .build()?;
/// ```
#[derive(Debug)]
#[must_use = "Builder does nothing until .build() is called"]
pub struct NavigatorBuilder<B: Bridge> {
  bridge: Arc<B>,
  config: Config,
}

impl<B: Bridge> NavigatorBuilder<B> {
  /// Replace the whole configuration.
  pub fn config(mut self, config: Config) -> Self {
    self.config = config;
    self
  }

  /// Info cache capacity. Default: 1000.
  pub fn cache_size(mut self, max_size: usize) -> Self {
    self.config.cache.max_size = max_size;
    self
  }

  /// Deepest tree level visited. Default: 50.
  pub fn max_depth(mut self, depth: usize) -> Self {
    self.config.tree.max_depth = depth;
    self
  }

  /// Move the cursor back after clicks. Default: false.
  pub fn restore_cursor_position(mut self, restore: bool) -> Self {
    self.config.action.restore_cursor_position = restore;
    self
  }

  /// Build the Navigator with the configured options.
  ///
  /// Returns an error if the configuration is invalid or accessibility
  /// permissions are not granted. Starts the cache cleanup thread, which stops
  /// when the last clone is dropped or on [`Navigator::shutdown`].
  #[must_use = "Navigator instance must be stored to keep its cache alive"]
  pub fn build(self) -> AxResult<Navigator<B>> {
    self.config.validate()?;
    if !self.bridge.permissions_granted() {
      return Err(AxError::PermissionDenied);
    }

    let cache = InfoCache::new(Arc::clone(&self.bridge), self.config.cache.clone());
    let navigator = Navigator {
      cache: Arc::new(cache),
      pool: Arc::new(NodePool::new()),
      settings: Arc::new(RwLock::new(Settings::from_config(&self.config))),
      mouse: Arc::new(MouseState::new()),
      retained: Arc::new(RetainedElements::new(Arc::clone(&self.bridge))),
      bridge: self.bridge,
    };
    log::debug!(
      "Navigator ready: cache {} entries, {} clickable roles",
      self.config.cache.max_size,
      self.config.clickable_roles.len()
    );
    Ok(navigator)
  }
}

impl<B: Bridge> Navigator<B> {
  /// Create a builder around a platform bridge.
  pub fn builder(bridge: Arc<B>) -> NavigatorBuilder<B> {
    NavigatorBuilder {
      bridge,
      config: Config::default(),
    }
  }

  /// Create a navigator with the default configuration.
  #[must_use = "Navigator instance must be stored to keep its cache alive"]
  pub fn new(bridge: Arc<B>) -> AxResult<Self> {
    Self::builder(bridge).build()
  }

  /// Bundle id of the focused application, if it has one.
  pub fn focused_app_bundle_id(&self, cancel: &CancellationToken) -> AxResult<Option<String>> {
    check_cancel(cancel)?;
    let app = self.bridge.focused_app()?;
    let bundle = self.bridge.bundle_id(&app);
    self.bridge.release(app);
    Ok(bundle)
  }

  /// Whether focused-app queries return nothing for this bundle.
  pub fn is_bundle_excluded(&self, bundle_id: &str, cancel: &CancellationToken) -> AxResult<bool> {
    check_cancel(cancel)?;
    Ok(self.settings.read().excluded_bundles.contains(bundle_id))
  }

  /// Fails with `PermissionDenied` when accessibility trust is missing.
  pub fn check_permissions(&self, cancel: &CancellationToken) -> AxResult<()> {
    check_cancel(cancel)?;
    if self.bridge.permissions_granted() {
      Ok(())
    } else {
      Err(AxError::PermissionDenied)
    }
  }

  /// Permissions check plus a liveness check of the info cache.
  pub fn health(&self, cancel: &CancellationToken) -> AxResult<()> {
    self.check_permissions(cancel)?;
    if self.cache.is_stopped() {
      return Err(AxError::Internal("info cache is stopped".into()));
    }
    log::debug!("Health: {:?}", self.cache.stats());
    Ok(())
  }

  /// Replace the global clickable role set. Unknown names are kept as-is.
  pub fn update_clickable_roles<I, S>(&self, roles: I)
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    let roles = RoleSet::from_names(roles);
    log::info!("Clickable roles updated: {} roles", roles.len());
    self.settings.write().clickable_roles = roles;
  }

  /// Current global clickable role set.
  pub fn clickable_roles(&self) -> RoleSet {
    self.settings.read().clickable_roles.clone()
  }

  /// Replace the excluded bundle list.
  pub fn update_excluded_bundles<I, S>(&self, bundles: I)
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    let bundles: HashSet<String> = bundles.into_iter().map(Into::into).collect();
    log::info!("Excluded bundles updated: {} bundles", bundles.len());
    self.settings.write().excluded_bundles = bundles;
  }

  /// Info cache counters.
  pub fn cache_stats(&self) -> CacheStatsSnapshot {
    self.cache.stats()
  }

  /// Number of handles held for the last returned elements.
  pub fn retained_count(&self) -> usize {
    self.retained.len()
  }

  /// Release the handles behind the last returned elements.
  pub fn forget_elements(&self) -> usize {
    self.retained.clear()
  }

  /// Release every held handle and stop the cache cleanup thread.
  ///
  /// The navigator stays usable for actions; element queries run uncached.
  pub fn shutdown(&self) {
    let forgotten = self.retained.clear();
    self.cache.stop();
    log::debug!("Navigator shut down, released {forgotten} retained elements");
  }

  fn settings_snapshot(&self) -> Settings {
    self.settings.read().clone()
  }
}

fn check_cancel(cancel: &CancellationToken) -> AxResult<()> {
  if cancel.is_cancelled() {
    Err(AxError::Cancelled)
  } else {
    Ok(())
  }
}

#[cfg(test)]
pub(crate) mod test_support {
  use std::sync::Arc;

  use super::Navigator;
  use crate::a11y::Role;
  use crate::platform::mock::{info, MockBridge};

  pub(crate) const APP: u64 = 1;
  pub(crate) const WINDOW: u64 = 10;
  pub(crate) const MENU_BAR: u64 = 50;
  pub(crate) const DOCK_APP: u64 = 70;
  pub(crate) const DOCK_LIST: u64 = 71;

  /// Focused app `com.example.editor` with a window of three buttons (11..=13),
  /// a menu bar of two items (51, 52), and a dock with two items (72, 73).
  pub(crate) fn desktop() -> Arc<MockBridge> {
    let bridge = MockBridge::new();

    bridge.insert(APP, info(Role::Application, 0.0, 0.0, 1440.0, 900.0));
    bridge.set_bundle(APP, "com.example.editor");
    bridge.set_focused_app(APP);

    bridge.insert(WINDOW, info(Role::Window, 0.0, 25.0, 800.0, 600.0));
    bridge.set_bundle(WINDOW, "com.example.editor");
    bridge.set_frontmost_window(WINDOW);
    for (i, id) in (11..=13).enumerate() {
      #[allow(clippy::cast_precision_loss)]
      let x = 10.0 + 100.0 * i as f64;
      bridge.insert(id, info(Role::Button, x, 50.0, 80.0, 30.0));
      bridge.set_bundle(id, "com.example.editor");
    }
    bridge.set_children(WINDOW, &[11, 12, 13]);

    bridge.insert(MENU_BAR, info(Role::MenuBar, 0.0, 0.0, 1440.0, 25.0));
    bridge.insert(51, info(Role::MenuBarItem, 10.0, 0.0, 40.0, 25.0));
    bridge.insert(52, info(Role::MenuBarItem, 60.0, 0.0, 40.0, 25.0));
    bridge.set_children(MENU_BAR, &[51, 52]);
    bridge.set_menu_bar(APP, MENU_BAR);

    bridge.insert(DOCK_APP, info(Role::Application, 0.0, 0.0, 1440.0, 900.0));
    bridge.register_app("com.apple.dock", DOCK_APP);
    bridge.insert(DOCK_LIST, info(Role::List, 300.0, 850.0, 800.0, 50.0));
    bridge.insert(72, info(Role::DockItem, 310.0, 850.0, 50.0, 50.0));
    bridge.insert(73, info(Role::DockItem, 370.0, 850.0, 50.0, 50.0));
    bridge.set_children(DOCK_APP, &[DOCK_LIST]);
    bridge.set_children(DOCK_LIST, &[72, 73]);

    Arc::new(bridge)
  }

  pub(crate) fn navigator(bridge: &Arc<MockBridge>) -> Navigator<MockBridge> {
    Navigator::builder(Arc::clone(bridge)).build().unwrap()
  }
}

#[cfg(test)]
mod tests {
  use super::test_support::{desktop, navigator};
  use super::*;
  use crate::types::ErrorCode;

  mod builder_tests {
    use super::*;

    #[test]
    fn rejects_invalid_config() {
      let bridge = desktop();
      let err = Navigator::builder(Arc::clone(&bridge))
        .cache_size(0)
        .build()
        .unwrap_err();
      assert_eq!(err.code(), ErrorCode::InvalidInput);
    }

    #[test]
    fn requires_permissions() {
      let bridge = desktop();
      bridge.set_permissions(false);
      let err = Navigator::new(Arc::clone(&bridge)).unwrap_err();
      assert_eq!(err.code(), ErrorCode::AccessibilityDenied);
    }

    #[test]
    fn applies_config() {
      let bridge = desktop();
      let config = Config::from_json(r#"{ "excluded_bundles": ["com.example.secret"] }"#).unwrap();
      let nav = Navigator::builder(Arc::clone(&bridge))
        .config(config)
        .build()
        .unwrap();
      let cancel = CancellationToken::new();
      assert!(nav.is_bundle_excluded("com.example.secret", &cancel).unwrap());
      assert!(!nav.is_bundle_excluded("com.example.editor", &cancel).unwrap());
    }
  }

  mod settings_tests {
    use super::*;
    use crate::a11y::Role;

    #[test]
    fn update_clickable_roles_replaces_set() {
      let nav = navigator(&desktop());
      nav.update_clickable_roles(["AXButton", " AXLink ", ""]);
      let roles = nav.clickable_roles();
      assert_eq!(roles.len(), 2);
      assert!(roles.contains(&Role::Link));
      assert!(!roles.contains(&Role::Row));
    }

    #[test]
    fn update_excluded_bundles_replaces_list() {
      let nav = navigator(&desktop());
      let cancel = CancellationToken::new();
      nav.update_excluded_bundles(["com.a"]);
      nav.update_excluded_bundles(vec!["com.b".to_string()]);
      assert!(!nav.is_bundle_excluded("com.a", &cancel).unwrap());
      assert!(nav.is_bundle_excluded("com.b", &cancel).unwrap());
    }

    #[test]
    fn focused_bundle_releases_app_handle() {
      let bridge = desktop();
      let nav = navigator(&bridge);
      let bundle = nav.focused_app_bundle_id(&CancellationToken::new()).unwrap();
      assert_eq!(bundle.as_deref(), Some("com.example.editor"));
      assert_eq!(bridge.outstanding(), 0);
    }
  }

  mod health_tests {
    use super::*;

    #[test]
    fn reports_lost_permissions() {
      let bridge = desktop();
      let nav = navigator(&bridge);
      let cancel = CancellationToken::new();
      nav.health(&cancel).unwrap();
      bridge.set_permissions(false);
      assert_eq!(nav.check_permissions(&cancel).unwrap_err().code(), ErrorCode::AccessibilityDenied);
    }

    #[test]
    fn reports_stopped_cache() {
      let nav = navigator(&desktop());
      nav.shutdown();
      assert_eq!(
        nav.health(&CancellationToken::new()).unwrap_err().code(),
        ErrorCode::Internal
      );
    }

    #[test]
    fn cancelled_token_short_circuits() {
      let nav = navigator(&desktop());
      let cancel = CancellationToken::new();
      cancel.cancel();
      assert!(nav.health(&cancel).unwrap_err().is_cancelled());
      assert!(nav.focused_app_bundle_id(&cancel).unwrap_err().is_cancelled());
    }
  }
}
