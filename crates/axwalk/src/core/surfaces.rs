/*!
Per-surface sub-queries.

Each surface resolves a root element, builds its tree, keeps the clickable nodes
and converts them. Every sub-query returns owned handles for its elements and
releases everything else it acquired, on success and on failure alike.
*/

use std::fmt;

use tokio_util::sync::CancellationToken;

use super::convert::{self, Collected};
use super::{Navigator, Settings};
use crate::a11y::{Role, RoleSet};
use crate::platform::Bridge;
use crate::tree::{build_tree, ClickableFinder, ReleasedTree, TreeOptions};
use crate::types::{AxError, AxResult, ElementFilter};

pub(super) const DOCK_BUNDLE_ID: &str = "com.apple.dock";
pub(super) const NOTIFICATION_CENTER_BUNDLE_ID: &str = "com.apple.notificationcenterui";
pub(super) const STAGE_MANAGER_BUNDLE_ID: &str = "com.apple.WindowManager";

/// One independent element source of a `clickable_elements` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum Surface {
  FrontmostWindow,
  MenuBar,
  Dock,
  NotificationCenter,
  StageManager,
  Bundle(String),
}

impl fmt::Display for Surface {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::FrontmostWindow => f.write_str("frontmost window"),
      Self::MenuBar => f.write_str("menu bar"),
      Self::Dock => f.write_str("dock"),
      Self::NotificationCenter => f.write_str("notification center"),
      Self::StageManager => f.write_str("stage manager"),
      Self::Bundle(id) => write!(f, "bundle {id}"),
    }
  }
}

impl Surface {
  /// Surfaces to query for `filter`, in merge order.
  pub(super) fn plan(filter: &ElementFilter, mission_control: bool) -> Vec<Self> {
    let mut surfaces = Vec::new();
    if !mission_control {
      surfaces.push(Self::FrontmostWindow);
      if filter.include_menubar {
        surfaces.push(Self::MenuBar);
      }
    }
    if filter.include_dock {
      surfaces.push(Self::Dock);
    }
    if filter.include_notification_center && mission_control {
      surfaces.push(Self::NotificationCenter);
    }
    if filter.include_stage_manager {
      surfaces.push(Self::StageManager);
    }
    surfaces.extend(
      filter
        .additional_bundle_ids
        .iter()
        .filter(|id| !id.trim().is_empty())
        .map(|id| Self::Bundle(id.trim().to_string())),
    );
    surfaces
  }
}

/// How one surface's tree is searched and filtered.
struct Collect<'a> {
  include_out_of_bounds: bool,
  /// Replaces the global role set for this surface only.
  roles: Option<RoleSet>,
  exempt_all: bool,
  post_filter: Option<&'a ElementFilter>,
}

impl<B: Bridge> Navigator<B> {
  pub(super) fn query_surface(
    &self,
    surface: &Surface,
    filter: &ElementFilter,
    settings: &Settings,
    cancel: &CancellationToken,
  ) -> AxResult<Collected<B::Handle>> {
    let collected = match surface {
      Surface::FrontmostWindow => self.frontmost_window_elements(filter, settings, cancel),
      Surface::MenuBar => self.menu_bar_elements(filter, settings, cancel),
      Surface::Dock => {
        let plan = Collect {
          include_out_of_bounds: true,
          roles: Some(settings.clickable_roles.widened([Role::DockItem])),
          exempt_all: false,
          post_filter: None,
        };
        self.system_app_elements(DOCK_BUNDLE_ID, true, &plan, settings, cancel)
      }
      Surface::NotificationCenter => {
        let plan = Collect {
          include_out_of_bounds: true,
          roles: None,
          exempt_all: false,
          post_filter: None,
        };
        self.system_app_elements(NOTIFICATION_CENTER_BUNDLE_ID, false, &plan, settings, cancel)
      }
      Surface::StageManager => {
        let plan = Collect {
          include_out_of_bounds: true,
          roles: None,
          exempt_all: false,
          post_filter: None,
        };
        self.system_app_elements(STAGE_MANAGER_BUNDLE_ID, true, &plan, settings, cancel)
      }
      Surface::Bundle(bundle_id) => {
        let plan = Collect {
          include_out_of_bounds: true,
          roles: Some(settings.clickable_roles.widened([Role::MenuBarItem])),
          exempt_all: false,
          post_filter: Some(filter),
        };
        self.system_app_elements(bundle_id, false, &plan, settings, cancel)
      }
    }?;
    log::debug!("{surface}: {} elements", collected.len());
    Ok(collected)
  }

  fn frontmost_window_elements(
    &self,
    filter: &ElementFilter,
    settings: &Settings,
    cancel: &CancellationToken,
  ) -> AxResult<Collected<B::Handle>> {
    let focused = self.focused_bundle();
    if let Some(bundle) = focused.as_deref() {
      if settings.excluded_bundles.contains(bundle) {
        log::debug!("Focused app {bundle} is excluded");
        return Ok(Vec::new());
      }
    }

    let window = self.bridge.frontmost_window()?;
    let app_override = focused
      .as_deref()
      .and_then(|bundle| settings.app_overrides.get(bundle));
    let roles = app_override
      .filter(|o| !o.additional_clickable_roles.is_empty())
      .map(|o| {
        settings
          .clickable_roles
          .widened(o.additional_clickable_roles.iter().cloned())
      });
    let plan = Collect {
      include_out_of_bounds: filter.include_out_of_bounds,
      roles,
      exempt_all: app_override.is_some_and(|o| o.ignore_clickable_check),
      post_filter: Some(filter),
    };
    self.collect_from_root(window, &plan, settings, cancel)
  }

  fn menu_bar_elements(
    &self,
    filter: &ElementFilter,
    settings: &Settings,
    cancel: &CancellationToken,
  ) -> AxResult<Collected<B::Handle>> {
    let app = self.bridge.focused_app()?;
    if let Some(bundle) = self.bridge.bundle_id(&app) {
      if settings.excluded_bundles.contains(&bundle) {
        self.bridge.release(app);
        log::debug!("Focused app {bundle} is excluded");
        return Ok(Vec::new());
      }
    }
    let menu_bar = self.bridge.menu_bar(&app);
    self.bridge.release(app);

    let plan = Collect {
      include_out_of_bounds: false,
      roles: Some(settings.clickable_roles.widened([Role::MenuBarItem])),
      exempt_all: false,
      post_filter: Some(filter),
    };
    self.collect_from_root(menu_bar?, &plan, settings, cancel)
  }

  /// Elements of a running application's whole tree.
  ///
  /// With `must_be_application`, a root whose role is not `AXApplication` is a
  /// stale handle and fails the surface with `ElementInvalidated`.
  fn system_app_elements(
    &self,
    bundle_id: &str,
    must_be_application: bool,
    plan: &Collect<'_>,
    settings: &Settings,
    cancel: &CancellationToken,
  ) -> AxResult<Collected<B::Handle>> {
    let app = self.bridge.app_by_bundle_id(bundle_id)?;
    if must_be_application {
      let role = self.bridge.info(&app).map(|info| info.role);
      if !matches!(role, Ok(Role::Application)) {
        self.bridge.release(app);
        log::warn!("Skipping {bundle_id}: application element is stale");
        return Err(AxError::ElementInvalidated(format!(
          "{bundle_id} application element is stale"
        )));
      }
    }
    self.collect_from_root(app, plan, settings, cancel)
  }

  /// Build, select, release, convert. Takes ownership of `root`.
  fn collect_from_root(
    &self,
    root: B::Handle,
    plan: &Collect<'_>,
    settings: &Settings,
    cancel: &CancellationToken,
  ) -> AxResult<Collected<B::Handle>> {
    let bridge = &*self.bridge;
    let options = TreeOptions::new(&self.cache)
      .include_out_of_bounds(plan.include_out_of_bounds)
      .limits(settings.tree);
    let tree = build_tree(bridge, root, &options, &self.pool, cancel)?;

    let finder = ClickableFinder::new(bridge, &settings.clickable_roles)
      .exempt_bundles(&settings.ignore_click_check)
      .exempt_all(plan.exempt_all);
    let keep = match finder.find(&tree, plan.roles.as_ref(), cancel) {
      Ok(keep) => keep,
      Err(e) => {
        tree.release_all(bridge, &self.pool);
        return Err(e);
      }
    };

    let ReleasedTree { root, kept } = tree.release(&keep, bridge, &self.pool);
    if let Some(root) = root {
      bridge.release(root);
    }
    convert::collect_elements(bridge, &self.pool, kept, plan.post_filter, cancel)
  }

  fn focused_bundle(&self) -> Option<String> {
    let app = self.bridge.focused_app().ok()?;
    let bundle = self.bridge.bundle_id(&app);
    self.bridge.release(app);
    bundle
  }
}
