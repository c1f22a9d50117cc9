/*! Query filter for clickable-element discovery. */

use serde::{Deserialize, Serialize};

use super::{Bounds, DomainElement, Size};
use crate::a11y::{Role, RoleSet};

/// Which surfaces to query and how to narrow the results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
#[allow(clippy::struct_excessive_bools)]
pub struct ElementFilter {
  /// Allowed roles. Empty admits every role.
  pub roles: RoleSet,
  pub exclude_roles: RoleSet,
  /// Keep elements outside the focused window's rectangle.
  pub include_out_of_bounds: bool,
  pub min_size: Size,
  pub include_menubar: bool,
  pub include_dock: bool,
  pub include_notification_center: bool,
  pub include_stage_manager: bool,
  /// Extra applications to query, by bundle identifier.
  pub additional_bundle_ids: Vec<String>,
}

impl ElementFilter {
  /// Minimum size plus role include/exclude.
  pub fn matches(&self, role: &Role, bounds: &Bounds) -> bool {
    if !self.min_size.fits(bounds) {
      return false;
    }
    if !self.roles.is_empty() && !self.roles.contains(role) {
      return false;
    }
    !self.exclude_roles.contains(role)
  }

  pub fn matches_element(&self, element: &DomainElement) -> bool {
    self.matches(&Role::from_platform(&element.role), &element.bounds)
  }
}
