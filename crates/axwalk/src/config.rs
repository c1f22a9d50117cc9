/*!
Configuration.

Every field has a default, so a partial JSON document is a valid config:

```ignore
let config = Config::from_json(r#"{ "cache": { "max_size": 500 } }"#)?;
```
*/

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::a11y::{Role, RoleSet};
use crate::types::{AxError, AxResult};

/// Default cache capacity, in entries.
pub const DEFAULT_CACHE_SIZE: usize = 1000;
const DEFAULT_STATIC_TTL_MS: u64 = 30_000;
const DEFAULT_DYNAMIC_TTL_MS: u64 = 2_000;
const DEFAULT_CLEANUP_INTERVAL_MS: u64 = 1_000;

const DEFAULT_MAX_DEPTH: usize = 50;
const DEFAULT_PARALLEL_THRESHOLD: usize = 100;
const DEFAULT_MAX_PARALLEL_DEPTH: usize = 4;
const DEFAULT_CHILDREN_CAPACITY: usize = 8;

/// Roles reported as clickable unless configured otherwise.
pub fn default_clickable_roles() -> RoleSet {
  [
    Role::Button,
    Role::ComboBox,
    Role::CheckBox,
    Role::RadioButton,
    Role::Link,
    Role::PopUpButton,
    Role::TextField,
    Role::Slider,
    Role::TabButton,
    Role::Switch,
    Role::DisclosureTriangle,
    Role::TextArea,
    Role::MenuButton,
    Role::MenuItem,
    Role::Cell,
    Role::Row,
  ]
  .into_iter()
  .collect()
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
  pub cache: CacheConfig,
  pub tree: TreeConfig,
  pub action: ActionConfig,
  /// Global clickable role set.
  pub clickable_roles: RoleSet,
  /// Bundles whose focused-app queries return nothing.
  pub excluded_bundles: Vec<String>,
  /// Bundles whose elements count as clickable without advertising a press action.
  pub bundles_to_ignore_clickable_check: Vec<String>,
  /// Per-application adjustments, by bundle id.
  pub app_overrides: HashMap<String, AppOverride>,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      cache: CacheConfig::default(),
      tree: TreeConfig::default(),
      action: ActionConfig::default(),
      clickable_roles: default_clickable_roles(),
      excluded_bundles: Vec::new(),
      bundles_to_ignore_clickable_check: Vec::new(),
      app_overrides: HashMap::new(),
    }
  }
}

impl Config {
  /// Parse and validate a JSON config.
  pub fn from_json(json: &str) -> AxResult<Self> {
    let config: Self = serde_json::from_str(json)
      .map_err(|e| AxError::InvalidInput(format!("invalid config: {e}")))?;
    config.validate()?;
    Ok(config)
  }

  pub fn validate(&self) -> AxResult<()> {
    let invalid = |field: &str| Err(AxError::InvalidInput(format!("{field} must be positive")));
    if self.cache.max_size == 0 {
      return invalid("cache.max_size");
    }
    if self.cache.cleanup_interval_ms == 0 {
      return invalid("cache.cleanup_interval_ms");
    }
    if self.tree.max_depth == 0 {
      return invalid("tree.max_depth");
    }
    if self.tree.parallel_threshold == 0 {
      return invalid("tree.parallel_threshold");
    }
    if self.tree.children_capacity == 0 {
      return invalid("tree.children_capacity");
    }
    Ok(())
  }
}

/// Info cache sizing and expiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
  pub max_size: usize,
  /// TTL for roles whose info rarely changes (controls, static content).
  pub static_ttl_ms: u64,
  pub dynamic_ttl_ms: u64,
  pub cleanup_interval_ms: u64,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      max_size: DEFAULT_CACHE_SIZE,
      static_ttl_ms: DEFAULT_STATIC_TTL_MS,
      dynamic_ttl_ms: DEFAULT_DYNAMIC_TTL_MS,
      cleanup_interval_ms: DEFAULT_CLEANUP_INTERVAL_MS,
    }
  }
}

impl CacheConfig {
  pub fn ttl_for(&self, role: &Role) -> Duration {
    if role.has_static_info() {
      Duration::from_millis(self.static_ttl_ms)
    } else {
      Duration::from_millis(self.dynamic_ttl_ms)
    }
  }

  pub fn cleanup_interval(&self) -> Duration {
    Duration::from_millis(self.cleanup_interval_ms.max(1))
  }
}

/// Tree traversal limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
  /// Nodes deeper than this are not visited. The root is at depth 1.
  pub max_depth: usize,
  /// Minimum child count for a parallel fan-out.
  pub parallel_threshold: usize,
  /// Deepest level that may fan out in parallel.
  pub max_parallel_depth: usize,
  /// Minimum capacity of each expanded node's children buffer.
  pub children_capacity: usize,
}

impl Default for TreeConfig {
  fn default() -> Self {
    Self {
      max_depth: DEFAULT_MAX_DEPTH,
      parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
      max_parallel_depth: DEFAULT_MAX_PARALLEL_DEPTH,
      children_capacity: DEFAULT_CHILDREN_CAPACITY,
    }
  }
}

/// Pointer action behavior.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionConfig {
  /// Move the cursor back after a click.
  pub restore_cursor_position: bool,
}

/// Adjustments for one application.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppOverride {
  /// Roles added to the clickable set while this app is focused.
  pub additional_clickable_roles: RoleSet,
  /// Treat this app's elements as clickable without a press action.
  pub ignore_clickable_check: bool,
}
