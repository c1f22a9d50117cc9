/*!
Clickable-node extraction and tree release.
*/

use std::collections::{HashMap, HashSet};

use tokio_util::sync::CancellationToken;

use super::{NodeId, NodePool, TreeNode};
use crate::a11y::RoleSet;
use crate::platform::Bridge;
use crate::types::{AxError, AxResult};

/// Nodes visited between cancellation checks.
const CANCEL_CHECK_INTERVAL: usize = 100;

/// Nodes to keep when a tree is released, in selection order.
#[derive(Debug, Clone, Default)]
pub struct KeepSet {
  positions: HashMap<NodeId, usize>,
}

impl KeepSet {
  pub fn new() -> Self {
    Self::default()
  }

  /// Add a node. Returns false if it was already present.
  pub fn insert(&mut self, id: NodeId) -> bool {
    let next = self.positions.len();
    match self.positions.entry(id) {
      std::collections::hash_map::Entry::Occupied(_) => false,
      std::collections::hash_map::Entry::Vacant(slot) => {
        slot.insert(next);
        true
      }
    }
  }

  pub fn contains(&self, id: NodeId) -> bool {
    self.positions.contains_key(&id)
  }

  pub fn len(&self) -> usize {
    self.positions.len()
  }

  pub fn is_empty(&self) -> bool {
    self.positions.is_empty()
  }

  fn position(&self, id: NodeId) -> Option<usize> {
    self.positions.get(&id).copied()
  }
}

/// Selects clickable nodes from a built tree.
///
/// A node is clickable when its role is in the allowed set and it either
/// advertises a press action or belongs to an app exempt from that check.
pub struct ClickableFinder<'a, B: Bridge> {
  bridge: &'a B,
  default_roles: &'a RoleSet,
  exempt_bundles: Option<&'a HashSet<String>>,
  exempt_all: bool,
}

impl<B: Bridge> std::fmt::Debug for ClickableFinder<'_, B> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ClickableFinder")
      .field("default_roles", &self.default_roles.len())
      .field("exempt_all", &self.exempt_all)
      .finish_non_exhaustive()
  }
}

impl<'a, B: Bridge> ClickableFinder<'a, B> {
  /// `default_roles` applies whenever `find` is given no explicit role set.
  pub const fn new(bridge: &'a B, default_roles: &'a RoleSet) -> Self {
    Self {
      bridge,
      default_roles,
      exempt_bundles: None,
      exempt_all: false,
    }
  }

  /// Skip the press-action check for elements of these bundles.
  #[must_use]
  pub const fn exempt_bundles(mut self, bundles: &'a HashSet<String>) -> Self {
    self.exempt_bundles = Some(bundles);
    self
  }

  /// Skip the press-action check for every element.
  #[must_use]
  pub const fn exempt_all(mut self, exempt: bool) -> Self {
    self.exempt_all = exempt;
    self
  }

  /// Pre-order scan of `tree`. `allowed` overrides the default role set.
  pub fn find(
    &self,
    tree: &TreeNode<B::Handle>,
    allowed: Option<&RoleSet>,
    cancel: &CancellationToken,
  ) -> AxResult<KeepSet> {
    let roles = allowed.unwrap_or(self.default_roles);
    let mut keep = KeepSet::new();
    let mut stack = vec![tree];
    let mut visited = 0usize;

    while let Some(node) = stack.pop() {
      if visited % CANCEL_CHECK_INTERVAL == 0 && cancel.is_cancelled() {
        return Err(AxError::Cancelled);
      }
      visited += 1;
      if self.is_clickable(node, roles) {
        keep.insert(node.id());
      }
      stack.extend(node.children().iter().rev());
    }

    log::debug!("Found {} clickable of {visited} nodes", keep.len());
    Ok(keep)
  }

  fn is_clickable(&self, node: &TreeNode<B::Handle>, roles: &RoleSet) -> bool {
    if !roles.contains(&node.info().role) {
      return false;
    }
    if self.exempt_all {
      return true;
    }
    let exempt = self.exempt_bundles.is_some_and(|bundles| {
      !bundles.is_empty()
        && self
          .bridge
          .bundle_id(node.handle())
          .is_some_and(|b| bundles.contains(&b))
    });
    exempt || self.bridge.has_click_action(node.handle())
  }
}

/// What survives a release: the root handle (unless the root was kept) and the
/// kept nodes, detached and childless.
#[derive(Debug)]
pub struct ReleasedTree<H> {
  pub root: Option<H>,
  pub kept: Vec<TreeNode<H>>,
}

impl<H> TreeNode<H> {
  /// Release every handle in this tree except the root's and the kept nodes'.
  ///
  /// Children are released before their parents. Kept nodes are returned in the
  /// order they were added to `keep`, with parent links and children cleared. The
  /// root handle is handed back to the caller unless the root itself was kept.
  pub fn release<B: Bridge<Handle = H>>(
    mut self,
    keep: &KeepSet,
    bridge: &B,
    pool: &NodePool<H>,
  ) -> ReleasedTree<H> {
    let mut slots: Vec<Option<TreeNode<H>>> =
      std::iter::repeat_with(|| None).take(keep.len()).collect();
    let children = std::mem::take(&mut self.children);
    release_children(children, keep, bridge, pool, &mut slots);

    self.parent = None;
    let root = match keep.position(self.id) {
      Some(position) => {
        if let Some(slot) = slots.get_mut(position) {
          *slot = Some(self);
        }
        None
      }
      None => Some(self.handle),
    };

    ReleasedTree {
      root,
      kept: slots.into_iter().flatten().collect(),
    }
  }

  /// Release every handle in this tree, the root's included.
  pub fn release_all<B: Bridge<Handle = H>>(self, bridge: &B, pool: &NodePool<H>) {
    let released = self.release(&KeepSet::new(), bridge, pool);
    if let Some(root) = released.root {
      bridge.release(root);
    }
  }
}

fn release_children<B: Bridge>(
  mut children: Vec<TreeNode<B::Handle>>,
  keep: &KeepSet,
  bridge: &B,
  pool: &NodePool<B::Handle>,
  slots: &mut [Option<TreeNode<B::Handle>>],
) {
  for mut node in children.drain(..) {
    let grandchildren = std::mem::take(&mut node.children);
    release_children(grandchildren, keep, bridge, pool, slots);
    match keep.position(node.id) {
      Some(position) => {
        node.parent = None;
        if let Some(slot) = slots.get_mut(position) {
          *slot = Some(node);
        }
      }
      None => bridge.release(node.handle),
    }
  }
  pool.recycle(children);
}
