/*!
Tree construction from a root element.

Traversal rules, applied to each node at depth `d` (root at 1):

- content roles (static text, image, heading) are kept but never expanded
- interactive leaves are kept but their children are never fetched
- at `d == max_depth` children are not fetched
- unless out-of-bounds elements are requested, a child is dropped when it has
  positive area and does not overlap the root's rectangle, or when it is a
  zero-area interactive leaf
- a node dropped by the rules above or by the caller's predicate is released
  immediately, together with its unexplored subtree

Children of a node are visited in parallel when the node is shallow enough and has
enough children; otherwise sequentially. Either way the result keeps platform order.

Only `PermissionDenied` (and cancellation) abort a build. Other per-node bridge
failures drop that node. An aborted build releases every handle it acquired,
including the root.
*/

use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use tokio_util::sync::CancellationToken;

use super::stats::TreeStats;
use super::{NodeId, NodePool, TreeNode, TreeStatsSnapshot};
use crate::cache::InfoCache;
use crate::config::TreeConfig;
use crate::platform::{Bridge, BridgeError};
use crate::types::{AxError, AxResult, Bounds, ElementInfo};

/// Extra inclusion test applied to every non-root node.
pub type ElementPredicate<'a> = &'a (dyn Fn(&ElementInfo) -> bool + Send + Sync);

/// Inputs for one build.
pub struct TreeOptions<'a, B: Bridge> {
  /// Info cache consulted before every `info` call. Required.
  pub cache: Option<&'a InfoCache<B>>,
  pub filter: Option<ElementPredicate<'a>>,
  pub include_out_of_bounds: bool,
  pub limits: TreeConfig,
}

impl<B: Bridge> Default for TreeOptions<'_, B> {
  fn default() -> Self {
    Self {
      cache: None,
      filter: None,
      include_out_of_bounds: false,
      limits: TreeConfig::default(),
    }
  }
}

impl<B: Bridge> std::fmt::Debug for TreeOptions<'_, B> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("TreeOptions")
      .field("has_cache", &self.cache.is_some())
      .field("has_filter", &self.filter.is_some())
      .field("include_out_of_bounds", &self.include_out_of_bounds)
      .field("limits", &self.limits)
      .finish()
  }
}

impl<'a, B: Bridge> TreeOptions<'a, B> {
  pub fn new(cache: &'a InfoCache<B>) -> Self {
    Self {
      cache: Some(cache),
      ..Self::default()
    }
  }

  #[must_use]
  pub const fn include_out_of_bounds(mut self, include: bool) -> Self {
    self.include_out_of_bounds = include;
    self
  }

  #[must_use]
  pub const fn limits(mut self, limits: TreeConfig) -> Self {
    self.limits = limits;
    self
  }

  #[must_use]
  pub fn filter(mut self, filter: ElementPredicate<'a>) -> Self {
    self.filter = Some(filter);
    self
  }
}

/// Builds trees with fixed options and accumulates statistics across builds.
pub struct TreeBuilder<'a, B: Bridge> {
  bridge: &'a B,
  cache: &'a InfoCache<B>,
  filter: Option<ElementPredicate<'a>>,
  include_out_of_bounds: bool,
  limits: TreeConfig,
  pool: &'a NodePool<B::Handle>,
  cancel: &'a CancellationToken,
  stats: TreeStats,
}

impl<B: Bridge> std::fmt::Debug for TreeBuilder<'_, B> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("TreeBuilder")
      .field("limits", &self.limits)
      .field("stats", &self.stats.snapshot())
      .finish_non_exhaustive()
  }
}

impl<'a, B: Bridge> TreeBuilder<'a, B> {
  /// Fails with `InvalidInput` when the options carry no cache.
  pub fn new(
    bridge: &'a B,
    options: &TreeOptions<'a, B>,
    pool: &'a NodePool<B::Handle>,
    cancel: &'a CancellationToken,
  ) -> AxResult<Self> {
    let cache = options
      .cache
      .ok_or_else(|| AxError::InvalidInput("tree options require an info cache".into()))?;
    Ok(Self {
      bridge,
      cache,
      filter: options.filter,
      include_out_of_bounds: options.include_out_of_bounds,
      limits: options.limits,
      pool,
      cancel,
      stats: TreeStats::default(),
    })
  }

  pub fn stats(&self) -> TreeStatsSnapshot {
    self.stats.snapshot()
  }

  /// Build the tree under `root`, taking ownership of the root handle.
  pub fn build(&self, root: B::Handle) -> AxResult<TreeNode<B::Handle>> {
    let started = Instant::now();
    if let Err(e) = self.ensure_active() {
      self.bridge.release(root);
      return Err(e);
    }
    let info = match self.info_for(&root) {
      Ok(info) => info,
      Err(e) => {
        self.bridge.release(root);
        return Err(AxError::from(e).context("failed to read root element"));
      }
    };
    let window = info.bounds();
    self.stats.visit(1);

    let mut tree = TreeNode::new(self.pool.next_id(), None, 1, root, info);
    if let Err(e) = self.expand(&mut tree, &window) {
      tree.release_all(self.bridge, self.pool);
      return Err(e);
    }

    log::debug!(
      "Built tree: nodes={} elapsed={:?} stats={:?}",
      tree.len(),
      started.elapsed(),
      self.stats.snapshot()
    );
    Ok(tree)
  }

  fn ensure_active(&self) -> AxResult<()> {
    if self.cancel.is_cancelled() {
      Err(AxError::Cancelled)
    } else {
      Ok(())
    }
  }

  fn info_for(&self, handle: &B::Handle) -> Result<Arc<ElementInfo>, BridgeError> {
    if let Some(info) = self.cache.get(handle) {
      return Ok(info);
    }
    let info = Arc::new(self.bridge.info(handle)?);
    self.cache.set(handle, Arc::clone(&info));
    Ok(info)
  }

  fn should_include(&self, info: &ElementInfo, window: &Bounds) -> bool {
    if !self.include_out_of_bounds {
      let bounds = info.bounds();
      if bounds.is_empty() {
        if info.role.is_interactive_leaf() {
          return false;
        }
      } else if !bounds.overlaps(window) {
        return false;
      }
    }
    self.filter.is_none_or(|f| f(info))
  }

  /// Fetch and attach the children of `node`.
  ///
  /// On error, whatever was attached stays on `node` for the caller to release.
  fn expand(&self, node: &mut TreeNode<B::Handle>, window: &Bounds) -> AxResult<()> {
    let depth = node.depth;
    let role = &node.info.role;
    if role.is_non_interactive() {
      self.stats.non_interactive();
      return Ok(());
    }
    if role.is_interactive_leaf() {
      self.stats.leaf();
      return Ok(());
    }
    if depth >= self.limits.max_depth {
      self.stats.depth_limited();
      return Ok(());
    }
    self.ensure_active()?;

    let children = match self.bridge.children(&node.handle) {
      Ok(children) => children,
      Err(BridgeError::PermissionDenied) => return Err(AxError::PermissionDenied),
      Err(e) => {
        self.stats.children_error();
        log::trace!("Skipping children of {}: {e}", node.info.role);
        return Ok(());
      }
    };
    if children.is_empty() {
      return Ok(());
    }

    let parent = node.id;
    let child_depth = depth + 1;
    let parallel =
      depth <= self.limits.max_parallel_depth && children.len() >= self.limits.parallel_threshold;
    self.stats.expansion(parallel);

    let mut attached = self
      .pool
      .children_buffer(children.len().max(self.limits.children_capacity));
    let mut failure = None;
    if parallel {
      let results: Vec<AxResult<Option<TreeNode<B::Handle>>>> = children
        .into_par_iter()
        .map(|child| self.visit(child, parent, child_depth, window))
        .collect();
      for result in results {
        match result {
          Ok(Some(child)) => attached.push(child),
          Ok(None) => {}
          Err(e) => {
            failure.get_or_insert(e);
          }
        }
      }
    } else {
      let mut pending = children.into_iter();
      for child in pending.by_ref() {
        match self.visit(child, parent, child_depth, window) {
          Ok(Some(child)) => attached.push(child),
          Ok(None) => {}
          Err(e) => {
            failure = Some(e);
            break;
          }
        }
      }
      for unvisited in pending {
        self.bridge.release(unvisited);
      }
    }

    node.children = attached;
    failure.map_or(Ok(()), Err)
  }

  /// Resolve one child. `Ok(None)` means it was dropped and released.
  fn visit(
    &self,
    handle: B::Handle,
    parent: NodeId,
    depth: usize,
    window: &Bounds,
  ) -> AxResult<Option<TreeNode<B::Handle>>> {
    if let Err(e) = self.ensure_active() {
      self.bridge.release(handle);
      return Err(e);
    }
    self.stats.visit(depth);

    let info = match self.info_for(&handle) {
      Ok(info) => info,
      Err(BridgeError::PermissionDenied) => {
        self.bridge.release(handle);
        return Err(AxError::PermissionDenied);
      }
      Err(e) => {
        self.stats.info_error();
        log::trace!("Skipping element: {e}");
        self.bridge.release(handle);
        return Ok(None);
      }
    };
    if !self.should_include(&info, window) {
      self.stats.filtered_out();
      self.bridge.release(handle);
      return Ok(None);
    }

    let mut node = TreeNode::new(self.pool.next_id(), Some(parent), depth, handle, info);
    if let Err(e) = self.expand(&mut node, window) {
      node.release_all(self.bridge, self.pool);
      return Err(e);
    }
    Ok(Some(node))
  }
}

/// Build a tree with one-off options. Takes ownership of `root`.
pub fn build_tree<B: Bridge>(
  bridge: &B,
  root: B::Handle,
  options: &TreeOptions<'_, B>,
  pool: &NodePool<B::Handle>,
  cancel: &CancellationToken,
) -> AxResult<TreeNode<B::Handle>> {
  match TreeBuilder::new(bridge, options, pool, cancel) {
    Ok(builder) => builder.build(root),
    Err(e) => {
      bridge.release(root);
      Err(e)
    }
  }
}
