/*!
Accessibility tree snapshots.

A [`TreeNode`] owns its element handle and its children. Building a tree acquires
one handle per node; [`TreeNode::release`] gives every handle back except those of
the nodes the caller chose to keep, which come out detached from the tree.

```ignore
let tree = build_tree(&*bridge, window, &TreeOptions::new(&cache), &pool, &cancel)?;
let keep = ClickableFinder::new(&*bridge, &roles).find(&tree, None, &cancel)?;
let ReleasedTree { root, kept } = tree.release(&keep, &*bridge, &pool);
```
*/

mod build;
mod clickable;
mod pool;
mod stats;

pub use build::{build_tree, ElementPredicate, TreeBuilder, TreeOptions};
pub use clickable::{ClickableFinder, KeepSet, ReleasedTree};
pub use pool::NodePool;
pub use stats::TreeStatsSnapshot;

use std::sync::Arc;

use derive_more::{Display, From, Into};

use crate::types::ElementInfo;

/// Identifier of a node within one pool's builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, From, Into)]
pub struct NodeId(pub u64);

/// One element of a built tree.
#[derive(Debug)]
pub struct TreeNode<H> {
  id: NodeId,
  parent: Option<NodeId>,
  depth: usize,
  handle: H,
  info: Arc<ElementInfo>,
  children: Vec<TreeNode<H>>,
}

impl<H> TreeNode<H> {
  pub(crate) const fn new(
    id: NodeId,
    parent: Option<NodeId>,
    depth: usize,
    handle: H,
    info: Arc<ElementInfo>,
  ) -> Self {
    Self {
      id,
      parent,
      depth,
      handle,
      info,
      children: Vec::new(),
    }
  }

  pub const fn id(&self) -> NodeId {
    self.id
  }

  /// Parent node, or `None` for the root and for nodes detached by `release`.
  pub const fn parent(&self) -> Option<NodeId> {
    self.parent
  }

  /// Depth in the tree; the root is at depth 1.
  pub const fn depth(&self) -> usize {
    self.depth
  }

  pub const fn handle(&self) -> &H {
    &self.handle
  }

  pub fn info(&self) -> &ElementInfo {
    &self.info
  }

  pub fn children(&self) -> &[TreeNode<H>] {
    &self.children
  }

  /// Node count of this subtree.
  pub fn len(&self) -> usize {
    1 + self.children.iter().map(TreeNode::len).sum::<usize>()
  }

  /// Always false: a subtree contains at least its own root.
  pub const fn is_empty(&self) -> bool {
    false
  }

  /// Pre-order visit of this subtree.
  pub fn walk<'a>(&'a self, f: &mut impl FnMut(&'a TreeNode<H>)) {
    f(self);
    for child in &self.children {
      child.walk(f);
    }
  }

  /// Take the handle and info of a node with no children.
  ///
  /// Detached nodes from [`TreeNode::release`] always qualify. Returns the node
  /// unchanged if it still has children, since their handles would be lost.
  pub fn into_parts(self) -> Result<(H, Arc<ElementInfo>), Self> {
    if self.children.is_empty() {
      Ok((self.handle, self.info))
    } else {
      Err(self)
    }
  }
}
