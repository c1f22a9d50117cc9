/*!
Kept tree nodes to domain elements, with the caller's post-filter.
*/

use std::num::NonZeroUsize;
use std::thread;

use rayon::prelude::*;
use tokio_util::sync::CancellationToken;

use crate::platform::Bridge;
use crate::tree::{NodePool, TreeNode};
use crate::types::{AxError, AxResult, DomainElement, ElementFilter, ElementId, ElementInfo};

/// Element counts above this are filtered in parallel chunks.
const CONCURRENT_FILTER_THRESHOLD: usize = 100;

const MAX_FILTER_WORKERS: usize = 8;

/// Elements processed between cancellation checks.
const CANCEL_CHECK_INTERVAL: usize = 100;

/// Domain elements paired with the handles that back them.
pub(super) type Collected<H> = Vec<(DomainElement, H)>;

pub(super) fn to_domain<B: Bridge>(bridge: &B, handle: &B::Handle, info: &ElementInfo) -> DomainElement {
  DomainElement {
    id: ElementId::from_hash(bridge.hash(handle)),
    bounds: info.bounds(),
    role: info.role.as_str().to_string(),
    title: info.title.clone(),
    description: info.role_description.clone(),
    clickable: true,
  }
}

/// Convert kept nodes, releasing the handles of elements the filter rejects.
///
/// On cancellation every handle, accepted or not, is released.
pub(super) fn collect_elements<B: Bridge>(
  bridge: &B,
  pool: &NodePool<B::Handle>,
  nodes: Vec<TreeNode<B::Handle>>,
  filter: Option<&ElementFilter>,
  cancel: &CancellationToken,
) -> AxResult<Collected<B::Handle>> {
  if nodes.len() <= CONCURRENT_FILTER_THRESHOLD {
    return filter_chunk(bridge, pool, nodes, filter, cancel);
  }

  let workers = thread::available_parallelism()
    .map_or(1, NonZeroUsize::get)
    .clamp(1, MAX_FILTER_WORKERS);
  let chunk_size = nodes.len().div_ceil(workers);
  let mut chunks = Vec::with_capacity(workers);
  let mut rest = nodes;
  while !rest.is_empty() {
    let tail = rest.split_off(chunk_size.min(rest.len()));
    chunks.push(rest);
    rest = tail;
  }

  let results: Vec<AxResult<Collected<B::Handle>>> = chunks
    .into_par_iter()
    .map(|chunk| filter_chunk(bridge, pool, chunk, filter, cancel))
    .collect();

  let mut merged = Vec::new();
  let mut failure = None;
  for result in results {
    match result {
      Ok(collected) => merged.extend(collected),
      Err(e) => {
        failure.get_or_insert(e);
      }
    }
  }
  match failure {
    Some(e) => {
      release_collected(bridge, merged);
      Err(e)
    }
    None => Ok(merged),
  }
}

pub(super) fn release_collected<B: Bridge>(bridge: &B, collected: Collected<B::Handle>) {
  for (_, handle) in collected {
    bridge.release(handle);
  }
}

fn filter_chunk<B: Bridge>(
  bridge: &B,
  pool: &NodePool<B::Handle>,
  nodes: Vec<TreeNode<B::Handle>>,
  filter: Option<&ElementFilter>,
  cancel: &CancellationToken,
) -> AxResult<Collected<B::Handle>> {
  let mut accepted = Vec::with_capacity(nodes.len());
  let mut pending = nodes.into_iter().enumerate();

  for (index, node) in pending.by_ref() {
    if index % CANCEL_CHECK_INTERVAL == 0 && cancel.is_cancelled() {
      node.release_all(bridge, pool);
      for (_, rest) in pending {
        rest.release_all(bridge, pool);
      }
      release_collected(bridge, accepted);
      return Err(AxError::Cancelled);
    }

    let (handle, info) = match node.into_parts() {
      Ok(parts) => parts,
      Err(node) => {
        log::error!("Kept node still has children; releasing it");
        node.release_all(bridge, pool);
        continue;
      }
    };
    let element = to_domain(bridge, &handle, &info);
    if filter.is_none_or(|f| f.matches(&info.role, &element.bounds)) {
      accepted.push((element, handle));
    } else {
      bridge.release(handle);
    }
  }
  Ok(accepted)
}
