/*! Branded ID types for type-safe entity references. */

use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Element identifier, derived from the platform element hash.
///
/// Two handles to the same on-screen element produce the same id, so ids are
/// stable across queries as long as the platform hash is.
#[derive(
  Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS, Display, From, Into,
)]
#[ts(export)]
pub struct ElementId(pub String);

impl ElementId {
  pub fn from_hash(hash: u64) -> Self {
    Self(format!("elem_{hash:016x}"))
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

/// Process ID - branded type to distinguish from other u32 values.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, Display, From, Into,
)]
#[ts(export)]
pub struct ProcessId(pub u32);
