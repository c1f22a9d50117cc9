/*! Core types for axwalk.

Regenerate TypeScript types: `cargo test export_bindings`
*/

#![allow(missing_docs)]

mod element;
mod error;
mod filter;
mod geometry;
mod ids;

pub use element::{DomainElement, ElementInfo};
pub use error::{AxError, AxResult, ErrorCode};
pub use filter::ElementFilter;
pub use geometry::{Bounds, Point, Size};
pub use ids::{ElementId, ProcessId};
