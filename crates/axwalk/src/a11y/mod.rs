/*! Accessibility vocabulary: roles and actions. */

mod action;
mod role;

pub use action::{ActionKind, MouseButton};
pub use role::{Role, RoleSet};
