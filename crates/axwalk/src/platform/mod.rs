/*! Platform contract and shared input state. */

mod mouse;
mod traits;

#[cfg(test)]
pub(crate) mod mock;

pub use mouse::MouseState;
pub use traits::{Bridge, BridgeError, BridgeResult};
