/*!
axwalk - accessibility tree walking for keyboard-driven pointer control

```ignore
use axwalk::{ActionKind, ElementFilter, Navigator};
use tokio_util::sync::CancellationToken;

// Create instance around a platform bridge (cache cleanup starts automatically)
let navigator = Navigator::builder(bridge).config(config).build()?;
let cancel = CancellationToken::new();

// Clickable elements of the frontmost window, menu bar and dock
let filter = ElementFilter { include_menubar: true, include_dock: true, ..Default::default() };
let elements = navigator.clickable_elements(&filter, &cancel)?;

// Act on one of them
navigator.perform_action_on_element(&elements[0], ActionKind::LeftClick, &cancel)?;

// Handles behind returned elements are released on the next query or here
navigator.shutdown();
```
*/

mod core;
mod types;

pub mod a11y;
pub mod cache;
pub mod config;
pub mod platform;
pub mod quadgrid;
pub mod tree;

pub use types::*;

pub use crate::core::{Navigator, NavigatorBuilder};
