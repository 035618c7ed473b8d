//! Horizontally paged carousel state.
//!
//! The carousel owns a continuous scroll offset measured in terminal columns.
//! One page is one viewport wide. Listeners observe the offset through scoped
//! subscriptions; the offset only changes through drags, animated scroll
//! commands and resizes.

mod state;
mod subscription;

pub use state::*;
pub use subscription::*;
