//! Application module: exposes the app model used by the TUI and runtime.
//!
//! The `App` model lives in `app::model` and holds the track list, the
//! carousel, the index synchronizer and the last observed playback snapshot.

mod model;

pub use model::*;
