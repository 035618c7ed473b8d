//! Playback engine backed by a `rodio` audio thread.
//!
//! `AudioPlayer` is the command side, `PlaybackInfo` the observed side.
//! Decoding and output are rodio's job; this module only sequences tracks.

mod player;
mod sink;
mod thread;
mod types;

pub use player::*;
pub use sink::SinkError;
pub use types::*;
