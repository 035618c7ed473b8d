//! Interfaces the synchronizer drives, and the notifications it consumes.

use std::time::Duration;

use crate::audio::{LoopMode, PlaybackInfo, TransportState};
use crate::carousel::ScrollEvent;
use crate::library::Track;

/// Command surface of the audio engine.
///
/// Every command is fire-and-forget: completion is observed later through
/// `Notification::TrackChanged` and the shared `PlaybackInfo`, never through a
/// return value.
pub trait PlaybackEngine {
    fn load_playlist(&self, tracks: Vec<Track>);
    fn skip_to(&self, index: usize);
    fn play(&self);
    fn pause(&self);
    fn stop(&self);
    /// Seek to an absolute position in the current track.
    fn seek_to(&self, position: Duration);
    fn set_loop_mode(&self, mode: LoopMode);

    /// Index of the track the engine currently has loaded.
    fn current_track(&self) -> Option<usize>;
    /// Snapshot of position, duration and transport state.
    fn progress(&self) -> PlaybackInfo;

    fn transport_state(&self) -> TransportState {
        self.progress().state
    }
}

/// Command surface of the paged carousel.
pub trait CarouselView {
    fn scroll_to_offset(&mut self, offset: f64);
    /// Offset the carousel will rest at: the end of a running animation, or
    /// the current offset.
    fn target_offset(&self) -> f64;
}

/// Everything the synchronizer reacts to, serialized through one channel so
/// that scroll-driven and engine-driven updates are processed in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    Scroll(ScrollEvent),
    /// The engine switched tracks; `None` means there is no next track.
    TrackChanged(Option<usize>),
}

/// What a play/pause button press should ask the engine to do.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TransportAction {
    Play,
    Pause,
}

impl TransportAction {
    /// Map the engine's reported state to the opposite action.
    pub fn for_state(state: TransportState) -> Self {
        match state {
            TransportState::Idle | TransportState::Ready | TransportState::Paused => Self::Play,
            TransportState::Playing | TransportState::Buffering => Self::Pause,
        }
    }
}
