//! Audio-related small types and handles.
//!
//! Loop modes, transport states, the command enum understood by the audio
//! thread and the shared playback snapshot read by the UI.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::library::Track;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum LoopMode {
    /// Stop after the last track.
    NoLoop,
    /// Wrap around to the first track.
    #[default]
    LoopAll,
    /// Repeat the current song when it ends.
    LoopOne,
}

impl LoopMode {
    /// `NoLoop -> LoopAll -> LoopOne -> NoLoop`.
    pub fn cycled(self) -> Self {
        match self {
            Self::NoLoop => Self::LoopAll,
            Self::LoopAll => Self::LoopOne,
            Self::LoopOne => Self::NoLoop,
        }
    }

    /// Track to continue with after `current` finished on its own.
    pub fn next_after_end(self, current: usize, track_count: usize) -> Option<usize> {
        if track_count == 0 {
            return None;
        }
        match self {
            Self::LoopOne => Some(current),
            Self::LoopAll => Some((current + 1) % track_count),
            Self::NoLoop => (current + 1 < track_count).then_some(current + 1),
        }
    }
}

/// Transport state reported by the engine.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum TransportState {
    /// No playlist loaded.
    #[default]
    Idle,
    /// A track is loaded but has not started.
    Ready,
    Playing,
    Paused,
    /// Opening and decoding the next source.
    Buffering,
}

impl TransportState {
    pub fn label(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Ready => "Ready",
            Self::Playing => "Playing",
            Self::Paused => "Paused",
            Self::Buffering => "Buffering",
        }
    }

    /// Whether the engine is (about to be) producing sound.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Playing | Self::Buffering)
    }
}

#[derive(Debug)]
pub enum AudioCmd {
    /// Replace the playlist; the first track becomes current, not started.
    LoadPlaylist(Vec<Track>),
    /// Make `index` the current track, keeping play/pause as it is.
    SkipTo(usize),
    Play,
    Pause,
    /// Stop playback and unload the current source.
    Stop,
    /// Seek to an absolute position in the current track.
    SeekTo(Duration),
    SetLoopMode(LoopMode),
    /// Quit the audio thread, optionally fading out over `fade_out_ms` milliseconds.
    Quit { fade_out_ms: u64 },
}

/// Runtime playback information shared with the UI.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaybackInfo {
    /// Current track index in the playlist (if any).
    pub index: Option<usize>,
    pub state: TransportState,
    /// Elapsed playback time for the current track.
    pub position: Duration,
    /// Total duration of the current track, when known.
    pub duration: Option<Duration>,
}

pub type PlaybackHandle = Arc<Mutex<PlaybackInfo>>;
