//! Application model: `App`.
//!
//! Everything the UI draws and the runtime mutates lives here. The carousel
//! and the synchronizer are plain fields so the event loop can borrow them
//! separately.

use std::collections::HashSet;
use std::time::Duration;

use crate::artwork::ArtworkCache;
use crate::audio::{LoopMode, PlaybackHandle, PlaybackInfo, TransportState};
use crate::carousel::Carousel;
use crate::library::Track;
use crate::sync::{IndexSynchronizer, Notification, PlaybackEngine};

/// The main application model.
pub struct App {
    pub tracks: Vec<Track>,
    pub carousel: Carousel,
    pub sync: IndexSynchronizer,
    pub loop_mode: LoopMode,
    pub artwork: ArtworkCache,

    liked: HashSet<u32>,
    playback: PlaybackInfo,
    playback_handle: Option<PlaybackHandle>,
}

impl App {
    /// Create a new `App` over `tracks`, one carousel page per track.
    pub fn new(tracks: Vec<Track>, viewport_width: f64, animation: Duration) -> Self {
        let count = tracks.len();
        Self {
            tracks,
            carousel: Carousel::new(count, viewport_width, animation),
            sync: IndexSynchronizer::new(count, viewport_width),
            loop_mode: LoopMode::LoopAll,
            artwork: ArtworkCache::default(),
            liked: HashSet::new(),
            playback: PlaybackInfo::default(),
            playback_handle: None,
        }
    }

    /// Attach a `PlaybackHandle` used to observe playback progress.
    pub fn set_playback_handle(&mut self, h: PlaybackHandle) {
        self.playback_handle = Some(h);
    }

    /// Copy the engine's shared snapshot. Returns true if it changed.
    pub fn refresh_playback(&mut self) -> bool {
        let Some(handle) = self.playback_handle.as_ref() else {
            return false;
        };
        let Ok(info) = handle.lock() else {
            return false;
        };
        if *info == self.playback {
            return false;
        }
        self.playback = info.clone();
        true
    }

    pub fn playback(&self) -> &PlaybackInfo {
        &self.playback
    }

    pub fn transport_state(&self) -> TransportState {
        self.playback.state
    }

    /// Route one notification through the synchronizer.
    pub fn handle_notification(
        &mut self,
        notification: Notification,
        engine: &dyn PlaybackEngine,
    ) -> bool {
        self.sync.handle(notification, engine, &mut self.carousel)
    }

    /// Resize carousel pages and keep the synchronizer's page math in step.
    pub fn set_viewport_width(&mut self, width: f64) {
        if (width - self.carousel.viewport_width()).abs() < f64::EPSILON {
            return;
        }
        self.carousel.set_viewport_width(width);
        self.sync.set_viewport_width(width);
        self.artwork.clear();
    }

    /// The track the carousel is settled on (or settling towards).
    pub fn current_track(&self) -> Option<&Track> {
        self.tracks.get(self.sync.current_index())
    }

    /// The track the engine reports as loaded.
    pub fn now_playing(&self) -> Option<(usize, &Track)> {
        let i = self.playback.index?;
        self.tracks.get(i).map(|t| (i, t))
    }

    /// Flip the liked flag of the current track. Returns the new value.
    pub fn toggle_like(&mut self) -> bool {
        let Some(id) = self.current_track().map(|t| t.id) else {
            return false;
        };
        if self.liked.remove(&id) {
            false
        } else {
            self.liked.insert(id);
            true
        }
    }

    pub fn is_liked(&self, id: u32) -> bool {
        self.liked.contains(&id)
    }

    /// Cycle `loop_mode` through `NoLoop -> LoopAll -> LoopOne`.
    pub fn cycle_loop_mode(&mut self) {
        self.loop_mode = self.loop_mode.cycled();
    }

    /// Return true if the library contains any tracks.
    pub fn has_tracks(&self) -> bool {
        !self.tracks.is_empty()
    }
}
