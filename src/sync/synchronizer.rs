use std::time::Duration;

use tracing::{debug, trace, warn};

use crate::audio::TransportState;
use crate::carousel::ScrollEvent;

use super::collaborators::{CarouselView, Notification, PlaybackEngine, TransportAction};

/// Reconciles the carousel's scroll offset with the engine's playing track.
///
/// Settled invariant: `round(offset / viewport_width) == current_index ==`
/// the engine's current track. Drags and animated transitions break it for a
/// moment; the notifications that follow restore it.
#[derive(Debug, Clone)]
pub struct IndexSynchronizer {
    track_count: usize,
    viewport_width: f64,
    current_index: usize,
    /// Target of a carousel transition started by an engine track change.
    /// Scroll notifications for other pages are suppressed until it lands.
    follow_target: Option<usize>,
    /// Last skip issued from a scroll, not yet reported back by the engine.
    pending_skip: Option<usize>,
    /// Page of the last published offset.
    last_page: usize,
    dragging: bool,
}

impl IndexSynchronizer {
    pub fn new(track_count: usize, viewport_width: f64) -> Self {
        let viewport_width = if viewport_width.is_finite() && viewport_width > 0.0 {
            viewport_width
        } else {
            1.0
        };

        Self {
            track_count,
            viewport_width,
            current_index: 0,
            follow_target: None,
            pending_skip: None,
            last_page: 0,
            dragging: false,
        }
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn track_count(&self) -> usize {
        self.track_count
    }

    pub fn viewport_width(&self) -> f64 {
        self.viewport_width
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// True while an engine-driven carousel transition is in flight.
    pub fn is_following(&self) -> bool {
        self.follow_target.is_some()
    }

    /// Update the page width after a resize. Non-positive widths are ignored.
    pub fn set_viewport_width(&mut self, width: f64) {
        if width.is_finite() && width > 0.0 {
            self.viewport_width = width;
        }
    }

    /// Scroll offset at which `index` is settled.
    pub fn offset_for(&self, index: usize) -> f64 {
        index as f64 * self.viewport_width
    }

    /// Nearest page for a continuous offset, clamped to the track range.
    pub fn index_for_offset(&self, offset: f64) -> Option<usize> {
        if self.track_count == 0 || !offset.is_finite() {
            return None;
        }
        let last = (self.track_count - 1) as f64;
        let page = (offset / self.viewport_width).round().clamp(0.0, last);
        Some(page as usize)
    }

    /// Dispatch one notification. Returns true when `current_index` changed.
    pub fn handle(
        &mut self,
        notification: Notification,
        engine: &dyn PlaybackEngine,
        carousel: &mut dyn CarouselView,
    ) -> bool {
        match notification {
            Notification::Scroll(ScrollEvent::DragStarted) => {
                self.on_drag_started();
                false
            }
            Notification::Scroll(ScrollEvent::DragEnded) => self.on_drag_ended(engine).is_some(),
            Notification::Scroll(ScrollEvent::Offset(offset)) => {
                self.on_scroll_offset_changed(offset, engine).is_some()
            }
            Notification::TrackChanged(next) => self.on_playback_track_changed(next, carousel),
        }
    }

    /// React to a carousel offset, published continuously while it moves.
    ///
    /// Pushes playback only; the carousel already owns its offset so no
    /// scroll command is sent back. Returns the index skipped to, if any.
    pub fn on_scroll_offset_changed(
        &mut self,
        offset: f64,
        engine: &dyn PlaybackEngine,
    ) -> Option<usize> {
        let candidate = self.index_for_offset(offset)?;
        self.last_page = candidate;

        if let Some(target) = self.follow_target {
            if candidate == target {
                trace!(target, "carousel caught up with playback");
                self.follow_target = None;
            } else {
                trace!(candidate, target, "scroll suppressed during follow transition");
            }
            return None;
        }

        self.skip_to_page(candidate, engine)
    }

    fn skip_to_page(&mut self, page: usize, engine: &dyn PlaybackEngine) -> Option<usize> {
        if page == self.current_index {
            return None;
        }

        debug!(from = self.current_index, to = page, "carousel page changed, skipping");
        self.current_index = page;
        self.pending_skip = Some(page);
        engine.skip_to(page);
        Some(page)
    }

    /// The user grabbed the carousel: their drag drives playback until released.
    pub fn on_drag_started(&mut self) {
        self.dragging = true;
        if self.follow_target.take().is_some() {
            trace!("drag interrupted follow transition");
        }
    }

    /// The carousel was released and is settling on the page it was let go
    /// on. A track change that arrived mid-drag is overruled by that page, even
    /// when the drag published no offset afterwards.
    pub fn on_drag_ended(&mut self, engine: &dyn PlaybackEngine) -> Option<usize> {
        self.dragging = false;
        if self.track_count == 0 {
            return None;
        }
        self.skip_to_page(self.last_page, engine)
    }

    /// React to the engine reporting a new playing track.
    ///
    /// Returns true when `current_index` moved, so now-playing details need a
    /// refresh.
    pub fn on_playback_track_changed(
        &mut self,
        next: Option<usize>,
        carousel: &mut dyn CarouselView,
    ) -> bool {
        let Some(next) = next else {
            trace!("engine reported no next track");
            return false;
        };

        if next >= self.track_count {
            warn!(next, track_count = self.track_count, "engine reported out-of-range track");
            return false;
        }

        if let Some(pending) = self.pending_skip {
            if pending == next {
                self.pending_skip = None;
            } else {
                // Acknowledgement of an earlier skip; a newer one is on its way.
                trace!(next, pending, "stale track change ignored");
                return false;
            }
        }

        if next == self.current_index {
            return false;
        }

        if self.dragging {
            // The page the user lets go on decides; don't pull the carousel
            // out from under the pointer.
            debug!(from = self.current_index, to = next, "engine changed track during drag");
            self.current_index = next;
            return true;
        }

        debug!(from = self.current_index, to = next, "engine changed track, following");
        self.current_index = next;
        // Already on that page: no offsets will arrive to end the transition.
        self.follow_target = (self.last_page != next).then_some(next);
        carousel.scroll_to_offset(self.offset_for(next));
        true
    }

    /// Page the carousel is heading to. Equals `current_index` once settled.
    fn landing_page(&self, carousel: &dyn CarouselView) -> usize {
        self.index_for_offset(carousel.target_offset())
            .unwrap_or(self.current_index)
    }

    /// Scroll one page past where the carousel is heading. No-op on the last
    /// track.
    ///
    /// Takes over from an engine-driven transition, like a drag does, so the
    /// pages it scrolls through drive playback.
    pub fn request_next(&mut self, carousel: &mut dyn CarouselView) -> bool {
        let target = self.landing_page(carousel) + 1;
        if target >= self.track_count {
            return false;
        }
        self.scroll_on_request(target, carousel);
        true
    }

    /// Scroll one page before where the carousel is heading. No-op on the
    /// first track.
    pub fn request_previous(&mut self, carousel: &mut dyn CarouselView) -> bool {
        let Some(target) = self.landing_page(carousel).checked_sub(1) else {
            return false;
        };
        if target >= self.track_count {
            return false;
        }
        self.scroll_on_request(target, carousel);
        true
    }

    fn scroll_on_request(&mut self, target: usize, carousel: &mut dyn CarouselView) {
        if self.follow_target.take().is_some() {
            trace!(target, "request interrupted follow transition");
        }
        carousel.scroll_to_offset(self.offset_for(target));
    }

    /// Ask the engine for the opposite of the state it reports.
    pub fn request_toggle_playback(
        &self,
        state: TransportState,
        engine: &dyn PlaybackEngine,
    ) -> TransportAction {
        let action = TransportAction::for_state(state);
        match action {
            TransportAction::Play => engine.play(),
            TransportAction::Pause => engine.pause(),
        }
        action
    }

    /// Seek to an absolute position, clamped to the known track duration.
    pub fn request_seek(&self, position: Duration, engine: &dyn PlaybackEngine) -> Option<Duration> {
        let info = engine.progress();
        info.index?;
        let position = match info.duration {
            Some(total) => position.min(total),
            None => position,
        };
        engine.seek_to(position);
        Some(position)
    }

    /// Seek relative to the engine's current position.
    pub fn request_seek_by(&self, delta_secs: i64, engine: &dyn PlaybackEngine) -> Option<Duration> {
        let current = engine.progress().position;
        let target = if delta_secs >= 0 {
            current.saturating_add(Duration::from_secs(delta_secs.unsigned_abs()))
        } else {
            current.saturating_sub(Duration::from_secs(delta_secs.unsigned_abs()))
        };
        self.request_seek(target, engine)
    }
}
