use std::cell::RefCell;
use std::time::Duration;

use super::*;
use crate::audio::{LoopMode, PlaybackInfo, TransportState};
use crate::carousel::ScrollEvent;
use crate::library::Track;

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Load(usize),
    SkipTo(usize),
    Play,
    Pause,
    Stop,
    SeekTo(Duration),
    LoopMode(LoopMode),
}

#[derive(Default)]
struct RecordingEngine {
    calls: RefCell<Vec<Call>>,
    info: RefCell<PlaybackInfo>,
}

impl RecordingEngine {
    fn with_info(info: PlaybackInfo) -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            info: RefCell::new(info),
        }
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }
}

impl PlaybackEngine for RecordingEngine {
    fn load_playlist(&self, tracks: Vec<Track>) {
        self.calls.borrow_mut().push(Call::Load(tracks.len()));
    }
    fn skip_to(&self, index: usize) {
        self.calls.borrow_mut().push(Call::SkipTo(index));
    }
    fn play(&self) {
        self.calls.borrow_mut().push(Call::Play);
    }
    fn pause(&self) {
        self.calls.borrow_mut().push(Call::Pause);
    }
    fn stop(&self) {
        self.calls.borrow_mut().push(Call::Stop);
    }
    fn seek_to(&self, position: Duration) {
        self.calls.borrow_mut().push(Call::SeekTo(position));
    }
    fn set_loop_mode(&self, mode: LoopMode) {
        self.calls.borrow_mut().push(Call::LoopMode(mode));
    }
    fn current_track(&self) -> Option<usize> {
        self.info.borrow().index
    }
    fn progress(&self) -> PlaybackInfo {
        self.info.borrow().clone()
    }
}

#[derive(Default)]
struct RecordingCarousel {
    scrolls: Vec<f64>,
    target: f64,
}

impl CarouselView for RecordingCarousel {
    fn scroll_to_offset(&mut self, offset: f64) {
        self.scrolls.push(offset);
        self.target = offset;
    }

    fn target_offset(&self) -> f64 {
        self.target
    }
}

fn offset(value: f64) -> Notification {
    Notification::Scroll(ScrollEvent::Offset(value))
}

#[test]
fn scroll_offset_skips_to_rounded_page() {
    let engine = RecordingEngine::default();
    let mut sync = IndexSynchronizer::new(5, 400.0);

    assert_eq!(sync.on_scroll_offset_changed(812.0, &engine), Some(2));
    assert_eq!(sync.current_index(), 2);
    assert_eq!(engine.calls(), vec![Call::SkipTo(2)]);
}

#[test]
fn repeated_offsets_on_the_same_page_skip_once() {
    let engine = RecordingEngine::default();
    let mut carousel = RecordingCarousel::default();
    let mut sync = IndexSynchronizer::new(5, 400.0);

    for value in [790.0, 800.0, 812.0, 805.5] {
        sync.handle(offset(value), &engine, &mut carousel);
    }
    assert_eq!(engine.calls(), vec![Call::SkipTo(2)]);
    assert!(carousel.scrolls.is_empty());
}

#[test]
fn offset_below_half_page_stays_on_current_track() {
    let engine = RecordingEngine::default();
    let mut sync = IndexSynchronizer::new(5, 400.0);

    assert_eq!(sync.on_scroll_offset_changed(199.0, &engine), None);
    assert!(engine.calls().is_empty());
}

#[test]
fn offsets_outside_the_range_clamp_to_the_ends() {
    let sync = IndexSynchronizer::new(3, 100.0);
    assert_eq!(sync.index_for_offset(-250.0), Some(0));
    assert_eq!(sync.index_for_offset(10_000.0), Some(2));
    assert_eq!(sync.index_for_offset(f64::NAN), None);

    let empty = IndexSynchronizer::new(0, 100.0);
    assert_eq!(empty.index_for_offset(0.0), None);
}

#[test]
fn track_changed_scrolls_carousel_exactly_once() {
    let engine = RecordingEngine::default();
    let mut carousel = RecordingCarousel::default();
    let mut sync = IndexSynchronizer::new(5, 400.0);
    sync.on_scroll_offset_changed(800.0, &engine);
    sync.on_playback_track_changed(Some(2), &mut carousel);
    assert!(carousel.scrolls.is_empty());

    assert!(sync.on_playback_track_changed(Some(3), &mut carousel));
    assert_eq!(sync.current_index(), 3);
    assert_eq!(carousel.scrolls, vec![1200.0]);
}

#[test]
fn track_changed_to_none_is_ignored() {
    let mut carousel = RecordingCarousel::default();
    let mut sync = IndexSynchronizer::new(5, 400.0);

    assert!(!sync.on_playback_track_changed(None, &mut carousel));
    assert_eq!(sync.current_index(), 0);
    assert!(carousel.scrolls.is_empty());
}

#[test]
fn track_changed_out_of_range_is_ignored() {
    let mut carousel = RecordingCarousel::default();
    let mut sync = IndexSynchronizer::new(2, 400.0);

    assert!(!sync.on_playback_track_changed(Some(7), &mut carousel));
    assert_eq!(sync.current_index(), 0);
    assert!(carousel.scrolls.is_empty());
}

#[test]
fn track_changed_to_current_index_does_nothing() {
    let mut carousel = RecordingCarousel::default();
    let mut sync = IndexSynchronizer::new(3, 400.0);

    assert!(!sync.on_playback_track_changed(Some(0), &mut carousel));
    assert!(carousel.scrolls.is_empty());
}

#[test]
fn follow_transition_does_not_echo_back_to_engine() {
    let engine = RecordingEngine::default();
    let mut carousel = RecordingCarousel::default();
    let mut sync = IndexSynchronizer::new(5, 400.0);

    sync.on_playback_track_changed(Some(3), &mut carousel);
    assert!(sync.is_following());

    // Intermediate frames of the animation from page 0 to page 3.
    for value in [150.0, 420.0, 790.0, 1100.0, 1200.0] {
        sync.handle(offset(value), &engine, &mut carousel);
    }

    assert!(engine.calls().is_empty());
    assert!(!sync.is_following());
    assert_eq!(sync.current_index(), 3);
}

#[test]
fn scrolls_after_follow_lands_drive_the_engine_again() {
    let engine = RecordingEngine::default();
    let mut carousel = RecordingCarousel::default();
    let mut sync = IndexSynchronizer::new(5, 400.0);

    sync.on_playback_track_changed(Some(1), &mut carousel);
    sync.on_scroll_offset_changed(400.0, &engine);
    assert_eq!(sync.on_scroll_offset_changed(800.0, &engine), Some(2));
    assert_eq!(engine.calls(), vec![Call::SkipTo(2)]);
}

#[test]
fn stale_acknowledgement_of_an_earlier_skip_is_ignored() {
    let engine = RecordingEngine::default();
    let mut carousel = RecordingCarousel::default();
    let mut sync = IndexSynchronizer::new(5, 400.0);

    // A fast flick passes pages 1 and 2.
    sync.on_scroll_offset_changed(400.0, &engine);
    sync.on_scroll_offset_changed(800.0, &engine);
    assert_eq!(engine.calls(), vec![Call::SkipTo(1), Call::SkipTo(2)]);

    // The engine acknowledges both, in order.
    assert!(!sync.on_playback_track_changed(Some(1), &mut carousel));
    assert!(!sync.on_playback_track_changed(Some(2), &mut carousel));

    assert_eq!(sync.current_index(), 2);
    assert!(carousel.scrolls.is_empty());
}

#[test]
fn engine_change_during_drag_updates_index_without_scrolling() {
    let engine = RecordingEngine::default();
    let mut carousel = RecordingCarousel::default();
    let mut sync = IndexSynchronizer::new(5, 400.0);

    sync.handle(Notification::Scroll(ScrollEvent::DragStarted), &engine, &mut carousel);
    assert!(sync.is_dragging());

    assert!(sync.handle(Notification::TrackChanged(Some(1)), &engine, &mut carousel));
    assert_eq!(sync.current_index(), 1);
    assert!(carousel.scrolls.is_empty());

    sync.handle(offset(450.0), &engine, &mut carousel);
    sync.handle(Notification::Scroll(ScrollEvent::DragEnded), &engine, &mut carousel);
    assert!(!sync.is_dragging());
    assert!(engine.calls().is_empty());
}

#[test]
fn release_on_another_page_overrules_track_change_during_drag() {
    let engine = RecordingEngine::default();
    let mut carousel = RecordingCarousel::default();
    let mut sync = IndexSynchronizer::new(5, 400.0);

    // The pointer never moves, so no offset follows the engine's change.
    sync.handle(Notification::Scroll(ScrollEvent::DragStarted), &engine, &mut carousel);
    sync.handle(Notification::TrackChanged(Some(1)), &engine, &mut carousel);
    assert!(sync.handle(Notification::Scroll(ScrollEvent::DragEnded), &engine, &mut carousel));

    assert_eq!(sync.current_index(), 0);
    assert_eq!(engine.calls(), vec![Call::SkipTo(0)]);
    assert!(carousel.scrolls.is_empty());

    // Its acknowledgement changes nothing.
    assert!(!sync.handle(Notification::TrackChanged(Some(0)), &engine, &mut carousel));
}

#[test]
fn plain_drag_release_issues_no_skip() {
    let engine = RecordingEngine::default();
    let mut sync = IndexSynchronizer::new(5, 400.0);

    sync.on_drag_started();
    sync.on_scroll_offset_changed(120.0, &engine);
    assert_eq!(sync.on_drag_ended(&engine), None);
    assert!(engine.calls().is_empty());
}

#[test]
fn drag_cancels_follow_transition() {
    let engine = RecordingEngine::default();
    let mut carousel = RecordingCarousel::default();
    let mut sync = IndexSynchronizer::new(5, 400.0);

    sync.on_playback_track_changed(Some(4), &mut carousel);
    sync.on_drag_started();
    assert!(!sync.is_following());

    // The user pulls back to page 1 before the animation lands.
    assert_eq!(sync.on_scroll_offset_changed(410.0, &engine), Some(1));
    assert_eq!(engine.calls(), vec![Call::SkipTo(1)]);
}

#[test]
fn next_scrolls_one_page_forward() {
    let mut carousel = RecordingCarousel::default();
    let mut sync = IndexSynchronizer::new(5, 400.0);
    sync.on_playback_track_changed(Some(1), &mut carousel);
    carousel.scrolls.clear();

    assert!(sync.request_next(&mut carousel));
    assert_eq!(carousel.scrolls, vec![800.0]);
}

#[test]
fn next_on_last_track_is_a_no_op() {
    let mut carousel = RecordingCarousel::default();
    let mut sync = IndexSynchronizer::new(3, 400.0);
    sync.on_playback_track_changed(Some(2), &mut carousel);
    carousel.scrolls.clear();

    assert!(!sync.request_next(&mut carousel));
    assert!(carousel.scrolls.is_empty());
}

#[test]
fn previous_on_first_track_is_a_no_op() {
    let mut carousel = RecordingCarousel::default();
    let mut sync = IndexSynchronizer::new(3, 400.0);

    assert!(!sync.request_previous(&mut carousel));
    assert!(carousel.scrolls.is_empty());
}

#[test]
fn previous_scrolls_one_page_back() {
    let mut carousel = RecordingCarousel::default();
    let mut sync = IndexSynchronizer::new(3, 400.0);
    sync.on_playback_track_changed(Some(2), &mut carousel);
    carousel.scrolls.clear();

    assert!(sync.request_previous(&mut carousel));
    assert_eq!(carousel.scrolls, vec![400.0]);
}

#[test]
fn requests_step_from_where_the_carousel_is_heading() {
    let mut carousel = RecordingCarousel::default();
    let mut sync = IndexSynchronizer::new(5, 400.0);

    // Two presses before the first animation crosses half a page.
    assert!(sync.request_next(&mut carousel));
    assert!(sync.request_next(&mut carousel));
    assert_eq!(carousel.scrolls, vec![400.0, 800.0]);

    assert!(sync.request_previous(&mut carousel));
    assert_eq!(carousel.scrolls.last(), Some(&400.0));
}

#[test]
fn request_during_follow_ends_the_follow() {
    let mut carousel = RecordingCarousel::default();
    let mut sync = IndexSynchronizer::new(5, 400.0);

    sync.on_playback_track_changed(Some(3), &mut carousel);
    assert!(sync.is_following());

    assert!(sync.request_previous(&mut carousel));
    assert!(!sync.is_following());
    assert_eq!(carousel.scrolls, vec![1200.0, 800.0]);
}

#[test]
fn toggle_maps_reported_state_to_opposite_command() {
    let sync = IndexSynchronizer::new(3, 400.0);

    let cases = [
        (TransportState::Idle, TransportAction::Play, Call::Play),
        (TransportState::Ready, TransportAction::Play, Call::Play),
        (TransportState::Paused, TransportAction::Play, Call::Play),
        (TransportState::Playing, TransportAction::Pause, Call::Pause),
        (TransportState::Buffering, TransportAction::Pause, Call::Pause),
    ];
    for (state, action, call) in cases {
        let engine = RecordingEngine::default();
        assert_eq!(sync.request_toggle_playback(state, &engine), action, "{state:?}");
        assert_eq!(engine.calls(), vec![call]);
    }
}

#[test]
fn seek_clamps_to_track_duration() {
    let engine = RecordingEngine::with_info(PlaybackInfo {
        index: Some(0),
        state: TransportState::Playing,
        position: Duration::from_secs(10),
        duration: Some(Duration::from_secs(30)),
    });
    let sync = IndexSynchronizer::new(3, 400.0);

    assert_eq!(
        sync.request_seek(Duration::from_secs(99), &engine),
        Some(Duration::from_secs(30))
    );
    assert_eq!(
        sync.request_seek_by(-60, &engine),
        Some(Duration::ZERO)
    );
    assert_eq!(
        sync.request_seek_by(5, &engine),
        Some(Duration::from_secs(15))
    );
    assert_eq!(
        engine.calls(),
        vec![
            Call::SeekTo(Duration::from_secs(30)),
            Call::SeekTo(Duration::ZERO),
            Call::SeekTo(Duration::from_secs(15)),
        ]
    );
}

#[test]
fn seek_without_loaded_track_is_ignored() {
    let engine = RecordingEngine::default();
    let sync = IndexSynchronizer::new(3, 400.0);

    assert_eq!(sync.request_seek(Duration::from_secs(3), &engine), None);
    assert!(engine.calls().is_empty());
}

#[test]
fn resize_changes_offsets_for_following() {
    let mut carousel = RecordingCarousel::default();
    let mut sync = IndexSynchronizer::new(4, 400.0);

    sync.set_viewport_width(0.0);
    assert_eq!(sync.viewport_width(), 400.0);

    sync.set_viewport_width(250.0);
    sync.on_playback_track_changed(Some(2), &mut carousel);
    assert_eq!(carousel.scrolls, vec![500.0]);
}

#[test]
fn invalid_initial_width_falls_back_to_one() {
    let sync = IndexSynchronizer::new(3, -4.0);
    assert_eq!(sync.viewport_width(), 1.0);
    assert_eq!(sync.index_for_offset(2.2), Some(2));
}

#[test]
fn default_transport_state_comes_from_progress() {
    let engine = RecordingEngine::with_info(PlaybackInfo {
        index: Some(1),
        state: TransportState::Paused,
        ..PlaybackInfo::default()
    });
    assert_eq!(engine.transport_state(), TransportState::Paused);
    assert_eq!(engine.current_track(), Some(1));
}

mod wired {
    use std::sync::mpsc::{self, Receiver};

    use super::*;
    use crate::carousel::Carousel;

    const WIDTH: f64 = 400.0;
    const FRAME: Duration = Duration::from_millis(16);

    fn drain(
        rx: &Receiver<Notification>,
        sync: &mut IndexSynchronizer,
        engine: &RecordingEngine,
        carousel: &mut Carousel,
    ) {
        while let Ok(n) = rx.try_recv() {
            sync.handle(n, engine, carousel);
        }
    }

    #[test]
    fn user_drag_reaches_engine_and_acks_do_not_scroll_back() {
        let (tx, rx) = mpsc::channel();
        let mut carousel = Carousel::new(5, WIDTH, Duration::from_millis(100));
        let _sub = carousel.subscribe(move |e| {
            let _ = tx.send(Notification::Scroll(e));
        });
        let mut sync = IndexSynchronizer::new(5, WIDTH);
        let engine = RecordingEngine::default();

        carousel.begin_drag(1000);
        carousel.drag_to(600);
        carousel.drag_to(190);
        carousel.end_drag();
        drain(&rx, &mut sync, &engine, &mut carousel);
        assert!(!sync.is_dragging());

        while carousel.is_animating() {
            carousel.tick(FRAME);
            drain(&rx, &mut sync, &engine, &mut carousel);
        }
        assert_eq!(carousel.offset(), 800.0);
        assert_eq!(engine.calls(), vec![Call::SkipTo(1), Call::SkipTo(2)]);

        // The engine acknowledges both skips.
        let mut unused = RecordingCarousel::default();
        sync.handle(Notification::TrackChanged(Some(1)), &engine, &mut unused);
        sync.handle(Notification::TrackChanged(Some(2)), &engine, &mut unused);
        assert!(unused.scrolls.is_empty());
        assert_eq!(sync.current_index(), 2);
    }

    #[test]
    fn engine_advance_animates_carousel_without_echo() {
        let (tx, rx) = mpsc::channel();
        let events = tx.clone();
        let mut carousel = Carousel::new(5, WIDTH, Duration::from_millis(100));
        let _sub = carousel.subscribe(move |e| {
            let _ = tx.send(Notification::Scroll(e));
        });
        let mut sync = IndexSynchronizer::new(5, WIDTH);
        let engine = RecordingEngine::default();

        events.send(Notification::TrackChanged(Some(1))).unwrap();
        drain(&rx, &mut sync, &engine, &mut carousel);
        assert!(carousel.is_animating());

        while carousel.is_animating() {
            carousel.tick(FRAME);
            drain(&rx, &mut sync, &engine, &mut carousel);
        }

        assert_eq!(carousel.offset(), WIDTH);
        assert_eq!(sync.current_index(), 1);
        assert!(!sync.is_following());
        assert!(engine.calls().is_empty());
    }

    #[test]
    fn next_request_round_trips_through_carousel() {
        let (tx, rx) = mpsc::channel();
        let mut carousel = Carousel::new(3, WIDTH, Duration::from_millis(100));
        let _sub = carousel.subscribe(move |e| {
            let _ = tx.send(Notification::Scroll(e));
        });
        let mut sync = IndexSynchronizer::new(3, WIDTH);
        let engine = RecordingEngine::default();

        assert!(sync.request_next(&mut carousel));
        while carousel.is_animating() {
            carousel.tick(FRAME);
            drain(&rx, &mut sync, &engine, &mut carousel);
        }

        assert_eq!(engine.calls(), vec![Call::SkipTo(1)]);
        assert_eq!(sync.current_index(), 1);
    }

    fn settle(
        rx: &Receiver<Notification>,
        sync: &mut IndexSynchronizer,
        engine: &RecordingEngine,
        carousel: &mut Carousel,
    ) {
        drain(rx, sync, engine, carousel);
        while carousel.is_animating() {
            carousel.tick(FRAME);
            drain(rx, sync, engine, carousel);
        }
    }

    #[test]
    fn previous_during_engine_advance_lands_engine_and_carousel_together() {
        let (tx, rx) = mpsc::channel();
        let events = tx.clone();
        let mut carousel = Carousel::new(5, WIDTH, Duration::from_millis(300));
        let _sub = carousel.subscribe(move |e| {
            let _ = tx.send(Notification::Scroll(e));
        });
        let mut sync = IndexSynchronizer::new(5, WIDTH);
        let engine = RecordingEngine::default();

        events.send(Notification::TrackChanged(Some(3))).unwrap();
        drain(&rx, &mut sync, &engine, &mut carousel);
        for _ in 0..2 {
            carousel.tick(FRAME);
            drain(&rx, &mut sync, &engine, &mut carousel);
        }

        assert!(sync.request_previous(&mut carousel));
        settle(&rx, &mut sync, &engine, &mut carousel);

        assert_eq!(carousel.visible_page(), 2);
        assert_eq!(sync.current_index(), 2);
        assert!(!sync.is_following());
        assert_eq!(engine.calls().last(), Some(&Call::SkipTo(2)));
    }

    #[test]
    fn quick_successive_nexts_each_advance_a_page() {
        let (tx, rx) = mpsc::channel();
        let mut carousel = Carousel::new(5, WIDTH, Duration::from_millis(300));
        let _sub = carousel.subscribe(move |e| {
            let _ = tx.send(Notification::Scroll(e));
        });
        let mut sync = IndexSynchronizer::new(5, WIDTH);
        let engine = RecordingEngine::default();

        assert!(sync.request_next(&mut carousel));
        carousel.tick(FRAME);
        drain(&rx, &mut sync, &engine, &mut carousel);
        assert!(sync.request_next(&mut carousel));
        settle(&rx, &mut sync, &engine, &mut carousel);

        assert_eq!(carousel.visible_page(), 2);
        assert_eq!(sync.current_index(), 2);
        assert_eq!(engine.calls().last(), Some(&Call::SkipTo(2)));
    }

    #[test]
    fn still_drag_release_reconciles_engine_change() {
        let (tx, rx) = mpsc::channel();
        let events = tx.clone();
        let mut carousel = Carousel::new(5, WIDTH, Duration::from_millis(100));
        let _sub = carousel.subscribe(move |e| {
            let _ = tx.send(Notification::Scroll(e));
        });
        let mut sync = IndexSynchronizer::new(5, WIDTH);
        let engine = RecordingEngine::default();

        carousel.begin_drag(100);
        drain(&rx, &mut sync, &engine, &mut carousel);
        events.send(Notification::TrackChanged(Some(1))).unwrap();
        drain(&rx, &mut sync, &engine, &mut carousel);
        assert_eq!(sync.current_index(), 1);

        carousel.end_drag();
        settle(&rx, &mut sync, &engine, &mut carousel);

        assert_eq!(carousel.visible_page(), 0);
        assert_eq!(sync.current_index(), carousel.visible_page());
        assert_eq!(engine.calls(), vec![Call::SkipTo(0)]);
    }
}
