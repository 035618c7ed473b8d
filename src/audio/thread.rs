use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use rodio::{OutputStream, OutputStreamBuilder, Sink};
use tracing::{debug, error, info, warn};

use crate::config::AudioSettings;
use crate::library::Track;
use crate::sync::Notification;

use super::sink::create_sink_at;
use super::types::{AudioCmd, LoopMode, PlaybackHandle, PlaybackInfo, TransportState};

/// How often the thread wakes up to publish progress and detect track ends.
const TICK: Duration = Duration::from_millis(200);

pub(super) fn spawn_audio_thread(
    rx: Receiver<AudioCmd>,
    playback_info: PlaybackHandle,
    events: Sender<Notification>,
    audio_settings: AudioSettings,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let mut stream = match OutputStreamBuilder::open_default_stream() {
            Ok(s) => s,
            Err(e) => {
                // Dropping `rx` makes every later command fail to send, which
                // the player treats as "engine not available".
                error!("no audio output device: {e}");
                return;
            }
        };
        // rodio logs to stderr when OutputStream is dropped. That's useful in debugging,
        // but noisy for a TUI app.
        stream.log_on_drop(false);
        info!("audio output ready");

        let mut engine = Engine::new(&stream, playback_info, events, audio_settings);

        loop {
            match rx.recv_timeout(TICK) {
                Ok(AudioCmd::Quit { fade_out_ms }) => {
                    engine.quit(fade_out_ms);
                    break;
                }
                Ok(cmd) => engine.handle(cmd),
                Err(RecvTimeoutError::Timeout) => engine.check_track_end(),
                Err(RecvTimeoutError::Disconnected) => break,
            }
            engine.publish();
        }
        debug!("audio thread exiting");
    })
}

/// Everything the audio thread knows about the current session.
struct Engine<'a> {
    stream: &'a OutputStream,
    tracks: Vec<Track>,
    index: Option<usize>,
    state: TransportState,
    sink: Option<Sink>,
    /// Set while playing; elapsed = accumulated + started_at.elapsed().
    started_at: Option<Instant>,
    accumulated: Duration,
    duration: Option<Duration>,
    loop_mode: LoopMode,
    settings: AudioSettings,
    info: PlaybackHandle,
    events: Sender<Notification>,
}

impl<'a> Engine<'a> {
    fn new(
        stream: &'a OutputStream,
        info: PlaybackHandle,
        events: Sender<Notification>,
        settings: AudioSettings,
    ) -> Self {
        Self {
            stream,
            tracks: Vec::new(),
            index: None,
            state: TransportState::Idle,
            sink: None,
            started_at: None,
            accumulated: Duration::ZERO,
            duration: None,
            loop_mode: LoopMode::default(),
            settings,
            info,
            events,
        }
    }

    fn handle(&mut self, cmd: AudioCmd) {
        match cmd {
            AudioCmd::LoadPlaylist(tracks) => self.load_playlist(tracks),
            AudioCmd::SkipTo(i) => self.skip_to(i),
            AudioCmd::Play => self.play(),
            AudioCmd::Pause => self.pause(),
            AudioCmd::Stop => self.stop(),
            AudioCmd::SeekTo(pos) => self.seek_to(pos),
            AudioCmd::SetLoopMode(m) => self.loop_mode = m,
            // Handled by the thread loop.
            AudioCmd::Quit { .. } => {}
        }
    }

    fn load_playlist(&mut self, tracks: Vec<Track>) {
        self.drop_sink();
        self.tracks = tracks;
        info!(tracks = self.tracks.len(), "playlist loaded");

        if self.tracks.is_empty() {
            self.index = None;
            self.state = TransportState::Idle;
            self.duration = None;
            return;
        }
        self.cue(0);
        self.emit(Some(0));
    }

    /// Change track. Playback continues if it was running; otherwise the
    /// track is only cued. Always reported, so the caller can match it to
    /// the skip it asked for.
    fn skip_to(&mut self, i: usize) {
        if i >= self.tracks.len() {
            warn!(index = i, tracks = self.tracks.len(), "skip out of range ignored");
            return;
        }

        if self.state.is_active() {
            self.start(i, Duration::ZERO);
        } else {
            self.drop_sink();
            self.cue(i);
        }
        self.emit(Some(i));
    }

    fn play(&mut self) {
        match self.state {
            TransportState::Paused => {
                if let Some(s) = self.sink.as_ref() {
                    s.play();
                }
                self.started_at = Some(Instant::now());
                self.state = TransportState::Playing;
            }
            TransportState::Ready => {
                let i = self.index.unwrap_or(0);
                let from = self.accumulated;
                self.start(i, from);
            }
            TransportState::Idle => {
                if !self.tracks.is_empty() {
                    self.start(0, Duration::ZERO);
                    self.emit(Some(0));
                }
            }
            TransportState::Playing | TransportState::Buffering => {}
        }
    }

    fn pause(&mut self) {
        if !self.state.is_active() {
            return;
        }
        if let Some(s) = self.sink.as_ref() {
            s.pause();
        }
        if let Some(st) = self.started_at.take() {
            self.accumulated += st.elapsed();
        }
        self.state = TransportState::Paused;
    }

    fn stop(&mut self) {
        self.drop_sink();
        self.accumulated = Duration::ZERO;
        self.state = if self.index.is_some() {
            TransportState::Ready
        } else {
            TransportState::Idle
        };
    }

    fn seek_to(&mut self, pos: Duration) {
        let Some(i) = self.index else {
            return;
        };
        let pos = match self.duration {
            Some(total) => pos.min(total),
            None => pos,
        };

        match self.state {
            // Nothing decoded yet: remember where to start.
            TransportState::Ready | TransportState::Idle => self.accumulated = pos,
            TransportState::Playing | TransportState::Buffering => self.start(i, pos),
            TransportState::Paused => {
                self.start(i, pos);
                self.pause();
            }
        }
        debug!(position = ?pos, "seeked");
    }

    /// Make `i` current without decoding it.
    fn cue(&mut self, i: usize) {
        self.index = Some(i);
        self.state = TransportState::Ready;
        self.started_at = None;
        self.accumulated = Duration::ZERO;
        self.duration = self.tracks[i].duration;
    }

    /// Decode `i` and start playing it at `from`, crossfading from a running sink.
    fn start(&mut self, i: usize, from: Duration) {
        self.index = Some(i);
        self.state = TransportState::Buffering;
        self.publish();

        let track = &self.tracks[i];
        let prepared = match create_sink_at(self.stream, track, from) {
            Ok(p) => p,
            Err(e) => {
                warn!("cannot play track: {e}");
                self.drop_sink();
                self.cue(i);
                return;
            }
        };
        self.duration = track.duration.or(prepared.total);

        let new_sink = prepared.sink;
        new_sink.set_volume(1.0);
        if let Some(old) = self.sink.take() {
            let was_playing = self.started_at.is_some();
            self.crossfade(old, &new_sink, was_playing);
        }

        new_sink.play();
        self.sink = Some(new_sink);
        self.state = TransportState::Playing;
        self.started_at = Some(Instant::now());
        self.accumulated = from;
    }

    fn crossfade(&self, old: Sink, new_sink: &Sink, was_playing: bool) {
        let crossfade_ms = self.settings.crossfade_ms;
        if !was_playing || crossfade_ms == 0 {
            old.stop();
            return;
        }

        let steps = self.settings.crossfade_steps.max(1);
        old.set_volume(1.0);
        new_sink.set_volume(0.0);
        new_sink.play();

        // Fading blocks this thread only; rodio's mixer keeps producing audio.
        for step in 1..=steps {
            let t = (step as f32) / (steps as f32);
            old.set_volume(1.0 - t);
            new_sink.set_volume(t);
            thread::sleep(Duration::from_millis((crossfade_ms / steps).max(1)));
        }
        old.stop();
    }

    /// Auto-advance when the current source ran dry.
    fn check_track_end(&mut self) {
        if self.state != TransportState::Playing {
            return;
        }
        let finished = self.sink.as_ref().is_some_and(Sink::empty);
        let Some(current) = self.index else {
            return;
        };
        if !finished {
            return;
        }

        match self.loop_mode.next_after_end(current, self.tracks.len()) {
            Some(next) => {
                debug!(from = current, to = next, "track finished, advancing");
                self.start(next, Duration::ZERO);
                if next != current {
                    self.emit(Some(next));
                }
            }
            None => {
                debug!(index = current, "end of playlist");
                self.drop_sink();
                self.cue(current);
                self.emit(None);
            }
        }
    }

    fn quit(&mut self, fade_out_ms: u64) {
        if let Some(s) = self.sink.take() {
            // Fade out gently before stopping.
            fade_out_sink(&s, fade_out_ms);
            s.stop();
        }
        self.started_at = None;
        self.state = TransportState::Idle;
        // Update shared state so UI/MPRIS don't keep showing Playing.
        self.publish();
    }

    fn drop_sink(&mut self) {
        if let Some(s) = self.sink.take() {
            s.stop();
        }
        self.started_at = None;
    }

    fn position(&self) -> Duration {
        let elapsed = self.accumulated + self.started_at.map_or(Duration::ZERO, |st| st.elapsed());
        match self.duration {
            Some(total) => elapsed.min(total),
            None => elapsed,
        }
    }

    fn publish(&self) {
        if let Ok(mut info) = self.info.lock() {
            *info = PlaybackInfo {
                index: self.index,
                state: self.state,
                position: self.position(),
                duration: self.duration,
            };
        }
    }

    fn emit(&self, next: Option<usize>) {
        if self.events.send(Notification::TrackChanged(next)).is_err() {
            debug!("no listener for track changes");
        }
    }
}

fn fade_out_sink(sink: &Sink, fade_out_ms: u64) {
    if fade_out_ms == 0 {
        sink.set_volume(0.0);
        return;
    }
    let steps: u64 = 20;
    let step_ms = (fade_out_ms / steps).max(1);
    sink.set_volume(1.0);
    for step in 1..=steps {
        let t = step as f32 / steps as f32;
        sink.set_volume(1.0 - t);
        thread::sleep(Duration::from_millis(step_ms));
    }
    sink.set_volume(0.0);
}
