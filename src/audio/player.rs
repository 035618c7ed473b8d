use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use tracing::debug;

use crate::config::AudioSettings;
use crate::library::Track;
use crate::sync::{Notification, PlaybackEngine};

use super::thread::spawn_audio_thread;
use super::types::{AudioCmd, LoopMode, PlaybackHandle, PlaybackInfo};

/// Handle to the audio thread.
///
/// Commands go over a channel; state comes back through the shared
/// `PlaybackHandle` and `Notification::TrackChanged` events.
pub struct AudioPlayer {
    tx: Sender<AudioCmd>,
    playback: PlaybackHandle,
    join: Mutex<Option<JoinHandle<()>>>,
}

impl AudioPlayer {
    /// Spawn the audio thread. The output device opens in the background;
    /// commands sent before that wait in the channel.
    pub fn setup(audio_settings: AudioSettings, events: Sender<Notification>) -> Self {
        let (tx, rx) = mpsc::channel::<AudioCmd>();
        let playback_info: PlaybackHandle = Arc::new(Mutex::new(PlaybackInfo::default()));

        let audio_handle = spawn_audio_thread(rx, playback_info.clone(), events, audio_settings);

        Self {
            tx,
            playback: playback_info,
            join: Mutex::new(Some(audio_handle)),
        }
    }

    pub fn playback_handle(&self) -> PlaybackHandle {
        self.playback.clone()
    }

    fn send(&self, cmd: AudioCmd) -> Result<(), mpsc::SendError<AudioCmd>> {
        self.tx.send(cmd)
    }

    /// Fire-and-forget send; a dead audio thread just drops the command.
    fn dispatch(&self, cmd: AudioCmd) {
        if let Err(mpsc::SendError(cmd)) = self.send(cmd) {
            debug!(?cmd, "audio engine unavailable, command dropped");
        }
    }

    pub fn quit_softly(&self, fade_out: Duration) {
        let _ = self.send(AudioCmd::Quit {
            fade_out_ms: fade_out.as_millis() as u64,
        });

        if let Ok(mut j) = self.join.lock() {
            if let Some(h) = j.take() {
                let _ = h.join();
            }
        }
    }
}

impl PlaybackEngine for AudioPlayer {
    fn load_playlist(&self, tracks: Vec<Track>) {
        self.dispatch(AudioCmd::LoadPlaylist(tracks));
    }

    fn skip_to(&self, index: usize) {
        self.dispatch(AudioCmd::SkipTo(index));
    }

    fn play(&self) {
        self.dispatch(AudioCmd::Play);
    }

    fn pause(&self) {
        self.dispatch(AudioCmd::Pause);
    }

    fn stop(&self) {
        self.dispatch(AudioCmd::Stop);
    }

    fn seek_to(&self, position: Duration) {
        self.dispatch(AudioCmd::SeekTo(position));
    }

    fn set_loop_mode(&self, mode: LoopMode) {
        self.dispatch(AudioCmd::SetLoopMode(mode));
    }

    fn current_track(&self) -> Option<usize> {
        self.playback.lock().ok().and_then(|info| info.index)
    }

    fn progress(&self) -> PlaybackInfo {
        self.playback
            .lock()
            .map(|info| info.clone())
            .unwrap_or_default()
    }
}
