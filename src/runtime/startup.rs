use tracing::debug;

use crate::app::App;
use crate::audio::LoopMode;
use crate::config;
use crate::sync::PlaybackEngine;

/// Hand the playlist to the engine and apply the configured playback defaults.
pub fn apply_playback_defaults(
    app: &mut App,
    engine: &dyn PlaybackEngine,
    settings: &config::Settings,
) {
    app.loop_mode = match settings.playback.loop_mode {
        config::LoopModeSetting::NoLoop => LoopMode::NoLoop,
        config::LoopModeSetting::LoopAll => LoopMode::LoopAll,
        config::LoopModeSetting::LoopOne => LoopMode::LoopOne,
    };

    // Commands queue until the audio thread has opened its output device.
    engine.load_playlist(app.tracks.clone());
    engine.set_loop_mode(app.loop_mode);

    if settings.playback.autoplay && app.has_tracks() {
        debug!("autoplay enabled");
        engine.play();
    }
}
