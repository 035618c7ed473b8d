use crate::app::App;
use crate::mpris::MprisHandle;

pub fn update_mpris(mpris: &MprisHandle, app: &App) {
    match app.now_playing() {
        Some((i, track)) => mpris.set_track_metadata(Some(i), Some(track)),
        None => mpris.set_track_metadata(None, None),
    }
    mpris.set_playback(app.transport_state());
    mpris.set_position(app.playback().position);
}
