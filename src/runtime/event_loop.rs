use std::sync::mpsc;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind};
use ratatui::{Terminal, backend::CrosstermBackend, layout::Rect};
use tracing::debug;

use crate::app::App;
use crate::audio::{AudioPlayer, TransportState};
use crate::config;
use crate::mpris::ControlCmd;
use crate::mpris::MprisHandle;
use crate::runtime::mpris_sync::update_mpris;
use crate::sync::{Notification, PlaybackEngine};
use crate::ui::{self, ScreenLayout};

/// Input poll timeout while the carousel is moving (about 60 fps).
const FRAME: Duration = Duration::from_millis(16);
/// Input poll timeout while nothing animates; progress still ticks.
const IDLE_POLL: Duration = Duration::from_millis(100);

/// State tracked by the runtime event loop across iterations.
pub struct EventLoopState {
    /// Last-known playing index as emitted to MPRIS.
    pub last_mpris_index: Option<usize>,
    /// Last-known transport state as emitted to MPRIS.
    pub last_mpris_playback: TransportState,
    /// Layout of the last drawn frame, for mouse hit-testing.
    layout: ScreenLayout,
    last_frame: Instant,
}

impl EventLoopState {
    /// Construct a new `EventLoopState` seeded from `app`.
    pub fn new(app: &App) -> Self {
        Self {
            last_mpris_index: None,
            last_mpris_playback: app.transport_state(),
            layout: ScreenLayout::default(),
            last_frame: Instant::now(),
        }
    }
}

/// Main terminal event loop: handles input, UI drawing, carousel animation,
/// index synchronization and MPRIS. Returns `Ok(())` when shutdown is requested.
#[allow(clippy::too_many_arguments)]
pub fn run(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    settings: &config::Settings,
    app: &mut App,
    audio_player: &AudioPlayer,
    mpris: &MprisHandle,
    control_tx: &mpsc::Sender<ControlCmd>,
    control_rx: &mpsc::Receiver<ControlCmd>,
    notifications: &mpsc::Receiver<Notification>,
    state: &mut EventLoopState,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        // Advance the carousel animation; its offsets land in `notifications`.
        let now = Instant::now();
        app.carousel.tick(now - state.last_frame);
        state.last_frame = now;

        while let Ok(n) = notifications.try_recv() {
            app.handle_notification(n, audio_player);
        }

        // Keep MPRIS in sync even when playback changes come from media keys or auto-advance.
        if app.refresh_playback() {
            let idx = app.playback().index;
            let playback = app.transport_state();
            if idx != state.last_mpris_index || playback != state.last_mpris_playback {
                update_mpris(mpris, app);
                state.last_mpris_index = idx;
                state.last_mpris_playback = playback;
            } else {
                mpris.set_position(app.playback().position);
            }
        }

        // One page is one carousel-width; follow terminal resizes.
        let size = terminal.size()?;
        let layout = ScreenLayout::new(Rect::new(0, 0, size.width, size.height));
        if layout.carousel.width > 0 {
            app.set_viewport_width(f64::from(layout.carousel.width));
        }

        terminal.draw(|f| state.layout = ui::draw(f, app, &settings.ui, &settings.controls))?;

        while let Ok(cmd) = control_rx.try_recv() {
            if handle_control_cmd(cmd, settings, app, audio_player) {
                return Ok(());
            }
        }

        let timeout = if app.carousel.is_settled() { IDLE_POLL } else { FRAME };
        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if handle_key_event(key, settings, app, audio_player, control_tx) {
                        break;
                    }
                }
                Event::Mouse(mouse) => handle_mouse_event(mouse, &state.layout, app, audio_player),
                _ => {}
            }
        }
    }

    Ok(())
}

/// Apply a remote or keyboard transport command. Returns true on quit.
fn handle_control_cmd(
    cmd: ControlCmd,
    settings: &config::Settings,
    app: &mut App,
    audio_player: &AudioPlayer,
) -> bool {
    debug!(?cmd, "control command");
    match cmd {
        ControlCmd::Quit => {
            audio_player.quit_softly(Duration::from_millis(settings.audio.quit_fade_out_ms));
            return true;
        }
        ControlCmd::Play => audio_player.play(),
        ControlCmd::Pause => audio_player.pause(),
        ControlCmd::PlayPause => {
            app.sync
                .request_toggle_playback(audio_player.transport_state(), audio_player);
        }
        ControlCmd::Stop => audio_player.stop(),
        // Skips go through the carousel; its scroll drives the engine.
        ControlCmd::Next => {
            app.sync.request_next(&mut app.carousel);
        }
        ControlCmd::Prev => {
            app.sync.request_previous(&mut app.carousel);
        }
        ControlCmd::SeekBy(offset_micros) => {
            let current = audio_player.progress().position;
            let by = Duration::from_micros(offset_micros.unsigned_abs());
            let target = if offset_micros >= 0 {
                current.saturating_add(by)
            } else {
                current.saturating_sub(by)
            };
            app.sync.request_seek(target, audio_player);
        }
        ControlCmd::SetPosition(position) => {
            app.sync.request_seek(position, audio_player);
        }
    }
    false
}

/// Returns true when shutdown was requested.
fn handle_key_event(
    key: KeyEvent,
    settings: &config::Settings,
    app: &mut App,
    audio_player: &AudioPlayer,
    control_tx: &mpsc::Sender<ControlCmd>,
) -> bool {
    let scrub = i64::try_from(settings.controls.scrub_seconds).unwrap_or(i64::MAX);

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => {
            audio_player.quit_softly(Duration::from_millis(settings.audio.quit_fade_out_ms));
            return true;
        }
        KeyCode::Char('p') | KeyCode::Char(' ') => {
            let _ = control_tx.send(ControlCmd::PlayPause);
        }
        KeyCode::Char('l') | KeyCode::Right => {
            let _ = control_tx.send(ControlCmd::Next);
        }
        KeyCode::Char('h') | KeyCode::Left => {
            let _ = control_tx.send(ControlCmd::Prev);
        }
        KeyCode::Char('L') => {
            app.sync.request_seek_by(scrub, audio_player);
        }
        KeyCode::Char('H') => {
            app.sync.request_seek_by(-scrub, audio_player);
        }
        KeyCode::Char('f') => {
            let liked = app.toggle_like();
            debug!(liked, "like toggled");
        }
        KeyCode::Char('r') => {
            app.cycle_loop_mode();
            audio_player.set_loop_mode(app.loop_mode);
        }
        _ => {}
    }

    false
}

fn handle_mouse_event(
    mouse: MouseEvent,
    layout: &ScreenLayout,
    app: &mut App,
    audio_player: &AudioPlayer,
) {
    let (col, row) = (mouse.column, mouse.row);
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            if layout.in_carousel(col, row) {
                app.carousel.begin_drag(col);
            } else if let Some(fraction) = layout.seek_fraction(col, row) {
                if let Some(total) = app.playback().duration {
                    app.sync.request_seek(total.mul_f64(fraction), audio_player);
                }
            }
        }
        MouseEventKind::Drag(MouseButton::Left) => app.carousel.drag_to(col),
        MouseEventKind::Up(MouseButton::Left) => app.carousel.end_drag(),
        MouseEventKind::ScrollDown if layout.in_carousel(col, row) => {
            app.sync.request_next(&mut app.carousel);
        }
        MouseEventKind::ScrollUp if layout.in_carousel(col, row) => {
            app.sync.request_previous(&mut app.carousel);
        }
        _ => {}
    }
}
