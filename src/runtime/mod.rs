use std::env;
use std::path::PathBuf;
use std::sync::mpsc;
use std::time::Duration;

use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::{error, info};

use crate::app::App;
use crate::audio::AudioPlayer;
use crate::library;
use crate::logging;
use crate::mpris::ControlCmd;
use crate::sync::Notification;

mod event_loop;
mod mpris_sync;
mod settings;
mod startup;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let settings = settings::load_settings();
    let log_path = logging::init(&settings.logging);

    let source = env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .or_else(|| env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."));

    let tracks = library::load(&source, &settings.library).map_err(|e| {
        error!("cannot load tracks: {e}");
        e
    })?;
    info!(log = ?log_path, source = %source.display(), "starting");

    // Scroll events and engine track changes share one queue so they are
    // handled in arrival order.
    let (event_tx, event_rx) = mpsc::channel::<Notification>();
    let audio_player = AudioPlayer::setup(settings.audio.clone(), event_tx.clone());

    let mut app = App::new(
        tracks,
        settings.carousel.default_viewport_width,
        Duration::from_millis(settings.carousel.animation_ms),
    );
    app.set_playback_handle(audio_player.playback_handle());
    let _scroll_subscription = app.carousel.subscribe(move |event| {
        let _ = event_tx.send(Notification::Scroll(event));
    });

    let (control_tx, control_rx) = mpsc::channel::<ControlCmd>();
    let mpris = crate::mpris::spawn_mpris(control_tx.clone());

    startup::apply_playback_defaults(&mut app, &audio_player, &settings);
    mpris_sync::update_mpris(&mpris, &app);

    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let run_result: Result<(), Box<dyn std::error::Error>> = (|| {
        let mut state = event_loop::EventLoopState::new(&app);

        event_loop::run(
            &mut terminal,
            &settings,
            &mut app,
            &audio_player,
            &mpris,
            &control_tx,
            &control_rx,
            &event_rx,
            &mut state,
        )
    })();

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), DisableMouseCapture, LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = &run_result {
        error!("event loop failed: {e}");
    }
    info!("bye");
    run_result
}
