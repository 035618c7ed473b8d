//! File-backed `tracing` setup.
//!
//! The terminal belongs to the TUI, so logs go to a file. `COVERFLOW_LOG`
//! overrides the configured filter.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::config::{LoggingSettings, default_log_path};

pub const LOG_ENV_VAR: &str = "COVERFLOW_LOG";

/// Install the global subscriber. Returns the log path on success.
///
/// Failures are reported on stderr before the TUI starts and leave logging
/// disabled; they never stop the player.
pub fn init(settings: &LoggingSettings) -> Option<PathBuf> {
    let path = settings.file.clone().or_else(default_log_path)?;

    let file = match open_log_file(&path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("coverflow: cannot open log file {}: {e}", path.display());
            return None;
        }
    };

    let subscriber = tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_env_filter(build_filter(&settings.level))
        .with_target(true)
        .with_ansi(false)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("coverflow: logging already initialized: {e}");
        return None;
    }
    Some(path)
}

fn open_log_file(path: &Path) -> std::io::Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// `COVERFLOW_LOG` when set and valid, else the configured level, else `info`.
fn build_filter(configured: &str) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV_VAR)
        .or_else(|_| EnvFilter::try_new(configured))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}
