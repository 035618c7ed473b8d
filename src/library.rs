//! Static track source.
//!
//! The track list is loaded once at startup, either from a `playlist.toml`
//! manifest or by scanning a directory of audio files, and never changes
//! during a session.

mod error;
mod manifest;
mod model;
mod scan;

use std::path::Path;

use tracing::info;

use crate::config::LibrarySettings;

pub use error::LibraryError;
pub use manifest::{MANIFEST_FILE_NAME, load_manifest};
pub use model::Track;
pub use scan::scan;

/// Load the session's tracks from `source`.
///
/// `source` may be a manifest file, a directory holding `playlist.toml`, or a
/// directory to scan.
pub fn load(source: &Path, settings: &LibrarySettings) -> Result<Vec<Track>, LibraryError> {
    let tracks = if source.is_file() {
        load_manifest(source)?
    } else if source.join(MANIFEST_FILE_NAME).is_file() {
        load_manifest(&source.join(MANIFEST_FILE_NAME))?
    } else if source.is_dir() {
        scan(source, settings)
    } else {
        return Err(LibraryError::Io {
            path: source.to_path_buf(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        });
    };

    if tracks.is_empty() {
        return Err(LibraryError::Empty(source.to_path_buf()));
    }
    info!(count = tracks.len(), source = %source.display(), "tracks loaded");
    Ok(tracks)
}
