//! Static playlist manifests.
//!
//! ```toml
//! [[track]]
//! id = 1
//! title = "19th Floor"
//! artist = "Bobby Richards"
//! url = "audio/19th-floor.mp3"
//! artwork = "img/img1.jpg"
//! duration_secs = 184.0
//! ```
//!
//! Relative `url` and `artwork` paths resolve against the manifest's directory.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use super::error::LibraryError;
use super::model::Track;

pub const MANIFEST_FILE_NAME: &str = "playlist.toml";

#[derive(Debug, Deserialize)]
struct Manifest {
    #[serde(rename = "track", default)]
    tracks: Vec<ManifestTrack>,
}

#[derive(Debug, Deserialize)]
struct ManifestTrack {
    id: u32,
    title: String,
    #[serde(default)]
    artist: String,
    url: PathBuf,
    artwork: Option<PathBuf>,
    duration_secs: Option<f64>,
}

/// Load tracks from a manifest file, keeping their declared order.
pub fn load_manifest(path: &Path) -> Result<Vec<Track>, LibraryError> {
    let text = fs::read_to_string(path).map_err(|source| LibraryError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_manifest(&text, path)
}

/// Parse manifest `text` as if it had been read from `path`.
pub(super) fn parse_manifest(text: &str, path: &Path) -> Result<Vec<Track>, LibraryError> {
    let manifest: Manifest = toml::from_str(text).map_err(|source| LibraryError::Manifest {
        path: path.to_path_buf(),
        source,
    })?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));

    let mut seen = HashSet::new();
    let mut tracks = Vec::with_capacity(manifest.tracks.len());
    for t in manifest.tracks {
        if !seen.insert(t.id) {
            return Err(LibraryError::DuplicateId(t.id));
        }

        let duration = t
            .duration_secs
            .map(|secs| {
                Duration::try_from_secs_f64(secs)
                    .map_err(|_| LibraryError::InvalidDuration { id: t.id })
            })
            .transpose()?;

        tracks.push(Track {
            id: t.id,
            title: t.title,
            artist: t.artist,
            artwork: t.artwork.map(|p| resolve(base, p)),
            path: resolve(base, t.url),
            duration,
        });
    }
    Ok(tracks)
}

fn resolve(base: &Path, p: PathBuf) -> PathBuf {
    if p.is_absolute() { p } else { base.join(p) }
}
