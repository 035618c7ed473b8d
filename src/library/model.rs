use std::path::PathBuf;
use std::time::Duration;

/// One playable song. Immutable once loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    /// Unique within a session.
    pub id: u32,
    pub title: String,
    pub artist: String,
    /// Cover image shown on the carousel card.
    pub artwork: Option<PathBuf>,
    /// Audio source.
    pub path: PathBuf,
    pub duration: Option<Duration>,
}

impl Track {
    /// `Artist - Title`, or just the title when the artist is blank.
    pub fn display(&self) -> String {
        let artist = self.artist.trim();
        if artist.is_empty() {
            self.title.clone()
        } else {
            format!("{} - {}", artist, self.title)
        }
    }
}
