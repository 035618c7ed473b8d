use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum LibraryError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid playlist manifest {}: {source}", path.display())]
    Manifest {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("track id {0} appears more than once")]
    DuplicateId(u32),
    #[error("track {id} has an invalid duration")]
    InvalidDuration { id: u32 },
    #[error("no tracks found in {}", .0.display())]
    Empty(PathBuf),
}
