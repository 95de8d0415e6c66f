//! Error types for the apex core library.
use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApexError {
    /// A tunable is out of its accepted range.
    #[error("invalid config: {0}")]
    Config(String),

    /// Reading or writing the playlist file failed.
    #[error("playlist {path}: {source}")]
    Playlist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The playback position source could not answer.
    #[error("position source unavailable: {0}")]
    Source(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("TOML encode error: {0}")]
    TomlSer(#[from] toml::ser::Error),
}

pub type Result<T> = std::result::Result<T, ApexError>;
