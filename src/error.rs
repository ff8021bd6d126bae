//! Error types for httptape

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::config::Mode;

/// Result type for httptape operations
pub type Result<T> = std::result::Result<T, TapeError>;

/// Errors that can occur in httptape
#[derive(Debug, Error)]
pub enum TapeError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Cassette file missing in a playback path. The message walks a human
    /// operator through recording it rather than surfacing a bare I/O error.
    #[error(
        "cassette not found: {name}\n\
         \x20 looked for: {}\n\
         \n\
         httptape is in {mode} mode but the cassette file is missing.\n\
         \n\
         To fix this, record the cassette first:\n\
         \x20 HTTPTAPE_MODE=record cargo test\n\
         \n\
         This will create the cassette files by making real API calls.\n\
         Make sure you have valid credentials exported for the services\n\
         under test before recording.\n\
         \n\
         After recording, run tests in playback mode:\n\
         \x20 HTTPTAPE_MODE=playback cargo test",
        .path.display()
    )]
    CassetteMissing {
        /// Cassette name
        name: String,
        /// Full path that was checked
        path: PathBuf,
        /// Mode the transport was running in
        mode: Mode,
    },

    /// Cassette file exists but could not be parsed
    #[error("failed to parse cassette {name}: {reason}")]
    MalformedCassette {
        /// Cassette name
        name: String,
        /// Underlying parse error
        reason: String,
    },

    /// No recorded interaction satisfies the enabled match criteria
    #[error("no matching interaction found in cassette {cassette} for {method} {url}")]
    PlaybackMiss {
        /// Cassette that was searched
        cassette: String,
        /// Live request method
        method: String,
        /// Live request URL
        url: String,
    },

    /// Live transport failure
    #[error("live request failed: {0}")]
    Transport(String),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}
