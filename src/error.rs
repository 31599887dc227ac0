//! Error type shared by the catalog, exception table, decomposer and renderer.
//!
//! Every variant is recoverable by the caller: input errors are rejected
//! before any partial output is produced, and resolution failures name the
//! offending key and where it sits in the plan.

use thiserror::Error;

/// Result alias used throughout the library.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Negative or malformed numeral input.
    #[error("invalid numeral input: {0}")]
    InvalidArgument(String),

    /// The number is at or beyond the configured ceiling.
    #[error("number {value} is not supported (ceiling is {ceiling})")]
    UnsupportedMagnitude { value: String, ceiling: u64 },

    /// A segment key has no recorded clip in the catalog.
    #[error("no recording for segment '{key}' at position {position}")]
    MissingSegment { key: String, position: usize },

    /// The same integer was given two different plans in an exception table.
    #[error("conflicting exception entries for {value}")]
    DuplicateException { value: u64 },

    /// Playback speed outside `(0, 4]` or not finite.
    #[error("playback speed {0} is out of range (0, 4]")]
    InvalidSpeed(f32),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// True for errors caused by what the user typed rather than by the
    /// installation (catalog, files, config).
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidArgument(_) | Error::UnsupportedMagnitude { .. } | Error::InvalidSpeed(_)
        )
    }
}
