//! Common error types used throughout supsync.
//!
//! Covers failures that are not specific to one crate, such as malformed
//! clock strings or missing files.

/// Common error type for supsync.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested file or resource was not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// An I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid input was provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A clock string could not be parsed.
    #[error("Invalid timestamp '{0}'")]
    InvalidTimestamp(String),
}

impl Error {
    /// Create a new NotFound error.
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a new InvalidInput error.
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a new InvalidTimestamp error.
    pub fn invalid_timestamp<S: Into<String>>(value: S) -> Self {
        Self::InvalidTimestamp(value.into())
    }
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;
