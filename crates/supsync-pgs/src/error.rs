//! Error types for supsync-pgs.

use thiserror::Error;

/// Result type for supsync-pgs operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for supsync-pgs operations.
#[derive(Debug, Error)]
pub enum Error {
    /// No segment could be recovered from non-empty input.
    #[error("Invalid PGS stream: no segments found in {len} bytes")]
    NoSegments { len: usize },

    /// Buffer too small for operation.
    #[error("Buffer underflow: need {need} bytes, have {have}")]
    BufferUnderflow { need: usize, have: usize },

    /// Segment index outside the stream.
    #[error("Invalid segment index: {index} (len: {len})")]
    InvalidSegmentIndex { index: usize, len: usize },

    /// Payload larger than the 16-bit size field allows.
    #[error("Segment payload too large: {len} bytes")]
    PayloadTooLarge { len: usize },
}

impl Error {
    /// Create an invalid segment index error.
    pub fn invalid_index(index: usize, len: usize) -> Self {
        Self::InvalidSegmentIndex { index, len }
    }
}
