//! Per-file and batch-level failures.

use std::path::PathBuf;

/// Why a file (or the whole batch) could not be synced.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// The input could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The input is not a usable PGS stream.
    #[error(transparent)]
    Format(#[from] supsync_pgs::Error),

    /// The stream contains no visible display events.
    #[error("no image-bearing display events")]
    NoEvents,

    /// The aligner failed or returned unusable output.
    #[error("alignment failed: {0}")]
    Alignment(#[from] supsync_av::Error),

    /// The synced stream could not be written.
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The reference media could not be claimed or restored.
    #[error("reference media {}: {message}", path.display())]
    Reference { path: PathBuf, message: String },
}

impl SyncError {
    /// Create a reference error.
    pub fn reference(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Reference {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Short machine-readable kind, used in reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Read { .. } => "read",
            Self::Format(_) => "format",
            Self::NoEvents => "no-events",
            Self::Alignment(_) => "alignment",
            Self::Write { .. } => "write",
            Self::Reference { .. } => "reference",
        }
    }

    /// Whether this outcome is a skip rather than a failure.
    pub fn is_skip(&self) -> bool {
        matches!(self, Self::NoEvents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(SyncError::NoEvents.kind(), "no-events");
        assert!(SyncError::NoEvents.is_skip());

        let err = SyncError::from(supsync_pgs::Error::NoSegments { len: 4 });
        assert_eq!(err.kind(), "format");
        assert!(!err.is_skip());
        assert_eq!(
            err.to_string(),
            "Invalid PGS stream: no segments found in 4 bytes"
        );
    }

    #[test]
    fn test_reference_display() {
        let err = SyncError::reference("/media/a.flac", "already claimed");
        assert_eq!(err.to_string(), "reference media /media/a.flac: already claimed");
    }
}
