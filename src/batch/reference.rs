//! Batch-wide claim on the reference media file.
//!
//! The aligner only accepts some container extensions, so the reference is
//! renamed for the duration of the batch and renamed back afterwards. The
//! claim restores the original name when released or dropped, whichever
//! happens first.

use std::path::{Path, PathBuf};

use supsync_common::paths::normalize_extension;
use tracing::{debug, error, info};

use super::SyncError;

/// A renamed reference file, restored on release or drop.
#[derive(Debug)]
pub struct ReferenceClaim {
    original: PathBuf,
    claimed: PathBuf,
    active: bool,
}

impl ReferenceClaim {
    /// Rename `path` to carry `extension`.
    ///
    /// A file that already has the extension is used in place. Refuses to
    /// overwrite an existing file at the target name.
    pub fn acquire(path: &Path, extension: &str) -> Result<Self, SyncError> {
        if !path.is_file() {
            return Err(SyncError::reference(path, "not found"));
        }

        let extension = normalize_extension(extension);
        let current = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        if current == extension {
            debug!(path = %path.display(), "Reference already has the expected extension");
            return Ok(Self {
                original: path.to_path_buf(),
                claimed: path.to_path_buf(),
                active: false,
            });
        }

        let claimed = path.with_extension(&extension);
        if claimed.exists() {
            return Err(SyncError::reference(
                path,
                format!("target {} already exists", claimed.display()),
            ));
        }

        std::fs::rename(path, &claimed)
            .map_err(|e| SyncError::reference(path, format!("rename failed: {e}")))?;
        info!(from = %path.display(), to = %claimed.display(), "Claimed reference media");

        Ok(Self {
            original: path.to_path_buf(),
            claimed,
            active: true,
        })
    }

    /// Path the aligner should read during the batch.
    pub fn path(&self) -> &Path {
        &self.claimed
    }

    /// Original reference path.
    pub fn original(&self) -> &Path {
        &self.original
    }

    /// Restore the original name, reporting failure.
    pub fn release(mut self) -> Result<(), SyncError> {
        self.restore()
    }

    fn restore(&mut self) -> Result<(), SyncError> {
        if !self.active {
            return Ok(());
        }
        self.active = false;

        if self.original.exists() {
            return Err(SyncError::reference(
                &self.original,
                format!(
                    "restore failed: {} already exists, reference left at {}",
                    self.original.display(),
                    self.claimed.display()
                ),
            ));
        }
        std::fs::rename(&self.claimed, &self.original).map_err(|e| {
            SyncError::reference(&self.original, format!("restore failed: {e}"))
        })?;
        info!(path = %self.original.display(), "Restored reference media");
        Ok(())
    }
}

impl Drop for ReferenceClaim {
    fn drop(&mut self) {
        if let Err(e) = self.restore() {
            error!("{e}");
        }
    }
}
