//! Working directories for a sync batch.

use crate::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Proxy timing files written for the aligner.
pub const PROXY_DIR: &str = "dummy_srt";
/// Timing files written by the aligner.
pub const SYNCED_DIR: &str = "synced_srt";

/// Directory layout for one batch, rooted at the input directory.
///
/// Intermediate timing files live in [`PROXY_DIR`] and [`SYNCED_DIR`] and are
/// removed by [`BatchWorkspace::cleanup`] unless `keep_temp` is set. Synced
/// streams go to the output directory, which is always kept.
///
/// # Example
///
/// ```no_run
/// use supsync_av::BatchWorkspace;
///
/// let ws = BatchWorkspace::create("/rips/movie/subs", "synced_sups", false)?;
/// let proxy = ws.proxy_file("movie.en");
/// // ... align ...
/// ws.cleanup();
/// # Ok::<(), supsync_av::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct BatchWorkspace {
    root: PathBuf,
    proxy_dir: PathBuf,
    synced_dir: PathBuf,
    output_dir: PathBuf,
    keep_temp: bool,
}

impl BatchWorkspace {
    /// Create the working directories under `root`.
    ///
    /// `output_dir` is resolved relative to `root` unless absolute.
    pub fn create<P: AsRef<Path>, O: AsRef<Path>>(
        root: P,
        output_dir: O,
        keep_temp: bool,
    ) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_dir() {
            return Err(Error::InvalidInput(format!(
                "not a directory: {}",
                root.display()
            )));
        }

        let ws = Self {
            proxy_dir: root.join(PROXY_DIR),
            synced_dir: root.join(SYNCED_DIR),
            output_dir: root.join(output_dir.as_ref()),
            root,
            keep_temp,
        };

        for dir in [&ws.proxy_dir, &ws.synced_dir, &ws.output_dir] {
            std::fs::create_dir_all(dir).map_err(|e| {
                Error::Workspace(format!("Failed to create {}: {}", dir.display(), e))
            })?;
        }
        debug!(root = %ws.root.display(), "Created batch workspace");

        Ok(ws)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn proxy_dir(&self) -> &Path {
        &self.proxy_dir
    }

    pub fn synced_dir(&self) -> &Path {
        &self.synced_dir
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn keep_temp(&self) -> bool {
        self.keep_temp
    }

    /// Proxy timing file for an input stem.
    pub fn proxy_file(&self, stem: &str) -> PathBuf {
        self.proxy_dir.join(format!("{stem}.srt"))
    }

    /// Aligned timing file for an input stem.
    pub fn synced_file(&self, stem: &str) -> PathBuf {
        self.synced_dir.join(format!("{stem}.synced.srt"))
    }

    /// Output stream path, `<output_dir>/<stem>.<suffix>.sup`.
    pub fn output_file(&self, stem: &str, suffix: &str) -> PathBuf {
        if suffix.is_empty() {
            self.output_dir.join(format!("{stem}.sup"))
        } else {
            self.output_dir.join(format!("{stem}.{suffix}.sup"))
        }
    }

    /// Remove the intermediate directories unless `keep_temp` is set.
    ///
    /// Failures are logged, not returned.
    pub fn cleanup(&self) {
        if self.keep_temp {
            debug!("Keeping intermediate timing files");
            return;
        }

        for dir in [&self.proxy_dir, &self.synced_dir] {
            if let Err(e) = std::fs::remove_dir_all(dir) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(dir = %dir.display(), error = %e, "Failed to remove working directory");
                }
            }
        }
    }
}
