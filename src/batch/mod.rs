//! Batch orchestration: fan a directory of streams out across workers.
//!
//! A batch claims the reference media once, runs every input through
//! [`pipeline::sync_file`] under a bounded worker pool, and collects one
//! [`FileReport`] per input. Per-file failures never abort the batch.

pub mod discovery;
mod error;
pub mod pipeline;
pub mod reference;
pub mod report;

pub use error::SyncError;
pub use pipeline::{sync_file, FileSuccess, SyncContext};
pub use reference::ReferenceClaim;
pub use report::{BatchReport, FileReport, FileStatus};

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use supsync_av::{AlignmentBackend, BatchWorkspace, FfsubsyncBackend};
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

use crate::config::Config;

/// Knobs for one batch run.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub workers: usize,
    pub keep_temp: bool,
    pub output_dir: PathBuf,
    pub output_suffix: String,
    pub reference_extension: String,
}

impl BatchOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            workers: config.sync.workers,
            keep_temp: config.sync.keep_temp,
            output_dir: config.sync.output_dir.clone(),
            output_suffix: config.sync.output_suffix.clone(),
            reference_extension: config.backend.reference_extension.clone(),
        }
    }
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// The aligner described by `config`.
pub fn backend_from_config(config: &Config) -> FfsubsyncBackend {
    FfsubsyncBackend::new(&config.backend.program)
        .with_timeout(Duration::from_secs(config.backend.timeout_secs))
        .with_extra_args(config.backend.extra_args.clone())
}

/// Runs batches against one alignment backend.
pub struct BatchRunner {
    options: BatchOptions,
    backend: Arc<dyn AlignmentBackend>,
    stop_signal: Arc<AtomicBool>,
}

impl BatchRunner {
    pub fn new(options: BatchOptions, backend: Arc<dyn AlignmentBackend>) -> Self {
        Self {
            options,
            backend,
            stop_signal: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn options(&self) -> &BatchOptions {
        &self.options
    }

    /// Get a clone of the stop signal for external control.
    ///
    /// Once set, files that have not started are reported as skipped.
    /// Files already aligning run to completion.
    pub fn stop_signal(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop_signal)
    }

    /// Sync `files` against `reference`, with working directories under `root`.
    ///
    /// Fails only when the batch cannot start. Per-file outcomes, and any
    /// failure to restore the reference name, are in the returned report.
    pub async fn run(
        &self,
        root: &Path,
        files: Vec<PathBuf>,
        reference: &Path,
    ) -> Result<BatchReport, SyncError> {
        let workspace =
            BatchWorkspace::create(root, &self.options.output_dir, self.options.keep_temp)
                .map_err(|e| SyncError::Write {
                    path: root.to_path_buf(),
                    source: std::io::Error::other(e),
                })?;
        let claim = match ReferenceClaim::acquire(reference, &self.options.reference_extension) {
            Ok(claim) => claim,
            Err(e) => {
                workspace.cleanup();
                return Err(e);
            }
        };

        let ctx = SyncContext {
            workspace: workspace.clone(),
            reference: claim.path().to_path_buf(),
            backend: Arc::clone(&self.backend),
            output_suffix: self.options.output_suffix.clone(),
        };

        let workers = self.options.workers.max(1);
        info!(
            files = files.len(),
            workers,
            backend = self.backend.name(),
            reference = %claim.path().display(),
            "Starting batch"
        );

        let semaphore = Arc::new(Semaphore::new(workers));
        let mut handles = Vec::with_capacity(files.len());

        for file in files {
            let sem = Arc::clone(&semaphore);
            let stop = Arc::clone(&self.stop_signal);
            let ctx = ctx.clone();
            let path = file.clone();

            let handle = tokio::spawn(async move {
                let Ok(_permit) = sem.acquire_owned().await else {
                    return FileReport::interrupted(&path);
                };
                if stop.load(Ordering::Relaxed) {
                    debug!(file = %path.display(), "Stop requested, not starting");
                    return FileReport::interrupted(&path);
                }

                let result = sync_file(&ctx, &path).await;
                match result {
                    Ok(_) => {}
                    Err(ref e) if e.is_skip() => {
                        info!(file = %path.display(), "Skipped: {}", e);
                    }
                    Err(ref e) => {
                        warn!(file = %path.display(), kind = e.kind(), "Failed: {}", e);
                    }
                }
                FileReport::from_result(&path, &result)
            });
            handles.push((file, handle));
        }

        let mut reports = Vec::with_capacity(handles.len());
        for (file, handle) in handles {
            match handle.await {
                Ok(report) => reports.push(report),
                Err(e) => {
                    error!(file = %file.display(), "Worker task failed: {}", e);
                    reports.push(FileReport::aborted(&file, e.to_string()));
                }
            }
        }

        workspace.cleanup();
        let original = claim.original().to_path_buf();
        let restored = claim.release();

        let interrupted = self.stop_signal.load(Ordering::Relaxed);
        let mut report = BatchReport::new(original, reports, interrupted);
        if let Err(ref e) = restored {
            error!("{e}");
            report = report.with_restore_error(e);
        }
        info!(
            synced = report.count(FileStatus::Synced),
            skipped = report.count(FileStatus::Skipped),
            failed = report.count(FileStatus::Failed),
            "Batch finished"
        );

        Ok(report)
    }
}
