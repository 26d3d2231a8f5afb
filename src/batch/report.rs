//! Per-file status lines and the batch summary.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use supsync_pgs::{FrameRate, FrameRateChange};

use super::pipeline::FileSuccess;
use super::SyncError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    Synced,
    Skipped,
    Failed,
}

impl FileStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Synced => "synced",
            Self::Skipped => "skipped",
            Self::Failed => "failed",
        }
    }
}

/// Outcome of one input file.
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub file: PathBuf,
    pub status: FileStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
    pub events: usize,
    pub mapped: usize,
    pub synced: usize,
    pub count_mismatch: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_frame_rate: Option<FrameRate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_rate_change: Option<FrameRateChange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_factor: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub diagnostics: String,
}

impl FileReport {
    fn empty(file: &Path, status: FileStatus) -> Self {
        Self {
            file: file.to_path_buf(),
            status,
            output: None,
            events: 0,
            mapped: 0,
            synced: 0,
            count_mismatch: false,
            original_frame_rate: None,
            frame_rate_change: None,
            rate_factor: None,
            error_kind: None,
            message: None,
            diagnostics: String::new(),
        }
    }

    /// Build the line for a finished file.
    pub fn from_result(file: &Path, result: &Result<FileSuccess, SyncError>) -> Self {
        match result {
            Ok(done) => Self {
                output: Some(done.output.clone()),
                events: done.events,
                mapped: done.remap.mapped,
                synced: done.remap.synced,
                count_mismatch: done.remap.count_mismatch(),
                original_frame_rate: done.original_frame_rate,
                frame_rate_change: done.remap.frame_rate,
                rate_factor: done.rate_factor,
                diagnostics: done.diagnostics.clone(),
                ..Self::empty(file, FileStatus::Synced)
            },
            Err(err) => {
                let status = if err.is_skip() {
                    FileStatus::Skipped
                } else {
                    FileStatus::Failed
                };
                Self {
                    error_kind: Some(err.kind()),
                    message: Some(err.to_string()),
                    ..Self::empty(file, status)
                }
            }
        }
    }

    /// A file that was never started because the batch was stopped.
    pub fn interrupted(file: &Path) -> Self {
        Self {
            message: Some("interrupted before start".to_string()),
            ..Self::empty(file, FileStatus::Skipped)
        }
    }

    /// A file whose worker ended without producing a result.
    pub fn aborted(file: &Path, message: impl Into<String>) -> Self {
        Self {
            error_kind: Some("aborted"),
            message: Some(message.into()),
            ..Self::empty(file, FileStatus::Failed)
        }
    }

    fn display_name(&self) -> String {
        self.file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.file.display().to_string())
    }
}

/// Summary of a whole batch.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub reference: PathBuf,
    pub files: Vec<FileReport>,
    pub interrupted: bool,
    /// Set when the reference could not be renamed back after the batch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restore_error: Option<String>,
}

impl BatchReport {
    /// Build a report, ordering files by name.
    pub fn new(reference: PathBuf, mut files: Vec<FileReport>, interrupted: bool) -> Self {
        files.sort_by(|a, b| a.file.cmp(&b.file));
        Self {
            reference,
            files,
            interrupted,
            restore_error: None,
        }
    }

    /// Record that the reference was left under its claimed name.
    pub fn with_restore_error(mut self, err: &SyncError) -> Self {
        self.restore_error = Some(err.to_string());
        self
    }

    pub fn count(&self, status: FileStatus) -> usize {
        self.files.iter().filter(|f| f.status == status).count()
    }

    pub fn has_failures(&self) -> bool {
        self.count(FileStatus::Failed) > 0 || self.restore_error.is_some()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Human-readable report.
    pub fn write_text<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "Reference: {}", self.reference.display())?;
        writeln!(out)?;

        for file in &self.files {
            write!(out, "[{}] {}", file.status.as_str(), file.display_name())?;
            match file.status {
                FileStatus::Synced => {
                    write!(out, ": {}/{} events mapped", file.mapped, file.events)?;
                    if file.count_mismatch {
                        write!(out, " (aligner returned {})", file.synced)?;
                    }
                    writeln!(out)?;
                    if let Some(ref change) = file.frame_rate_change {
                        writeln!(
                            out,
                            "    frame rate {} -> {} (factor {:.4})",
                            change.from, change.to, change.factor
                        )?;
                    } else if let Some(rate) = file.original_frame_rate {
                        writeln!(out, "    frame rate {rate}")?;
                    }
                    if let Some(ref output) = file.output {
                        writeln!(out, "    -> {}", output.display())?;
                    }
                }
                FileStatus::Skipped | FileStatus::Failed => {
                    match file.message {
                        Some(ref message) => writeln!(out, ": {message}")?,
                        None => writeln!(out)?,
                    }
                }
            }
            for line in file.diagnostics.lines() {
                writeln!(out, "    | {line}")?;
            }
        }

        writeln!(out)?;
        write!(
            out,
            "{} synced, {} skipped, {} failed",
            self.count(FileStatus::Synced),
            self.count(FileStatus::Skipped),
            self.count(FileStatus::Failed)
        )?;
        if self.interrupted {
            write!(out, " (interrupted)")?;
        }
        writeln!(out)?;

        if let Some(ref err) = self.restore_error {
            writeln!(out, "Reference not restored: {err}")?;
        }
        Ok(())
    }
}
