//! Alignment bridge: hand display spans to an external aligner and read the
//! adjusted spans back.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use supsync_common::TimeSpan;
use tracing::{debug, info, warn};

use crate::command::ToolCommand;
use crate::timing::{read_srt, write_srt};
use crate::{Error, Result};

/// Default aligner program.
pub const DEFAULT_PROGRAM: &str = "ffs";

/// Paths for one aligner invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignRequest {
    /// Reference media the timing is aligned against.
    pub reference: PathBuf,
    /// Proxy timing file to align.
    pub proxy: PathBuf,
    /// Where the aligner writes the adjusted timing file.
    pub output: PathBuf,
}

/// What the aligner reported.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlignResponse {
    /// Raw diagnostic text (stdout and stderr).
    pub diagnostics: String,
}

/// An external time-alignment tool.
#[async_trait]
pub trait AlignmentBackend: Send + Sync {
    /// Short name for logs and reports.
    fn name(&self) -> &str;

    /// Align `request.proxy` against `request.reference`, writing
    /// `request.output`.
    ///
    /// Must fail if the tool reports failure.
    async fn align(&self, request: &AlignRequest) -> Result<AlignResponse>;
}

/// Runs `ffsubsync` as `<program> <reference> -i <proxy> -o <output>`.
#[derive(Debug, Clone)]
pub struct FfsubsyncBackend {
    program: PathBuf,
    timeout: Duration,
    extra_args: Vec<String>,
}

impl FfsubsyncBackend {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            timeout: Duration::from_secs(1800),
            extra_args: Vec::new(),
        }
    }

    /// Set the per-invocation timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Arguments appended after the standard ones.
    pub fn with_extra_args(mut self, args: Vec<String>) -> Self {
        self.extra_args = args;
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn command(&self, request: &AlignRequest) -> ToolCommand {
        let mut cmd = ToolCommand::new(self.program.clone());
        cmd.arg(request.reference.to_string_lossy())
            .arg("-i")
            .arg(request.proxy.to_string_lossy())
            .arg("-o")
            .arg(request.output.to_string_lossy())
            .args(self.extra_args.iter().cloned())
            .timeout(self.timeout);
        cmd
    }
}

impl Default for FfsubsyncBackend {
    fn default() -> Self {
        Self::new(DEFAULT_PROGRAM)
    }
}

#[async_trait]
impl AlignmentBackend for FfsubsyncBackend {
    fn name(&self) -> &str {
        "ffsubsync"
    }

    async fn align(&self, request: &AlignRequest) -> Result<AlignResponse> {
        let output = self.command(request).output().await?;
        let diagnostics = output.combined();

        if !output.status.success() {
            let tail = filter_progress(&diagnostics);
            return Err(Error::tool_failed(
                self.program.to_string_lossy(),
                format!("exited with {}: {}", output.status, tail.trim()),
            ));
        }

        Ok(AlignResponse { diagnostics })
    }
}

/// Result of aligning one file's spans.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignOutcome {
    /// Adjusted spans, in file order.
    pub synced: Vec<TimeSpan>,
    /// Frame-rate scale factor reported by the aligner.
    pub rate_factor: Option<f64>,
    /// Aligner diagnostics with progress output removed.
    pub diagnostics: String,
}

/// Write `events` as a proxy file, run `backend`, and read the result.
///
/// `proxy` and `output` are the proxy and aligned timing file locations.
pub async fn align(
    events: &[TimeSpan],
    reference: &Path,
    proxy: &Path,
    output: &Path,
    backend: &dyn AlignmentBackend,
) -> Result<AlignOutcome> {
    write_srt(proxy, events).await?;
    debug!(proxy = %proxy.display(), entries = events.len(), "Wrote proxy timing file");

    // A stale output from an earlier run must not be mistaken for a result
    if tokio::fs::try_exists(output).await? {
        tokio::fs::remove_file(output).await?;
    }

    let request = AlignRequest {
        reference: reference.to_path_buf(),
        proxy: proxy.to_path_buf(),
        output: output.to_path_buf(),
    };
    info!(backend = backend.name(), proxy = %proxy.display(), "Aligning");
    let response = backend.align(&request).await?;

    if !tokio::fs::try_exists(output).await? {
        return Err(Error::missing_output(output));
    }

    let synced = read_srt(output).await?;
    if synced.is_empty() && !events.is_empty() {
        return Err(Error::EmptyOutput {
            path: output.to_path_buf(),
            expected: events.len(),
        });
    }

    let diagnostics = filter_progress(&response.diagnostics);
    let rate_factor = parse_rate_factor(&diagnostics);
    if let Some(factor) = rate_factor {
        debug!(factor, "Aligner reported a frame rate scale factor");
    }
    if synced.len() != events.len() {
        warn!(
            sent = events.len(),
            received = synced.len(),
            "Aligner returned a different number of entries"
        );
    }

    Ok(AlignOutcome {
        synced,
        rate_factor,
        diagnostics,
    })
}

static PROGRESS_BAR: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^\s*\d{1,3}%\|.*$").ok());

static ITERATION: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^\s*\d+(\.\d+)?it.*$").ok());

static RATE_FACTOR: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"framerate scale factor:\s*([0-9.]+)").ok());

/// Drop progress-bar and iteration-counter lines from aligner output.
///
/// Carriage-return redraws are split into separate lines first.
///
/// ```
/// use supsync_av::align::filter_progress;
///
/// let log = " 45%|████      | 9/20\nINFO: done\n";
/// assert_eq!(filter_progress(log), "INFO: done");
/// ```
pub fn filter_progress(log: &str) -> String {
    let patterns: Vec<&Regex> = [&*PROGRESS_BAR, &*ITERATION]
        .into_iter()
        .flatten()
        .collect();

    log.split(['\n', '\r'])
        .filter(|line| !line.trim().is_empty())
        .filter(|line| !patterns.iter().any(|re| re.is_match(line)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Extract the frame-rate scale factor from aligner output.
///
/// ```
/// use supsync_av::align::parse_rate_factor;
///
/// let log = "INFO: framerate scale factor: 1.042\n";
/// assert_eq!(parse_rate_factor(log), Some(1.042));
/// assert_eq!(parse_rate_factor("nothing here"), None);
/// ```
pub fn parse_rate_factor(log: &str) -> Option<f64> {
    let re = RATE_FACTOR.as_ref()?;
    re.captures(log)
        .and_then(|caps| caps[1].parse::<f64>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use supsync_common::Timestamp;

    fn span(start: u64, end: u64) -> TimeSpan {
        TimeSpan::new(Timestamp::from_millis(start), Timestamp::from_millis(end))
    }

    /// Shifts every entry by a fixed offset and records its requests.
    struct ShiftBackend {
        shift_ms: u64,
        log: String,
        requests: Mutex<Vec<AlignRequest>>,
    }

    #[async_trait]
    impl AlignmentBackend for ShiftBackend {
        fn name(&self) -> &str {
            "shift"
        }

        async fn align(&self, request: &AlignRequest) -> Result<AlignResponse> {
            self.requests.lock().unwrap().push(request.clone());
            let spans = read_srt(&request.proxy).await?;
            let shifted: Vec<_> = spans
                .iter()
                .map(|s| {
                    span(
                        s.start.as_millis() + self.shift_ms,
                        s.end.as_millis() + self.shift_ms,
                    )
                })
                .collect();
            write_srt(&request.output, &shifted).await?;
            Ok(AlignResponse {
                diagnostics: self.log.clone(),
            })
        }
    }

    struct SilentBackend;

    #[async_trait]
    impl AlignmentBackend for SilentBackend {
        fn name(&self) -> &str {
            "silent"
        }

        async fn align(&self, _request: &AlignRequest) -> Result<AlignResponse> {
            Ok(AlignResponse::default())
        }
    }

    #[tokio::test]
    async fn test_align_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let proxy = dir.path().join("a.srt");
        let output = dir.path().join("a.synced.srt");
        let backend = ShiftBackend {
            shift_ms: 250,
            log: "  3%|▎ | 1/30\nframerate scale factor: 1.001\n".into(),
            requests: Mutex::new(Vec::new()),
        };

        let outcome = align(
            &[span(1_000, 2_000), span(3_000, 4_000)],
            Path::new("ref.mkv"),
            &proxy,
            &output,
            &backend,
        )
        .await
        .unwrap();

        assert_eq!(outcome.synced, vec![span(1_250, 2_250), span(3_250, 4_250)]);
        assert_eq!(outcome.rate_factor, Some(1.001));
        assert_eq!(outcome.diagnostics, "framerate scale factor: 1.001");

        let requests = backend.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].reference, PathBuf::from("ref.mkv"));
        assert_eq!(requests[0].proxy, proxy);
    }

    #[tokio::test]
    async fn test_align_missing_output() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.srt");
        std::fs::write(&output, "stale").unwrap();

        let err = align(
            &[span(0, 1)],
            Path::new("ref.mkv"),
            &dir.path().join("in.srt"),
            &output,
            &SilentBackend,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::MissingOutput { .. }));
    }

    #[tokio::test]
    async fn test_align_empty_output() {
        struct EmptyBackend;

        #[async_trait]
        impl AlignmentBackend for EmptyBackend {
            fn name(&self) -> &str {
                "empty"
            }

            async fn align(&self, request: &AlignRequest) -> Result<AlignResponse> {
                tokio::fs::write(&request.output, "").await?;
                Ok(AlignResponse::default())
            }
        }

        let dir = tempfile::tempdir().unwrap();
        let err = align(
            &[span(0, 1)],
            Path::new("ref.mkv"),
            &dir.path().join("in.srt"),
            &dir.path().join("out.srt"),
            &EmptyBackend,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::EmptyOutput { expected: 1, .. }));
    }

    #[test]
    fn test_filter_progress() {
        let log = "INFO: extracting speech\n\
                   100%|██████████| 20/20 [00:01<00:00]\r  5%|▌| 1/20\n\
                   12.5it/s\n\
                   3it [00:00, 4.2it/s]\n\
                   INFO: framerate scale factor: 0.959\n\n";
        assert_eq!(
            filter_progress(log),
            "INFO: extracting speech\nINFO: framerate scale factor: 0.959"
        );
    }

    #[test]
    fn test_parse_rate_factor() {
        assert_eq!(parse_rate_factor("framerate scale factor:0.959"), Some(0.959));
        assert_eq!(
            parse_rate_factor("a\nframerate scale factor: 1.043\nframerate scale factor: 2"),
            Some(1.043)
        );
        assert_eq!(parse_rate_factor("framerate scale factor: ..."), None);
        assert_eq!(parse_rate_factor(""), None);
    }

    #[test]
    fn test_ffsubsync_command_line() {
        let backend = FfsubsyncBackend::new("/opt/ffs")
            .with_extra_args(vec!["--vad".into(), "webrtc".into()]);
        let request = AlignRequest {
            reference: PathBuf::from("/media/ref.mkv"),
            proxy: PathBuf::from("/work/dummy_srt/a.srt"),
            output: PathBuf::from("/work/synced_srt/a.srt"),
        };
        let cmd = backend.command(&request);
        assert_eq!(
            cmd.get_args(),
            [
                "/media/ref.mkv",
                "-i",
                "/work/dummy_srt/a.srt",
                "-o",
                "/work/synced_srt/a.srt",
                "--vad",
                "webrtc",
            ]
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_ffsubsync_nonzero_exit() {
        let backend = FfsubsyncBackend::new("false");
        let request = AlignRequest {
            reference: PathBuf::from("ref.mkv"),
            proxy: PathBuf::from("in.srt"),
            output: PathBuf::from("out.srt"),
        };
        let err = backend.align(&request).await.unwrap_err();
        assert!(matches!(err, Error::ToolFailed { .. }));
    }
}
