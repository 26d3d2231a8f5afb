//! The per-file sync pipeline: parse, extract, align, remap, write.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use supsync_av::{AlignmentBackend, BatchWorkspace};
use supsync_common::TimeSpan;
use supsync_pgs::{FrameRate, RemapOutcome, SegmentStream};
use tracing::{debug, info};

use super::SyncError;

/// Everything a worker needs, shared across the batch.
#[derive(Clone)]
pub struct SyncContext {
    pub workspace: BatchWorkspace,
    /// Claimed reference path handed to the aligner.
    pub reference: PathBuf,
    pub backend: Arc<dyn AlignmentBackend>,
    pub output_suffix: String,
}

/// A successfully synced file.
#[derive(Debug, Clone)]
pub struct FileSuccess {
    pub output: PathBuf,
    pub events: usize,
    pub remap: RemapOutcome,
    pub original_frame_rate: Option<FrameRate>,
    pub rate_factor: Option<f64>,
    pub diagnostics: String,
}

/// File stem used for working and output names.
pub fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "subtitle".to_string())
}

/// Run one file through the whole pipeline.
pub async fn sync_file(ctx: &SyncContext, input: &Path) -> Result<FileSuccess, SyncError> {
    let data = tokio::fs::read(input).await.map_err(|source| SyncError::Read {
        path: input.to_path_buf(),
        source,
    })?;

    let mut stream = SegmentStream::parse(data)?;
    debug!(
        file = %input.display(),
        segments = stream.len(),
        gap_bytes = stream.gap_len(),
        "Parsed stream"
    );

    let events = supsync_pgs::extract(stream.segments());
    if events.is_empty() {
        return Err(SyncError::NoEvents);
    }
    info!(file = %input.display(), events = events.len(), "Extracted display events");

    let stem = file_stem(input);
    let spans: Vec<TimeSpan> = events.iter().map(|e| e.span()).collect();
    let aligned = supsync_av::align(
        &spans,
        &ctx.reference,
        &ctx.workspace.proxy_file(&stem),
        &ctx.workspace.synced_file(&stem),
        ctx.backend.as_ref(),
    )
    .await?;

    let original_frame_rate = stream.nominal_frame_rate();
    let remap = supsync_pgs::remap(&mut stream, &events, &aligned.synced, aligned.rate_factor)?;

    let output = ctx.workspace.output_file(&stem, &ctx.output_suffix);
    let bytes = stream.serialize().map_err(|e| SyncError::Write {
        path: output.clone(),
        source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
    })?;
    tokio::fs::write(&output, &bytes)
        .await
        .map_err(|source| SyncError::Write {
            path: output.clone(),
            source,
        })?;

    info!(
        file = %input.display(),
        output = %output.display(),
        mapped = remap.mapped,
        segments_changed = remap.segments_changed,
        "Wrote synced stream"
    );

    Ok(FileSuccess {
        output,
        events: events.len(),
        remap,
        original_frame_rate,
        rate_factor: aligned.rate_factor,
        diagnostics: aligned.diagnostics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use supsync_av::{AlignRequest, AlignResponse};
    use supsync_common::Timestamp;
    use supsync_pgs::{Segment, SegmentKind};

    /// Shifts every entry by a fixed offset and reports a rate factor.
    struct Shift {
        millis: u64,
        log: &'static str,
    }

    #[async_trait]
    impl AlignmentBackend for Shift {
        fn name(&self) -> &str {
            "shift"
        }

        async fn align(&self, request: &AlignRequest) -> supsync_av::Result<AlignResponse> {
            let spans = supsync_av::timing::read_srt(&request.proxy).await?;
            let shifted: Vec<TimeSpan> = spans
                .iter()
                .map(|s| {
                    TimeSpan::new(
                        Timestamp::from_millis(s.start.as_millis() + self.millis),
                        Timestamp::from_millis(s.end.as_millis() + self.millis),
                    )
                })
                .collect();
            supsync_av::timing::write_srt(&request.output, &shifted).await?;
            Ok(AlignResponse {
                diagnostics: self.log.to_string(),
            })
        }
    }

    fn pcs_payload(rate: u8, state: u8, objects: u8) -> Vec<u8> {
        let mut p = vec![0x07, 0x80, 0x04, 0x38, rate, 0x00, 0x01, state, 0x00, 0x00, objects];
        for _ in 0..objects {
            p.extend_from_slice(&[0, 0, 0, 0, 0, 0, 0, 0]);
        }
        p
    }

    fn stream_bytes() -> Vec<u8> {
        let at = Timestamp::from_millis;
        let segments = vec![
            Segment::new(SegmentKind::Composition, at(1000), at(1000), pcs_payload(0x10, 0x80, 1)),
            Segment::new(SegmentKind::Window, at(1000), at(1000), vec![0; 10]),
            Segment::new(SegmentKind::Object, at(1000), at(1000), vec![0; 12]),
            Segment::new(SegmentKind::End, at(2000), at(2000), vec![]),
            Segment::new(SegmentKind::Composition, at(3000), at(3000), pcs_payload(0x10, 0x00, 0)),
            Segment::new(SegmentKind::End, at(3000), at(3000), vec![]),
        ];
        SegmentStream::from_segments(segments)
            .serialize()
            .unwrap()
            .to_vec()
    }

    fn context(dir: &Path, backend: Arc<dyn AlignmentBackend>) -> SyncContext {
        SyncContext {
            workspace: BatchWorkspace::create(dir, "out", false).unwrap(),
            reference: dir.join("ref.mkv"),
            backend,
            output_suffix: "synced".to_string(),
        }
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem(Path::new("/subs/movie.en.sup")), "movie.en");
    }

    #[tokio::test]
    async fn test_sync_file_shifts_events() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("movie.en.sup");
        std::fs::write(&input, stream_bytes()).unwrap();

        let backend = Arc::new(Shift {
            millis: 500,
            log: "framerate scale factor: 1.000\n",
        });
        let ctx = context(dir.path(), backend);
        let done = sync_file(&ctx, &input).await.unwrap();

        assert_eq!(done.output, dir.path().join("out/movie.en.synced.sup"));
        assert_eq!(done.events, 1);
        assert_eq!(done.remap.mapped, 1);
        assert_eq!(done.remap.segments_changed, 2);
        assert_eq!(done.original_frame_rate, Some(FrameRate::Film));
        assert_eq!(done.rate_factor, Some(1.0));
        assert!(done.remap.frame_rate.is_none());

        let written = SegmentStream::parse(std::fs::read(&done.output).unwrap()).unwrap();
        assert_eq!(written.segments()[0].pts, Timestamp::from_millis(1500));
        assert_eq!(written.segments()[3].pts, Timestamp::from_millis(2500));
        assert_eq!(written.segments()[1].pts, Timestamp::from_millis(1000));
        assert_eq!(written.segments()[4].pts, Timestamp::from_millis(3000));
    }

    #[tokio::test]
    async fn test_sync_file_rate_change() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("a.sup");
        std::fs::write(&input, stream_bytes()).unwrap();

        let backend = Arc::new(Shift {
            millis: 0,
            log: "INFO: framerate scale factor: 0.959\n",
        });
        let done = sync_file(&context(dir.path(), backend), &input).await.unwrap();

        let change = done.remap.frame_rate.unwrap();
        assert_eq!(change.from, FrameRate::Film);
        assert_eq!(change.to, FrameRate::Fps25);
    }

    #[tokio::test]
    async fn test_sync_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let backend: Arc<dyn AlignmentBackend> = Arc::new(Shift { millis: 0, log: "" });
        let ctx = context(dir.path(), backend);

        let missing = sync_file(&ctx, &dir.path().join("missing.sup")).await.unwrap_err();
        assert_eq!(missing.kind(), "read");

        let garbage = dir.path().join("garbage.sup");
        std::fs::write(&garbage, b"not a subtitle stream").unwrap();
        assert_eq!(sync_file(&ctx, &garbage).await.unwrap_err().kind(), "format");

        let at = Timestamp::from_millis;
        let control_only = SegmentStream::from_segments(vec![
            Segment::new(SegmentKind::Composition, at(0), at(0), pcs_payload(0x10, 0x80, 0)),
            Segment::new(SegmentKind::End, at(0), at(0), vec![]),
        ]);
        let empty = dir.path().join("empty.sup");
        std::fs::write(&empty, control_only.serialize().unwrap()).unwrap();
        let err = sync_file(&ctx, &empty).await.unwrap_err();
        assert!(err.is_skip());
    }
}
