//! Shared helpers for integration tests.
//!
//! Builds small PGS streams in memory and provides fake alignment backends
//! so batches can run without the real aligner.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use supsync_av::timing::{read_srt, write_srt};
use supsync_av::{AlignRequest, AlignResponse, AlignmentBackend};
use supsync_common::{TimeSpan, Timestamp};
use supsync_pgs::{Segment, SegmentKind, SegmentStream};

pub const FILM: u8 = 0x10;
const EPOCH_START: u8 = 0x80;
const NORMAL: u8 = 0x00;

fn at(millis: u64) -> Timestamp {
    Timestamp::from_millis(millis)
}

fn pcs(millis: u64, state: u8, objects: u8) -> Segment {
    let mut payload = vec![0x07, 0x80, 0x04, 0x38, FILM, 0x00, 0x01, state, 0x00, 0x00, objects];
    for _ in 0..objects {
        payload.extend_from_slice(&[0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x03, 0x20]);
    }
    Segment::new(SegmentKind::Composition, at(millis), at(millis), payload)
}

fn simple(kind: SegmentKind, millis: u64, payload: &[u8]) -> Segment {
    Segment::new(kind, at(millis), at(millis), payload.to_vec())
}

/// Two image-bearing display sets with a control-only clear between them.
///
/// Indices 0, 4, 8 and 11 carry the event boundaries.
pub fn scenario_segments() -> Vec<Segment> {
    vec![
        pcs(1_000, EPOCH_START, 1),
        simple(SegmentKind::Window, 1_000, &[0x01, 0, 0, 0, 0, 0, 0x07, 0x80, 0, 0x80]),
        simple(SegmentKind::Palette, 1_000, &[0x00, 0x00, 0x01, 0xeb, 0x80, 0x80, 0xff]),
        simple(SegmentKind::Object, 1_000, &[0x00, 0x01, 0x00, 0xc0, 0x00, 0x00, 0x04]),
        simple(SegmentKind::End, 3_000, &[]),
        pcs(3_000, NORMAL, 0),
        simple(SegmentKind::Window, 3_000, &[0x01, 0, 0, 0, 0, 0, 0x07, 0x80, 0, 0x80]),
        simple(SegmentKind::End, 3_000, &[]),
        pcs(5_000, EPOCH_START, 1),
        simple(SegmentKind::Palette, 5_000, &[0x00, 0x00, 0x01, 0xeb, 0x80, 0x80, 0xff]),
        simple(SegmentKind::Object, 5_000, &[0x00, 0x02, 0x00, 0xc0, 0x00, 0x00, 0x04]),
        simple(SegmentKind::End, 7_000, &[]),
    ]
}

pub fn scenario_bytes() -> Vec<u8> {
    SegmentStream::from_segments(scenario_segments())
        .serialize()
        .unwrap()
        .to_vec()
}

/// A stream with compositions but nothing visible.
pub fn control_only_bytes() -> Vec<u8> {
    SegmentStream::from_segments(vec![
        pcs(1_000, EPOCH_START, 0),
        simple(SegmentKind::End, 1_000, &[]),
    ])
    .serialize()
    .unwrap()
    .to_vec()
}

/// Input directory `<root>/subs` with a reference track next to it.
pub struct Fixture {
    pub root: tempfile::TempDir,
    pub subs: PathBuf,
    pub reference: PathBuf,
}

impl Fixture {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        let subs = root.path().join("subs");
        std::fs::create_dir(&subs).unwrap();
        let reference = root.path().join("movie.flac");
        std::fs::write(&reference, b"fLaC").unwrap();
        Self {
            root,
            subs,
            reference,
        }
    }

    pub fn add(&self, name: &str, bytes: &[u8]) -> PathBuf {
        let path = self.subs.join(name);
        std::fs::write(&path, bytes).unwrap();
        path
    }

    pub fn claimed_reference(&self) -> PathBuf {
        self.reference.with_extension("mkv")
    }
}

/// Shifts every proxy entry by a fixed offset.
pub struct ShiftBackend {
    pub millis: u64,
    pub diagnostics: String,
    pub references: Mutex<Vec<PathBuf>>,
}

impl ShiftBackend {
    pub fn new(millis: u64) -> Self {
        Self {
            millis,
            diagnostics: String::new(),
            references: Mutex::new(Vec::new()),
        }
    }

    pub fn with_diagnostics(mut self, log: &str) -> Self {
        self.diagnostics = log.to_string();
        self
    }

    pub fn seen_references(&self) -> Vec<PathBuf> {
        self.references.lock().unwrap().clone()
    }
}

#[async_trait]
impl AlignmentBackend for ShiftBackend {
    fn name(&self) -> &str {
        "shift"
    }

    async fn align(&self, request: &AlignRequest) -> supsync_av::Result<AlignResponse> {
        self.references
            .lock()
            .unwrap()
            .push(request.reference.clone());

        let spans = read_srt(&request.proxy).await?;
        let shifted: Vec<TimeSpan> = spans
            .iter()
            .map(|s| {
                TimeSpan::new(
                    at(s.start.as_millis() + self.millis),
                    at(s.end.as_millis() + self.millis),
                )
            })
            .collect();
        write_srt(&request.output, &shifted).await?;

        Ok(AlignResponse {
            diagnostics: self.diagnostics.clone(),
        })
    }
}

/// Shifts like [`ShiftBackend`], but drops a file at `path` while aligning.
pub struct SquattingBackend {
    pub inner: ShiftBackend,
    pub path: PathBuf,
}

#[async_trait]
impl AlignmentBackend for SquattingBackend {
    fn name(&self) -> &str {
        "squatting"
    }

    async fn align(&self, request: &AlignRequest) -> supsync_av::Result<AlignResponse> {
        tokio::fs::write(&self.path, b"squatter").await?;
        self.inner.align(request).await
    }
}

/// Always fails, like an aligner that exits non-zero.
pub struct FailingBackend;

#[async_trait]
impl AlignmentBackend for FailingBackend {
    fn name(&self) -> &str {
        "failing"
    }

    async fn align(&self, _request: &AlignRequest) -> supsync_av::Result<AlignResponse> {
        Err(supsync_av::Error::tool_failed("failing", "exited with status 1"))
    }
}

pub fn file_name(path: &Path) -> String {
    path.file_name().unwrap().to_string_lossy().into_owned()
}
