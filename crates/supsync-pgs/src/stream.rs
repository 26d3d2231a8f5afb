//! Lossless segment stream: parse, inspect, mutate timing, serialize.
//!
//! A [`SegmentStream`] keeps the original input buffer alongside the parsed
//! segments. Bytes that do not belong to any segment (leading garbage,
//! resynchronisation skips, a truncated tail) are never copied out; they are
//! re-emitted from the source buffer using segment offsets, so an unmutated
//! stream serializes back to exactly the input.

use bytes::{Bytes, BytesMut};
use supsync_common::Timestamp;
use tracing::{debug, trace, warn};

use crate::framerate::{FrameRate, FrameRateChange};
use crate::segment::{Segment, SegmentHeader, SegmentKind, HEADER_LEN, MAGIC};
use crate::{Error, Result};

/// Parsed PGS stream.
#[derive(Debug, Clone)]
pub struct SegmentStream {
    source: Bytes,
    segments: Vec<Segment>,
    rate_applied: bool,
}

/// One line of [`SegmentStream::describe`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct SegmentSummary {
    pub index: usize,
    pub kind: SegmentKind,
    pub pts: Timestamp,
    pub dts: Timestamp,
    pub offset: usize,
    pub payload_len: usize,
    #[cfg_attr(feature = "serialize", serde(skip_serializing_if = "Option::is_none"))]
    pub frame_rate: Option<FrameRate>,
}

impl SegmentStream {
    /// Parse a PGS byte stream.
    ///
    /// On a magic mismatch, or a declared size that runs past the end of the
    /// data, the parser scans forward for the next plausible header instead
    /// of failing. An oversized segment with no valid header after it is a
    /// truncated tail and is left unparsed. Fails only when non-empty input
    /// yields no segments.
    pub fn parse(data: impl Into<Bytes>) -> Result<Self> {
        let source: Bytes = data.into();
        let mut segments = Vec::new();
        let mut pos = 0usize;
        let mut skipped = 0usize;

        while source.len() - pos >= HEADER_LEN {
            match SegmentHeader::decode(&source[pos..])? {
                Some(header) => {
                    let end = pos + header.segment_len();
                    if end > source.len() {
                        match find_resync(&source, pos + 1) {
                            Some(next) => {
                                warn!(
                                    offset = pos,
                                    declared = header.payload_len,
                                    resumed = next,
                                    "Segment size runs past end of data, skipping to next header"
                                );
                                skipped += next - pos;
                                pos = next;
                                continue;
                            }
                            None => {
                                debug!(
                                    offset = pos,
                                    declared = header.payload_len,
                                    "Truncated trailing segment kept as raw bytes"
                                );
                                break;
                            }
                        }
                    }
                    let payload = source.slice(pos + HEADER_LEN..end);
                    trace!(offset = pos, kind = %header.kind, "Parsed segment");
                    segments.push(Segment::from_header(header, payload, pos));
                    pos = end;
                }
                None => match find_resync(&source, pos + 1) {
                    Some(next) => {
                        skipped += next - pos;
                        debug!(from = pos, to = next, "Resynchronised after bad magic");
                        pos = next;
                    }
                    None => {
                        skipped += source.len() - pos;
                        break;
                    }
                },
            }
        }

        if segments.is_empty() && !source.is_empty() {
            return Err(Error::NoSegments { len: source.len() });
        }
        if skipped > 0 {
            warn!(bytes = skipped, "Skipped non-segment bytes while parsing");
        }

        Ok(Self {
            source,
            segments,
            rate_applied: false,
        })
    }

    /// Build a stream from detached segments laid out back to back.
    pub fn from_segments(segments: Vec<Segment>) -> Self {
        let mut offset = 0;
        let segments = segments
            .into_iter()
            .map(|mut seg| {
                seg.offset = offset;
                seg.source_len = seg.encoded_len();
                offset += seg.source_len;
                seg
            })
            .collect();

        Self {
            source: Bytes::new(),
            segments,
            rate_applied: false,
        }
    }

    /// Serialize back to bytes, re-emitting every gap from the source.
    pub fn serialize(&self) -> Result<Bytes> {
        let mut out = BytesMut::with_capacity(self.source.len().max(self.encoded_len()));
        let mut cursor = 0usize;

        for seg in &self.segments {
            if seg.offset > cursor {
                if let Some(gap) = self.source.get(cursor..seg.offset) {
                    out.extend_from_slice(gap);
                }
            }
            seg.write_to(&mut out)?;
            cursor = seg.offset + seg.source_len;
        }

        if let Some(tail) = self.source.get(cursor..) {
            out.extend_from_slice(tail);
        }

        Ok(out.freeze())
    }

    /// All segments in source order.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Segment at `index`.
    pub fn get(&self, index: usize) -> Option<&Segment> {
        self.segments.get(index)
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Length of the parsed input.
    pub fn source_len(&self) -> usize {
        self.source.len()
    }

    /// Total number of bytes that are not part of any segment.
    pub fn gap_len(&self) -> usize {
        let covered: usize = self.segments.iter().map(|s| s.source_len).sum();
        self.source.len().saturating_sub(covered)
    }

    fn encoded_len(&self) -> usize {
        self.segments.iter().map(Segment::encoded_len).sum()
    }

    /// Set PTS and DTS of one segment. Returns whether anything changed.
    pub fn set_timestamps(&mut self, index: usize, ts: Timestamp) -> Result<bool> {
        let len = self.segments.len();
        let seg = self
            .segments
            .get_mut(index)
            .ok_or_else(|| Error::invalid_index(index, len))?;
        Ok(seg.set_timestamps(ts))
    }

    /// Index of the first composition segment.
    pub fn first_composition(&self) -> Option<usize> {
        self.segments
            .iter()
            .position(|s| s.kind == SegmentKind::Composition)
    }

    /// Frame rate coded in the first composition segment.
    pub fn nominal_frame_rate(&self) -> Option<FrameRate> {
        self.first_composition()
            .and_then(|i| self.segments[i].frame_rate())
    }

    /// Whether a frame-rate correction has already been written.
    pub fn rate_applied(&self) -> bool {
        self.rate_applied
    }

    /// Rewrite the nominal frame rate as `original / factor`, snapped to the
    /// nearest standard rate.
    ///
    /// Writes into the first composition segment only, and at most once per
    /// stream: later calls return `None` without touching anything. A factor
    /// of exactly 1.0 is a no-op and does not consume the single write.
    pub fn reconcile_frame_rate(&mut self, factor: f64) -> Option<FrameRateChange> {
        if self.rate_applied {
            debug!(factor, "Frame rate already reconciled for this stream");
            return None;
        }
        if !factor.is_finite() || factor <= 0.0 {
            warn!(factor, "Ignoring invalid frame rate factor");
            return None;
        }
        if factor == 1.0 {
            return None;
        }

        let Some(index) = self.first_composition() else {
            warn!("No composition segment to carry a frame rate");
            return None;
        };
        let Some(from) = self.segments[index].frame_rate() else {
            warn!(index, "Unknown frame rate code in first composition segment");
            return None;
        };

        let corrected = from.fps() / factor;
        let to = FrameRate::nearest(corrected)?;

        self.rate_applied = true;
        self.segments[index].set_frame_rate(to);
        debug!(%from, %to, factor, corrected, "Frame rate reconciled");

        Some(FrameRateChange {
            from,
            to,
            factor,
            segment: index,
        })
    }

    /// Per-segment summary for display.
    pub fn describe(&self) -> Vec<SegmentSummary> {
        self.segments
            .iter()
            .enumerate()
            .map(|(index, seg)| SegmentSummary {
                index,
                kind: seg.kind,
                pts: seg.pts,
                dts: seg.dts,
                offset: seg.offset,
                payload_len: seg.payload.len(),
                frame_rate: seg.frame_rate(),
            })
            .collect()
    }
}

/// Find the next offset at or after `from` that looks like a segment header.
fn find_resync(data: &[u8], from: usize) -> Option<usize> {
    let last = data.len().checked_sub(HEADER_LEN)?;
    (from..=last).find(|&pos| {
        let window = &data[pos..];
        if window[..2] != MAGIC || !SegmentKind::from_byte(window[10]).is_known() {
            return false;
        }
        let size = u16::from_be_bytes([window[11], window[12]]) as usize;
        pos + HEADER_LEN + size <= data.len()
    })
}
