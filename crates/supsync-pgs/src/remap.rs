//! Write re-aligned event timings back onto the segments they came from.

use supsync_common::TimeSpan;
use tracing::{debug, warn};

use crate::extract::Event;
use crate::framerate::FrameRateChange;
use crate::stream::SegmentStream;
use crate::Result;

/// What a remap changed.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct RemapOutcome {
    /// Events whose timing was written.
    pub mapped: usize,
    /// Events extracted from the stream.
    pub events: usize,
    /// Timings returned by the aligner.
    pub synced: usize,
    /// Segments whose timestamps actually changed.
    pub segments_changed: usize,
    /// Frame-rate rewrite, if one was applied.
    pub frame_rate: Option<FrameRateChange>,
}

impl RemapOutcome {
    /// Whether the event and synced counts disagreed.
    pub fn count_mismatch(&self) -> bool {
        self.events != self.synced
    }
}

/// Apply `synced` timings to `stream` positionally.
///
/// Event `i` takes `synced[i]`: its composition segment gets the new start,
/// and its end segment (the following composition, or the chosen end
/// segment) gets the new end. Only the overlapping prefix is mapped when the
/// counts differ. A `rate_factor` other than 1.0 triggers a single
/// frame-rate rewrite on the stream.
pub fn remap(
    stream: &mut SegmentStream,
    events: &[Event],
    synced: &[TimeSpan],
    rate_factor: Option<f64>,
) -> Result<RemapOutcome> {
    let mapped = events.len().min(synced.len());
    if events.len() != synced.len() {
        warn!(
            events = events.len(),
            synced = synced.len(),
            mapped,
            "Event count mismatch, remapping overlapping prefix only"
        );
    }

    let mut touched = Vec::with_capacity(mapped * 2);
    for (event, span) in events.iter().zip(synced) {
        if stream.set_timestamps(event.start_index, span.start)? {
            touched.push(event.start_index);
        }
        if stream.set_timestamps(event.end_index, span.end)? {
            touched.push(event.end_index);
        }
    }
    touched.sort_unstable();
    touched.dedup();

    let frame_rate = rate_factor.and_then(|factor| stream.reconcile_frame_rate(factor));

    debug!(
        mapped,
        segments_changed = touched.len(),
        rate_changed = frame_rate.is_some(),
        "Remapped stream timing"
    );

    Ok(RemapOutcome {
        mapped,
        events: events.len(),
        synced: synced.len(),
        segments_changed: touched.len(),
        frame_rate,
    })
}
