//! Display set and epoch grouping.
//!
//! A display set runs from a composition segment up to and including the
//! next end segment, or up to the next composition if no end segment comes
//! first. Display sets whose composition state is "epoch start" open a new
//! epoch; every other set belongs to the epoch before it.

use std::ops::Range;

use supsync_common::Timestamp;

use crate::composition::CompositionState;
use crate::segment::{Segment, SegmentKind};

/// One composition and the segments that follow it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplaySet {
    /// Segment index range, starting at the composition segment.
    pub range: Range<usize>,
    /// Composition state, when the payload could be decoded.
    pub state: Option<CompositionState>,
    /// Index of the terminating end segment, if any.
    pub end: Option<usize>,
}

impl DisplaySet {
    /// Index of the composition segment.
    pub fn composition(&self) -> usize {
        self.range.start
    }

    /// Whether any palette or object segment belongs to this set.
    pub fn has_image(&self, segments: &[Segment]) -> bool {
        segments[self.range.clone()].iter().any(|s| s.kind.is_image())
    }
}

/// A run of display sets sharing one epoch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Epoch {
    pub display_sets: Vec<DisplaySet>,
}

impl Epoch {
    /// Segment index range spanned by the epoch.
    pub fn range(&self) -> Range<usize> {
        match (self.display_sets.first(), self.display_sets.last()) {
            (Some(first), Some(last)) => first.range.start..last.range.end,
            _ => 0..0,
        }
    }

    /// Earliest presentation timestamp of any segment in the epoch.
    pub fn earliest_timestamp(&self, segments: &[Segment]) -> Option<Timestamp> {
        segments.get(self.range())?.iter().map(|s| s.pts).min()
    }
}

/// Split segments into display sets. Segments before the first composition
/// belong to no set.
pub fn display_sets(segments: &[Segment]) -> Vec<DisplaySet> {
    let mut sets = Vec::new();
    let mut current: Option<DisplaySet> = None;

    for (index, seg) in segments.iter().enumerate() {
        match seg.kind {
            SegmentKind::Composition => {
                if let Some(set) = current.take() {
                    sets.push(set);
                }
                current = Some(DisplaySet {
                    range: index..index + 1,
                    state: seg.composition().map(|c| c.state),
                    end: None,
                });
            }
            kind => {
                if let Some(set) = current.as_mut() {
                    set.range.end = index + 1;
                    if kind == SegmentKind::End {
                        set.end = Some(index);
                        sets.extend(current.take());
                    }
                }
            }
        }
    }

    sets.extend(current);
    sets
}

/// Group display sets into epochs.
pub fn epochs(segments: &[Segment]) -> Vec<Epoch> {
    let mut epochs: Vec<Epoch> = Vec::new();

    for set in display_sets(segments) {
        let opens = set.state == Some(CompositionState::EpochStart);
        match epochs.last_mut() {
            Some(epoch) if !opens => epoch.display_sets.push(set),
            _ => epochs.push(Epoch {
                display_sets: vec![set],
            }),
        }
    }

    epochs
}
