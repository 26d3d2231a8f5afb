//! Display event extraction.
//!
//! Every composition segment is a candidate event start. Its end is resolved
//! by trying [`EndRule::PRIORITY`] in order; the first rule that yields a
//! segment wins. Candidates with no resolvable end, or with no palette or
//! object segment between start and end, are dropped.

use std::fmt;

use supsync_common::{TimeSpan, Timestamp};
use tracing::{debug, trace};

use crate::segment::{Segment, SegmentKind};

/// A visible display interval and the segments it is anchored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct Event {
    pub start: Timestamp,
    pub end: Timestamp,
    /// Index of the composition segment that starts the event.
    pub start_index: usize,
    /// Index of the segment whose timestamp ends the event.
    pub end_index: usize,
    /// Whether the end is the next composition rather than an end segment.
    pub end_is_next_composition: bool,
    /// Rule that resolved the end.
    pub rule: EndRule,
}

impl Event {
    pub fn span(&self) -> TimeSpan {
        TimeSpan::new(self.start, self.end)
    }
}

/// Ways of resolving where an event ends, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
#[cfg_attr(feature = "serialize", serde(rename_all = "snake_case"))]
pub enum EndRule {
    /// Last end segment before the next composition, at or after the start.
    QualifyingEpochEnd,
    /// The next composition segment.
    NextComposition,
    /// First end segment anywhere after the start.
    LaterEpochEnd,
    /// First segment of any kind after the start.
    LaterTimestamp,
}

/// Where an event ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndChoice {
    pub index: usize,
    pub time: Timestamp,
    pub rule: EndRule,
}

/// Inputs shared by every end rule for one candidate.
#[derive(Debug, Clone, Copy)]
pub struct EndContext<'a> {
    pub segments: &'a [Segment],
    /// Index of the composition segment.
    pub start_index: usize,
    pub start_time: Timestamp,
    /// Index of the following composition segment, if any.
    pub next_composition: Option<usize>,
}

impl<'a> EndContext<'a> {
    /// Build the context for the composition at `start_index`.
    pub fn new(segments: &'a [Segment], start_index: usize) -> Self {
        let next_composition = segments
            .iter()
            .enumerate()
            .skip(start_index + 1)
            .find(|(_, s)| s.kind == SegmentKind::Composition)
            .map(|(i, _)| i);

        Self {
            segments,
            start_index,
            start_time: segments[start_index].pts,
            next_composition,
        }
    }

    /// Segments strictly after the start, with their indices.
    fn after_start(&self) -> impl Iterator<Item = (usize, &'a Segment)> + 'a {
        self.segments.iter().enumerate().skip(self.start_index + 1)
    }
}

impl EndRule {
    /// Rules in the order they are tried.
    pub const PRIORITY: [EndRule; 4] = [
        EndRule::QualifyingEpochEnd,
        EndRule::NextComposition,
        EndRule::LaterEpochEnd,
        EndRule::LaterTimestamp,
    ];

    /// Apply this rule alone.
    pub fn resolve(self, ctx: &EndContext<'_>) -> Option<EndChoice> {
        let found = match self {
            Self::QualifyingEpochEnd => {
                let window_end = ctx.next_composition.unwrap_or(ctx.segments.len());
                ctx.segments[ctx.start_index + 1..window_end]
                    .iter()
                    .enumerate()
                    .rev()
                    .map(|(i, s)| (ctx.start_index + 1 + i, s))
                    .find(|(_, s)| s.kind == SegmentKind::End && s.pts >= ctx.start_time)
            }
            Self::NextComposition => ctx.next_composition.map(|i| (i, &ctx.segments[i])),
            Self::LaterEpochEnd => ctx.after_start().find(|(_, s)| s.kind == SegmentKind::End),
            Self::LaterTimestamp => ctx.after_start().next(),
        };

        found.map(|(index, seg)| EndChoice {
            index,
            time: seg.pts,
            rule: self,
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::QualifyingEpochEnd => "epoch-end",
            Self::NextComposition => "next-composition",
            Self::LaterEpochEnd => "later-epoch-end",
            Self::LaterTimestamp => "later-timestamp",
        }
    }
}

impl fmt::Display for EndRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolve the end of the candidate described by `ctx`.
pub fn resolve_end(ctx: &EndContext<'_>) -> Option<EndChoice> {
    EndRule::PRIORITY.iter().find_map(|rule| rule.resolve(ctx))
}

/// Derive display events from a segment sequence.
///
/// Deterministic: the same segments always give the same events.
pub fn extract(segments: &[Segment]) -> Vec<Event> {
    let mut events = Vec::new();

    for (start_index, seg) in segments.iter().enumerate() {
        if seg.kind != SegmentKind::Composition {
            continue;
        }

        let ctx = EndContext::new(segments, start_index);
        let Some(choice) = resolve_end(&ctx) else {
            trace!(index = start_index, "No end found for composition");
            continue;
        };

        let has_image = segments[start_index..=choice.index]
            .iter()
            .any(|s| s.kind.is_image());
        if !has_image {
            trace!(index = start_index, "Skipping control-only display set");
            continue;
        }

        events.push(Event {
            start: ctx.start_time,
            end: choice.time.max(ctx.start_time),
            start_index,
            end_index: choice.index,
            end_is_next_composition: choice.rule == EndRule::NextComposition,
            rule: choice.rule,
        });
    }

    debug!(segments = segments.len(), events = events.len(), "Extracted events");
    events
}
