//! Supsync-PGS: lossless PGS (.sup) parsing, event extraction, and retiming
//!
//! This crate owns everything that touches the binary subtitle stream. It
//! never decodes images; it only reads segment structure and rewrites timing
//! metadata (plus one frame-rate byte).
//!
//! # Modules
//!
//! - `segment` - Segment header coding and segment kinds
//! - `stream` - Parsed stream with byte-exact serialization
//! - `composition` - Composition (PCS) payload fields
//! - `epoch` - Display set and epoch grouping
//! - `extract` - Display event derivation with a prioritized end-rule list
//! - `remap` - Positional write-back of aligned timings
//! - `framerate` - Standard frame rates and their codes
//!
//! # Flow
//!
//! 1. [`SegmentStream::parse`] the input bytes
//! 2. [`extract`] display events from the segments
//! 3. Align the events externally
//! 4. [`remap`] the aligned timings onto the stream
//! 5. [`SegmentStream::serialize`] the result; untouched bytes are identical

pub mod composition;
pub mod epoch;
pub mod error;
pub mod extract;
pub mod framerate;
pub mod remap;
pub mod segment;
pub mod stream;

#[cfg(test)]
pub(crate) mod test_support;

pub use composition::{CompositionInfo, CompositionState};
pub use epoch::{DisplaySet, Epoch};
pub use error::{Error, Result};
pub use extract::{extract, EndChoice, EndContext, EndRule, Event};
pub use framerate::{FrameRate, FrameRateChange};
pub use remap::{remap, RemapOutcome};
pub use segment::{Segment, SegmentKind};
pub use stream::{SegmentStream, SegmentSummary};
