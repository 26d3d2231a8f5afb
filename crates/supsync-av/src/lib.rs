//! # supsync-av
//!
//! Bridge between display events and an external time-alignment tool.
//!
//! This crate provides functionality for:
//! - Writing display spans as a SubRip proxy file and reading aligned spans back
//! - Running the aligner (`ffsubsync` by default) with a timeout
//! - Scanning aligner diagnostics for a frame-rate scale factor
//! - Laying out and cleaning up the batch working directories
//!
//! ## Example
//!
//! ```no_run
//! use std::path::Path;
//! use supsync_av::{align, FfsubsyncBackend};
//! use supsync_common::{TimeSpan, Timestamp};
//!
//! # async fn example() -> supsync_av::Result<()> {
//! let spans = [TimeSpan::new(Timestamp::from_millis(1_000), Timestamp::from_millis(2_000))];
//! let outcome = align(
//!     &spans,
//!     Path::new("reference.mkv"),
//!     Path::new("dummy_srt/movie.srt"),
//!     Path::new("synced_srt/movie.srt"),
//!     &FfsubsyncBackend::default(),
//! )
//! .await?;
//! println!("rate factor: {:?}", outcome.rate_factor);
//! # Ok(())
//! # }
//! ```

pub mod align;
pub mod command;
mod error;
pub mod timing;
pub mod tools;
pub mod workspace;

// Re-exports
pub use align::{
    align, filter_progress, parse_rate_factor, AlignOutcome, AlignRequest, AlignResponse,
    AlignmentBackend, FfsubsyncBackend,
};
pub use command::{ToolCommand, ToolOutput};
pub use error::{Error, Result};
pub use tools::{check_tool, get_tool_path, require_tool, ToolInfo};
pub use workspace::BatchWorkspace;
