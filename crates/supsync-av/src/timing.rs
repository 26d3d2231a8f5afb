//! SubRip proxy timing files.
//!
//! The aligner only understands text subtitles, so each display event is
//! written as a SubRip entry carrying a placeholder line. The aligner's output
//! is read back positionally; entry numbers and text are ignored.

use std::fmt::Write as _;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use supsync_common::{TimeSpan, Timestamp};

use crate::{Error, Result};

/// Text written for every proxy entry.
pub const PLACEHOLDER: &str = "DUMMY";

/// Render spans as a SubRip document.
///
/// ```
/// use supsync_av::timing::render_srt;
/// use supsync_common::{TimeSpan, Timestamp};
///
/// let span = TimeSpan::new(Timestamp::from_millis(1_000), Timestamp::from_millis(2_500));
/// assert_eq!(
///     render_srt(&[span]),
///     "1\n00:00:01,000 --> 00:00:02,500\nDUMMY\n\n"
/// );
/// ```
pub fn render_srt(spans: &[TimeSpan]) -> String {
    let mut out = String::with_capacity(spans.len() * 48);
    for (i, span) in spans.iter().enumerate() {
        // Writing to a String cannot fail
        let _ = write!(
            out,
            "{}\n{} --> {}\n{}\n\n",
            i + 1,
            span.start.format_clock(','),
            span.end.format_clock(','),
            PLACEHOLDER
        );
    }
    out
}

static TIMING_LINE: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r"^\s*(\d{2}:\d{2}:\d{2},\d{3})\s*-->\s*(\d{2}:\d{2}:\d{2},\d{3})\s*$").ok()
});

/// Parse the timing lines of a SubRip document, in file order.
///
/// Any line that is not a timing line is ignored, which also skips entry
/// numbers, text, and a byte-order mark.
pub fn parse_srt(text: &str) -> Result<Vec<TimeSpan>> {
    let re = TIMING_LINE
        .as_ref()
        .ok_or_else(|| Error::InvalidInput("timing pattern failed to compile".into()))?;
    let mut spans = Vec::new();

    for line in text.lines() {
        if let Some(caps) = re.captures(line) {
            let start = Timestamp::parse_clock(&caps[1])?;
            let end = Timestamp::parse_clock(&caps[2])?;
            spans.push(TimeSpan::new(start, end));
        }
    }

    Ok(spans)
}

/// Write a proxy timing file.
pub async fn write_srt(path: &Path, spans: &[TimeSpan]) -> Result<()> {
    tokio::fs::write(path, render_srt(spans)).await?;
    Ok(())
}

/// Read a timing file written by the aligner.
pub async fn read_srt(path: &Path) -> Result<Vec<TimeSpan>> {
    let bytes = tokio::fs::read(path).await?;
    parse_srt(&String::from_utf8_lossy(&bytes))
}
