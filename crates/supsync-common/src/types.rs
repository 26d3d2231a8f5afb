//! Core timing types shared by the segment store and the alignment bridge.
//!
//! PGS timestamps are 32-bit counts of a 90 kHz clock. Text timing formats
//! work in milliseconds, so conversions between the two live here.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{Error, Result};

/// Ticks of the presentation clock per second.
pub const TICKS_PER_SECOND: u32 = 90_000;

/// Ticks of the presentation clock per millisecond.
pub const TICKS_PER_MILLI: u32 = 90;

/// A point on the 90 kHz presentation clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(u32);

impl Timestamp {
    /// The zero timestamp.
    pub const ZERO: Self = Self(0);

    /// Create a timestamp from raw 90 kHz ticks.
    pub const fn from_ticks(ticks: u32) -> Self {
        Self(ticks)
    }

    /// Raw 90 kHz ticks.
    pub const fn ticks(self) -> u32 {
        self.0
    }

    /// Create a timestamp from milliseconds, saturating at the clock's range.
    pub fn from_millis(millis: u64) -> Self {
        let ticks = millis.saturating_mul(TICKS_PER_MILLI as u64);
        Self(u32::try_from(ticks).unwrap_or(u32::MAX))
    }

    /// Whole milliseconds, rounded down.
    pub fn as_millis(self) -> u64 {
        (self.0 / TICKS_PER_MILLI) as u64
    }

    /// Seconds as a float.
    pub fn as_secs_f64(self) -> f64 {
        self.0 as f64 / TICKS_PER_SECOND as f64
    }

    /// Format as `HH:MM:SS<sep>mmm`.
    ///
    /// ```
    /// use supsync_common::Timestamp;
    ///
    /// let ts = Timestamp::from_millis(3_723_004);
    /// assert_eq!(ts.format_clock(','), "01:02:03,004");
    /// ```
    pub fn format_clock(self, separator: char) -> String {
        let total_ms = self.as_millis();
        let hours = total_ms / 3_600_000;
        let minutes = (total_ms % 3_600_000) / 60_000;
        let seconds = (total_ms % 60_000) / 1_000;
        let millis = total_ms % 1_000;
        format!("{hours:02}:{minutes:02}:{seconds:02}{separator}{millis:03}")
    }

    /// Parse `HH:MM:SS,mmm` (a `.` separator is accepted as well).
    pub fn parse_clock(s: &str) -> Result<Self> {
        let invalid = || Error::invalid_timestamp(s);
        let trimmed = s.trim();

        let mut parts = trimmed.split(':');
        let (Some(h), Some(m), Some(rest), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid());
        };

        let (sec, ms) = rest.split_once([',', '.']).ok_or_else(invalid)?;
        if ms.len() != 3 {
            return Err(invalid());
        }

        let parse = |v: &str| -> Result<u64> {
            if v.is_empty() || !v.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            v.parse::<u64>().map_err(|_| invalid())
        };

        let (hours, minutes, seconds, millis) = (parse(h)?, parse(m)?, parse(sec)?, parse(ms)?);
        if minutes >= 60 || seconds >= 60 {
            return Err(invalid());
        }

        let total = ((hours * 3600 + minutes * 60 + seconds) * 1000).saturating_add(millis);
        Ok(Self::from_millis(total))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_clock('.'))
    }
}

/// A display interval on the presentation clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeSpan {
    /// Start of the interval.
    pub start: Timestamp,
    /// End of the interval.
    pub end: Timestamp,
}

impl TimeSpan {
    /// Create a new span.
    pub fn new(start: Timestamp, end: Timestamp) -> Self {
        Self { start, end }
    }

    /// Length of the span; zero when the end precedes the start.
    pub fn duration(&self) -> Timestamp {
        Timestamp::from_ticks(self.end.ticks().saturating_sub(self.start.ticks()))
    }

    /// Whether `start <= end`.
    pub fn is_ordered(&self) -> bool {
        self.start <= self.end
    }
}

impl fmt::Display for TimeSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} --> {}", self.start, self.end)
    }
}
