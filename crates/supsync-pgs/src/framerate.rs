//! Standard frame rates and their composition-segment codes.

use std::fmt;

/// A frame rate representable in the composition frame-rate byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
#[cfg_attr(feature = "serialize", serde(into = "f64"))]
pub enum FrameRate {
    /// 24000/1001
    Film,
    /// 24
    Fps24,
    /// 25
    Fps25,
    /// 30000/1001
    Ntsc,
    /// 50
    Fps50,
    /// 60000/1001
    NtscDouble,
}

impl FrameRate {
    /// All standard rates, ascending.
    pub const ALL: [FrameRate; 6] = [
        FrameRate::Film,
        FrameRate::Fps24,
        FrameRate::Fps25,
        FrameRate::Ntsc,
        FrameRate::Fps50,
        FrameRate::NtscDouble,
    ];

    /// Decode a frame-rate byte.
    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|rate| rate.code() == code)
    }

    /// The frame-rate byte for this rate.
    pub fn code(self) -> u8 {
        match self {
            Self::Film => 0x10,
            Self::Fps24 => 0x20,
            Self::Fps25 => 0x30,
            Self::Ntsc => 0x40,
            Self::Fps50 => 0x60,
            Self::NtscDouble => 0x70,
        }
    }

    /// Frames per second.
    pub fn fps(self) -> f64 {
        match self {
            Self::Film => 23.976,
            Self::Fps24 => 24.0,
            Self::Fps25 => 25.0,
            Self::Ntsc => 29.97,
            Self::Fps50 => 50.0,
            Self::NtscDouble => 59.94,
        }
    }

    /// Snap an arbitrary rate to the closest standard rate.
    ///
    /// Ties resolve to the lower rate. Returns `None` for non-finite input.
    ///
    /// ```
    /// use supsync_pgs::FrameRate;
    ///
    /// assert_eq!(FrameRate::nearest(25.02), Some(FrameRate::Fps25));
    /// assert_eq!(FrameRate::nearest(23.9), Some(FrameRate::Film));
    /// ```
    pub fn nearest(fps: f64) -> Option<Self> {
        if !fps.is_finite() {
            return None;
        }
        Self::ALL.into_iter().min_by(|a, b| {
            let da = (a.fps() - fps).abs();
            let db = (b.fps() - fps).abs();
            da.total_cmp(&db)
        })
    }
}

impl From<FrameRate> for f64 {
    fn from(rate: FrameRate) -> f64 {
        rate.fps()
    }
}

/// A frame-rate rewrite applied to a stream.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct FrameRateChange {
    /// Rate coded before the rewrite.
    pub from: FrameRate,
    /// Rate written.
    pub to: FrameRate,
    /// Scale factor the rewrite was derived from.
    pub factor: f64,
    /// Index of the composition segment that was rewritten.
    pub segment: usize,
}

impl fmt::Display for FrameRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fps24 | Self::Fps25 | Self::Fps50 => write!(f, "{:.0}", self.fps()),
            _ => write!(f, "{}", self.fps()),
        }
    }
}
