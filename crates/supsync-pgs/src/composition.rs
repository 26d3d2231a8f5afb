//! Presentation composition segment (PCS) payload.

use bytes::Buf;

/// Payload offset of the frame-rate byte.
pub const FRAME_RATE_OFFSET: usize = 4;

/// Fixed part of a composition payload, before the composition objects.
pub const COMPOSITION_FIXED_LEN: usize = 11;

/// Composition state of a display set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum CompositionState {
    /// Update of the current epoch.
    Normal,
    /// Refresh point, carries everything needed to display.
    AcquisitionPoint,
    /// Start of a new epoch.
    EpochStart,
    /// Unrecognised state byte.
    Other(u8),
}

impl CompositionState {
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            0x00 => Self::Normal,
            0x40 => Self::AcquisitionPoint,
            0x80 => Self::EpochStart,
            other => Self::Other(other),
        }
    }
}

/// Decoded fixed fields of a composition payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct CompositionInfo {
    pub width: u16,
    pub height: u16,
    pub frame_rate_code: u8,
    pub number: u16,
    pub state: CompositionState,
    pub palette_update: bool,
    pub palette_id: u8,
    pub object_count: u8,
}

impl CompositionInfo {
    /// Decode the fixed fields. Returns `None` if the payload is too short.
    pub fn parse(mut buf: &[u8]) -> Option<Self> {
        if buf.len() < COMPOSITION_FIXED_LEN {
            return None;
        }

        Some(Self {
            width: buf.get_u16(),
            height: buf.get_u16(),
            frame_rate_code: buf.get_u8(),
            number: buf.get_u16(),
            state: CompositionState::from_byte(buf.get_u8()),
            palette_update: buf.get_u8() == 0x80,
            palette_id: buf.get_u8(),
            object_count: buf.get_u8(),
        })
    }
}
