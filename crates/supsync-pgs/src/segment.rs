//! PGS segment definitions and header coding.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use supsync_common::Timestamp;

use crate::composition::{CompositionInfo, FRAME_RATE_OFFSET};
use crate::{Error, FrameRate, Result};

/// Segment magic marker (`"PG"`).
pub const MAGIC: [u8; 2] = *b"PG";

/// Size of the fixed segment header.
pub const HEADER_LEN: usize = 13;

/// Segment type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum SegmentKind {
    /// Palette definition (PDS).
    Palette,
    /// Object definition (ODS).
    Object,
    /// Presentation composition (PCS).
    Composition,
    /// Window definition (WDS).
    Window,
    /// End of display set (END).
    End,
    /// Any other type byte, kept so the stream round-trips.
    Unknown(u8),
}

impl SegmentKind {
    pub const PDS: u8 = 0x14;
    pub const ODS: u8 = 0x15;
    pub const PCS: u8 = 0x16;
    pub const WDS: u8 = 0x17;
    pub const END: u8 = 0x80;

    /// Decode a type byte.
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            Self::PDS => Self::Palette,
            Self::ODS => Self::Object,
            Self::PCS => Self::Composition,
            Self::WDS => Self::Window,
            Self::END => Self::End,
            other => Self::Unknown(other),
        }
    }

    /// Encode as a type byte.
    pub fn as_byte(self) -> u8 {
        match self {
            Self::Palette => Self::PDS,
            Self::Object => Self::ODS,
            Self::Composition => Self::PCS,
            Self::Window => Self::WDS,
            Self::End => Self::END,
            Self::Unknown(byte) => byte,
        }
    }

    /// Whether the type byte is one of the five defined kinds.
    pub fn is_known(self) -> bool {
        !matches!(self, Self::Unknown(_))
    }

    /// Palette and object segments carry the visible part of a display set.
    pub fn is_image(self) -> bool {
        matches!(self, Self::Palette | Self::Object)
    }

    /// Short name as used in PGS documentation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Palette => "PDS",
            Self::Object => "ODS",
            Self::Composition => "PCS",
            Self::Window => "WDS",
            Self::End => "END",
            Self::Unknown(_) => "???",
        }
    }
}

impl std::fmt::Display for SegmentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unknown(byte) => write!(f, "0x{byte:02x}"),
            other => f.write_str(other.as_str()),
        }
    }
}

/// Parsed fixed-size segment header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentHeader {
    pub pts: Timestamp,
    pub dts: Timestamp,
    pub kind: SegmentKind,
    pub payload_len: usize,
}

impl SegmentHeader {
    /// Decode a header. Returns `None` if the magic marker does not match.
    pub fn decode(mut buf: &[u8]) -> Result<Option<Self>> {
        if buf.len() < HEADER_LEN {
            return Err(Error::BufferUnderflow {
                need: HEADER_LEN,
                have: buf.len(),
            });
        }
        if buf[..2] != MAGIC {
            return Ok(None);
        }
        buf.advance(2);

        let pts = Timestamp::from_ticks(buf.get_u32());
        let dts = Timestamp::from_ticks(buf.get_u32());
        let kind = SegmentKind::from_byte(buf.get_u8());
        let payload_len = buf.get_u16() as usize;

        Ok(Some(Self {
            pts,
            dts,
            kind,
            payload_len,
        }))
    }

    /// Total encoded length (header + payload).
    pub fn segment_len(&self) -> usize {
        HEADER_LEN + self.payload_len
    }
}

/// A single segment of a PGS stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// Segment type.
    pub kind: SegmentKind,
    /// Presentation timestamp.
    pub pts: Timestamp,
    /// Decode timestamp.
    pub dts: Timestamp,
    /// Raw payload bytes.
    pub payload: Bytes,
    /// Byte offset of the header in the source stream.
    pub offset: usize,
    /// Length this segment occupied in the source stream.
    pub(crate) source_len: usize,
}

impl Segment {
    /// Create a detached segment (offset 0).
    pub fn new(kind: SegmentKind, pts: Timestamp, dts: Timestamp, payload: impl Into<Bytes>) -> Self {
        let payload = payload.into();
        let source_len = HEADER_LEN + payload.len();
        Self {
            kind,
            pts,
            dts,
            payload,
            offset: 0,
            source_len,
        }
    }

    pub(crate) fn from_header(header: SegmentHeader, payload: Bytes, offset: usize) -> Self {
        Self {
            kind: header.kind,
            pts: header.pts,
            dts: header.dts,
            payload,
            offset,
            source_len: header.segment_len(),
        }
    }

    /// Encoded length with the current payload.
    pub fn encoded_len(&self) -> usize {
        HEADER_LEN + self.payload.len()
    }

    /// Write header and payload. The size field is derived from the payload.
    pub fn write_to(&self, out: &mut BytesMut) -> Result<()> {
        let size = u16::try_from(self.payload.len()).map_err(|_| Error::PayloadTooLarge {
            len: self.payload.len(),
        })?;

        out.reserve(self.encoded_len());
        out.put_slice(&MAGIC);
        out.put_u32(self.pts.ticks());
        out.put_u32(self.dts.ticks());
        out.put_u8(self.kind.as_byte());
        out.put_u16(size);
        out.put_slice(&self.payload);
        Ok(())
    }

    /// Encode into a standalone buffer.
    pub fn to_bytes(&self) -> Result<Bytes> {
        let mut out = BytesMut::with_capacity(self.encoded_len());
        self.write_to(&mut out)?;
        Ok(out.freeze())
    }

    /// Set both timestamps. Returns whether anything changed.
    pub fn set_timestamps(&mut self, ts: Timestamp) -> bool {
        let changed = self.pts != ts || self.dts != ts;
        self.pts = ts;
        self.dts = ts;
        changed
    }

    /// Composition fields, for PCS segments with a well-formed payload.
    pub fn composition(&self) -> Option<CompositionInfo> {
        if self.kind != SegmentKind::Composition {
            return None;
        }
        CompositionInfo::parse(&self.payload)
    }

    /// Frame rate coded in a composition segment.
    pub fn frame_rate(&self) -> Option<FrameRate> {
        self.composition()
            .and_then(|c| FrameRate::from_code(c.frame_rate_code))
    }

    /// Overwrite the frame-rate byte of a composition segment.
    ///
    /// Only that single payload byte changes. Callers check
    /// [`Segment::frame_rate`] first, which guarantees the byte exists.
    pub(crate) fn set_frame_rate(&mut self, rate: FrameRate) {
        if self.kind != SegmentKind::Composition || self.payload.len() <= FRAME_RATE_OFFSET {
            return;
        }
        let mut payload = BytesMut::from(&self.payload[..]);
        payload[FRAME_RATE_OFFSET] = rate.code();
        self.payload = payload.freeze();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(ms: u64) -> Timestamp {
        Timestamp::from_millis(ms)
    }

    #[test]
    fn test_kind_byte_round_trip() {
        for byte in [0x14u8, 0x15, 0x16, 0x17, 0x80, 0x42] {
            assert_eq!(SegmentKind::from_byte(byte).as_byte(), byte);
        }
        assert_eq!(SegmentKind::from_byte(0x16), SegmentKind::Composition);
        assert!(!SegmentKind::from_byte(0x42).is_known());
    }

    #[test]
    fn test_is_image() {
        assert!(SegmentKind::Palette.is_image());
        assert!(SegmentKind::Object.is_image());
        assert!(!SegmentKind::Composition.is_image());
        assert!(!SegmentKind::Window.is_image());
        assert!(!SegmentKind::End.is_image());
    }

    #[test]
    fn test_header_decode() {
        let bytes = [
            b'P', b'G', 0x00, 0x01, 0x5F, 0x90, 0x00, 0x00, 0x00, 0x00, 0x16, 0x00, 0x13,
        ];
        let header = SegmentHeader::decode(&bytes).unwrap().unwrap();
        assert_eq!(header.pts.ticks(), 90_000);
        assert_eq!(header.dts, Timestamp::ZERO);
        assert_eq!(header.kind, SegmentKind::Composition);
        assert_eq!(header.payload_len, 0x13);
        assert_eq!(header.segment_len(), 13 + 0x13);
    }

    #[test]
    fn test_header_decode_bad_magic() {
        let bytes = [0u8; HEADER_LEN];
        assert!(SegmentHeader::decode(&bytes).unwrap().is_none());
    }

    #[test]
    fn test_header_decode_short() {
        let err = SegmentHeader::decode(b"PG").unwrap_err();
        assert!(matches!(err, Error::BufferUnderflow { need: 13, have: 2 }));
    }

    #[test]
    fn test_encode_decode() {
        let seg = Segment::new(SegmentKind::End, ts(1_000), ts(990), Bytes::new());
        let bytes = seg.to_bytes().unwrap();
        assert_eq!(bytes.len(), HEADER_LEN);

        let header = SegmentHeader::decode(&bytes).unwrap().unwrap();
        assert_eq!(header.pts, ts(1_000));
        assert_eq!(header.dts, ts(990));
        assert_eq!(header.kind, SegmentKind::End);
        assert_eq!(header.payload_len, 0);
    }

    #[test]
    fn test_set_timestamps_reports_change() {
        let mut seg = Segment::new(SegmentKind::End, ts(5), ts(5), Bytes::new());
        assert!(!seg.set_timestamps(ts(5)));
        assert!(seg.set_timestamps(ts(6)));
        assert_eq!(seg.pts, ts(6));
        assert_eq!(seg.dts, ts(6));
    }

    #[test]
    fn test_payload_too_large() {
        let seg = Segment::new(
            SegmentKind::Object,
            Timestamp::ZERO,
            Timestamp::ZERO,
            vec![0u8; u16::MAX as usize + 1],
        );
        assert!(matches!(
            seg.to_bytes().unwrap_err(),
            Error::PayloadTooLarge { .. }
        ));
    }

    #[test]
    fn test_set_frame_rate_touches_one_byte() {
        let payload = vec![0x07, 0x80, 0x04, 0x38, 0x10, 0x00, 0x01, 0x80, 0x00, 0x00, 0x00];
        let mut pcs = Segment::new(SegmentKind::Composition, ts(1_000), ts(1_000), payload.clone());
        pcs.set_frame_rate(FrameRate::Fps25);
        assert_eq!(pcs.frame_rate(), Some(FrameRate::Fps25));

        let changed: Vec<_> = payload
            .iter()
            .zip(pcs.payload.iter())
            .enumerate()
            .filter(|(_, (a, b))| a != b)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(changed, vec![FRAME_RATE_OFFSET]);

        let mut window = Segment::new(SegmentKind::Window, ts(1_000), ts(1_000), payload.clone());
        window.set_frame_rate(FrameRate::Fps25);
        assert_eq!(&window.payload[..], &payload[..]);
    }
}
