//! Segment builders shared by the unit tests.

use bytes::{Bytes, BytesMut};
use supsync_common::Timestamp;

use crate::segment::{Segment, SegmentKind};

pub(crate) const EPOCH_START: u8 = 0x80;
pub(crate) const NORMAL: u8 = 0x00;

pub(crate) fn ms(millis: u64) -> Timestamp {
    Timestamp::from_millis(millis)
}

fn pcs_payload(number: u16, state: u8, objects: u8) -> Vec<u8> {
    let mut payload = vec![0x07, 0x80, 0x04, 0x38, 0x10];
    payload.extend_from_slice(&number.to_be_bytes());
    payload.extend_from_slice(&[state, 0x00, 0x00, objects]);
    for _ in 0..objects {
        payload.extend_from_slice(&[0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x03, 0x20]);
    }
    payload
}

/// Composition with one object.
pub(crate) fn pcs(at: u64, number: u16) -> Segment {
    pcs_with(at, number, EPOCH_START, 1)
}

pub(crate) fn pcs_with(at: u64, number: u16, state: u8, objects: u8) -> Segment {
    Segment::new(
        SegmentKind::Composition,
        ms(at),
        ms(at),
        pcs_payload(number, state, objects),
    )
}

pub(crate) fn wds(at: u64) -> Segment {
    Segment::new(
        SegmentKind::Window,
        ms(at),
        ms(at),
        vec![0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x07, 0x80, 0x00, 0x80],
    )
}

pub(crate) fn pds(at: u64) -> Segment {
    Segment::new(
        SegmentKind::Palette,
        ms(at),
        ms(at),
        vec![0x00, 0x00, 0x01, 0xeb, 0x80, 0x80, 0xff],
    )
}

pub(crate) fn ods(at: u64) -> Segment {
    Segment::new(
        SegmentKind::Object,
        ms(at),
        ms(at),
        vec![0x00, 0x00, 0x00, 0xc0, 0x00, 0x00, 0x08, 0x00, 0x02, 0x00, 0x01, 0x01, 0x00],
    )
}

pub(crate) fn end(at: u64) -> Segment {
    Segment::new(SegmentKind::End, ms(at), ms(at), Bytes::new())
}

pub(crate) fn encode(segments: &[Segment]) -> Bytes {
    let mut out = BytesMut::new();
    for seg in segments {
        seg.write_to(&mut out).unwrap();
    }
    out.freeze()
}

/// Three display sets: an image at 1s, a control-only clear at 3s, and an
/// image at 5s.
///
/// | idx | segment       |
/// |-----|---------------|
/// | 0-4 | PCS WDS PDS ODS END(3s) |
/// | 5-7 | PCS WDS END(3s)         |
/// | 8-11| PCS PDS ODS END(7s)     |
pub(crate) fn scenario_segments() -> Vec<Segment> {
    vec![
        pcs_with(1_000, 0, EPOCH_START, 1),
        wds(1_000),
        pds(1_000),
        ods(1_000),
        end(3_000),
        pcs_with(3_000, 1, NORMAL, 0),
        wds(3_000),
        end(3_000),
        pcs_with(5_000, 2, EPOCH_START, 1),
        pds(5_000),
        ods(5_000),
        end(7_000),
    ]
}

pub(crate) fn scenario_bytes() -> Bytes {
    encode(&scenario_segments())
}
