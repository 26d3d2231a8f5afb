//! supsync - re-time PGS subtitle streams against a reference audio track.
//!
//! The library crate exposes configuration and batch orchestration for the
//! binary and for integration testing. Stream handling lives in
//! `supsync-pgs`, the aligner bridge in `supsync-av`.

pub mod batch;
pub mod config;
