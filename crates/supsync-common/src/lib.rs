//! Supsync-Common: Shared types, constants, and utilities.
//!
//! This crate provides common functionality used across supsync:
//!
//! - **Timestamps**: 90 kHz presentation clock values and time spans
//! - **Path Utilities**: Subtitle file detection and reference extension tables
//! - **Error Handling**: Common error types and result aliases
//!
//! # Examples
//!
//! ```
//! use supsync_common::{Timestamp, TimeSpan};
//! use supsync_common::paths::is_sup_file;
//! use std::path::Path;
//!
//! let start = Timestamp::from_millis(1_500);
//! let span = TimeSpan::new(start, Timestamp::from_millis(3_000));
//! assert_eq!(span.duration().as_millis(), 1_500);
//!
//! assert!(is_sup_file(Path::new("movie.en.sup")));
//! ```

pub mod error;
pub mod paths;
pub mod types;

pub use error::{Error, Result};
pub use types::*;
