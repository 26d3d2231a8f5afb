//! Path utilities for detecting file types by extension.
//!
//! Used by the batch runner to pick out `.sup` inputs and to locate the
//! reference audio track next to them.

use std::path::Path;

/// Extensions of PGS subtitle streams.
const SUP_EXTENSIONS: &[&str] = &["sup"];

/// Audio extensions accepted as a reference track, in discovery order.
const AUDIO_EXTENSIONS: &[&str] = &[
    "ac3", "ec3", "eac3", "aac", "flac", "wav", "mlp", "thd", "dts", "dtshd", "dtshr", "dtsma",
    "opus",
];

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| extensions.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Check if a path has a PGS subtitle extension.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use supsync_common::paths::is_sup_file;
///
/// assert!(is_sup_file(Path::new("movie.sup")));
/// assert!(!is_sup_file(Path::new("movie.srt")));
/// ```
pub fn is_sup_file(path: &Path) -> bool {
    has_extension(path, SUP_EXTENSIONS)
}

/// Get the list of reference audio extensions, in discovery order.
#[must_use]
pub fn audio_extensions() -> &'static [&'static str] {
    AUDIO_EXTENSIONS
}

/// Normalize a configured extension (`".FLAC"` → `"flac"`).
pub fn normalize_extension(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_lowercase()
}
