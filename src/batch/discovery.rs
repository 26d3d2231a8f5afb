//! Locating input streams and the reference media.

use std::path::{Path, PathBuf};

use supsync_common::paths::{is_sup_file, normalize_extension};
use walkdir::WalkDir;

/// `.sup` files directly inside `dir`, sorted by name.
pub fn list_sup_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(std::io::Error::other)?;
        if entry.file_type().is_file() && is_sup_file(entry.path()) {
            files.push(entry.into_path());
        }
    }

    files.sort();
    Ok(files)
}

/// First file in `dir` with one of `extensions`, trying extensions in order.
///
/// Within one extension the alphabetically first file wins.
pub fn find_reference_media(dir: &Path, extensions: &[String]) -> Option<PathBuf> {
    let mut candidates: Vec<PathBuf> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .collect();
    candidates.sort();

    extensions.iter().map(|e| normalize_extension(e)).find_map(|wanted| {
        candidates
            .iter()
            .find(|path| {
                path.extension()
                    .map(|ext| ext.to_string_lossy().to_lowercase() == wanted)
                    .unwrap_or(false)
            })
            .cloned()
    })
}

/// Default reference location for an input directory: its parent.
pub fn reference_search_dir(input_dir: &Path) -> &Path {
    input_dir.parent().unwrap_or(input_dir)
}
