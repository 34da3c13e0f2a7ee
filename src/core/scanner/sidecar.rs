//! Sidecar lookup.

use super::MediaFilter;
use std::fs;
use std::path::{Path, PathBuf};

/// Companion files next to `media` that share its stem.
///
/// Matching is case-insensitive on the extension and exact on the stem, so
/// `IMG_0001.JPG` picks up both `IMG_0001.AAE` and `IMG_0001.xmp`. Read
/// errors yield no sidecars rather than failing.
pub fn sidecars_for(media: &Path, filter: &MediaFilter) -> Vec<PathBuf> {
    let (Some(dir), Some(stem)) = (media.parent(), media.file_stem()) else {
        return Vec::new();
    };
    let dir = if dir.as_os_str().is_empty() {
        Path::new(".")
    } else {
        dir
    };

    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut found: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.file_stem() == Some(stem))
        .filter(|path| filter.is_sidecar(path))
        .filter(|path| path.is_file())
        .collect();
    found.sort();
    found
}
