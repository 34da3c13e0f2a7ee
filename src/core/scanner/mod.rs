//! # Scanner Module
//!
//! Discovers media files in a directory.
//!
//! ## Extension Classes
//! - **Photo** - JPEG, PNG, HEIC/HEIF and common camera RAW formats
//! - **Video** - MP4, MOV, M4V, AVI, MTS/M2TS, 3GP
//! - **Sidecar** - AAE, XMP, THM, LRV companions sharing a media file's stem
//!
//! ## Example
//! ```rust,ignore
//! use media_curator::core::scanner::{MediaWalker, ScanConfig};
//!
//! let walker = MediaWalker::new(ScanConfig::default());
//! for file in walker.walk("/Users/me/Pictures".as_ref(), true)? {
//!     println!("{} ({} bytes)", file.path.display(), file.size);
//! }
//! ```

mod filter;
mod sidecar;
mod walker;

pub use filter::MediaFilter;
pub use sidecar::sidecars_for;
pub use walker::{MediaIter, MediaWalker};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::SystemTime;

/// A media file as seen at indexing time.
///
/// The snapshot is not refreshed; a file changed after indexing keeps its
/// old size and modification time here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaFile {
    pub path: PathBuf,
    pub size: u64,
    pub modified: SystemTime,
    pub kind: MediaKind,
}

/// Extension class of a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Photo,
    Video,
    Sidecar,
}

impl MediaKind {
    /// Photos and videos are indexed; sidecars only travel with them
    pub fn is_media(&self) -> bool {
        matches!(self, MediaKind::Photo | MediaKind::Video)
    }
}

/// Configuration for indexing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Lowercase photo extensions, without the dot
    pub photo_extensions: Vec<String>,
    /// Lowercase video extensions, without the dot
    pub video_extensions: Vec<String>,
    /// Lowercase sidecar extensions, without the dot
    pub sidecar_extensions: Vec<String>,
    /// Whether to include hidden files and directories
    pub include_hidden: bool,
    /// Whether to follow symbolic links
    pub follow_symlinks: bool,
    /// Directories whose name starts with one of these are never entered
    pub exclude_dir_prefixes: Vec<String>,
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            photo_extensions: strings(&[
                "jpg", "jpeg", "png", "heic", "heif", "dng", "nef", "cr2", "cr3", "arw", "rw2",
                "orf",
            ]),
            video_extensions: strings(&["mp4", "mov", "m4v", "avi", "mts", "m2ts", "3gp"]),
            sidecar_extensions: strings(&["aae", "xmp", "thm", "lrv"]),
            include_hidden: false,
            follow_symlinks: false,
            exclude_dir_prefixes: strings(&["_Quarantine_"]),
        }
    }
}
