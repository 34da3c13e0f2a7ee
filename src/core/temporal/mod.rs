//! # Temporal Module
//!
//! Resolves when a photo or video was captured.
//!
//! ## Resolution Order
//! 1. Metadata tags read through `exiftool`, scanned in [`DATE_TAGS`] order.
//!    The first value that parses wins.
//! 2. The file's modification time, as local wall-clock. Such records are
//!    flagged as lower confidence.
//!
//! Files are read in batches; a batch that the tool cannot handle falls
//! back per file without affecting the other batches.

mod exiftool;
mod parse;
mod resolver;

pub use exiftool::ExifTool;
pub use parse::{normalize, parse_date_value, ParsedDate};
pub use resolver::TemporalResolver;

use crate::error::ToolError;
use chrono::{DateTime, Datelike, FixedOffset, Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Date tags in priority order.
///
/// Sub-second original-capture tags first, generic creation and
/// modification tags after, filesystem timestamps last.
pub const DATE_TAGS: [&str; 13] = [
    "SubSecDateTimeOriginal",
    "DateTimeOriginal",
    "SubSecCreateDate",
    "CreateDate",
    "XMP:DateCreated",
    "Photoshop:DateCreated",
    "IPTC:DateCreated",
    "MediaCreateDate",
    "TrackCreateDate",
    "CreationDate",
    "ModifyDate",
    "FileCreateDate",
    "FileModifyDate",
];

/// One exiftool JSON record: tag name to value, plus `SourceFile`
pub type TagRecord = serde_json::Map<String, serde_json::Value>;

/// How offset-bearing datetimes are adjusted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Normalization {
    /// Keep the wall-clock time as written
    None,
    /// Convert to the machine's local zone
    #[default]
    Local,
    /// Convert to UTC
    Utc,
}

impl fmt::Display for Normalization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Normalization::None => write!(f, "none"),
            Normalization::Local => write!(f, "local"),
            Normalization::Utc => write!(f, "utc"),
        }
    }
}

/// Configuration for capture-date resolution
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TemporalConfig {
    /// Path or name of the exiftool executable
    pub exiftool_path: PathBuf,
    /// Files per exiftool invocation
    pub batch_size: usize,
    /// Batches larger than this pass their paths through an argument file
    pub argfile_threshold: usize,
    pub normalization: Normalization,
}

impl Default for TemporalConfig {
    fn default() -> Self {
        Self {
            exiftool_path: PathBuf::from("exiftool"),
            batch_size: 25,
            argfile_threshold: 50,
            normalization: Normalization::Local,
        }
    }
}

/// Where a resolved datetime came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateSource {
    /// A metadata tag, by the name it has in [`DATE_TAGS`]
    Tag(String),
    /// Filesystem modification time
    ModificationTime,
}

impl fmt::Display for DateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateSource::Tag(tag) => write!(f, "tag={}", tag),
            DateSource::ModificationTime => write!(f, "mtime"),
        }
    }
}

/// A resolved capture datetime
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemporalRecord {
    /// Wall-clock datetime after normalization
    pub captured_at: NaiveDateTime,
    /// Offset carried by the value, if any
    pub offset: Option<FixedOffset>,
    pub source: DateSource,
    pub normalization: Normalization,
}

impl TemporalRecord {
    /// Lower-confidence record from a filesystem timestamp
    pub fn from_modified(modified: SystemTime) -> Self {
        let local: DateTime<Local> = modified.into();
        Self {
            captured_at: local.naive_local(),
            offset: None,
            source: DateSource::ModificationTime,
            normalization: Normalization::None,
        }
    }

    pub fn is_metadata_backed(&self) -> bool {
        matches!(self.source, DateSource::Tag(_))
    }

    pub fn year(&self) -> i32 {
        self.captured_at.year()
    }

    pub fn month(&self) -> u32 {
        self.captured_at.month()
    }
}

/// Trait for metadata readers
///
/// Implement this trait to feed tag records from somewhere other than
/// exiftool (tests use in-memory fakes).
pub trait MetadataSource: Send + Sync {
    /// Read the date tags of `files`, one record per file that could be read
    fn read_tags(&self, files: &[PathBuf]) -> Result<Vec<TagRecord>, ToolError>;
}

/// Absolute form of `path` without touching the filesystem
pub(crate) fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    }
}
