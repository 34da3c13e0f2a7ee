//! # Video Module
//!
//! Flags probable re-encodes: videos with the same resolution, codec and
//! (quantized) duration whose bytes differ.
//!
//! Needs `ffprobe`. When it is missing the analysis is skipped and the rest
//! of the scan carries on. Groups found here are reported, never
//! consolidated.

mod analyzer;
mod probe;

pub use analyzer::NearDuplicateAnalyzer;
pub use probe::{parse_probe_output, Ffprobe, MediaProbe, StreamInfo};

use crate::core::hasher::ContentHash;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Configuration for near-duplicate analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    /// Path or name of the ffprobe executable
    pub ffprobe_path: PathBuf,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            ffprobe_path: PathBuf::from("ffprobe"),
        }
    }
}

/// Approximate identity of a video stream.
///
/// Duration is kept as a count of whole half-seconds (truncated), so 10.1 s
/// and 10.3 s both land in the 10.0 s slot while 10.6 s does not.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VideoFingerprint {
    pub width: u32,
    pub height: u32,
    pub codec: String,
    pub half_seconds: u64,
}

impl VideoFingerprint {
    /// Durations are truncated to the half second, so 10.1 s and 10.3 s both
    /// land in the 10.0 s slot. `None` for negative or non-finite durations.
    pub fn from_stream(info: &StreamInfo) -> Option<Self> {
        if !info.duration_secs.is_finite() || info.duration_secs < 0.0 {
            return None;
        }
        Some(Self {
            width: info.width,
            height: info.height,
            codec: info.codec.clone(),
            half_seconds: (info.duration_secs * 2.0).floor() as u64,
        })
    }

    pub fn duration_secs(&self) -> f64 {
        self.half_seconds as f64 / 2.0
    }
}

impl fmt::Display for VideoFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{} {} {:.1}s",
            self.width,
            self.height,
            self.codec,
            self.duration_secs()
        )
    }
}

/// Files sharing one exact content hash inside a fingerprint group
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentVariant {
    pub hash: ContentHash,
    pub paths: Vec<PathBuf>,
}

/// A fingerprint shared by two or more distinct contents
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NearDuplicateGroup {
    pub fingerprint: VideoFingerprint,
    /// Sorted by hash; always two or more
    pub variants: Vec<ContentVariant>,
}

impl NearDuplicateGroup {
    pub fn member_count(&self) -> usize {
        self.variants.iter().map(|v| v.paths.len()).sum()
    }
}
