//! # Duplicates Module
//!
//! Finds byte-identical files with three-tier progressive hashing.
//!
//! ## How It Works
//! 1. **Size** - group by byte size, straight from filesystem metadata
//! 2. **Partial hash** - for sizes shared by 2+ files, hash the first few MiB
//! 3. **Full hash** - for prefixes shared by 2+ files, hash everything
//!
//! Only full-hash groups with two or more members are reported. Each tier
//! is a pure regrouping of the previous tier's collision-prone buckets, so
//! skipping the partial tier changes cost but never the result.

mod detector;
mod report;
mod tiers;

pub use detector::{DetectionResult, DetectorConfig, DuplicateDetector};
pub use report::{format_bytes, GroupRecord, ReportConfig, ScanReport};
pub use tiers::{collision_prone, group_by_size, refine, Buckets};

use crate::core::hasher::ContentHash;
use crate::core::scanner::MediaFile;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Files proven identical by full-content hash
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateGroup {
    /// Full-content hash, also the group identifier
    pub hash: ContentHash,
    /// Byte size shared by every member
    pub size: u64,
    /// Members sorted by path
    pub members: Vec<MediaFile>,
}

impl DuplicateGroup {
    /// Build a group, sorting members by path
    pub fn new(hash: ContentHash, mut members: Vec<MediaFile>) -> Self {
        members.sort_by(|a, b| a.path.cmp(&b.path));
        let size = members.first().map(|m| m.size).unwrap_or(0);
        Self {
            hash,
            size,
            members,
        }
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Bytes freed by keeping a single copy
    pub fn potential_savings(&self) -> u64 {
        self.size * self.members.len().saturating_sub(1) as u64
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.members.iter().map(|m| m.path.clone()).collect()
    }
}
