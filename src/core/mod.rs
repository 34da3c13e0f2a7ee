//! # Core Module
//!
//! The media curation engine, free of any terminal concerns.
//!
//! ## Modules
//! - `scanner` - Finds photos, videos and their sidecars
//! - `hasher` - SHA-256 content hashing
//! - `duplicates` - Tiered exact-duplicate detection and scan reports
//! - `video` - Probable re-encode detection through ffprobe
//! - `pipeline` - Orchestrates a duplicate scan
//! - `temporal` - Capture dates through exiftool, with mtime fallback
//! - `keeper` - Picks the survivor of each duplicate group
//! - `consolidate` - Quarantines or deletes the other copies
//! - `organize` - Resumable filing into `YYYY/MM` folders
//! - `journal` - Append-only action logs
//! - `relocate` - File moves with cross-device fallback
//! - `tool` - External executable launching
//! - `config` - Run configuration

pub mod config;
pub mod consolidate;
pub mod duplicates;
pub mod hasher;
pub mod journal;
pub mod keeper;
pub mod organize;
pub mod pipeline;
pub mod relocate;
pub mod scanner;
pub mod temporal;
pub mod tool;
pub mod video;

// Re-export commonly used types
pub use config::CurateConfig;
pub use consolidate::{ConsolidationExecutor, ConsolidationMode, ConsolidationPlan};
pub use duplicates::{DetectionResult, DuplicateDetector, DuplicateGroup};
pub use hasher::ContentHash;
pub use keeper::{select_keeper, KeeperSelector};
pub use organize::{CancellationToken, OrganizePipeline, OrganizeResult};
pub use pipeline::{Pipeline, PipelineResult};
pub use scanner::{MediaFile, MediaKind};
pub use temporal::{TemporalRecord, TemporalResolver};
pub use video::{NearDuplicateGroup, VideoFingerprint};
