//! Event type definitions for progress reporting.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// All events emitted while scanning for duplicates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// Indexing phase events
    Scan(ScanEvent),
    /// Tiered hashing events
    Detect(DetectEvent),
    /// Run-level events
    Pipeline(PipelineEvent),
}

/// Events during directory indexing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ScanEvent {
    /// Indexing has started
    Started { path: PathBuf, recursive: bool },
    /// Progress update, sent every few hundred files
    Progress { files_indexed: usize },
    /// Indexing completed
    Completed { total_files: usize, total_bytes: u64 },
}

/// The hashing tiers of the duplicate detector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HashTier {
    Size,
    Partial,
    Full,
}

impl std::fmt::Display for HashTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HashTier::Size => write!(f, "Grouping by size"),
            HashTier::Partial => write!(f, "Hashing file prefixes"),
            HashTier::Full => write!(f, "Hashing full content"),
        }
    }
}

/// Events during duplicate detection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DetectEvent {
    /// A tier has started on this many candidate files
    TierStarted { tier: HashTier, candidates: usize },
    /// Progress within a tier
    TierProgress(TierProgress),
    /// A file could not be hashed and was dropped from its group
    Error { path: PathBuf, message: String },
    /// A tier completed, leaving this many files in groups of two or more
    TierCompleted { tier: HashTier, remaining: usize },
}

/// Progress information within a hashing tier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierProgress {
    pub tier: HashTier,
    pub completed: usize,
    pub total: usize,
    pub current_path: PathBuf,
}

/// Run-level events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PipelineEvent {
    Started,
    PhaseChanged { phase: PipelinePhase },
    Completed { summary: ScanSummary },
}

/// Phases of a duplicate scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelinePhase {
    Indexing,
    Detecting,
    NearDuplicates,
    Reporting,
}

impl std::fmt::Display for PipelinePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelinePhase::Indexing => write!(f, "Indexing"),
            PipelinePhase::Detecting => write!(f, "Detecting duplicates"),
            PipelinePhase::NearDuplicates => write!(f, "Inspecting videos"),
            PipelinePhase::Reporting => write!(f, "Reporting"),
        }
    }
}

/// Summary of a duplicate scan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanSummary {
    pub total_files: usize,
    pub total_bytes: u64,
    pub duplicate_groups: usize,
    /// Files that would be removed, keepers excluded
    pub duplicate_count: usize,
    pub potential_savings_bytes: u64,
    pub near_duplicate_groups: usize,
    pub duration_ms: u64,
}
