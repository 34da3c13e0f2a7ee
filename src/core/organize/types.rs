//! Types for the organize module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// Configuration for organize runs; file names are relative to the base
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrganizeConfig {
    pub checkpoint_file: PathBuf,
    /// Frozen candidate list of the run being checkpointed
    pub manifest_file: PathBuf,
    pub report_log: PathBuf,
    pub report_records: PathBuf,
    /// Organize dot-files too, regardless of the scan setting
    pub include_hidden: bool,
}

impl Default for OrganizeConfig {
    fn default() -> Self {
        Self {
            checkpoint_file: PathBuf::from(".curate_checkpoint.json"),
            manifest_file: PathBuf::from(".curate_candidates.json"),
            report_log: PathBuf::from("organize_report.txt"),
            report_records: PathBuf::from("organize_report.jsonl"),
            include_hidden: true,
        }
    }
}

/// What a dry run would do with one sidecar; each carries the destination
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SidecarPlan {
    Move(PathBuf),
    /// Identical sidecar already there
    Skip(PathBuf),
    /// Different sidecar already there
    Conflict(PathBuf),
}

/// Per-invocation switches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrganizeOptions {
    /// Report what would happen without touching any file
    pub dry_run: bool,
    /// Only the N oldest candidates
    pub limit: Option<usize>,
    /// Continue from an existing checkpoint
    pub resume: bool,
}

impl Default for OrganizeOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            limit: None,
            resume: true,
        }
    }
}

/// What happened to one candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    Moved(PathBuf),
    /// Dry run: would have moved here, along with its sidecars
    Planned {
        dest: PathBuf,
        sidecars: Vec<SidecarPlan>,
    },
    /// Identical file already at the destination
    Duplicate(PathBuf),
    /// Different file already at the destination
    Conflict(PathBuf),
    Failed(String),
}

/// Outcome of an organize run.
///
/// Counters include the work of earlier, interrupted runs of the same
/// checkpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrganizeResult {
    pub run_id: Uuid,
    pub total: usize,
    /// Candidates handled by this invocation
    pub processed: usize,
    pub moved: usize,
    pub duplicates: usize,
    pub conflicts: usize,
    /// Dry run only
    pub planned: usize,
    pub interrupted: bool,
    /// Index this invocation started from, when resuming
    pub resumed_from: Option<usize>,
}

/// Cooperative cancellation, checked between candidates
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
