//! # Consolidate Module
//!
//! Reduces each duplicate group to its keeper.
//!
//! ## Modes
//! - **Quarantine**: non-keepers move to
//!   `<base>/_Quarantine_<YYYYmmdd_HHMMSS>/<group-hash>/`
//! - **Delete**: non-keepers are removed
//!
//! Sidecars follow their media file. The keeper and the keeper's sidecars
//! are never touched. Every action lands in the action journal.

mod executor;

pub use executor::ConsolidationExecutor;

use crate::core::duplicates::DuplicateGroup;
use crate::core::hasher::ContentHash;
use crate::core::scanner::MediaFile;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use uuid::Uuid;

/// What happens to non-keepers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsolidationMode {
    Quarantine,
    Delete,
}

impl fmt::Display for ConsolidationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsolidationMode::Quarantine => write!(f, "quarantine"),
            ConsolidationMode::Delete => write!(f, "delete"),
        }
    }
}

impl FromStr for ConsolidationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "quarantine" => Ok(ConsolidationMode::Quarantine),
            "delete" => Ok(ConsolidationMode::Delete),
            other => Err(format!("unknown consolidation mode: {}", other)),
        }
    }
}

/// Configuration for consolidation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsolidateConfig {
    /// Prefix of the per-run quarantine directory
    pub quarantine_prefix: String,
    /// Human-readable action log, relative to the base directory
    pub action_log: PathBuf,
    /// JSON-lines action log, relative to the base directory
    pub action_records: PathBuf,
}

impl Default for ConsolidateConfig {
    fn default() -> Self {
        Self {
            quarantine_prefix: "_Quarantine_".to_string(),
            action_log: PathBuf::from("duplicates_action.txt"),
            action_records: PathBuf::from("duplicates_action.jsonl"),
        }
    }
}

/// What to do with one duplicate group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsolidationPlan {
    pub group: ContentHash,
    pub keeper: PathBuf,
    /// Members to quarantine or delete, never including the keeper
    pub remove: Vec<PathBuf>,
}

impl ConsolidationPlan {
    pub fn new(group: &DuplicateGroup, keeper: &MediaFile) -> Self {
        Self {
            group: group.hash.clone(),
            keeper: keeper.path.clone(),
            remove: group
                .members
                .iter()
                .filter(|m| m.path != keeper.path)
                .map(|m| m.path.clone())
                .collect(),
        }
    }
}

/// Outcome of a consolidation run
#[derive(Debug, Clone, Default)]
pub struct ConsolidationResult {
    pub run_id: Uuid,
    /// Set in quarantine mode once the directory exists
    pub quarantine_dir: Option<PathBuf>,
    /// Media files moved or deleted
    pub removed: usize,
    /// Sidecars moved or deleted along with them
    pub sidecars: usize,
    pub bytes_reclaimed: u64,
    /// One message per failed action
    pub failures: Vec<String>,
}
