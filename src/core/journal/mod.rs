//! # Journal Module
//!
//! Append-only action logs.
//!
//! Every action is written twice: a plain text line for people and a JSON
//! line for tools. Both files are opened, appended and closed per entry, so
//! an interrupted run leaves every completed action on disk.

use crate::core::hasher::ContentHash;
use crate::error::JournalError;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// What happened to a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Moved to quarantine or into its date directory
    Moved,
    Deleted,
    /// A sidecar followed its media file
    SidecarMoved,
    SidecarDeleted,
    /// Identical content already present at the destination
    Duplicate,
    /// Different content already present at the destination
    Conflict,
    /// Left alone on purpose
    Skipped,
    Failed,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ActionKind::Moved => "MOVED",
            ActionKind::Deleted => "DELETED",
            ActionKind::SidecarMoved => "SIDECAR_MOVED",
            ActionKind::SidecarDeleted => "SIDECAR_DELETED",
            ActionKind::Duplicate => "DUPLICATE",
            ActionKind::Conflict => "CONFLICT",
            ActionKind::Skipped => "SKIPPED",
            ActionKind::Failed => "FAILED",
        };
        f.write_str(label)
    }
}

/// One journaled action
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    pub run_id: Uuid,
    pub timestamp: DateTime<Local>,
    pub action: ActionKind,
    pub source: PathBuf,
    pub destination: Option<PathBuf>,
    /// Duplicate group the file belongs to
    pub group: Option<ContentHash>,
    pub detail: Option<String>,
}

impl JournalEntry {
    pub fn new(run_id: Uuid, action: ActionKind, source: impl Into<PathBuf>) -> Self {
        Self {
            run_id,
            timestamp: Local::now(),
            action,
            source: source.into(),
            destination: None,
            group: None,
            detail: None,
        }
    }

    pub fn destination(mut self, destination: impl Into<PathBuf>) -> Self {
        self.destination = Some(destination.into());
        self
    }

    pub fn group(mut self, group: &ContentHash) -> Self {
        self.group = Some(group.clone());
        self
    }

    pub fn detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// `<timestamp> <ACTION> <source> [-> <destination>] [group=<hash>] [(detail)]`
    pub fn human_line(&self) -> String {
        let mut line = format!(
            "{} {} {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.action,
            self.source.display()
        );
        if let Some(destination) = &self.destination {
            line.push_str(&format!(" -> {}", destination.display()));
        }
        if let Some(group) = &self.group {
            line.push_str(&format!(" group={}", group));
        }
        if let Some(detail) = &self.detail {
            line.push_str(&format!(" ({})", detail));
        }
        line
    }
}

/// A pair of append-only files
#[derive(Debug, Clone)]
pub struct Journal {
    text_path: PathBuf,
    records_path: PathBuf,
}

impl Journal {
    pub fn new(text_path: impl Into<PathBuf>, records_path: impl Into<PathBuf>) -> Self {
        Self {
            text_path: text_path.into(),
            records_path: records_path.into(),
        }
    }

    pub fn text_path(&self) -> &Path {
        &self.text_path
    }

    pub fn records_path(&self) -> &Path {
        &self.records_path
    }

    /// Append an entry to both files
    pub fn append(&self, entry: &JournalEntry) -> Result<(), JournalError> {
        let json = serde_json::to_string(entry)?;
        append_line(&self.text_path, &entry.human_line())?;
        append_line(&self.records_path, &json)
    }

    /// Append a free-form line to the human log only
    pub fn note(&self, line: &str) -> Result<(), JournalError> {
        append_line(&self.text_path, line)
    }
}

/// Append one line, opening and closing the file around the write
pub(crate) fn append_line(path: &Path, line: &str) -> Result<(), JournalError> {
    let write = || -> std::io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{}", line)
    };
    write().map_err(|source| JournalError::Write {
        path: path.to_path_buf(),
        source,
    })
}
