//! Checkpoint and candidate manifest persistence.

use super::OrganizeConfig;
use crate::error::CheckpointError;
use chrono::{DateTime, Local};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Progress through the candidate list.
///
/// `last_index` is the 0-based index of the last fully processed
/// candidate. The JSON field names are fixed: `last_index`, `moved`,
/// `duplicati`, `conflicts`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointState {
    pub last_index: usize,
    pub moved: usize,
    #[serde(rename = "duplicati")]
    pub duplicates: usize,
    pub conflicts: usize,
}

impl CheckpointState {
    /// First candidate still to process
    pub fn next_index(&self) -> usize {
        self.last_index + 1
    }
}

/// The ordered candidate list a checkpoint refers to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateManifest {
    pub created_at: DateTime<Local>,
    pub candidates: Vec<PathBuf>,
}

impl CandidateManifest {
    pub fn new(candidates: Vec<PathBuf>) -> Self {
        Self {
            created_at: Local::now(),
            candidates,
        }
    }
}

/// Reads and writes the checkpoint pair of a base directory
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    checkpoint_path: PathBuf,
    manifest_path: PathBuf,
}

impl CheckpointStore {
    pub fn new(base: &Path, config: &OrganizeConfig) -> Self {
        Self {
            checkpoint_path: base.join(&config.checkpoint_file),
            manifest_path: base.join(&config.manifest_file),
        }
    }

    pub fn checkpoint_path(&self) -> &Path {
        &self.checkpoint_path
    }

    pub fn manifest_path(&self) -> &Path {
        &self.manifest_path
    }

    pub fn load(&self) -> Result<Option<CheckpointState>, CheckpointError> {
        read_json(&self.checkpoint_path)
    }

    /// Overwrite the checkpoint through a sibling temp file and a rename
    pub fn save(&self, state: &CheckpointState) -> Result<(), CheckpointError> {
        write_json(&self.checkpoint_path, state)
    }

    pub fn load_manifest(&self) -> Result<Option<CandidateManifest>, CheckpointError> {
        read_json(&self.manifest_path)
    }

    pub fn save_manifest(&self, manifest: &CandidateManifest) -> Result<(), CheckpointError> {
        write_json(&self.manifest_path, manifest)
    }

    /// Remove both files; missing files are fine
    pub fn clear(&self) -> Result<(), CheckpointError> {
        for path in [&self.checkpoint_path, &self.manifest_path] {
            match fs::remove_file(path) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(source) => {
                    return Err(CheckpointError::Io {
                        path: path.clone(),
                        source,
                    })
                }
            }
        }
        Ok(())
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, CheckpointError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(CheckpointError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    serde_json::from_str(&content)
        .map(Some)
        .map_err(|e| CheckpointError::Corrupted {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), CheckpointError> {
    let io_error = |source| CheckpointError::Io {
        path: path.to_path_buf(),
        source,
    };
    let json = serde_json::to_string_pretty(value).map_err(|e| CheckpointError::Corrupted {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let mut temp_name = path.file_name().unwrap_or_default().to_os_string();
    temp_name.push(".tmp");
    let temp = path.with_file_name(temp_name);
    fs::write(&temp, json).map_err(io_error)?;
    fs::rename(&temp, path).map_err(io_error)
}
