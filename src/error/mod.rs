//! # Error Module
//!
//! Error types for the media curator.
//!
//! ## Design Principles
//! - **Never panic** on user data - return errors instead
//! - **Include context** - paths, tool names, what went wrong
//! - **Contain failures** - only an unreadable base directory is fatal,
//!   every other error is counted, logged, and skipped

use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum CurateError {
    #[error("Scanning error: {0}")]
    Scan(#[from] ScanError),

    #[error("Hashing error: {0}")]
    Hash(#[from] HashError),

    #[error("External tool error: {0}")]
    Tool(#[from] ToolError),

    #[error("Journal error: {0}")]
    Journal(#[from] JournalError),

    #[error("Checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors that occur while indexing a directory
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    #[error("Failed to read directory {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read file metadata for {path}: {source}")]
    Metadata {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that occur while hashing file content
#[derive(Error, Debug)]
pub enum HashError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors from the external metadata and media-inspection utilities
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("{tool} is not available: {reason}")]
    Unavailable { tool: String, reason: String },

    #[error("Permission denied launching {tool}")]
    PermissionDenied { tool: String },

    #[error("{tool} exited with status {status}: {stderr}")]
    Failed {
        tool: String,
        status: i32,
        stderr: String,
    },

    #[error("{tool} produced unusable output: {reason}")]
    MalformedOutput { tool: String, reason: String },
}

impl ToolError {
    /// Whether another launch strategy might get past this error
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, ToolError::PermissionDenied { .. })
    }
}

/// Errors that occur while appending to the action journals
#[derive(Error, Debug)]
pub enum JournalError {
    #[error("Failed to append to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize journal entry: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Errors that occur while reading or writing organize checkpoints
#[derive(Error, Debug)]
pub enum CheckpointError {
    #[error("Failed to access checkpoint at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Checkpoint at {path} is corrupted: {reason}. Delete this file or pass --restart.")]
    Corrupted { path: PathBuf, reason: String },
}

/// Errors that occur while loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {reason}")]
    Invalid { path: PathBuf, reason: String },
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, CurateError>;
