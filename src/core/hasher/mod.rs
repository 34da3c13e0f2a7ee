//! # Hasher Module
//!
//! Content hashing for exact duplicate detection.
//!
//! Two operations are offered: a hash over at most the first `limit` bytes
//! of a file (cheap pre-filter) and a hash over the whole file. Both use
//! SHA-256 and render as lowercase hex, which also serves as the duplicate
//! group identifier.

mod content;

pub use content::Sha256Hasher;

use crate::error::HashError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Lowercase hex digest of file content
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentHash(String);

impl ContentHash {
    pub fn from_hex(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 hex digits, for log lines
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(12)]
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Trait for content hashers
///
/// Implement this trait to swap the digest (or to count calls in tests).
pub trait ContentHasher: Send + Sync {
    /// Hash at most the first `limit` bytes of the file
    fn hash_prefix(&self, path: &Path, limit: u64) -> Result<ContentHash, HashError>;

    /// Hash the entire file
    fn hash_full(&self, path: &Path) -> Result<ContentHash, HashError>;

    /// Whether two files have identical content
    fn same_content(&self, a: &Path, b: &Path) -> Result<bool, HashError> {
        Ok(self.hash_full(a)? == self.hash_full(b)?)
    }
}
