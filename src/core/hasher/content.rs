//! SHA-256 implementation of [`ContentHasher`].

use super::{ContentHash, ContentHasher};
use crate::error::HashError;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

const BUFFER_SIZE: usize = 1024 * 1024;

/// Streams files through SHA-256 in 1 MiB chunks
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Hasher;

impl Sha256Hasher {
    pub fn new() -> Self {
        Self
    }

    fn digest(&self, path: &Path, limit: Option<u64>) -> Result<ContentHash, HashError> {
        let io_error = |source| HashError::Io {
            path: path.to_path_buf(),
            source,
        };

        let file = File::open(path).map_err(io_error)?;
        let mut reader = BufReader::with_capacity(BUFFER_SIZE, file);
        let mut hasher = Sha256::new();
        let mut buffer = vec![0u8; BUFFER_SIZE];
        let mut remaining = limit.unwrap_or(u64::MAX);

        while remaining > 0 {
            let want = remaining.min(BUFFER_SIZE as u64) as usize;
            let read = reader.read(&mut buffer[..want]).map_err(io_error)?;
            if read == 0 {
                break;
            }
            hasher.update(&buffer[..read]);
            remaining -= read as u64;
        }

        Ok(ContentHash::from_hex(format!("{:x}", hasher.finalize())))
    }
}

impl ContentHasher for Sha256Hasher {
    fn hash_prefix(&self, path: &Path, limit: u64) -> Result<ContentHash, HashError> {
        self.digest(path, Some(limit))
    }

    fn hash_full(&self, path: &Path) -> Result<ContentHash, HashError> {
        self.digest(path, None)
    }
}
