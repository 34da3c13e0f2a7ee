//! Candidate selection: top-level media files, oldest first.

use crate::core::scanner::MediaWalker;
use crate::error::ScanError;
use std::collections::BinaryHeap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Media files directly inside `base`, by modification time ascending.
///
/// Ties are ordered by path. With `limit`, only the N oldest are kept,
/// without sorting the whole directory.
pub fn collect_candidates(
    walker: &MediaWalker,
    base: &Path,
    limit: Option<usize>,
) -> Result<Vec<PathBuf>, ScanError> {
    let files = walker.walk(base, false)?;

    let keyed = files.map(|file| (file.modified, file.path));
    let mut selected: Vec<(SystemTime, PathBuf)> = match limit {
        Some(limit) => {
            // Max-heap of the oldest seen so far; the newest is evicted first
            let mut heap = BinaryHeap::with_capacity(limit + 1);
            for entry in keyed {
                heap.push(entry);
                if heap.len() > limit {
                    heap.pop();
                }
            }
            heap.into_vec()
        }
        None => keyed.collect(),
    };

    selected.sort();
    Ok(selected.into_iter().map(|(_, path)| path).collect())
}
