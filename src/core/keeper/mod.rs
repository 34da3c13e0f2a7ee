//! # Keeper Module
//!
//! Picks the one file of a duplicate group that survives consolidation.
//!
//! ## Ordering
//! 1. Metadata-backed capture dates beat modification-time fallbacks
//! 2. Earlier capture date
//! 3. Lexicographically smaller path
//!
//! The last rule also settles ties between fallbacks with identical
//! modification times, so selection is fully deterministic.

use crate::core::duplicates::DuplicateGroup;
use crate::core::scanner::MediaFile;
use crate::core::temporal::{TemporalRecord, TemporalResolver};
use std::collections::HashMap;
use std::path::PathBuf;

/// Pure selection over already-resolved records.
///
/// Members without a record rank by their indexed modification time.
/// Returns `None` only for an empty slice.
pub fn select_keeper<'a>(
    members: &'a [MediaFile],
    records: &HashMap<PathBuf, TemporalRecord>,
) -> Option<&'a MediaFile> {
    members.iter().min_by(|a, b| {
        let ra = record_for(a, records);
        let rb = record_for(b, records);
        (!ra.is_metadata_backed(), ra.captured_at, &a.path).cmp(&(
            !rb.is_metadata_backed(),
            rb.captured_at,
            &b.path,
        ))
    })
}

fn record_for(file: &MediaFile, records: &HashMap<PathBuf, TemporalRecord>) -> TemporalRecord {
    records
        .get(&file.path)
        .cloned()
        .unwrap_or_else(|| TemporalRecord::from_modified(file.modified))
}

/// Resolves capture dates for a group, then selects its keeper
pub struct KeeperSelector<'r> {
    resolver: &'r TemporalResolver,
}

impl<'r> KeeperSelector<'r> {
    pub fn new(resolver: &'r TemporalResolver) -> Self {
        Self { resolver }
    }

    pub fn select<'g>(&self, group: &'g DuplicateGroup) -> Option<&'g MediaFile> {
        let paths = group.paths();
        let records = self.resolver.resolve_batch(&paths);
        select_keeper(&group.members, &records)
    }
}
