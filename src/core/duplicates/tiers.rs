//! Grouping transforms for tiered hashing.
//!
//! Every tier maps `Buckets<K>` to `Buckets<K2>`, reading only buckets with
//! at least two members. None of these functions touch the filesystem
//! themselves; the key function passed to [`refine`] decides what I/O a
//! tier performs.

use crate::core::scanner::MediaFile;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Files keyed by a grouping key, in key order
pub type Buckets<K> = BTreeMap<K, Vec<MediaFile>>;

/// Tier 1: group by exact byte size
pub fn group_by_size(files: impl IntoIterator<Item = MediaFile>) -> Buckets<u64> {
    let mut buckets: Buckets<u64> = BTreeMap::new();
    for file in files {
        buckets.entry(file.size).or_default().push(file);
    }
    buckets
}

/// Members of buckets that still hold two or more files
pub fn collision_prone<K>(buckets: &Buckets<K>) -> impl Iterator<Item = (&K, &MediaFile)> {
    buckets
        .iter()
        .filter(|(_, members)| members.len() >= 2)
        .flat_map(|(key, members)| members.iter().map(move |m| (key, m)))
}

/// Regroup the collision-prone members of `buckets` under a new key.
///
/// `key` receives the member's current key and the member. A member whose
/// key cannot be computed is dropped from the output and returned alongside
/// the error; the rest of its bucket carries on.
pub fn refine<K, K2, E, F>(buckets: Buckets<K>, mut key: F) -> (Buckets<K2>, Vec<(PathBuf, E)>)
where
    K2: Ord,
    F: FnMut(&K, &MediaFile) -> Result<K2, E>,
{
    let mut refined: Buckets<K2> = BTreeMap::new();
    let mut failures = Vec::new();

    for (old_key, members) in buckets {
        if members.len() < 2 {
            continue;
        }
        for member in members {
            match key(&old_key, &member) {
                Ok(new_key) => refined.entry(new_key).or_default().push(member),
                Err(e) => failures.push((member.path.clone(), e)),
            }
        }
    }

    (refined, failures)
}
