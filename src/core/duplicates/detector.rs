//! Tiered duplicate detection.

use super::tiers::{collision_prone, group_by_size, refine, Buckets};
use super::DuplicateGroup;
use crate::core::hasher::{ContentHasher, Sha256Hasher};
use crate::core::scanner::MediaFile;
use crate::error::HashError;
use crate::events::{
    null_sender, DetectEvent, Event, EventSender, HashTier, ScanEvent, TierProgress,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// How often indexing progress is reported
const INDEX_PROGRESS_INTERVAL: usize = 1000;

/// Configuration for duplicate detection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Bytes hashed by the partial tier
    pub partial_hash_bytes: u64,
    /// Run the partial tier; when off, every size collision is fully hashed
    pub partial_tier: bool,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            partial_hash_bytes: 4 * 1024 * 1024,
            partial_tier: true,
        }
    }
}

/// Outcome of a detection run
#[derive(Debug, Default)]
pub struct DetectionResult {
    /// Groups sorted by member count (largest first), then by hash
    pub groups: Vec<DuplicateGroup>,
    /// Files indexed
    pub total_files: usize,
    /// Bytes indexed
    pub total_bytes: u64,
    /// Files dropped because they could not be read (non-fatal)
    pub errors: Vec<String>,
}

impl DetectionResult {
    /// Files removable by keeping one copy per group
    pub fn duplicate_count(&self) -> usize {
        self.groups.iter().map(|g| g.member_count() - 1).sum()
    }

    pub fn potential_savings(&self) -> u64 {
        self.groups.iter().map(|g| g.potential_savings()).sum()
    }
}

/// Size, then prefix, then full-content grouping
pub struct DuplicateDetector {
    config: DetectorConfig,
    hasher: Box<dyn ContentHasher>,
}

impl DuplicateDetector {
    /// Create a detector hashing with SHA-256
    pub fn new(config: DetectorConfig) -> Self {
        Self::with_hasher(config, Box::new(Sha256Hasher::new()))
    }

    /// Create a detector with a custom hasher
    pub fn with_hasher(config: DetectorConfig, hasher: Box<dyn ContentHasher>) -> Self {
        Self { config, hasher }
    }

    /// Run detection without events
    pub fn detect(&self, files: impl IntoIterator<Item = MediaFile>) -> DetectionResult {
        self.detect_with_events(files, &null_sender())
    }

    /// Run detection, reporting progress through `events`
    pub fn detect_with_events(
        &self,
        files: impl IntoIterator<Item = MediaFile>,
        events: &EventSender,
    ) -> DetectionResult {
        let mut total_files = 0usize;
        let mut total_bytes = 0u64;
        let indexed = files.into_iter().inspect(|file| {
            total_files += 1;
            total_bytes += file.size;
            if total_files % INDEX_PROGRESS_INTERVAL == 0 {
                events.send(Event::Scan(ScanEvent::Progress {
                    files_indexed: total_files,
                }));
            }
        });

        // Tier 1
        let by_size = group_by_size(indexed);
        events.send(Event::Scan(ScanEvent::Completed {
            total_files,
            total_bytes,
        }));
        let size_candidates = collision_prone(&by_size).count();
        info!(
            "Indexed {} files; {} share a size with another file",
            total_files, size_candidates
        );
        events.send(Event::Detect(DetectEvent::TierCompleted {
            tier: HashTier::Size,
            remaining: size_candidates,
        }));

        let mut errors = Vec::new();

        // Tier 2
        let by_full = if self.config.partial_tier {
            let by_prefix = self.run_tier(HashTier::Partial, by_size, events, &mut errors, |f| {
                self.hasher
                    .hash_prefix(&f.path, self.config.partial_hash_bytes)
                    .map(|h| (f.size, h))
            });
            // Tier 3
            self.run_tier(HashTier::Full, by_prefix, events, &mut errors, |f| {
                self.hasher.hash_full(&f.path)
            })
        } else {
            self.run_tier(HashTier::Full, by_size, events, &mut errors, |f| {
                self.hasher.hash_full(&f.path)
            })
        };

        let mut groups: Vec<DuplicateGroup> = by_full
            .into_iter()
            .filter(|(_, members)| members.len() >= 2)
            .map(|(hash, members)| DuplicateGroup::new(hash, members))
            .collect();
        groups.sort_by(|a, b| {
            b.member_count()
                .cmp(&a.member_count())
                .then_with(|| a.hash.cmp(&b.hash))
        });

        info!("Found {} duplicate groups", groups.len());

        DetectionResult {
            groups,
            total_files,
            total_bytes,
            errors,
        }
    }

    /// Refine one tier, reporting progress and collecting per-file failures
    fn run_tier<K, K2, F>(
        &self,
        tier: HashTier,
        buckets: Buckets<K>,
        events: &EventSender,
        errors: &mut Vec<String>,
        mut key: F,
    ) -> Buckets<K2>
    where
        K2: Ord,
        F: FnMut(&MediaFile) -> Result<K2, HashError>,
    {
        let total = collision_prone(&buckets).count();
        events.send(Event::Detect(DetectEvent::TierStarted {
            tier,
            candidates: total,
        }));
        debug!("{}: {} candidates", tier, total);

        let mut completed = 0usize;
        let (refined, failures) = refine(buckets, |_, file| {
            completed += 1;
            events.send(Event::Detect(DetectEvent::TierProgress(TierProgress {
                tier,
                completed,
                total,
                current_path: file.path.clone(),
            })));
            key(file)
        });

        for (path, error) in failures {
            warn!("Dropping {} from duplicate search: {}", path.display(), error);
            events.send(Event::Detect(DetectEvent::Error {
                path,
                message: error.to_string(),
            }));
            errors.push(error.to_string());
        }

        events.send(Event::Detect(DetectEvent::TierCompleted {
            tier,
            remaining: collision_prone(&refined).count(),
        }));
        refined
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::hasher::ContentHash;
    use crate::core::scanner::{MediaKind, MediaWalker, ScanConfig};
    use std::fs;
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::SystemTime;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn index(dir: &Path) -> Vec<MediaFile> {
        MediaWalker::new(ScanConfig::default())
            .walk(dir, true)
            .unwrap()
            .collect()
    }

    /// Counts full-hash calls to check that tiering avoids work
    struct CountingHasher {
        inner: Sha256Hasher,
        full_calls: Arc<AtomicUsize>,
    }

    impl ContentHasher for CountingHasher {
        fn hash_prefix(&self, path: &Path, limit: u64) -> Result<ContentHash, HashError> {
            self.inner.hash_prefix(path, limit)
        }

        fn hash_full(&self, path: &Path) -> Result<ContentHash, HashError> {
            self.full_calls.fetch_add(1, Ordering::SeqCst);
            self.inner.hash_full(path)
        }
    }

    #[test]
    fn groups_identical_files() {
        let dir = TempDir::new().unwrap();
        let content = vec![7u8; 5 * 1024];
        write(dir.path(), "a.jpg", &content);
        write(dir.path(), "b.jpg", &content);
        write(dir.path(), "c.jpg", &content);
        write(dir.path(), "different.jpg", &[1u8; 5 * 1024]);
        write(dir.path(), "unique.jpg", b"short");

        let result = DuplicateDetector::new(DetectorConfig::default()).detect(index(dir.path()));

        assert_eq!(result.total_files, 5);
        assert_eq!(result.groups.len(), 1);
        assert_eq!(result.groups[0].member_count(), 3);
        assert_eq!(result.duplicate_count(), 2);
        assert_eq!(result.potential_savings(), 2 * 5 * 1024);
    }

    #[test]
    fn same_prefix_different_tail_is_not_a_duplicate() {
        let dir = TempDir::new().unwrap();
        let mut a = vec![0u8; 64];
        let mut b = vec![0u8; 64];
        a[63] = 1;
        b[63] = 2;
        write(dir.path(), "a.mov", &a);
        write(dir.path(), "b.mov", &b);

        let config = DetectorConfig {
            partial_hash_bytes: 16,
            ..Default::default()
        };
        let result = DuplicateDetector::new(config).detect(index(dir.path()));

        assert!(result.groups.is_empty());
    }

    #[test]
    fn unique_sizes_are_never_fully_hashed() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.jpg", b"one");
        write(dir.path(), "b.jpg", b"three");
        write(dir.path(), "c.jpg", b"fivefive");

        let calls = Arc::new(AtomicUsize::new(0));
        let hasher = CountingHasher {
            inner: Sha256Hasher::new(),
            full_calls: calls.clone(),
        };
        let detector = DuplicateDetector::with_hasher(DetectorConfig::default(), Box::new(hasher));
        let result = detector.detect(index(dir.path()));

        assert!(result.groups.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn distinct_prefixes_skip_the_full_tier() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.jpg", b"AAAA-tail");
        write(dir.path(), "b.jpg", b"BBBB-tail");

        let calls = Arc::new(AtomicUsize::new(0));
        let hasher = CountingHasher {
            inner: Sha256Hasher::new(),
            full_calls: calls.clone(),
        };
        let config = DetectorConfig {
            partial_hash_bytes: 4,
            ..Default::default()
        };
        DuplicateDetector::with_hasher(config, Box::new(hasher)).detect(index(dir.path()));

        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn unreadable_member_is_dropped_without_aborting() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.jpg", b"same");
        write(dir.path(), "b.jpg", b"same");
        let mut files = index(dir.path());
        files.push(MediaFile {
            path: dir.path().join("vanished.jpg"),
            size: 4,
            modified: SystemTime::UNIX_EPOCH,
            kind: MediaKind::Photo,
        });

        let result = DuplicateDetector::new(DetectorConfig::default()).detect(files);

        assert_eq!(result.groups.len(), 1);
        assert_eq!(result.groups[0].member_count(), 2);
        assert_eq!(result.errors.len(), 1);
    }

    #[test]
    fn groups_are_ordered_by_size_of_group() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "pair1.jpg", b"pair");
        write(dir.path(), "pair2.jpg", b"pair");
        write(dir.path(), "trio1.jpg", b"trio!");
        write(dir.path(), "trio2.jpg", b"trio!");
        write(dir.path(), "trio3.jpg", b"trio!");

        let result = DuplicateDetector::new(DetectorConfig::default()).detect(index(dir.path()));

        assert_eq!(result.groups.len(), 2);
        assert_eq!(result.groups[0].member_count(), 3);
        assert_eq!(result.groups[1].member_count(), 2);
    }
}
