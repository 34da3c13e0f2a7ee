//! Grouping of videos by fingerprint, then by content.

use super::{ContentVariant, MediaProbe, NearDuplicateGroup, VideoFingerprint};
use crate::core::duplicates::{refine, Buckets};
use crate::core::hasher::{ContentHasher, Sha256Hasher};
use crate::core::scanner::{MediaFile, MediaKind};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Finds probable re-encodes among video files
pub struct NearDuplicateAnalyzer {
    probe: Box<dyn MediaProbe>,
    hasher: Box<dyn ContentHasher>,
}

impl NearDuplicateAnalyzer {
    pub fn new(probe: Box<dyn MediaProbe>) -> Self {
        Self::with_hasher(probe, Box::new(Sha256Hasher::new()))
    }

    pub fn with_hasher(probe: Box<dyn MediaProbe>, hasher: Box<dyn ContentHasher>) -> Self {
        Self { probe, hasher }
    }

    /// Analyze the videos among `files`; other kinds are ignored
    pub fn analyze(&self, files: &[MediaFile]) -> Vec<NearDuplicateGroup> {
        let mut by_fingerprint: Buckets<VideoFingerprint> = BTreeMap::new();
        for file in files.iter().filter(|f| f.kind == MediaKind::Video) {
            match self.probe.probe(&file.path) {
                Ok(info) => match VideoFingerprint::from_stream(&info) {
                    Some(fp) => by_fingerprint.entry(fp).or_default().push(file.clone()),
                    None => debug!("No usable duration for {}", file.path.display()),
                },
                Err(e) => debug!("Skipping {}: {}", file.path.display(), e),
            }
        }

        // Only fingerprints shared by two or more files get hashed
        let (by_content, failures) = refine(by_fingerprint, |fp, file| {
            self.hasher
                .hash_full(&file.path)
                .map(|hash| (fp.clone(), hash))
        });
        for (path, error) in failures {
            warn!("Skipping {} in re-encode check: {}", path.display(), error);
        }

        let mut variants: BTreeMap<VideoFingerprint, Vec<ContentVariant>> = BTreeMap::new();
        for ((fingerprint, hash), members) in by_content {
            let mut paths: Vec<_> = members.into_iter().map(|m| m.path).collect();
            paths.sort();
            variants
                .entry(fingerprint)
                .or_default()
                .push(ContentVariant { hash, paths });
        }

        variants
            .into_iter()
            .filter(|(_, variants)| variants.len() >= 2)
            .map(|(fingerprint, variants)| NearDuplicateGroup {
                fingerprint,
                variants,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::video::StreamInfo;
    use crate::error::ToolError;
    use std::collections::HashMap;
    use std::fs;
    use std::path::{Path, PathBuf};
    use std::time::SystemTime;
    use tempfile::TempDir;

    struct FakeProbe(HashMap<PathBuf, StreamInfo>);

    impl MediaProbe for FakeProbe {
        fn probe(&self, path: &Path) -> Result<StreamInfo, ToolError> {
            self.0
                .get(path)
                .cloned()
                .ok_or_else(|| ToolError::MalformedOutput {
                    tool: "ffprobe".to_string(),
                    reason: "no stream".to_string(),
                })
        }
    }

    fn video(dir: &Path, name: &str, content: &[u8]) -> MediaFile {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        MediaFile {
            path,
            size: content.len() as u64,
            modified: SystemTime::UNIX_EPOCH,
            kind: MediaKind::Video,
        }
    }

    fn info(width: u32, codec: &str, duration_secs: f64) -> StreamInfo {
        StreamInfo {
            width,
            height: 1080,
            codec: codec.to_string(),
            duration_secs,
        }
    }

    #[test]
    fn re_encodes_with_close_durations_are_grouped() {
        let dir = TempDir::new().unwrap();
        let a = video(dir.path(), "a.mp4", b"encode-one");
        let b = video(dir.path(), "b.mp4", b"encode-two-longer");
        let probe = FakeProbe(HashMap::from([
            (a.path.clone(), info(1920, "h264", 10.1)),
            (b.path.clone(), info(1920, "h264", 10.3)),
        ]));

        let groups = NearDuplicateAnalyzer::new(Box::new(probe)).analyze(&[a, b]);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].variants.len(), 2);
        assert_eq!(groups[0].member_count(), 2);
    }

    #[test]
    fn identical_copies_are_not_near_duplicates() {
        let dir = TempDir::new().unwrap();
        let a = video(dir.path(), "a.mp4", b"same");
        let b = video(dir.path(), "b.mp4", b"same");
        let probe = FakeProbe(HashMap::from([
            (a.path.clone(), info(1920, "h264", 10.0)),
            (b.path.clone(), info(1920, "h264", 10.0)),
        ]));

        assert!(NearDuplicateAnalyzer::new(Box::new(probe))
            .analyze(&[a, b])
            .is_empty());
    }

    #[test]
    fn codec_resolution_or_duration_mismatch_excludes_pair() {
        let dir = TempDir::new().unwrap();
        let base = video(dir.path(), "base.mp4", b"base");
        let hevc = video(dir.path(), "hevc.mp4", b"hevc");
        let small = video(dir.path(), "small.mp4", b"small");
        let long = video(dir.path(), "long.mp4", b"long");
        let probe = FakeProbe(HashMap::from([
            (base.path.clone(), info(1920, "h264", 10.0)),
            (hevc.path.clone(), info(1920, "hevc", 10.0)),
            (small.path.clone(), info(1280, "h264", 10.0)),
            (long.path.clone(), info(1920, "h264", 11.2)),
        ]));

        let groups =
            NearDuplicateAnalyzer::new(Box::new(probe)).analyze(&[base, hevc, small, long]);
        assert!(groups.is_empty());
    }

    #[test]
    fn photos_and_unprobeable_files_are_ignored() {
        let dir = TempDir::new().unwrap();
        let mut photo = video(dir.path(), "a.jpg", b"photo");
        photo.kind = MediaKind::Photo;
        let broken = video(dir.path(), "broken.mp4", b"broken");
        let probe = FakeProbe(HashMap::new());

        assert!(NearDuplicateAnalyzer::new(Box::new(probe))
            .analyze(&[photo, broken])
            .is_empty());
    }
}
