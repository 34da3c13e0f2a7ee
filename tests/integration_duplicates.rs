//! Integration tests for duplicate scanning and consolidation.
//!
//! These tests verify end-to-end behavior including:
//! - Grouping and savings across nested folders
//! - Identical results with and without the partial-hash tier
//! - Keepers surviving both consolidation modes
//! - Reports and journals written next to the scanned tree

use media_curator::core::consolidate::{
    ConsolidateConfig, ConsolidationExecutor, ConsolidationMode, ConsolidationPlan,
};
use media_curator::core::duplicates::{DetectorConfig, GroupRecord};
use media_curator::core::journal::{ActionKind, JournalEntry};
use media_curator::core::keeper::KeeperSelector;
use media_curator::core::pipeline::{Pipeline, PipelineResult};
use media_curator::core::scanner::{MediaFilter, ScanConfig};
use media_curator::core::temporal::{
    MetadataSource, TagRecord, TemporalConfig, TemporalResolver,
};
use media_curator::error::ToolError;
use serde_json::json;
use std::collections::HashMap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::{Duration, UNIX_EPOCH};
use tempfile::TempDir;

fn create(dir: &Path, name: &str, content: &[u8], secs: u64) -> PathBuf {
    let path = dir.join(name);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, content).unwrap();
    File::options()
        .write(true)
        .open(&path)
        .unwrap()
        .set_modified(UNIX_EPOCH + Duration::from_secs(secs))
        .unwrap();
    path
}

/// Three copies of one photo, two of one video, and a unique photo
fn library(dir: &Path) {
    let photo = vec![7u8; 3000];
    create(dir, "a/IMG_1.jpg", &photo, 1_600_000_000);
    create(dir, "b/IMG_1 copy.jpg", &photo, 1_500_000_000);
    create(dir, "c/deep/IMG_1.JPG", &photo, 1_650_000_000);
    create(dir, "a/clip.mp4", b"not really a video", 1_600_000_000);
    create(dir, "backup/clip.mp4", b"not really a video", 1_600_000_000);
    create(dir, "a/unique.png", &[1u8; 3000], 1_600_000_000);
    create(dir, "a/notes.txt", &photo, 1_600_000_000);
}

fn scan(dir: &Path, partial_tier: bool) -> PipelineResult {
    Pipeline::builder(dir)
        .recursive(true)
        .detector_config(DetectorConfig {
            partial_hash_bytes: 16,
            partial_tier,
        })
        .build()
        .run()
        .unwrap()
}

/// Capture dates by file name, reported the way exiftool reports them
struct DatedSource(HashMap<&'static str, &'static str>);

impl MetadataSource for DatedSource {
    fn read_tags(&self, files: &[PathBuf]) -> Result<Vec<TagRecord>, ToolError> {
        Ok(files
            .iter()
            .map(|file| {
                let mut record = TagRecord::new();
                record.insert("SourceFile".to_string(), json!(file.to_string_lossy()));
                let name = file.file_name().unwrap().to_str().unwrap();
                if let Some(date) = self.0.get(name) {
                    record.insert("DateTimeOriginal".to_string(), json!(date));
                }
                record
            })
            .collect())
    }
}

fn quarantine_executor(dir: &Path) -> ConsolidationExecutor {
    ConsolidationExecutor::new(
        dir,
        ConsolidationMode::Quarantine,
        ConsolidateConfig::default(),
        MediaFilter::new(&ScanConfig::default()),
    )
}

fn mtime_resolver() -> TemporalResolver {
    TemporalResolver::new(TemporalConfig::default(), None)
}

fn plans(result: &PipelineResult, resolver: &TemporalResolver) -> Vec<ConsolidationPlan> {
    let selector = KeeperSelector::new(resolver);
    result
        .detection
        .groups
        .iter()
        .map(|group| ConsolidationPlan::new(group, selector.select(group).unwrap()))
        .collect()
}

#[test]
fn scan_finds_groups_and_savings_across_folders() {
    let dir = TempDir::new().unwrap();
    library(dir.path());

    let result = scan(dir.path(), true);

    assert_eq!(result.detection.total_files, 6);
    assert_eq!(result.detection.groups.len(), 2);
    assert_eq!(result.detection.groups[0].member_count(), 3);
    assert_eq!(result.detection.groups[1].member_count(), 2);

    let summary = result.summary();
    assert_eq!(summary.duplicate_count, 3);
    assert_eq!(
        summary.potential_savings_bytes,
        2 * 3000 + b"not really a video".len() as u64
    );
}

#[test]
fn partial_tier_does_not_change_groups() {
    let dir = TempDir::new().unwrap();
    library(dir.path());

    let with_partial = scan(dir.path(), true);
    let without_partial = scan(dir.path(), false);

    let groups = |r: &PipelineResult| {
        r.detection
            .groups
            .iter()
            .map(|g| (g.hash.clone(), g.paths()))
            .collect::<Vec<_>>()
    };
    assert_eq!(groups(&with_partial), groups(&without_partial));
}

#[test]
fn scan_without_duplicates_reports_nothing() {
    let dir = TempDir::new().unwrap();
    create(dir.path(), "one.jpg", b"one", 1_600_000_000);
    create(dir.path(), "two.jpg", b"two", 1_600_000_000);

    let result = scan(dir.path(), true);

    assert!(result.detection.groups.is_empty());
    assert_eq!(result.summary().potential_savings_bytes, 0);
}

#[test]
fn scan_writes_report_files() {
    let dir = TempDir::new().unwrap();
    library(dir.path());

    let result = scan(dir.path(), true);

    let report = result.report.expect("report written");
    let text = fs::read_to_string(report.text_path()).unwrap();
    assert!(text.contains("IMG_1 copy.jpg"));
    assert!(dir.path().join("duplicates_scan.jsonl").exists());
}

#[test]
fn missing_directory_is_an_error() {
    let dir = TempDir::new().unwrap();
    let result = Pipeline::builder(dir.path().join("nope")).build().run();
    assert!(result.is_err());
}

#[test]
fn quarantine_keeps_oldest_copy_and_moves_the_rest() {
    let dir = TempDir::new().unwrap();
    library(dir.path());
    create(dir.path(), "c/deep/IMG_1.xmp", b"<xmp/>", 1_650_000_000);
    let resolver = mtime_resolver();

    let result = scan(dir.path(), true);
    let plans = plans(&result, &resolver);
    let photo_plan = &plans[0];
    assert!(photo_plan.keeper.ends_with("b/IMG_1 copy.jpg"));

    let executor = ConsolidationExecutor::new(
        dir.path(),
        ConsolidationMode::Quarantine,
        ConsolidateConfig::default(),
        MediaFilter::new(&ScanConfig::default()),
    );
    let outcome = executor.execute(&plans, |_, _, _| {});

    assert_eq!(outcome.removed, 3);
    assert_eq!(outcome.sidecars, 1);
    assert!(outcome.failures.is_empty());
    for plan in &plans {
        assert!(plan.keeper.exists(), "keeper {} moved", plan.keeper.display());
        for path in &plan.remove {
            assert!(!path.exists());
        }
    }
    assert!(!dir.path().join("c/deep/IMG_1.xmp").exists());

    let quarantine = outcome.quarantine_dir.unwrap();
    let name = quarantine.file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("_Quarantine_"));
    let held = quarantine.join(photo_plan.group.as_str());
    assert!(held.join("IMG_1.jpg").exists());
    assert!(held.join("IMG_1.xmp").exists());

    let log = fs::read_to_string(executor.journal().text_path()).unwrap();
    assert!(log.contains("MOVED"));
}

#[test]
fn same_named_copies_do_not_overwrite_each_other_in_quarantine() {
    let dir = TempDir::new().unwrap();
    create(dir.path(), "keep/IMG.jpg", b"dup", 1_500_000_000);
    create(dir.path(), "x/IMG.jpg", b"dup", 1_600_000_000);
    create(dir.path(), "y/IMG.jpg", b"dup", 1_600_000_000);
    let resolver = mtime_resolver();

    let result = scan(dir.path(), true);
    let executor = ConsolidationExecutor::new(
        dir.path(),
        ConsolidationMode::Quarantine,
        ConsolidateConfig::default(),
        MediaFilter::new(&ScanConfig::default()),
    );
    let outcome = executor.execute(&plans(&result, &resolver), |_, _, _| {});

    assert_eq!(outcome.removed, 2);
    let held = outcome
        .quarantine_dir
        .unwrap()
        .join(result.detection.groups[0].hash.as_str());
    assert_eq!(fs::read_dir(held).unwrap().count(), 2);
    assert!(dir.path().join("keep/IMG.jpg").exists());
}

#[test]
fn delete_mode_removes_copies_and_rescan_is_clean() {
    let dir = TempDir::new().unwrap();
    library(dir.path());
    let resolver = mtime_resolver();

    let result = scan(dir.path(), true);
    let executor = ConsolidationExecutor::new(
        dir.path(),
        ConsolidationMode::Delete,
        ConsolidateConfig::default(),
        MediaFilter::new(&ScanConfig::default()),
    );
    let outcome = executor.execute(&plans(&result, &resolver), |_, _, _| {});

    assert_eq!(outcome.removed, 3);
    assert!(outcome.quarantine_dir.is_none());
    assert_eq!(
        outcome.bytes_reclaimed,
        result.summary().potential_savings_bytes
    );

    let rescan = scan(dir.path(), true);
    assert!(rescan.detection.groups.is_empty());
    assert_eq!(rescan.detection.total_files, 3);
}

#[test]
fn earliest_metadata_date_keeps_and_two_copies_are_quarantined() {
    let dir = TempDir::new().unwrap();
    let content = vec![42u8; 5 * 1024 * 1024];
    // Oldest mtime, but no capture date in its metadata
    create(dir.path(), "c/scan.jpg", &content, 1_000_000_000);
    create(dir.path(), "a/late.jpg", &content, 1_600_000_000);
    create(dir.path(), "b/early.jpg", &content, 1_600_000_000);
    let resolver = TemporalResolver::new(
        TemporalConfig::default(),
        Some(Box::new(DatedSource(HashMap::from([
            ("late.jpg", "2020:05:01 09:00:00"),
            ("early.jpg", "2018:05:01 09:00:00"),
        ])))),
    );

    let result = scan(dir.path(), true);
    assert_eq!(result.detection.groups.len(), 1);
    assert_eq!(result.detection.groups[0].member_count(), 3);

    let plans = plans(&result, &resolver);
    assert!(plans[0].keeper.ends_with("b/early.jpg"));

    let executor = quarantine_executor(dir.path());
    let outcome = executor.execute(&plans, |_, _, _| {});
    assert_eq!(outcome.removed, 2);

    let held = outcome.quarantine_dir.unwrap().join(plans[0].group.as_str());
    assert_eq!(fs::read_dir(&held).unwrap().count(), 2);
    assert!(dir.path().join("b/early.jpg").exists());

    let entries: Vec<JournalEntry> = fs::read_to_string(dir.path().join("duplicates_action.jsonl"))
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    let moved: Vec<&JournalEntry> = entries
        .iter()
        .filter(|e| e.action == ActionKind::Moved)
        .collect();
    assert_eq!(moved.len(), 2);
    for entry in moved {
        assert_eq!(entry.group.as_ref(), Some(&plans[0].group));
        assert!(entry.destination.as_ref().unwrap().starts_with(&held));
    }
}

#[test]
fn rescan_ignores_quarantine_and_keeps_previous_keeper() {
    let dir = TempDir::new().unwrap();
    let album = create(dir.path(), "album/IMG.jpg", b"same photo", 1_600_000_000);
    create(dir.path(), "backup/IMG.jpg", b"same photo", 1_600_000_000);
    let resolver = mtime_resolver();

    let first = scan(dir.path(), true);
    quarantine_executor(dir.path()).execute(&plans(&first, &resolver), |_, _, _| {});
    assert!(album.exists());

    let second = scan(dir.path(), true);
    assert!(second.detection.groups.is_empty());
    assert_eq!(second.detection.total_files, 1);

    quarantine_executor(dir.path()).execute(&plans(&second, &resolver), |_, _, _| {});
    assert!(album.exists());
}

#[test]
fn scan_records_accumulate_per_run() {
    let dir = TempDir::new().unwrap();
    create(dir.path(), "a.jpg", b"pair", 1_600_000_000);
    create(dir.path(), "b.jpg", b"pair", 1_600_000_000);

    scan(dir.path(), false);
    scan(dir.path(), false);

    let records: Vec<GroupRecord> = fs::read_to_string(dir.path().join("duplicates_scan.jsonl"))
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].group, records[1].group);
    assert_ne!(records[0].scan_id, records[1].scan_id);
}
