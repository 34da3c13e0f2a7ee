//! Scan report writers: a human-readable text report and a JSON-lines stream.

use super::{DetectionResult, DuplicateGroup};
use crate::core::hasher::ContentHash;
use crate::core::journal::append_line;
use crate::core::video::NearDuplicateGroup;
use crate::error::JournalError;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// One JSON line per duplicate group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupRecord {
    /// Shared by every record of one scan
    pub scan_id: Uuid,
    pub scanned_at: DateTime<Local>,
    pub group: ContentHash,
    pub members: usize,
    pub size: u64,
    pub potential_savings: u64,
    pub paths: Vec<PathBuf>,
}

impl GroupRecord {
    pub fn new(scan_id: Uuid, scanned_at: DateTime<Local>, group: &DuplicateGroup) -> Self {
        Self {
            scan_id,
            scanned_at,
            group: group.hash.clone(),
            members: group.member_count(),
            size: group.size,
            potential_savings: group.potential_savings(),
            paths: group.paths(),
        }
    }
}

/// Report file names, relative to the scanned base directory
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub text_file: PathBuf,
    pub records_file: PathBuf,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            text_file: PathBuf::from("duplicates_scan.txt"),
            records_file: PathBuf::from("duplicates_scan.jsonl"),
        }
    }
}

/// Writes the results of one scan.
///
/// The text report is overwritten per scan; the JSON-lines stream is
/// append-only, one record per group tagged with the scan id.
#[derive(Debug, Clone)]
pub struct ScanReport {
    text_path: PathBuf,
    records_path: PathBuf,
}

impl ScanReport {
    pub fn new(text_path: PathBuf, records_path: PathBuf) -> Self {
        Self {
            text_path,
            records_path,
        }
    }

    /// Report files inside `base`
    pub fn in_dir(base: &Path, config: &ReportConfig) -> Self {
        Self::new(base.join(&config.text_file), base.join(&config.records_file))
    }

    pub fn text_path(&self) -> &Path {
        &self.text_path
    }

    pub fn records_path(&self) -> &Path {
        &self.records_path
    }

    /// Write both report files, returning the scan id stamped on the records
    pub fn write(
        &self,
        base: &Path,
        recursive: bool,
        result: &DetectionResult,
        near_duplicates: &[NearDuplicateGroup],
    ) -> Result<Uuid, JournalError> {
        let text = render_text(base, recursive, result, near_duplicates);
        fs::write(&self.text_path, text).map_err(|source| JournalError::Write {
            path: self.text_path.clone(),
            source,
        })?;

        let scan_id = Uuid::new_v4();
        let scanned_at = Local::now();
        for group in &result.groups {
            let record = GroupRecord::new(scan_id, scanned_at, group);
            append_line(&self.records_path, &serde_json::to_string(&record)?)?;
        }
        Ok(scan_id)
    }
}

fn render_text(
    base: &Path,
    recursive: bool,
    result: &DetectionResult,
    near_duplicates: &[NearDuplicateGroup],
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Duplicate report - generated {}", Local::now().to_rfc3339());
    let _ = writeln!(out, "Base directory: {}", base.display());
    let _ = writeln!(out, "Recursive: {}", if recursive { "yes" } else { "no" });
    let _ = writeln!(
        out,
        "Files indexed: {} (total data: {})\n",
        result.total_files,
        format_bytes(result.total_bytes)
    );

    for (i, group) in result.groups.iter().enumerate() {
        let _ = writeln!(
            out,
            "[{}] SHA256={}  members={}  size={}  potential_savings={}",
            i + 1,
            group.hash,
            group.member_count(),
            format_bytes(group.size),
            format_bytes(group.potential_savings())
        );
        for member in &group.members {
            let _ = writeln!(out, "    - {}", member.path.display());
        }
        out.push('\n');
    }

    if !near_duplicates.is_empty() {
        let _ = writeln!(out, "=== PROBABLE RE-ENCODES (not consolidated) ===");
        for (i, group) in near_duplicates.iter().enumerate() {
            let _ = writeln!(
                out,
                "[{}] {}  variants={}",
                i + 1,
                group.fingerprint,
                group.variants.len()
            );
            for variant in &group.variants {
                for path in &variant.paths {
                    let _ = writeln!(out, "    - {} ({})", path.display(), variant.hash.short());
                }
            }
            out.push('\n');
        }
    }

    let _ = writeln!(out, "=== SUMMARY ===");
    let _ = writeln!(out, "Duplicate groups: {}", result.groups.len());
    let _ = writeln!(
        out,
        "Potential space savings: {}",
        format_bytes(result.potential_savings())
    );
    if !near_duplicates.is_empty() {
        let _ = writeln!(out, "Probable re-encode groups: {}", near_duplicates.len());
    }
    out
}

/// Binary units with two decimals, e.g. `4.77 MB`
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.2} {}", value, UNITS[unit])
}
