//! Batched capture-date resolution with modification-time fallback.

use super::parse::{normalize, parse_date_value, string_values};
use super::{
    absolute, DateSource, ExifTool, MetadataSource, TagRecord, TemporalConfig, TemporalRecord,
    DATE_TAGS,
};
use crate::error::ScanError;
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Resolves capture dates for media files
pub struct TemporalResolver {
    config: TemporalConfig,
    source: Option<Box<dyn MetadataSource>>,
}

impl TemporalResolver {
    pub fn new(config: TemporalConfig, source: Option<Box<dyn MetadataSource>>) -> Self {
        Self { config, source }
    }

    /// Resolver backed by exiftool when it can be launched
    pub fn detect(config: TemporalConfig) -> Self {
        let source =
            ExifTool::detect(&config).map(|tool| Box::new(tool) as Box<dyn MetadataSource>);
        Self::new(config, source)
    }

    pub fn has_metadata_source(&self) -> bool {
        self.source.is_some()
    }

    pub fn config(&self) -> &TemporalConfig {
        &self.config
    }

    /// Resolve many files, one tool invocation per batch.
    ///
    /// Every file whose modification time can be read gets a record.
    pub fn resolve_batch(&self, files: &[PathBuf]) -> HashMap<PathBuf, TemporalRecord> {
        let mut resolved = HashMap::with_capacity(files.len());
        for chunk in files.chunks(self.config.batch_size.max(1)) {
            let mut from_tags = self.read_chunk(chunk);
            for path in chunk {
                if let Some(record) = from_tags.remove(path) {
                    resolved.insert(path.clone(), record);
                    continue;
                }
                match self.fallback(path) {
                    Ok(record) => {
                        resolved.insert(path.clone(), record);
                    }
                    Err(e) => warn!("Cannot date {}: {}", path.display(), e),
                }
            }
        }
        resolved
    }

    /// Resolve a single file
    pub fn resolve(&self, path: &Path) -> Result<TemporalRecord, ScanError> {
        let chunk = [path.to_path_buf()];
        match self.read_chunk(&chunk).remove(path) {
            Some(record) => Ok(record),
            None => self.fallback(path),
        }
    }

    /// First parsable date in priority order
    pub fn pick_date(&self, record: &TagRecord) -> Option<TemporalRecord> {
        for tag in DATE_TAGS {
            let Some(value) = lookup(record, tag) else {
                continue;
            };
            for candidate in string_values(value) {
                if let Some(parsed) = parse_date_value(&candidate) {
                    let offset = match parsed {
                        super::ParsedDate::Offset(dt) => Some(*dt.offset()),
                        super::ParsedDate::Naive(_) => None,
                    };
                    return Some(TemporalRecord {
                        captured_at: normalize(parsed, self.config.normalization),
                        offset,
                        source: DateSource::Tag(tag.to_string()),
                        normalization: self.config.normalization,
                    });
                }
            }
        }
        None
    }

    fn read_chunk(&self, chunk: &[PathBuf]) -> HashMap<PathBuf, TemporalRecord> {
        let mut resolved = HashMap::new();
        let Some(source) = &self.source else {
            return resolved;
        };

        let absolute_paths: Vec<PathBuf> = chunk.iter().map(|p| absolute(p)).collect();
        let records = match source.read_tags(&absolute_paths) {
            Ok(records) => records,
            Err(e) => {
                warn!(
                    "No metadata for {} file(s), falling back to modification time: {}",
                    chunk.len(),
                    e
                );
                return resolved;
            }
        };

        let index: HashMap<String, usize> = absolute_paths
            .iter()
            .enumerate()
            .map(|(i, p)| (source_key(&p.to_string_lossy()), i))
            .collect();
        let positional = records.len() == chunk.len();

        for (position, record) in records.iter().enumerate() {
            let slot = match record.get("SourceFile").and_then(Value::as_str) {
                Some(source_file) => index.get(&source_key(source_file)).copied(),
                None if positional => Some(position),
                None => None,
            };
            let Some(slot) = slot else {
                debug!("Ignoring exiftool record that matches no requested file");
                continue;
            };

            let path = &chunk[slot];
            match self.pick_date(record) {
                Some(resolved_date) => {
                    debug!(
                        "{}: {} ({})",
                        path.display(),
                        resolved_date.captured_at,
                        resolved_date.source
                    );
                    resolved.insert(path.clone(), resolved_date);
                }
                None => debug!("No parsable metadata date for {}", path.display()),
            }
        }
        resolved
    }

    fn fallback(&self, path: &Path) -> Result<TemporalRecord, ScanError> {
        let modified = fs::metadata(path)
            .and_then(|m| m.modified())
            .map_err(|source| ScanError::Metadata {
                path: path.to_path_buf(),
                source,
            })?;
        if self.source.is_some() {
            warn!("Using modification time for {}", path.display());
        }
        Ok(TemporalRecord::from_modified(modified))
    }
}

/// Tag value, trying the bare name when the tag carries a group prefix
fn lookup<'a>(record: &'a TagRecord, tag: &str) -> Option<&'a Value> {
    record.get(tag).or_else(|| {
        tag.split_once(':')
            .and_then(|(_, bare)| record.get(bare))
    })
}

/// exiftool reports Windows paths with forward slashes
fn source_key(path: &str) -> String {
    if cfg!(windows) {
        path.replace('\\', "/").to_lowercase()
    } else {
        path.to_string()
    }
}
