//! Directory walking implementation using walkdir.

use super::{MediaFile, MediaFilter, ScanConfig};
use crate::error::ScanError;
use std::fs;
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;

/// Walks a directory tree and yields indexable media files
#[derive(Debug, Clone)]
pub struct MediaWalker {
    config: ScanConfig,
    filter: MediaFilter,
}

impl MediaWalker {
    /// Create a new walker with the given configuration
    pub fn new(config: ScanConfig) -> Self {
        let filter = MediaFilter::new(&config);
        Self { config, filter }
    }

    pub fn filter(&self) -> &MediaFilter {
        &self.filter
    }

    /// Start walking `root`.
    ///
    /// Fails only if `root` itself cannot be read. Unreadable entries below
    /// it are skipped by the returned iterator.
    pub fn walk(&self, root: &Path, recursive: bool) -> Result<MediaIter, ScanError> {
        if !root.is_dir() {
            return Err(ScanError::DirectoryNotFound {
                path: root.to_path_buf(),
            });
        }
        fs::read_dir(root).map_err(|source| ScanError::Unreadable {
            path: root.to_path_buf(),
            source,
        })?;

        let mut walker = WalkDir::new(root)
            .follow_links(self.config.follow_symlinks)
            .sort_by_file_name();
        if !recursive {
            walker = walker.max_depth(1);
        }

        Ok(MediaIter {
            inner: walker.into_iter(),
            filter: self.filter.clone(),
        })
    }
}

/// Lazy sequence of media files produced by [`MediaWalker::walk`]
pub struct MediaIter {
    inner: walkdir::IntoIter,
    filter: MediaFilter,
}

impl Iterator for MediaIter {
    type Item = MediaFile;

    fn next(&mut self) -> Option<MediaFile> {
        loop {
            let entry = match self.inner.next()? {
                Ok(entry) => entry,
                Err(e) => {
                    debug!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };

            if entry.file_type().is_dir() {
                if entry.depth() > 0 && self.filter.is_excluded_dir(entry.path()) {
                    debug!("Not entering {}", entry.path().display());
                    self.inner.skip_current_dir();
                }
                continue;
            }

            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            if !self.filter.is_media(path) {
                continue;
            }
            let Some(kind) = self.filter.classify(path) else {
                continue;
            };

            match entry.metadata() {
                Ok(metadata) => {
                    return Some(MediaFile {
                        path: path.to_path_buf(),
                        size: metadata.len(),
                        modified: metadata
                            .modified()
                            .unwrap_or(std::time::SystemTime::UNIX_EPOCH),
                        kind,
                    })
                }
                Err(e) => {
                    debug!("Skipping {}: {}", path.display(), e);
                    continue;
                }
            }
        }
    }
}
