//! Extension-class filtering for the scanner.

use super::{MediaKind, ScanConfig};
use std::collections::HashMap;
use std::path::Path;

/// Classifies paths by extension
#[derive(Debug, Clone)]
pub struct MediaFilter {
    classes: HashMap<String, MediaKind>,
    include_hidden: bool,
    exclude_dir_prefixes: Vec<String>,
}

impl MediaFilter {
    /// Build a filter from the configured extension classes
    pub fn new(config: &ScanConfig) -> Self {
        let mut classes = HashMap::new();
        for (extensions, kind) in [
            (&config.sidecar_extensions, MediaKind::Sidecar),
            (&config.video_extensions, MediaKind::Video),
            (&config.photo_extensions, MediaKind::Photo),
        ] {
            for ext in extensions {
                classes.insert(ext.to_lowercase(), kind);
            }
        }

        Self {
            classes,
            include_hidden: config.include_hidden,
            exclude_dir_prefixes: config.exclude_dir_prefixes.clone(),
        }
    }

    /// Extension class of a path, if it has a recognized extension
    pub fn classify(&self, path: &Path) -> Option<MediaKind> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        self.classes.get(&ext).copied()
    }

    /// Whether a path is an indexable photo or video
    pub fn is_media(&self, path: &Path) -> bool {
        if !self.include_hidden && is_hidden(path) {
            return false;
        }
        self.classify(path).is_some_and(|kind| kind.is_media())
    }

    /// Whether a path is a sidecar companion
    pub fn is_sidecar(&self, path: &Path) -> bool {
        self.classify(path) == Some(MediaKind::Sidecar)
    }

    pub fn include_hidden(&self) -> bool {
        self.include_hidden
    }

    /// Whether the walker should stay out of this directory
    pub fn is_excluded_dir(&self, path: &Path) -> bool {
        if !self.include_hidden && is_hidden(path) {
            return true;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        self.exclude_dir_prefixes
            .iter()
            .any(|prefix| !prefix.is_empty() && name.starts_with(prefix.as_str()))
    }
}

impl Default for MediaFilter {
    fn default() -> Self {
        Self::new(&ScanConfig::default())
    }
}

/// Dot-files and dot-directories
fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|name| name.starts_with('.'))
}
