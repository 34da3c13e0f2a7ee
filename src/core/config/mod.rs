//! # Config Module
//!
//! One immutable configuration value for a whole run.
//!
//! Every section has defaults, so a config file only needs the keys it
//! changes:
//!
//! ```json
//! { "temporal": { "normalization": "utc", "batch_size": 50 } }
//! ```

use crate::core::consolidate::ConsolidateConfig;
use crate::core::duplicates::{DetectorConfig, ReportConfig};
use crate::core::organize::OrganizeConfig;
use crate::core::scanner::ScanConfig;
use crate::core::temporal::TemporalConfig;
use crate::core::video::VideoConfig;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Configuration for every component
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CurateConfig {
    pub scan: ScanConfig,
    pub detector: DetectorConfig,
    pub report: ReportConfig,
    pub temporal: TemporalConfig,
    pub video: VideoConfig,
    pub consolidate: ConsolidateConfig,
    pub organize: OrganizeConfig,
}

impl CurateConfig {
    /// Load from a JSON file
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&content).map_err(|e| ConfigError::Invalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Ok(config.exclude_quarantine())
    }

    /// Keep scans out of the configured quarantine folders
    pub fn exclude_quarantine(mut self) -> Self {
        let prefix = &self.consolidate.quarantine_prefix;
        if !prefix.is_empty() && !self.scan.exclude_dir_prefixes.contains(prefix) {
            self.scan.exclude_dir_prefixes.push(prefix.clone());
        }
        self
    }

    /// `<config dir>/media-curator/config.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("media-curator").join("config.json"))
    }

    /// Load the default config file if it exists, else defaults
    pub fn load_default() -> Result<Self, ConfigError> {
        match Self::default_path() {
            Some(path) if path.is_file() => {
                debug!("Loading config from {}", path.display());
                Self::from_json_file(&path)
            }
            _ => Ok(Self::default()),
        }
    }

    /// Explicit file when given, else [`CurateConfig::load_default`]
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_json_file(path),
            None => Self::load_default(),
        }
    }
}
