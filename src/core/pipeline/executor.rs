//! Pipeline execution implementation.

use crate::core::duplicates::{
    DetectionResult, DetectorConfig, DuplicateDetector, ReportConfig, ScanReport,
};
use crate::core::hasher::ContentHasher;
use crate::core::scanner::{MediaFile, MediaWalker, ScanConfig};
use crate::core::video::{MediaProbe, NearDuplicateAnalyzer, NearDuplicateGroup};
use crate::error::Result;
use crate::events::{
    null_sender, Event, EventSender, PipelineEvent, PipelinePhase, ScanEvent, ScanSummary,
};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

/// Result of pipeline execution
#[derive(Debug)]
pub struct PipelineResult {
    pub detection: DetectionResult,
    /// Probable re-encodes; empty when video inspection was off
    pub near_duplicates: Vec<NearDuplicateGroup>,
    /// Written report, unless writing failed
    pub report: Option<ScanReport>,
    pub duration_ms: u64,
}

impl PipelineResult {
    pub fn summary(&self) -> ScanSummary {
        ScanSummary {
            total_files: self.detection.total_files,
            total_bytes: self.detection.total_bytes,
            duplicate_groups: self.detection.groups.len(),
            duplicate_count: self.detection.duplicate_count(),
            potential_savings_bytes: self.detection.potential_savings(),
            near_duplicate_groups: self.near_duplicates.len(),
            duration_ms: self.duration_ms,
        }
    }
}

/// Builder for pipeline configuration
pub struct PipelineBuilder {
    base: PathBuf,
    recursive: bool,
    scan_config: ScanConfig,
    detector_config: DetectorConfig,
    report_config: ReportConfig,
    probe: Option<Box<dyn MediaProbe>>,
    hasher: Option<Box<dyn ContentHasher>>,
}

impl PipelineBuilder {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self {
            base: base.into(),
            recursive: false,
            scan_config: ScanConfig::default(),
            detector_config: DetectorConfig::default(),
            report_config: ReportConfig::default(),
            probe: None,
            hasher: None,
        }
    }

    /// Descend into subdirectories
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    pub fn scan_config(mut self, config: ScanConfig) -> Self {
        self.scan_config = config;
        self
    }

    pub fn detector_config(mut self, config: DetectorConfig) -> Self {
        self.detector_config = config;
        self
    }

    pub fn report_config(mut self, config: ReportConfig) -> Self {
        self.report_config = config;
        self
    }

    /// Enable re-encode detection with this probe
    pub fn near_duplicates(mut self, probe: Box<dyn MediaProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    /// Replace the SHA-256 hasher used for exact duplicates
    pub fn hasher(mut self, hasher: Box<dyn ContentHasher>) -> Self {
        self.hasher = Some(hasher);
        self
    }

    pub fn build(self) -> Pipeline {
        let detector = match self.hasher {
            Some(hasher) => DuplicateDetector::with_hasher(self.detector_config, hasher),
            None => DuplicateDetector::new(self.detector_config),
        };
        Pipeline {
            report: ScanReport::in_dir(&self.base, &self.report_config),
            base: self.base,
            recursive: self.recursive,
            walker: MediaWalker::new(self.scan_config),
            detector,
            analyzer: self.probe.map(NearDuplicateAnalyzer::new),
        }
    }
}

/// A configured duplicate scan
pub struct Pipeline {
    base: PathBuf,
    recursive: bool,
    walker: MediaWalker,
    detector: DuplicateDetector,
    analyzer: Option<NearDuplicateAnalyzer>,
    report: ScanReport,
}

impl Pipeline {
    pub fn builder(base: impl Into<PathBuf>) -> PipelineBuilder {
        PipelineBuilder::new(base)
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Run the pipeline without events
    pub fn run(&self) -> Result<PipelineResult> {
        self.run_with_events(&null_sender())
    }

    /// Run the pipeline with event reporting.
    ///
    /// Fails only when the base directory cannot be read.
    pub fn run_with_events(&self, events: &EventSender) -> Result<PipelineResult> {
        let start_time = Instant::now();
        events.send(Event::Pipeline(PipelineEvent::Started));

        // Phase 1: Indexing (lazy, consumed by detection)
        events.send(Event::Pipeline(PipelineEvent::PhaseChanged {
            phase: PipelinePhase::Indexing,
        }));
        events.send(Event::Scan(ScanEvent::Started {
            path: self.base.clone(),
            recursive: self.recursive,
        }));
        info!(
            "Scanning {} for duplicates (recursive: {})",
            self.base.display(),
            if self.recursive { "yes" } else { "no" }
        );
        let files = self.walker.walk(&self.base, self.recursive)?;

        // Phase 2: Detecting
        events.send(Event::Pipeline(PipelineEvent::PhaseChanged {
            phase: PipelinePhase::Detecting,
        }));
        let (detection, indexed) = if self.analyzer.is_some() {
            // Videos are needed again after detection
            let indexed: Vec<MediaFile> = files.collect();
            (self.detector.detect_with_events(indexed.clone(), events), indexed)
        } else {
            (self.detector.detect_with_events(files, events), Vec::new())
        };

        // Phase 3: Inspecting videos
        let near_duplicates = match &self.analyzer {
            Some(analyzer) => {
                events.send(Event::Pipeline(PipelineEvent::PhaseChanged {
                    phase: PipelinePhase::NearDuplicates,
                }));
                analyzer.analyze(&indexed)
            }
            None => Vec::new(),
        };

        // Phase 4: Reporting
        events.send(Event::Pipeline(PipelineEvent::PhaseChanged {
            phase: PipelinePhase::Reporting,
        }));
        let report = match self
            .report
            .write(&self.base, self.recursive, &detection, &near_duplicates)
        {
            Ok(scan_id) => {
                info!(
                    "Report written to {} (scan {})",
                    self.report.text_path().display(),
                    scan_id
                );
                Some(self.report.clone())
            }
            Err(e) => {
                warn!("Could not write scan report: {}", e);
                None
            }
        };

        let result = PipelineResult {
            detection,
            near_duplicates,
            report,
            duration_ms: start_time.elapsed().as_millis() as u64,
        };
        info!(
            "Scan complete: {} duplicate group(s)",
            result.detection.groups.len()
        );
        events.send(Event::Pipeline(PipelineEvent::Completed {
            summary: result.summary(),
        }));
        Ok(result)
    }
}
