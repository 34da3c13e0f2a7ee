//! # CLI Module
//!
//! Command-line interface for the media curator.
//!
//! ## Usage
//! ```bash
//! # Report duplicates in a folder tree
//! curate scan ~/Pictures --recursive
//!
//! # Also flag probable video re-encodes (needs ffprobe)
//! curate scan ~/Pictures --recursive --near-duplicates
//!
//! # Keep one copy per group, quarantining the rest
//! curate scan ~/Pictures --recursive --consolidate quarantine --yes
//!
//! # File top-level media into YYYY/MM folders
//! curate organize ~/Pictures/Inbox --dry-run
//! curate organize ~/Pictures/Inbox --limit 500
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use media_curator::core::consolidate::{ConsolidationExecutor, ConsolidationMode, ConsolidationPlan};
use media_curator::core::duplicates::format_bytes;
use media_curator::core::keeper::KeeperSelector;
use media_curator::core::organize::{
    CancellationToken, OrganizeOptions, OrganizePipeline, OrganizeResult, Placement,
};
use media_curator::core::pipeline::{Pipeline, PipelineResult};
use media_curator::core::scanner::MediaFilter;
use media_curator::core::temporal::TemporalResolver;
use media_curator::core::video::{Ffprobe, MediaProbe};
use media_curator::core::CurateConfig;
use media_curator::error::Result;
use media_curator::events::{DetectEvent, Event, EventChannel, PipelineEvent, ScanEvent};
use std::path::{Path, PathBuf};
use std::thread;
use tracing::warn;

/// Media Curator - find duplicates, keep the best copy, file the rest by date
#[derive(Parser, Debug)]
#[command(name = "curate")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file (default: <config dir>/media-curator/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Find byte-identical duplicates and write a report
    Scan {
        /// Directory to scan
        path: PathBuf,

        /// Include subdirectories
        #[arg(short, long)]
        recursive: bool,

        /// Skip the prefix-hash tier (same results, more reading)
        #[arg(long)]
        no_partial_hash: bool,

        /// Flag videos that look like re-encodes of each other
        #[arg(long)]
        near_duplicates: bool,

        /// Keep one file per group and quarantine or delete the rest
        #[arg(long, value_enum)]
        consolidate: Option<Mode>,

        /// Confirm consolidation
        #[arg(long)]
        yes: bool,

        /// Include hidden files
        #[arg(long)]
        include_hidden: bool,
    },

    /// Move top-level media into YYYY/MM folders by capture date
    Organize {
        /// Directory to organize
        path: PathBuf,

        /// Show what would happen without moving anything
        #[arg(long)]
        dry_run: bool,

        /// Only process the N oldest files
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        limit: Option<u64>,

        /// Ignore an existing checkpoint and start over
        #[arg(long)]
        restart: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    /// Move copies to a _Quarantine_ folder (recommended)
    Quarantine,
    /// Delete copies permanently
    Delete,
}

impl From<Mode> for ConsolidationMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Quarantine => ConsolidationMode::Quarantine,
            Mode::Delete => ConsolidationMode::Delete,
        }
    }
}

/// Run the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = CurateConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Scan {
            path,
            recursive,
            no_partial_hash,
            near_duplicates,
            consolidate,
            yes,
            include_hidden,
        } => {
            let mut config = config;
            config.detector.partial_tier &= !no_partial_hash;
            config.scan.include_hidden |= include_hidden;
            run_scan(
                &config,
                path,
                recursive,
                near_duplicates,
                consolidate.map(Into::into),
                yes,
            )
        }
        Commands::Organize {
            path,
            dry_run,
            limit,
            restart,
        } => {
            let options = OrganizeOptions {
                dry_run,
                limit: limit.map(|n| n as usize),
                resume: !restart,
            };
            run_organize(&config, path, options)
        }
    }
}

fn header(term: &Term) {
    term.write_line(&format!(
        "{} {}",
        style("Media Curator").bold().cyan(),
        style(concat!("v", env!("CARGO_PKG_VERSION"))).dim()
    ))
    .ok();
    term.write_line("").ok();
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▓░")
}

fn run_scan(
    config: &CurateConfig,
    path: PathBuf,
    recursive: bool,
    near_duplicates: bool,
    consolidate: Option<ConsolidationMode>,
    yes: bool,
) -> Result<()> {
    let term = Term::stderr();
    header(&term);

    let mut builder = Pipeline::builder(&path)
        .recursive(recursive)
        .scan_config(config.scan.clone())
        .detector_config(config.detector.clone())
        .report_config(config.report.clone());
    if near_duplicates {
        match Ffprobe::detect(&config.video) {
            Some(probe) => {
                builder = builder.near_duplicates(Box::new(probe) as Box<dyn MediaProbe>)
            }
            None => {
                term.write_line(&format!(
                    "  {} ffprobe not found, skipping re-encode check",
                    style("!").yellow()
                ))
                .ok();
            }
        }
    }
    let pipeline = builder.build();

    let (sender, receiver) = EventChannel::new();
    let progress = ProgressBar::new(0);
    progress.set_style(bar_style());
    let progress_clone = progress.clone();

    // Handle events in a separate thread
    let event_thread = thread::spawn(move || {
        for event in receiver.iter() {
            match event {
                Event::Pipeline(PipelineEvent::PhaseChanged { phase }) => {
                    progress_clone.set_message(format!("{}", phase));
                }
                Event::Scan(ScanEvent::Progress { files_indexed }) => {
                    progress_clone.set_message(format!("Indexed {} files", files_indexed));
                }
                Event::Detect(DetectEvent::TierStarted { tier, candidates }) => {
                    progress_clone.set_length(candidates as u64);
                    progress_clone.set_position(0);
                    progress_clone.set_message(format!("{}", tier));
                }
                Event::Detect(DetectEvent::TierProgress(p)) => {
                    progress_clone.set_position(p.completed as u64);
                }
                Event::Pipeline(PipelineEvent::Completed { .. }) => {
                    progress_clone.finish_and_clear();
                }
                _ => {}
            }
        }
    });

    let result = pipeline.run_with_events(&sender);

    // Drop sender to signal event thread to finish
    drop(sender);
    event_thread.join().ok();
    progress.finish_and_clear();
    let result = result?;

    print_scan_results(&term, &result);

    let Some(mode) = consolidate else {
        return Ok(());
    };
    if result.detection.groups.is_empty() {
        return Ok(());
    }
    if !yes {
        term.write_line(&format!(
            "{} Consolidation ({}) changes files on disk. Re-run with --yes to proceed.",
            style("!").yellow().bold(),
            mode
        ))
        .ok();
        return Ok(());
    }
    run_consolidation(&term, config, &path, mode, &result)
}

fn print_scan_results(term: &Term, result: &PipelineResult) {
    let summary = result.summary();
    term.write_line(&format!("{} Scan Complete", style("✓").green().bold()))
        .ok();
    term.write_line("").ok();
    term.write_line(&format!(
        "  {} files indexed ({}) in {:.1}s",
        style(summary.total_files).cyan(),
        format_bytes(summary.total_bytes),
        summary.duration_ms as f64 / 1000.0
    ))
    .ok();
    term.write_line(&format!(
        "  {} duplicate groups, {} removable copies",
        style(summary.duplicate_groups).cyan(),
        style(summary.duplicate_count).cyan()
    ))
    .ok();
    term.write_line(&format!(
        "  {} potential space savings",
        style(format_bytes(summary.potential_savings_bytes)).yellow()
    ))
    .ok();
    if summary.near_duplicate_groups > 0 {
        term.write_line(&format!(
            "  {} probable re-encode groups (reported only)",
            style(summary.near_duplicate_groups).cyan()
        ))
        .ok();
    }
    if !result.detection.errors.is_empty() {
        term.write_line(&format!(
            "  {} files could not be read",
            style(result.detection.errors.len()).red()
        ))
        .ok();
    }
    if let Some(report) = &result.report {
        term.write_line(&format!(
            "  Report: {}",
            style(report.text_path().display()).dim()
        ))
        .ok();
    }
    term.write_line("").ok();
}

fn run_consolidation(
    term: &Term,
    config: &CurateConfig,
    base: &Path,
    mode: ConsolidationMode,
    result: &PipelineResult,
) -> Result<()> {
    let resolver = TemporalResolver::detect(config.temporal.clone());
    let selector = KeeperSelector::new(&resolver);
    let plans: Vec<ConsolidationPlan> = result
        .detection
        .groups
        .iter()
        .filter_map(|group| {
            selector
                .select(group)
                .map(|keeper| ConsolidationPlan::new(group, keeper))
        })
        .collect();

    let executor = ConsolidationExecutor::new(
        base,
        mode,
        config.consolidate.clone(),
        MediaFilter::new(&config.scan),
    );
    let progress = ProgressBar::new(plans.len() as u64);
    progress.set_style(bar_style());
    let outcome = executor.execute(&plans, |done, _, keeper| {
        progress.set_position(done as u64);
        progress.set_message(display_name(keeper));
    });
    progress.finish_and_clear();

    term.write_line(&format!(
        "{} Consolidation complete ({})",
        style("✓").green().bold(),
        mode
    ))
    .ok();
    term.write_line(&format!(
        "  {} files and {} sidecars removed, {} reclaimed",
        style(outcome.removed).cyan(),
        style(outcome.sidecars).cyan(),
        style(format_bytes(outcome.bytes_reclaimed)).yellow()
    ))
    .ok();
    if let Some(dir) = &outcome.quarantine_dir {
        term.write_line(&format!(
            "  Quarantine: {} (review, then delete it yourself)",
            style(dir.display()).dim()
        ))
        .ok();
    }
    if !outcome.failures.is_empty() {
        term.write_line(&format!(
            "  {} actions failed, see {}",
            style(outcome.failures.len()).red(),
            executor.journal().text_path().display()
        ))
        .ok();
    }
    Ok(())
}

fn run_organize(config: &CurateConfig, path: PathBuf, options: OrganizeOptions) -> Result<()> {
    let term = Term::stderr();
    header(&term);
    term.write_line(&format!(
        "Mode: {}",
        if options.dry_run {
            style("DRY-RUN (nothing is moved)").yellow()
        } else {
            style("NORMAL (files are moved)").green()
        }
    ))
    .ok();

    let resolver = TemporalResolver::detect(config.temporal.clone());
    if !resolver.has_metadata_source() {
        term.write_line(&format!(
            "  {} exiftool not found, using file modification times",
            style("!").yellow()
        ))
        .ok();
    }

    let cancel = CancellationToken::new();
    let handler_token = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || handler_token.cancel()) {
        warn!("Could not install Ctrl-C handler: {}", e);
    }

    let pipeline =
        OrganizePipeline::new(&path, &config.organize, options, config.scan.clone(), &resolver);
    let progress = ProgressBar::new(0);
    progress.set_style(bar_style());
    let result = pipeline.run(&cancel, |position, total, source, placement| {
        progress.set_length(total as u64);
        progress.set_position(position as u64);
        let marker = match placement {
            Placement::Moved(_) | Placement::Planned { .. } => "",
            Placement::Duplicate(_) => " [dup]",
            Placement::Conflict(_) => " [conflict]",
            Placement::Failed(_) => " [error]",
        };
        progress.set_message(format!("{}{}", display_name(source), marker));
    });
    progress.finish_and_clear();

    print_organize_results(&term, &result?, &pipeline);
    Ok(())
}

fn print_organize_results(term: &Term, result: &OrganizeResult, pipeline: &OrganizePipeline<'_>) {
    if result.interrupted {
        term.write_line(&format!(
            "{} Interrupted. Partial summary below; run again to resume.",
            style("!").yellow().bold()
        ))
        .ok();
    } else {
        term.write_line(&format!("{} Organize Complete", style("✓").green().bold()))
            .ok();
    }
    term.write_line("").ok();
    if let Some(start) = result.resumed_from {
        term.write_line(&format!("  Resumed at file {} of {}", start + 1, result.total))
            .ok();
    }
    if result.planned > 0 {
        term.write_line(&format!("  Would move : {}", style(result.planned).cyan()))
            .ok();
    }
    term.write_line(&format!("  Moved      : {}", style(result.moved).cyan()))
        .ok();
    term.write_line(&format!(
        "  Duplicates : {}{}",
        style(result.duplicates).cyan(),
        if result.duplicates > 0 {
            format!(" (see {})", pipeline.journal().text_path().display())
        } else {
            String::new()
        }
    ))
    .ok();
    term.write_line(&format!("  Conflicts  : {}", style(result.conflicts).cyan()))
        .ok();
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .into_owned()
}
