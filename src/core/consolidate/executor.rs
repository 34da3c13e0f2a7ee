//! Executor for consolidation plans.

use super::{ConsolidateConfig, ConsolidationMode, ConsolidationPlan, ConsolidationResult};
use crate::core::hasher::ContentHash;
use crate::core::journal::{ActionKind, Journal, JournalEntry};
use crate::core::relocate::{move_file, unique_destination};
use crate::core::scanner::{sidecars_for, MediaFilter};
use chrono::Local;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use uuid::Uuid;

/// Carries out consolidation plans under one base directory
pub struct ConsolidationExecutor {
    base: PathBuf,
    mode: ConsolidationMode,
    config: ConsolidateConfig,
    filter: MediaFilter,
    journal: Journal,
}

impl ConsolidationExecutor {
    pub fn new(
        base: impl Into<PathBuf>,
        mode: ConsolidationMode,
        config: ConsolidateConfig,
        filter: MediaFilter,
    ) -> Self {
        let base = base.into();
        let journal = Journal::new(
            base.join(&config.action_log),
            base.join(&config.action_records),
        );
        Self {
            base,
            mode,
            config,
            filter,
            journal,
        }
    }

    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    /// Execute `plans` in order with a progress callback.
    ///
    /// Failures are journaled and counted; processing always continues.
    pub fn execute<F>(&self, plans: &[ConsolidationPlan], mut on_progress: F) -> ConsolidationResult
    where
        F: FnMut(usize, usize, &Path),
    {
        let mut run = Run {
            executor: self,
            result: ConsolidationResult {
                run_id: Uuid::new_v4(),
                ..ConsolidationResult::default()
            },
        };

        let quarantine_root = match self.mode {
            ConsolidationMode::Quarantine => Some(self.base.join(format!(
                "{}{}",
                self.config.quarantine_prefix,
                Local::now().format("%Y%m%d_%H%M%S")
            ))),
            ConsolidationMode::Delete => None,
        };

        run.note(&format!(
            "Consolidation {} at {}  mode={}",
            run.result.run_id,
            Local::now().to_rfc3339(),
            self.mode
        ));

        for (i, plan) in plans.iter().enumerate() {
            on_progress(i + 1, plans.len(), &plan.keeper);
            info!(
                "[{}/{}] Keeper: {}",
                i + 1,
                plans.len(),
                plan.keeper.display()
            );
            let target_dir = quarantine_root.as_ref().map(|root| root.join(plan.group.as_str()));
            run.apply(plan, target_dir.as_deref());
        }

        if let Some(root) = quarantine_root.filter(|root| root.exists()) {
            run.result.quarantine_dir = Some(root);
        }
        run.result
    }
}

/// State of one execution
struct Run<'e> {
    executor: &'e ConsolidationExecutor,
    result: ConsolidationResult,
}

impl Run<'_> {
    fn apply(&mut self, plan: &ConsolidationPlan, target_dir: Option<&Path>) {
        let executor = self.executor;
        let filter = &executor.filter;
        let keeper_sidecars: HashSet<PathBuf> =
            sidecars_for(&plan.keeper, filter).into_iter().collect();

        for path in &plan.remove {
            if *path == plan.keeper {
                self.record(
                    JournalEntry::new(self.result.run_id, ActionKind::Skipped, path)
                        .group(&plan.group)
                        .detail("keeper"),
                );
                continue;
            }

            let size = fs::metadata(path).map(|m| m.len()).unwrap_or(0);
            if !self.remove(path, &plan.group, target_dir, false) {
                continue;
            }
            self.result.removed += 1;
            self.result.bytes_reclaimed += size;

            for sidecar in sidecars_for(path, filter) {
                if keeper_sidecars.contains(&sidecar) {
                    self.record(
                        JournalEntry::new(self.result.run_id, ActionKind::Skipped, &sidecar)
                            .group(&plan.group)
                            .detail("sidecar of keeper"),
                    );
                    continue;
                }
                if self.remove(&sidecar, &plan.group, target_dir, true) {
                    self.result.sidecars += 1;
                }
            }
        }
    }

    /// Quarantine or delete one file; `true` on success
    fn remove(
        &mut self,
        path: &Path,
        group: &ContentHash,
        target_dir: Option<&Path>,
        sidecar: bool,
    ) -> bool {
        let run_id = self.result.run_id;
        let outcome = match target_dir {
            Some(dir) => quarantine(path, dir).map(|dest| {
                info!("    moved -> {}", dest.display());
                let kind = if sidecar {
                    ActionKind::SidecarMoved
                } else {
                    ActionKind::Moved
                };
                JournalEntry::new(run_id, kind, path).destination(dest)
            }),
            None => fs::remove_file(path).map(|()| {
                info!("    deleted -> {}", path.display());
                let kind = if sidecar {
                    ActionKind::SidecarDeleted
                } else {
                    ActionKind::Deleted
                };
                JournalEntry::new(run_id, kind, path)
            }),
        };

        match outcome {
            Ok(entry) => {
                self.record(entry.group(group));
                true
            }
            Err(e) => {
                warn!("Failed to consolidate {}: {}", path.display(), e);
                self.result
                    .failures
                    .push(format!("{}: {}", path.display(), e));
                self.record(
                    JournalEntry::new(run_id, ActionKind::Failed, path)
                        .group(group)
                        .detail(e.to_string()),
                );
                false
            }
        }
    }

    fn record(&self, entry: JournalEntry) {
        if let Err(e) = self.executor.journal.append(&entry) {
            warn!("{}", e);
        }
    }

    fn note(&self, line: &str) {
        if let Err(e) = self.executor.journal.note(line) {
            warn!("{}", e);
        }
    }
}

fn quarantine(path: &Path, dir: &Path) -> std::io::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let name = path.file_name().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no file name")
    })?;
    let dest = unique_destination(dir, Path::new(name));
    move_file(path, &dest)?;
    Ok(dest)
}
