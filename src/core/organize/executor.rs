//! Checkpointed placement of candidates into `YYYY/MM` directories.

use super::candidates::collect_candidates;
use super::checkpoint::{CandidateManifest, CheckpointState, CheckpointStore};
use super::types::*;
use crate::core::hasher::{ContentHasher, Sha256Hasher};
use crate::core::journal::{ActionKind, Journal, JournalEntry};
use crate::core::relocate::move_file;
use crate::core::scanner::{sidecars_for, MediaWalker, ScanConfig};
use crate::core::temporal::{TemporalRecord, TemporalResolver};
use crate::error::Result;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use uuid::Uuid;

/// Result of placing one candidate
struct Outcome {
    placement: Placement,
    /// Sidecars that could not follow their media file
    sidecar_conflicts: usize,
}

impl From<Placement> for Outcome {
    fn from(placement: Placement) -> Self {
        Self {
            placement,
            sidecar_conflicts: 0,
        }
    }
}

/// Moves the top-level media of a directory into capture-date folders
pub struct OrganizePipeline<'r> {
    base: PathBuf,
    options: OrganizeOptions,
    walker: MediaWalker,
    resolver: &'r TemporalResolver,
    hasher: Box<dyn ContentHasher>,
    journal: Journal,
    store: CheckpointStore,
}

impl<'r> OrganizePipeline<'r> {
    pub fn new(
        base: impl Into<PathBuf>,
        config: &OrganizeConfig,
        options: OrganizeOptions,
        scan_config: ScanConfig,
        resolver: &'r TemporalResolver,
    ) -> Self {
        let base = base.into();
        let scan_config = ScanConfig {
            include_hidden: scan_config.include_hidden || config.include_hidden,
            ..scan_config
        };
        Self {
            journal: Journal::new(base.join(&config.report_log), base.join(&config.report_records)),
            store: CheckpointStore::new(&base, config),
            walker: MediaWalker::new(scan_config),
            hasher: Box::new(Sha256Hasher::new()),
            base,
            options,
            resolver,
        }
    }

    pub fn with_hasher(mut self, hasher: Box<dyn ContentHasher>) -> Self {
        self.hasher = hasher;
        self
    }

    pub fn checkpoint_store(&self) -> &CheckpointStore {
        &self.store
    }

    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    /// Process candidates until done or cancelled.
    ///
    /// `on_progress` receives the 1-based position, the candidate count,
    /// the candidate and what happened to it.
    pub fn run<F>(&self, cancel: &CancellationToken, mut on_progress: F) -> Result<OrganizeResult>
    where
        F: FnMut(usize, usize, &Path, &Placement),
    {
        let (candidates, mut state, start) = self.prepare()?;
        let total = candidates.len();
        let mut result = OrganizeResult {
            run_id: Uuid::new_v4(),
            total,
            resumed_from: (start > 0).then_some(start),
            ..OrganizeResult::default()
        };

        if start > 0 {
            info!("Resuming at candidate {} of {}", start + 1, total);
        } else {
            info!("Found {} candidate file(s)", total);
        }

        let remaining = &candidates[start.min(total)..];
        let premap = self.resolver.resolve_batch(remaining);

        if !self.options.dry_run && !remaining.is_empty() {
            self.note(&format!(
                "Organize {} at {}  candidates={}  start={}",
                result.run_id,
                chrono::Local::now().to_rfc3339(),
                total,
                start
            ));
        }

        for (index, source) in candidates.iter().enumerate().skip(start) {
            if cancel.is_cancelled() {
                warn!("Interrupted before candidate {} of {}", index + 1, total);
                result.interrupted = true;
                break;
            }

            let outcome = self.place(source, &premap, result.run_id);
            match &outcome.placement {
                Placement::Moved(_) => state.moved += 1,
                Placement::Planned { .. } => result.planned += 1,
                Placement::Duplicate(_) => state.duplicates += 1,
                Placement::Conflict(_) | Placement::Failed(_) => state.conflicts += 1,
            }
            state.conflicts += outcome.sidecar_conflicts;
            state.last_index = index;
            result.processed += 1;

            if !self.options.dry_run {
                if let Err(e) = self.store.save(&state) {
                    warn!("{}", e);
                }
            }
            on_progress(index + 1, total, source, &outcome.placement);
        }

        result.moved = state.moved;
        result.duplicates = state.duplicates;
        result.conflicts = state.conflicts;
        Ok(result)
    }

    /// Candidate list, starting counters and first index to process
    fn prepare(&self) -> Result<(Vec<PathBuf>, CheckpointState, usize)> {
        if self.options.resume {
            if let Some(state) = self.store.load()? {
                let candidates = match self.store.load_manifest()? {
                    Some(manifest) => manifest.candidates,
                    None => {
                        warn!(
                            "Checkpoint without candidate list at {}, re-deriving candidates",
                            self.store.manifest_path().display()
                        );
                        collect_candidates(&self.walker, &self.base, self.options.limit)?
                    }
                };
                let start = state.next_index();
                if start < candidates.len() {
                    return Ok((candidates, state, start));
                }
                info!(
                    "Last run finished ({} moved, {} duplicates, {} conflicts), starting fresh",
                    state.moved, state.duplicates, state.conflicts
                );
            }
        }

        let candidates = collect_candidates(&self.walker, &self.base, self.options.limit)?;
        if !self.options.dry_run {
            self.store.clear()?;
            self.store
                .save_manifest(&CandidateManifest::new(candidates.clone()))?;
        }
        Ok((candidates, CheckpointState::default(), 0))
    }

    fn place(
        &self,
        source: &Path,
        premap: &HashMap<PathBuf, TemporalRecord>,
        run_id: Uuid,
    ) -> Outcome {
        let record = match premap.get(source) {
            Some(record) => record.clone(),
            None => match self.resolver.resolve(source) {
                Ok(record) => record,
                Err(e) => return self.failed(source, run_id, e.to_string()).into(),
            },
        };
        let Some(file_name) = source.file_name() else {
            return self
                .failed(source, run_id, "path has no file name".to_string())
                .into();
        };

        let dest_dir = self
            .base
            .join(format!("{:04}", record.year()))
            .join(format!("{:02}", record.month()));
        let dest = dest_dir.join(file_name);
        let slot = format!("{:04}/{:02}", record.year(), record.month());

        if dest.exists() {
            return match self.hasher.same_content(source, &dest) {
                Ok(true) => {
                    info!("[DUP] {} identical copy already in {}", source.display(), slot);
                    self.record(
                        JournalEntry::new(run_id, ActionKind::Duplicate, source).destination(&dest),
                    );
                    Placement::Duplicate(dest).into()
                }
                Ok(false) => {
                    warn!(
                        "[CONFLICT] {} differs from the file already in {}",
                        source.display(),
                        slot
                    );
                    self.record(
                        JournalEntry::new(run_id, ActionKind::Conflict, source).destination(&dest),
                    );
                    Placement::Conflict(dest).into()
                }
                Err(e) => self.failed(source, run_id, e.to_string()).into(),
            };
        }

        let sidecars = sidecars_for(source, self.walker.filter());
        if self.options.dry_run {
            info!("[DRY-RUN] would move {} -> {}/", source.display(), slot);
            let plans: Vec<SidecarPlan> = sidecars
                .iter()
                .filter_map(|sidecar| self.plan_sidecar(sidecar, &dest_dir))
                .collect();
            let sidecar_conflicts = plans
                .iter()
                .filter(|plan| matches!(plan, SidecarPlan::Conflict(_)))
                .count();
            return Outcome {
                placement: Placement::Planned {
                    dest,
                    sidecars: plans,
                },
                sidecar_conflicts,
            };
        }

        if let Err(e) = fs::create_dir_all(&dest_dir).and_then(|()| move_file(source, &dest)) {
            return self.failed(source, run_id, e.to_string()).into();
        }
        info!("[MOVED] {} -> {}", source.display(), dest.display());
        self.record(JournalEntry::new(run_id, ActionKind::Moved, source).destination(&dest));

        let sidecar_conflicts = sidecars
            .iter()
            .filter(|sidecar| !self.place_sidecar(sidecar, &dest_dir, run_id))
            .count();

        Outcome {
            placement: Placement::Moved(dest),
            sidecar_conflicts,
        }
    }

    /// Dry-run counterpart of [`Self::place_sidecar`]
    fn plan_sidecar(&self, sidecar: &Path, dest_dir: &Path) -> Option<SidecarPlan> {
        let dest = dest_dir.join(sidecar.file_name()?);
        if !dest.exists() {
            info!("[DRY-RUN]     (sidecar) would move {}", sidecar.display());
            return Some(SidecarPlan::Move(dest));
        }
        match self.hasher.same_content(sidecar, &dest) {
            Ok(true) => {
                info!(
                    "[DRY-RUN]     (sidecar) {} already present, identical; would skip",
                    sidecar.display()
                );
                Some(SidecarPlan::Skip(dest))
            }
            Ok(false) => {
                warn!(
                    "[DRY-RUN]     (sidecar) CONFLICT {} already present but different",
                    sidecar.display()
                );
                Some(SidecarPlan::Conflict(dest))
            }
            Err(e) => {
                warn!("[DRY-RUN]     (sidecar) cannot compare {}: {}", sidecar.display(), e);
                Some(SidecarPlan::Conflict(dest))
            }
        }
    }

    /// Move a sidecar next to its media file; `false` counts as a conflict
    fn place_sidecar(&self, sidecar: &Path, dest_dir: &Path, run_id: Uuid) -> bool {
        let Some(name) = sidecar.file_name() else {
            return false;
        };
        let dest = dest_dir.join(name);

        if dest.exists() {
            return match self.hasher.same_content(sidecar, &dest) {
                Ok(true) => {
                    info!("    (sidecar) {} already present, identical", sidecar.display());
                    self.record(
                        JournalEntry::new(run_id, ActionKind::Skipped, sidecar)
                            .destination(&dest)
                            .detail("identical sidecar present"),
                    );
                    true
                }
                Ok(false) => {
                    warn!(
                        "    (sidecar) CONFLICT {} already present but different",
                        sidecar.display()
                    );
                    self.record(
                        JournalEntry::new(run_id, ActionKind::Conflict, sidecar).destination(&dest),
                    );
                    false
                }
                Err(e) => {
                    self.failed(sidecar, run_id, e.to_string());
                    false
                }
            };
        }

        match move_file(sidecar, &dest) {
            Ok(()) => {
                info!("    (sidecar) moved {}", sidecar.display());
                self.record(
                    JournalEntry::new(run_id, ActionKind::SidecarMoved, sidecar).destination(&dest),
                );
                true
            }
            Err(e) => {
                self.failed(sidecar, run_id, e.to_string());
                false
            }
        }
    }

    fn failed(&self, path: &Path, run_id: Uuid, message: String) -> Placement {
        warn!("[ERROR] {}: {}", path.display(), message);
        self.record(JournalEntry::new(run_id, ActionKind::Failed, path).detail(message.clone()));
        Placement::Failed(message)
    }

    fn record(&self, entry: JournalEntry) {
        if self.options.dry_run {
            return;
        }
        if let Err(e) = self.journal.append(&entry) {
            warn!("{}", e);
        }
    }

    fn note(&self, line: &str) {
        if let Err(e) = self.journal.note(line) {
            warn!("{}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::temporal::TemporalConfig;
    use std::fs::File;
    use std::time::{Duration, UNIX_EPOCH};
    use tempfile::TempDir;

    /// 2021-06-15 12:00:00 UTC; mid-month so any local offset stays in June
    const JUNE_2021: u64 = 1_623_758_400;

    fn create(dir: &Path, name: &str, content: &[u8], secs: u64) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(UNIX_EPOCH + Duration::from_secs(secs))
            .unwrap();
        path
    }

    fn mtime_resolver() -> TemporalResolver {
        TemporalResolver::new(TemporalConfig::default(), None)
    }

    fn pipeline<'r>(
        base: &Path,
        options: OrganizeOptions,
        resolver: &'r TemporalResolver,
    ) -> OrganizePipeline<'r> {
        OrganizePipeline::new(
            base,
            &OrganizeConfig::default(),
            options,
            ScanConfig::default(),
            resolver,
        )
    }

    #[test]
    fn moves_into_year_month_with_sidecar() {
        let dir = TempDir::new().unwrap();
        let photo = create(dir.path(), "IMG_1.jpg", b"photo", JUNE_2021);
        let sidecar = create(dir.path(), "IMG_1.xmp", b"<xmp/>", JUNE_2021);
        let resolver = mtime_resolver();

        let result = pipeline(dir.path(), OrganizeOptions::default(), &resolver)
            .run(&CancellationToken::new(), |_, _, _, _| {})
            .unwrap();

        assert_eq!(result.moved, 1);
        assert_eq!(result.conflicts, 0);
        assert!(!photo.exists());
        assert!(!sidecar.exists());
        assert!(dir.path().join("2021/06/IMG_1.jpg").exists());
        assert!(dir.path().join("2021/06/IMG_1.xmp").exists());
    }

    #[test]
    fn identical_destination_is_duplicate_and_source_stays() {
        let dir = TempDir::new().unwrap();
        create(dir.path(), "2021/06/IMG_1.jpg", b"same", JUNE_2021);
        let source = create(dir.path(), "IMG_1.jpg", b"same", JUNE_2021);
        let resolver = mtime_resolver();

        let p = pipeline(dir.path(), OrganizeOptions::default(), &resolver);
        let result = p.run(&CancellationToken::new(), |_, _, _, _| {}).unwrap();

        assert_eq!((result.moved, result.duplicates, result.conflicts), (0, 1, 0));
        assert!(source.exists());
        let log = fs::read_to_string(p.journal().text_path()).unwrap();
        assert!(log.contains("DUPLICATE"));
    }

    #[test]
    fn different_destination_is_conflict() {
        let dir = TempDir::new().unwrap();
        create(dir.path(), "2021/06/IMG_1.jpg", b"old", JUNE_2021);
        let source = create(dir.path(), "IMG_1.jpg", b"new", JUNE_2021);
        let resolver = mtime_resolver();

        let result = pipeline(dir.path(), OrganizeOptions::default(), &resolver)
            .run(&CancellationToken::new(), |_, _, _, _| {})
            .unwrap();

        assert_eq!((result.moved, result.duplicates, result.conflicts), (0, 0, 1));
        assert!(source.exists());
        assert_eq!(fs::read(dir.path().join("2021/06/IMG_1.jpg")).unwrap(), b"old");
    }

    #[test]
    fn differing_sidecar_is_conflict_identical_is_skipped() {
        let dir = TempDir::new().unwrap();
        create(dir.path(), "2021/06/A.xmp", b"same", JUNE_2021);
        create(dir.path(), "2021/06/B.xmp", b"theirs", JUNE_2021);
        create(dir.path(), "A.jpg", b"a", JUNE_2021);
        let a_xmp = create(dir.path(), "A.xmp", b"same", JUNE_2021);
        create(dir.path(), "B.jpg", b"b", JUNE_2021 + 1);
        let b_xmp = create(dir.path(), "B.xmp", b"mine", JUNE_2021);
        let resolver = mtime_resolver();

        let result = pipeline(dir.path(), OrganizeOptions::default(), &resolver)
            .run(&CancellationToken::new(), |_, _, _, _| {})
            .unwrap();

        assert_eq!(result.moved, 2);
        assert_eq!(result.conflicts, 1);
        assert!(a_xmp.exists());
        assert!(b_xmp.exists());
        assert_eq!(fs::read(dir.path().join("2021/06/B.xmp")).unwrap(), b"theirs");
    }

    #[test]
    fn dry_run_touches_nothing() {
        let dir = TempDir::new().unwrap();
        let photo = create(dir.path(), "IMG_1.jpg", b"photo", JUNE_2021);
        let resolver = mtime_resolver();
        let options = OrganizeOptions {
            dry_run: true,
            ..OrganizeOptions::default()
        };

        let p = pipeline(dir.path(), options, &resolver);
        let mut placements = Vec::new();
        let result = p
            .run(&CancellationToken::new(), |_, _, _, placement| {
                placements.push(placement.clone())
            })
            .unwrap();

        assert_eq!(result.planned, 1);
        assert_eq!(result.moved, 0);
        assert!(photo.exists());
        assert!(!dir.path().join("2021").exists());
        assert!(!p.checkpoint_store().checkpoint_path().exists());
        assert!(!p.journal().text_path().exists());
        assert_eq!(
            placements,
            vec![Placement::Planned {
                dest: dir.path().join("2021/06/IMG_1.jpg"),
                sidecars: Vec::new(),
            }]
        );
    }

    #[test]
    fn dry_run_reports_what_happens_to_sidecars() {
        let dir = TempDir::new().unwrap();
        create(dir.path(), "2021/06/IMG_1.aae", b"same", JUNE_2021);
        create(dir.path(), "2021/06/IMG_1.thm", b"theirs", JUNE_2021);
        create(dir.path(), "IMG_1.jpg", b"photo", JUNE_2021);
        create(dir.path(), "IMG_1.aae", b"same", JUNE_2021);
        create(dir.path(), "IMG_1.thm", b"mine", JUNE_2021);
        let xmp = create(dir.path(), "IMG_1.xmp", b"<xmp/>", JUNE_2021);
        let resolver = mtime_resolver();
        let options = OrganizeOptions {
            dry_run: true,
            ..OrganizeOptions::default()
        };

        let mut placements = Vec::new();
        let result = pipeline(dir.path(), options, &resolver)
            .run(&CancellationToken::new(), |_, _, _, placement| {
                placements.push(placement.clone())
            })
            .unwrap();

        let month = dir.path().join("2021/06");
        assert_eq!(
            placements,
            vec![Placement::Planned {
                dest: month.join("IMG_1.jpg"),
                sidecars: vec![
                    SidecarPlan::Skip(month.join("IMG_1.aae")),
                    SidecarPlan::Conflict(month.join("IMG_1.thm")),
                    SidecarPlan::Move(month.join("IMG_1.xmp")),
                ],
            }]
        );
        assert_eq!(result.conflicts, 1);
        assert!(xmp.exists());
        assert!(!month.join("IMG_1.xmp").exists());
    }

    #[test]
    fn hidden_media_is_organized() {
        let dir = TempDir::new().unwrap();
        let hidden = create(dir.path(), ".IMG_1.jpg", b"photo", JUNE_2021);
        let resolver = mtime_resolver();

        let result = pipeline(dir.path(), OrganizeOptions::default(), &resolver)
            .run(&CancellationToken::new(), |_, _, _, _| {})
            .unwrap();

        assert_eq!(result.moved, 1);
        assert!(!hidden.exists());
        assert!(dir.path().join("2021/06/.IMG_1.jpg").exists());
    }

    #[test]
    fn cancellation_leaves_checkpoint_and_resume_finishes() {
        let dir = TempDir::new().unwrap();
        for i in 0..5 {
            create(dir.path(), &format!("IMG_{}.jpg", i), &[i as u8], JUNE_2021 + i);
        }
        let resolver = mtime_resolver();
        let token = CancellationToken::new();

        let first = pipeline(dir.path(), OrganizeOptions::default(), &resolver)
            .run(&token, |position, _, _, _| {
                if position == 2 {
                    token.cancel();
                }
            })
            .unwrap();
        assert!(first.interrupted);
        assert_eq!(first.processed, 2);

        let p = pipeline(dir.path(), OrganizeOptions::default(), &resolver);
        let state = p.checkpoint_store().load().unwrap().unwrap();
        assert_eq!(state.last_index, 1);
        assert_eq!(state.moved, 2);

        let second = p.run(&CancellationToken::new(), |_, _, _, _| {}).unwrap();
        assert!(!second.interrupted);
        assert_eq!(second.resumed_from, Some(2));
        assert_eq!(second.processed, 3);
        assert_eq!(second.moved, 5);

        let last = p.checkpoint_store().load().unwrap().unwrap();
        assert_eq!(last.last_index, 4);
        assert_eq!(last.moved, 5);
    }

    #[test]
    fn finished_checkpoint_starts_a_new_run() {
        let dir = TempDir::new().unwrap();
        create(dir.path(), "IMG_1.jpg", b"one", JUNE_2021);
        let resolver = mtime_resolver();

        let first = pipeline(dir.path(), OrganizeOptions::default(), &resolver)
            .run(&CancellationToken::new(), |_, _, _, _| {})
            .unwrap();
        assert_eq!(first.moved, 1);

        create(dir.path(), "IMG_2.jpg", b"two", JUNE_2021);
        let second = pipeline(dir.path(), OrganizeOptions::default(), &resolver)
            .run(&CancellationToken::new(), |_, _, _, _| {})
            .unwrap();

        assert_eq!(second.resumed_from, None);
        assert_eq!(second.total, 1);
        assert_eq!(second.moved, 1);
        assert!(dir.path().join("2021/06/IMG_2.jpg").exists());
    }

    #[test]
    fn restart_ignores_existing_checkpoint() {
        let dir = TempDir::new().unwrap();
        create(dir.path(), "IMG_1.jpg", b"photo", JUNE_2021);
        let resolver = mtime_resolver();
        let p = pipeline(dir.path(), OrganizeOptions::default(), &resolver);
        p.checkpoint_store()
            .save(&CheckpointState {
                last_index: 10,
                moved: 10,
                duplicates: 0,
                conflicts: 0,
            })
            .unwrap();

        let options = OrganizeOptions {
            resume: false,
            ..OrganizeOptions::default()
        };
        let result = pipeline(dir.path(), options, &resolver)
            .run(&CancellationToken::new(), |_, _, _, _| {})
            .unwrap();

        assert_eq!(result.moved, 1);
        assert_eq!(result.resumed_from, None);
    }
}
