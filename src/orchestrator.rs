//! The per-run pipeline: resolve, escalate, relocate, count.

use crate::config::RunSettings;
use crate::escalation::{DropReason, Escalation, EscalationQueue};
use crate::interaction::Interaction;
use crate::parser::{DateParser, ParseContext};
use crate::relocator::{RelocateError, Relocator};
use crate::resolution::DateResolution;
use crate::resolver::resolve;
use crate::trust::TrustPolicy;
use indicatif::ProgressBar;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A per-file problem worth reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileIssue {
    pub path: PathBuf,
    pub message: String,
}

impl FileIssue {
    fn new(path: &Path, message: impl ToString) -> Self {
        Self {
            path: path.to_path_buf(),
            message: message.to_string(),
        }
    }
}

/// Outcome counters for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Files handed to the run.
    pub total: usize,
    /// Files moved (or planned, in a dry run) or already in place.
    pub relocated: usize,
    /// Files no parser could date, whatever happened to them next.
    pub escalated: usize,
    /// Files left untouched because they were skipped or the user aborted.
    pub skipped: usize,
    /// Files whose relocation failed.
    pub failed: usize,
    pub failures: Vec<FileIssue>,
    pub warnings: Vec<FileIssue>,
}

/// Reported once per run in place of per-file creation-time warnings.
const CREATION_TIME_UNSUPPORTED: &str =
    "creation times cannot be set on this platform; modification times were rewritten instead";

/// Counters plus per-run bookkeeping that is not reported.
#[derive(Default)]
struct Tally {
    summary: RunSummary,
    creation_time_noted: bool,
}

/// Runs the date pipeline over a list of files.
pub struct Orchestrator {
    parsers: Vec<Box<dyn DateParser>>,
    policy: TrustPolicy,
    settings: RunSettings,
    relocator: Relocator,
    progress: ProgressBar,
}

impl Orchestrator {
    pub fn new(
        parsers: Vec<Box<dyn DateParser>>,
        policy: TrustPolicy,
        settings: RunSettings,
    ) -> Self {
        Self {
            relocator: Relocator::new(&settings),
            parsers,
            policy,
            settings,
            progress: ProgressBar::hidden(),
        }
    }

    /// Advances `progress` once per file.
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    /// Processes `files` in order and returns what happened.
    ///
    /// Resolved files are relocated as soon as they are resolved. Unresolved
    /// files go through the escalation strategy; deferred ones are asked for
    /// after the last file and relocated then. No per-file error stops the run.
    pub fn execute(&self, files: &[PathBuf], interaction: &mut dyn Interaction) -> RunSummary {
        let context = ParseContext::new(self.settings.zone);
        let mut queue = EscalationQueue::new(self.settings.escalation, self.settings.zone);
        let mut tally = Tally::default();
        tally.summary.total = files.len();

        for (index, path) in files.iter().enumerate() {
            if let Some(name) = path.file_name() {
                self.progress.set_message(name.to_string_lossy().to_string());
            }

            match resolve(path, &self.parsers, &self.policy, &context) {
                Some(resolution) => self.relocate(path, &resolution, &mut tally),
                None => {
                    tally.summary.escalated += 1;
                    match queue.enqueue(path.clone(), index, interaction) {
                        Escalation::Resolved(resolution) => {
                            self.relocate(path, &resolution, &mut tally)
                        }
                        Escalation::Deferred => {}
                        Escalation::Dropped(reason) => Self::drop_file(path, reason, &mut tally),
                    }
                }
            }

            self.progress.inc(1);
        }

        for drained in queue.drain_all(interaction) {
            match drained.outcome {
                Ok(resolution) => self.relocate(&drained.file.path, &resolution, &mut tally),
                Err(reason) => Self::drop_file(&drained.file.path, reason, &mut tally),
            }
        }

        tally.summary
    }

    fn relocate(&self, path: &Path, resolution: &DateResolution, tally: &mut Tally) {
        let summary = &mut tally.summary;
        match self.relocator.relocate(path, resolution) {
            Ok(relocation) => {
                summary.relocated += 1;
                debug!(
                    path = %relocation.new_path.display(),
                    %resolution,
                    moved = relocation.moved,
                    "placed"
                );
                for warning in relocation.warnings {
                    if let RelocateError::TimestampRewriteUnsupported { .. } = warning {
                        debug!(path = %path.display(), "{}", warning);
                        if !tally.creation_time_noted {
                            tally.creation_time_noted = true;
                            warn!("{}", CREATION_TIME_UNSUPPORTED);
                            summary
                                .warnings
                                .push(FileIssue::new(path, CREATION_TIME_UNSUPPORTED));
                        }
                        continue;
                    }
                    warn!(path = %path.display(), "{}", warning);
                    summary.warnings.push(FileIssue::new(path, warning));
                }
            }
            Err(e) => {
                warn!(path = %path.display(), "{}", e);
                summary.failed += 1;
                summary.failures.push(FileIssue::new(path, e));
            }
        }
    }

    fn drop_file(path: &Path, reason: DropReason, tally: &mut Tally) {
        tally.summary.skipped += 1;
        if let DropReason::Aborted(e) = reason {
            warn!(path = %path.display(), "{}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::escalation::EscalationStrategy;
    use crate::interaction::ScriptedInteraction;
    use crate::parser::FilenameDateParser;
    use crate::relocator::CollisionPolicy;
    use crate::resolution::Zone;
    use std::fs;
    use tempfile::TempDir;

    fn orchestrator(root: &Path, strategy: EscalationStrategy) -> Orchestrator {
        let mut settings = RunSettings::new(root);
        settings.escalation = strategy;
        settings.alter_creation_time = false;
        settings.zone = Zone::utc();
        Orchestrator::new(
            vec![Box::new(FilenameDateParser)],
            TrustPolicy::default(),
            settings,
        )
    }

    fn create(root: &Path, names: &[&str]) -> Vec<PathBuf> {
        names
            .iter()
            .map(|name| {
                let path = root.join(name);
                fs::write(&path, name.as_bytes()).unwrap();
                path
            })
            .collect()
    }

    #[test]
    fn test_resolved_files_are_relocated() {
        let temp = TempDir::new().unwrap();
        let files = create(temp.path(), &["IMG_20210305_141055.jpg", "20191231.png"]);

        let mut script = ScriptedInteraction::default();
        let summary = orchestrator(temp.path(), EscalationStrategy::Deferred)
            .execute(&files, &mut script);

        assert_eq!(summary.total, 2);
        assert_eq!(summary.relocated, 2);
        assert_eq!(summary.escalated, 0);
        assert!(script.asked().is_empty());
        assert!(temp.path().join("2021.03/IMG_20210305_141055.jpg").exists());
        assert!(temp.path().join("2019.12/20191231.png").exists());
    }

    #[test]
    fn test_skip_never_asks() {
        let temp = TempDir::new().unwrap();
        let files = create(temp.path(), &["holiday.jpg"]);

        let mut script = ScriptedInteraction::new([Some("2020-01-01")]);
        let summary =
            orchestrator(temp.path(), EscalationStrategy::Skip).execute(&files, &mut script);

        assert_eq!(summary.escalated, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.relocated, 0);
        assert!(script.asked().is_empty());
        assert!(files[0].exists());
    }

    #[test]
    fn test_immediate_asks_before_next_file() {
        let temp = TempDir::new().unwrap();
        let files = create(temp.path(), &["a.jpg", "IMG_20200101_000000.jpg", "b.jpg"]);

        let mut script = ScriptedInteraction::new([Some("2018-06-01"), None]);
        let summary =
            orchestrator(temp.path(), EscalationStrategy::Immediate).execute(&files, &mut script);

        assert_eq!(script.asked().len(), 2);
        assert!(script.asked()[0].contains("a.jpg"));
        assert!(script.asked()[1].contains("b.jpg"));
        assert_eq!(summary.escalated, 2);
        assert_eq!(summary.relocated, 2);
        assert_eq!(summary.skipped, 1);
        assert!(temp.path().join("2018.06/a.jpg").exists());
        assert!(files[2].exists());
    }

    #[test]
    fn test_deferred_asks_after_all_files_in_discovery_order() {
        let temp = TempDir::new().unwrap();
        let files = create(temp.path(), &["x.jpg", "IMG_20200101_000000.jpg", "y.jpg"]);

        let mut script = ScriptedInteraction::new([Some("2017-02-03"), Some("2016-04-05")]);
        let summary =
            orchestrator(temp.path(), EscalationStrategy::Deferred).execute(&files, &mut script);

        assert_eq!(script.asked().len(), 2);
        assert!(script.asked()[0].contains("x.jpg"));
        assert!(script.asked()[1].contains("y.jpg"));
        assert_eq!(summary.relocated, 3);
        assert!(temp.path().join("2020.01/IMG_20200101_000000.jpg").exists());
        assert!(temp.path().join("2017.02/x.jpg").exists());
        assert!(temp.path().join("2016.04/y.jpg").exists());
    }

    #[test]
    fn test_invalid_answer_reprompts() {
        let temp = TempDir::new().unwrap();
        let files = create(temp.path(), &["z.jpg"]);

        let mut script = ScriptedInteraction::new([Some("soon"), Some(""), Some("2015-05-05 10:00:00")]);
        let summary =
            orchestrator(temp.path(), EscalationStrategy::Immediate).execute(&files, &mut script);

        assert_eq!(script.asked().len(), 3);
        assert_eq!(summary.relocated, 1);
        assert!(temp.path().join("2015.05/z.jpg").exists());
    }

    #[test]
    fn test_collision_is_counted_and_run_continues() {
        let temp = TempDir::new().unwrap();
        let out = temp.path().join("out");
        fs::create_dir_all(out.join("2021.03")).unwrap();
        fs::write(out.join("2021.03/IMG_20210305_141055.jpg"), b"taken").unwrap();

        let files = create(temp.path(), &["IMG_20210305_141055.jpg", "IMG_20210306_090000.jpg"]);

        let mut settings = RunSettings::new(&out);
        settings.alter_creation_time = false;
        settings.collision = CollisionPolicy::Reject;
        let orchestrator = Orchestrator::new(
            vec![Box::new(FilenameDateParser)],
            TrustPolicy::default(),
            settings,
        );
        let summary = orchestrator.execute(&files, &mut ScriptedInteraction::default());

        assert_eq!(summary.failed, 1);
        assert_eq!(summary.relocated, 1);
        assert_eq!(summary.failures[0].path, files[0]);
        assert!(files[0].exists());
        assert!(out.join("2021.03/IMG_20210306_090000.jpg").exists());
        assert_eq!(
            fs::read(out.join("2021.03/IMG_20210305_141055.jpg")).unwrap(),
            b"taken"
        );
    }

    #[test]
    fn test_unsupported_creation_time_reported_once() {
        let temp = TempDir::new().unwrap();
        let files = create(
            temp.path(),
            &[
                "IMG_20210305_141055.jpg",
                "IMG_20210306_090000.jpg",
                "IMG_20210307_120000.jpg",
            ],
        );

        let mut settings = RunSettings::new(temp.path());
        settings.zone = Zone::utc();
        let orchestrator = Orchestrator::new(
            vec![Box::new(FilenameDateParser)],
            TrustPolicy::default(),
            settings,
        );
        let summary = orchestrator.execute(&files, &mut ScriptedInteraction::default());

        assert_eq!(summary.relocated, 3);
        if cfg!(any(windows, target_os = "macos")) {
            assert!(summary.warnings.is_empty());
        } else {
            assert_eq!(summary.warnings.len(), 1);
            assert_eq!(summary.warnings[0].message, CREATION_TIME_UNSUPPORTED);
        }
    }

    #[test]
    fn test_empty_file_list() {
        let temp = TempDir::new().unwrap();
        let summary = orchestrator(temp.path(), EscalationStrategy::Deferred)
            .execute(&[], &mut ScriptedInteraction::default());
        assert_eq!(summary, RunSummary::default());
    }
}
