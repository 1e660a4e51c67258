//! Handling of files whose date no parser could infer.
//!
//! Depending on the configured [`EscalationStrategy`] an unresolved file is
//! either asked about right away, queued until every other file has been
//! processed, or left alone.

use crate::interaction::{Interaction, InteractionError};
use crate::resolution::{DateResolution, DateSource, Zone};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, warn};

/// What to do with a file whose date could not be inferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationStrategy {
    /// Ask for a date as soon as the file is found.
    #[serde(alias = "live_question")]
    Immediate,
    /// Collect unresolved files and ask about all of them at the end.
    #[default]
    #[serde(alias = "last_question")]
    Deferred,
    /// Leave unresolved files where they are.
    #[serde(alias = "ignore")]
    Skip,
}

impl fmt::Display for EscalationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EscalationStrategy::Immediate => "immediate",
            EscalationStrategy::Deferred => "deferred",
            EscalationStrategy::Skip => "skip",
        })
    }
}

/// Error returned when a strategy name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown escalation strategy '{0}' (expected immediate, deferred or skip)")]
pub struct UnknownStrategy(pub String);

impl FromStr for EscalationStrategy {
    type Err = UnknownStrategy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "immediate" | "live_question" => Ok(EscalationStrategy::Immediate),
            "deferred" | "last_question" => Ok(EscalationStrategy::Deferred),
            "skip" | "ignore" => Ok(EscalationStrategy::Skip),
            _ => Err(UnknownStrategy(s.to_string())),
        }
    }
}

/// A file waiting for a manual date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingFile {
    pub path: PathBuf,
    /// Position of the file in the scan, starting at zero.
    pub discovered_at: usize,
}

/// Why an unresolved file will not be relocated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
    /// The strategy is [`EscalationStrategy::Skip`].
    Skipped,
    /// The user declined to provide a date.
    Aborted(InteractionError),
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DropReason::Skipped => f.write_str("no date could be inferred"),
            DropReason::Aborted(e) => write!(f, "{}", e),
        }
    }
}

/// Outcome of handing an unresolved file to the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Escalation {
    /// A manual date was obtained; the file can be relocated now.
    Resolved(DateResolution),
    /// The file is queued until [`EscalationQueue::drain_all`].
    Deferred,
    /// The file stays where it is.
    Dropped(DropReason),
}

/// A pending file after the end-of-run drain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrainedFile {
    pub file: PendingFile,
    pub outcome: Result<DateResolution, DropReason>,
}

/// Unresolved files and the strategy used to deal with them.
#[derive(Debug)]
pub struct EscalationQueue {
    strategy: EscalationStrategy,
    zone: Zone,
    pending: VecDeque<PendingFile>,
}

impl EscalationQueue {
    pub fn new(strategy: EscalationStrategy, zone: Zone) -> Self {
        Self {
            strategy,
            zone,
            pending: VecDeque::new(),
        }
    }

    pub fn strategy(&self) -> EscalationStrategy {
        self.strategy
    }

    /// Files still waiting for a date, in discovery order.
    pub fn pending(&self) -> impl Iterator<Item = &PendingFile> {
        self.pending.iter()
    }

    /// Hands an unresolved file to the queue.
    ///
    /// Under [`EscalationStrategy::Immediate`] this blocks until the user
    /// supplies a valid date or aborts. Under [`EscalationStrategy::Skip`] the
    /// interaction is never touched.
    pub fn enqueue(
        &mut self,
        path: PathBuf,
        discovered_at: usize,
        interaction: &mut dyn Interaction,
    ) -> Escalation {
        match self.strategy {
            EscalationStrategy::Skip => {
                debug!(path = %path.display(), "unresolved, skipping");
                Escalation::Dropped(DropReason::Skipped)
            }
            EscalationStrategy::Immediate => match request_date(&path, &self.zone, interaction) {
                Ok(resolution) => Escalation::Resolved(resolution),
                Err(e) => Escalation::Dropped(DropReason::Aborted(e)),
            },
            EscalationStrategy::Deferred => {
                debug!(path = %path.display(), discovered_at, "unresolved, deferring");
                self.pending.push_back(PendingFile {
                    path,
                    discovered_at,
                });
                Escalation::Deferred
            }
        }
    }

    /// Asks for a date for every queued file, in discovery order.
    ///
    /// The queue is empty afterwards.
    pub fn drain_all(&mut self, interaction: &mut dyn Interaction) -> Vec<DrainedFile> {
        let mut drained = Vec::with_capacity(self.pending.len());
        while let Some(file) = self.pending.pop_front() {
            let outcome =
                request_date(&file.path, &self.zone, interaction).map_err(DropReason::Aborted);
            drained.push(DrainedFile { file, outcome });
        }
        drained
    }
}

/// Asks until the user types a date we can read, or aborts.
///
/// There is no retry limit; the only exits are a valid date or an abort from
/// the interaction.
pub fn request_date(
    path: &Path,
    zone: &Zone,
    interaction: &mut dyn Interaction,
) -> Result<DateResolution, InteractionError> {
    let title = format!("Could not infer a date for {}", path.display());
    let hint = modified_hint(path, zone);

    loop {
        let answer = interaction.ask(
            &title,
            "Date (YYYY-MM-DD HH:MM:SS): ",
            hint.as_deref(),
        )?;

        match parse_manual_date(&answer, zone) {
            Some(timestamp) => return Ok(DateResolution::new(DateSource::UserInput, timestamp)),
            None => warn!(input = %answer.trim(), "not a date, asking again"),
        }
    }
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y:%m:%d %H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d"];

/// Reads a date typed by the user.
///
/// Accepts RFC 3339 with an explicit offset, or a naive date/time in one of
/// the common layouts, interpreted in `zone`. A bare date means midnight.
///
/// ```
/// use datetidy::escalation::parse_manual_date;
/// use datetidy::resolution::Zone;
///
/// let ts = parse_manual_date("2021-03-05 14:10:55", &Zone::utc()).unwrap();
/// assert_eq!(ts.to_rfc3339(), "2021-03-05T14:10:55+00:00");
/// assert!(parse_manual_date("yesterday", &Zone::utc()).is_none());
/// ```
pub fn parse_manual_date(input: &str, zone: &Zone) -> Option<DateTime<chrono::FixedOffset>> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt);
    }

    let naive = DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(input, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(input, fmt).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })?;

    zone.localize(naive)
}

fn modified_hint(path: &Path, zone: &Zone) -> Option<String> {
    let modified = fs::metadata(path).and_then(|m| m.modified()).ok()?;
    let when = zone.from_utc(DateTime::<Utc>::from(modified));
    Some(format!("last modified {}", when.format("%Y-%m-%d %H:%M:%S")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interaction::ScriptedInteraction;

    fn queue(strategy: EscalationStrategy) -> EscalationQueue {
        EscalationQueue::new(strategy, Zone::utc())
    }

    #[test]
    fn test_skip_never_asks() {
        let mut script = ScriptedInteraction::new([Some("2020-01-01")]);
        let mut q = queue(EscalationStrategy::Skip);

        let outcome = q.enqueue(PathBuf::from("/a.jpg"), 0, &mut script);

        assert_eq!(outcome, Escalation::Dropped(DropReason::Skipped));
        assert!(script.asked().is_empty());
        assert_eq!(q.pending().count(), 0);
    }

    #[test]
    fn test_immediate_asks_once_for_valid_input() {
        let mut script = ScriptedInteraction::new([Some("2020-01-02 03:04:05")]);
        let mut q = queue(EscalationStrategy::Immediate);

        let outcome = q.enqueue(PathBuf::from("/a.jpg"), 0, &mut script);

        match outcome {
            Escalation::Resolved(res) => {
                assert_eq!(res.source, DateSource::UserInput);
                assert_eq!(res.timestamp.to_rfc3339(), "2020-01-02T03:04:05+00:00");
            }
            other => panic!("expected a resolution, got {:?}", other),
        }
        assert_eq!(script.asked().len(), 1);
    }

    #[test]
    fn test_invalid_input_is_asked_again() {
        let mut script =
            ScriptedInteraction::new([Some("soon"), Some(""), Some("2020-13-01"), Some("2020-12-01")]);
        let mut q = queue(EscalationStrategy::Immediate);

        let outcome = q.enqueue(PathBuf::from("/a.jpg"), 0, &mut script);

        assert!(matches!(outcome, Escalation::Resolved(_)));
        assert_eq!(script.asked().len(), 4);
    }

    #[test]
    fn test_abort_drops_the_file() {
        let mut script = ScriptedInteraction::new([Some("nope"), None]);
        let mut q = queue(EscalationStrategy::Immediate);

        let outcome = q.enqueue(PathBuf::from("/a.jpg"), 0, &mut script);

        assert!(matches!(
            outcome,
            Escalation::Dropped(DropReason::Aborted(_))
        ));
    }

    #[test]
    fn test_deferred_waits_then_drains_in_discovery_order() {
        let mut script = ScriptedInteraction::new([
            Some("2020-01-01"),
            None,
            Some("2020-03-03 10:00"),
        ]);
        let mut q = queue(EscalationStrategy::Deferred);

        for (i, name) in ["/c.jpg", "/a.jpg", "/b.jpg"].iter().enumerate() {
            assert_eq!(
                q.enqueue(PathBuf::from(name), i * 2, &mut script),
                Escalation::Deferred
            );
        }
        assert!(script.asked().is_empty());

        let drained = q.drain_all(&mut script);

        let order: Vec<_> = drained.iter().map(|d| d.file.discovered_at).collect();
        assert_eq!(order, vec![0, 2, 4]);
        assert!(drained[0].outcome.is_ok());
        assert!(drained[1].outcome.is_err());
        assert!(drained[2].outcome.is_ok());
        assert!(script.asked()[0].contains("/c.jpg"));
        assert_eq!(q.pending().count(), 0);
    }

    #[test]
    fn test_manual_date_formats() {
        let utc = Zone::utc();
        let expect = |input: &str, rfc: &str| {
            assert_eq!(
                parse_manual_date(input, &utc).map(|d| d.to_rfc3339()),
                Some(rfc.to_string()),
                "{}",
                input
            );
        };

        expect("2021-03-05 14:10:55", "2021-03-05T14:10:55+00:00");
        expect("  2021-03-05 14:10 ", "2021-03-05T14:10:00+00:00");
        expect("2021:03:05 14:10:55", "2021-03-05T14:10:55+00:00");
        expect("2021/03/05", "2021-03-05T00:00:00+00:00");
        expect("2021-03-05T14:10:55+09:00", "2021-03-05T14:10:55+09:00");
        assert!(parse_manual_date("05/03/2021", &utc).is_none());
    }

    #[test]
    fn test_hint_uses_run_zone() {
        let temp_dir = tempfile::TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("a.jpg");
        let file = fs::File::create(&path).expect("Failed to create file");
        let when = DateTime::parse_from_rfc3339("2021-03-05T14:10:55+00:00").unwrap();
        file.set_modified(when.into()).expect("Failed to set mtime");

        let tokyo: Zone = "+09:00".parse().unwrap();
        assert_eq!(
            modified_hint(&path, &tokyo).as_deref(),
            Some("last modified 2021-03-05 23:10:55")
        );
        assert_eq!(
            modified_hint(&path, &Zone::utc()).as_deref(),
            Some("last modified 2021-03-05 14:10:55")
        );
    }

    #[test]
    fn test_strategy_names() {
        assert_eq!("IMMEDIATE".parse(), Ok(EscalationStrategy::Immediate));
        assert_eq!("last_question".parse(), Ok(EscalationStrategy::Deferred));
        assert_eq!("ignore".parse(), Ok(EscalationStrategy::Skip));
        assert!("later".parse::<EscalationStrategy>().is_err());
    }
}
