//! Command-line interface module for datetidy.
//!
//! This module handles all CLI-related functionality including:
//! - Argument parsing and config overrides
//! - Trust policy and filter validation
//! - Scanning the target directory
//! - Running the date pipeline and reporting the outcome

use crate::config::{Config, OrganizeConfig};
use crate::escalation::EscalationStrategy;
use crate::interaction::ConsoleInteraction;
use crate::orchestrator::{Orchestrator, RunSummary};
use crate::output::OutputFormatter;
use crate::parser::build_parsers;
use crate::relocator::CollisionPolicy;
use crate::resolution::DateSource;
use crate::scanner::Scanner;
use clap::{ArgAction, Parser};
use std::path::PathBuf;
use tracing::debug;

/// Sort photos and videos into dated folders.
#[derive(Parser, Debug, Clone)]
#[command(name = "datetidy", version, about)]
pub struct Args {
    /// Directory to scan, recursively
    pub target: PathBuf,

    /// Root of the dated folders (defaults to the target)
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Date sources, most trusted first, e.g. filename,metadata,user_input,filesystem_created
    #[arg(long, value_name = "SOURCES", value_delimiter = ',')]
    pub trust_order: Option<Vec<DateSource>>,

    /// What to do with undated files: immediate, deferred or skip
    #[arg(long, value_name = "STRATEGY")]
    pub escalation: Option<EscalationStrategy>,

    /// Rewrite file times to the resolved date
    #[arg(long, conflicts_with = "keep_times")]
    pub alter_times: bool,

    /// Leave file times untouched
    #[arg(long)]
    pub keep_times: bool,

    /// What to do when the destination name is taken: reject or suffix
    #[arg(long, value_name = "POLICY")]
    pub collision: Option<CollisionPolicy>,

    /// Show where files would go without moving anything
    #[arg(long)]
    pub dry_run: bool,

    /// Print the run summary as JSON
    #[arg(long)]
    pub json: bool,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    /// Applies command-line flags on top of the loaded configuration.
    pub fn apply_overrides(&self, organize: &mut OrganizeConfig) {
        if let Some(output) = &self.output {
            organize.output_root = Some(output.clone());
        }
        if let Some(order) = &self.trust_order {
            organize.trust_order = order.clone();
        }
        if let Some(strategy) = self.escalation {
            organize.escalation = strategy;
        }
        if self.alter_times {
            organize.alter_creation_time = true;
        }
        if self.keep_times {
            organize.alter_creation_time = false;
        }
        if let Some(collision) = self.collision {
            organize.collision = collision;
        }
    }
}

/// Runs the CLI application with the given arguments.
///
/// Configuration, policy and scan errors are fatal and returned as messages
/// before any file is touched. Per-file problems end up in the returned
/// summary instead.
///
/// # Examples
///
/// ```no_run
/// use clap::Parser;
/// use datetidy::cli::{Args, run_cli};
///
/// let args = Args::parse_from(["datetidy", "/path/to/photos", "--dry-run"]);
/// match run_cli(&args) {
///     Ok(summary) => println!("{} files relocated", summary.relocated),
///     Err(e) => eprintln!("Error: {}", e),
/// }
/// ```
pub fn run_cli(args: &Args) -> Result<RunSummary, String> {
    let mut config = Config::load(args.config.as_deref())
        .map_err(|e| format!("Error loading configuration: {}", e))?;
    args.apply_overrides(&mut config.organize);

    let policy = config
        .organize
        .trust_policy()
        .map_err(|e| format!("Error in trust order: {}", e))?;
    let filters = config
        .compile_filters()
        .map_err(|e| format!("Error compiling filters: {}", e))?;
    let mut settings = config
        .organize
        .run_settings(&args.target)
        .map_err(|e| format!("Error in configuration: {}", e))?;
    settings.dry_run = args.dry_run;

    let files = Scanner::new(&filters)
        .skip_dir(&settings.output_root)
        .scan(&args.target)
        .map_err(|e| format!("Error reading directory {}: {}", args.target.display(), e))?;

    debug!(trust_order = %policy, escalation = %settings.escalation, "settings");

    if !args.json {
        OutputFormatter::info(&format!(
            "Sorting {} files from {} into {}",
            files.len(),
            args.target.display(),
            settings.output_root.display()
        ));
        if settings.dry_run {
            OutputFormatter::dry_run_notice("No files will be moved.");
        }
    }

    let progress = OutputFormatter::create_progress_bar(files.len() as u64);
    let mut interaction = ConsoleInteraction::new().with_progress(progress.clone());
    let orchestrator = Orchestrator::new(build_parsers(&config.organize.parsers), policy, settings)
        .with_progress(progress.clone());

    let summary = orchestrator.execute(&files, &mut interaction);
    progress.finish_and_clear();

    if args.json {
        let json = serde_json::to_string_pretty(&summary)
            .map_err(|e| format!("Error serializing summary: {}", e))?;
        println!("{}", json);
    } else {
        OutputFormatter::summary_table(&summary);
        if summary.failed == 0 && summary.skipped == 0 {
            OutputFormatter::success("Done.");
        } else {
            OutputFormatter::warning("Some files were left in place. See above.");
        }
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_args() {
        let args = Args::try_parse_from(["datetidy", "/photos"]).unwrap();
        assert_eq!(args.target, PathBuf::from("/photos"));
        assert!(args.trust_order.is_none());
        assert!(!args.dry_run);
        assert_eq!(args.verbose, 0);
    }

    #[test]
    fn test_overrides_replace_config_values() {
        let args = Args::try_parse_from([
            "datetidy",
            "/photos",
            "-o",
            "/sorted",
            "--trust-order",
            "metadata,filename,user_input,filesystem_created",
            "--escalation",
            "skip",
            "--keep-times",
            "--collision",
            "suffix",
            "-vv",
        ])
        .unwrap();

        let mut organize = OrganizeConfig::default();
        args.apply_overrides(&mut organize);

        assert_eq!(organize.output_root, Some(PathBuf::from("/sorted")));
        assert_eq!(organize.trust_order[0], DateSource::Metadata);
        assert_eq!(organize.escalation, EscalationStrategy::Skip);
        assert!(!organize.alter_creation_time);
        assert_eq!(organize.collision, CollisionPolicy::Suffix);
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_no_flags_keep_config_values() {
        let args = Args::try_parse_from(["datetidy", "/photos"]).unwrap();
        let mut organize = OrganizeConfig {
            escalation: EscalationStrategy::Immediate,
            alter_creation_time: false,
            ..Default::default()
        };
        args.apply_overrides(&mut organize);

        assert_eq!(organize.escalation, EscalationStrategy::Immediate);
        assert!(!organize.alter_creation_time);
        assert!(organize.output_root.is_none());
    }

    #[test]
    fn test_conflicting_time_flags_rejected() {
        assert!(Args::try_parse_from(["datetidy", "/p", "--alter-times", "--keep-times"]).is_err());
    }

    #[test]
    fn test_unknown_source_rejected() {
        assert!(Args::try_parse_from(["datetidy", "/p", "--trust-order", "gps"]).is_err());
    }
}
