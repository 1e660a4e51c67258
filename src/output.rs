//! Output formatting and styling module.
//!
//! Provides a centralized interface for all CLI output, including colored output,
//! progress tracking, and the end-of-run summary table.

use crate::orchestrator::{FileIssue, RunSummary};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

/// Manages all CLI output with consistent styling and formatting.
///
/// This struct provides methods for:
/// - Success messages (green with ✓)
/// - Error messages (red with ✗)
/// - Warning messages (yellow with ⚠)
/// - Info messages (cyan)
/// - Progress bars for the run
/// - The run summary table
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use datetidy::output::OutputFormatter;
    /// OutputFormatter::success("All files dated");
    /// ```
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an info message in cyan.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use datetidy::output::OutputFormatter;
    /// OutputFormatter::info("Sorting photos in: /home/user/Pictures");
    /// ```
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    /// Prints a section header.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Creates and returns a progress bar for the run.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use datetidy::output::OutputFormatter;
    /// let pb = OutputFormatter::create_progress_bar(100);
    /// pb.inc(1);
    /// pb.finish_and_clear();
    /// ```
    pub fn create_progress_bar(total: u64) -> ProgressBar {
        let pb = ProgressBar::new(total);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░");
        pb.set_style(style);
        pb
    }

    /// Prints the run counters followed by any failures and warnings.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use datetidy::orchestrator::RunSummary;
    /// use datetidy::output::OutputFormatter;
    ///
    /// let summary = RunSummary { total: 3, relocated: 3, ..Default::default() };
    /// OutputFormatter::summary_table(&summary);
    /// ```
    pub fn summary_table(summary: &RunSummary) {
        Self::header("SUMMARY");

        let rows = [
            ("Relocated", summary.relocated.to_string().green()),
            ("Escalated", summary.escalated.to_string().cyan()),
            ("Skipped", summary.skipped.to_string().yellow()),
            ("Failed", summary.failed.to_string().red()),
        ];
        let width = rows
            .iter()
            .map(|(label, _)| label.len())
            .max()
            .unwrap_or(0);

        println!("{}", "-".repeat(width + 10));
        for (label, count) in &rows {
            println!("{:<width$} | {}", label, count, width = width);
        }
        println!("{}", "-".repeat(width + 10));
        println!(
            "{:<width$} | {} {}",
            "Total".bold(),
            summary.total.to_string().green().bold(),
            if summary.total == 1 { "file" } else { "files" },
            width = width
        );

        Self::issues("Failures", &summary.failures, Self::error);
        Self::issues("Warnings", &summary.warnings, Self::warning);
    }

    fn issues(title: &str, issues: &[FileIssue], print: fn(&str)) {
        if issues.is_empty() {
            return;
        }
        Self::header(title);
        for issue in issues {
            print(&issue.message);
        }
    }

    /// Prints a dry-run notice message.
    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }
}
