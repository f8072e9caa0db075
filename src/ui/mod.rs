//! Terminal output: the batch report and a progress bar.

use owo_colors::OwoColorize;
use std::io::IsTerminal;
use std::path::Path;

use crate::models::{BatchReport, FileOutcome, OutcomeStatus};

/// Check if stdout is a terminal.
pub fn is_terminal() -> bool {
    std::io::stdout().is_terminal()
}

/// Status icons for the report.
pub fn status_icon(status: Status) -> &'static str {
    match status {
        Status::Success => "✓",
        Status::Error => "✗",
        Status::Warning => "⚠",
        Status::Info => "ℹ",
        Status::Pending => "○",
    }
}

/// Status types for colored output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    Error,
    Warning,
    Info,
    Pending,
}

impl Status {
    pub fn of(outcome: &FileOutcome) -> Self {
        match &outcome.status {
            OutcomeStatus::Renamed {
                via_title_search: false,
                ..
            } => Status::Success,
            OutcomeStatus::Renamed { .. } | OutcomeStatus::Fallback { .. } => Status::Warning,
            OutcomeStatus::Unchanged => Status::Pending,
            OutcomeStatus::Failed { .. } => Status::Error,
        }
    }
}

/// Print a styled status line.
pub fn print_status(status: Status, msg: &str) {
    let icon = status_icon(status);
    match status {
        Status::Success => println!("{} {}", icon.green().bold(), msg),
        Status::Error => println!("{} {}", icon.red().bold(), msg),
        Status::Warning => println!("{} {}", icon.yellow().bold(), msg),
        Status::Info => println!("{} {}", icon.cyan().bold(), msg),
        Status::Pending => println!("{} {}", icon.white().dimmed(), msg),
    }
}

/// Print a section header.
pub fn print_section(title: &str) {
    println!();
    println!("{}", format!("━━━ {} ━━━", title).bold().cyan());
}

/// Print a divider line.
pub fn print_divider() {
    println!("{}", "─".repeat(80).dimmed());
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// One-line description of an outcome, without styling.
pub fn describe(outcome: &FileOutcome) -> String {
    let source = display_name(&outcome.source);
    match &outcome.status {
        OutcomeStatus::Renamed {
            target,
            via_title_search,
        } => {
            let note = if *via_title_search {
                " (matched by title, verify)"
            } else {
                ""
            };
            format!("{} -> {}{}", source, display_name(target), note)
        }
        OutcomeStatus::Unchanged => format!("{} (already named)", source),
        OutcomeStatus::Fallback { target, reason } => {
            let doi = outcome
                .doi
                .as_deref()
                .map(|d| format!(", DOI {}", d))
                .unwrap_or_default();
            if target == &outcome.source {
                format!("{} (kept, {}{})", source, reason, doi)
            } else {
                format!("{} -> {} ({}{})", source, display_name(target), reason, doi)
            }
        }
        OutcomeStatus::Failed { reason } => format!("{}: {}", source, reason),
    }
}

/// Counts line, e.g. `3 renamed, 1 unchanged, 1 fallback, 0 failed`.
pub fn summary(report: &BatchReport) -> String {
    format!(
        "{} renamed, {} unchanged, {} fallback, {} failed",
        report.renamed().count(),
        report.unchanged().count(),
        report.fallbacks().count(),
        report.failures().count()
    )
}

/// Print the report grouped by outcome, with colors.
pub fn print_report(report: &BatchReport) {
    let groups: [(&str, Vec<&FileOutcome>); 4] = [
        ("Renamed", report.renamed().collect()),
        ("Needs review", report.fallbacks().collect()),
        ("Failed", report.failures().collect()),
        ("Unchanged", report.unchanged().collect()),
    ];

    for (title, outcomes) in groups.iter().filter(|(_, o)| !o.is_empty()) {
        print_section(title);
        for outcome in outcomes {
            print_status(Status::of(outcome), &describe(outcome));
        }
    }

    println!();
    print_divider();
    let line = summary(report);
    if report.has_failures() {
        println!("{}", line.red().bold());
    } else {
        println!("{}", line.green().bold());
    }
    if report.dry_run {
        println!("{}", "Dry run: no files were renamed".yellow());
    }
}

/// Print the report as undecorated lines, one per file.
pub fn print_report_plain(report: &BatchReport) {
    for outcome in &report.outcomes {
        let label = match outcome.status {
            OutcomeStatus::Renamed { .. } => "renamed",
            OutcomeStatus::Unchanged => "unchanged",
            OutcomeStatus::Fallback { .. } => "fallback",
            OutcomeStatus::Failed { .. } => "failed",
        };
        println!("{}\t{}", label, describe(outcome));
    }
    println!("{}", summary(report));
}

/// Progress bar over the files of a batch.
pub struct BatchProgress {
    pb: indicatif::ProgressBar,
}

impl BatchProgress {
    /// A bar for `len` files; hidden when `visible` is false.
    pub fn new(len: u64, visible: bool) -> Self {
        if !visible {
            return Self {
                pb: indicatif::ProgressBar::hidden(),
            };
        }

        let pb = indicatif::ProgressBar::new(len);
        let style = indicatif::ProgressStyle::with_template(
            "{msg:30!} {bar:40.cyan/blue} {pos}/{len} ({percent}%)",
        )
        .unwrap_or_else(|_| indicatif::ProgressStyle::default_bar())
        .progress_chars("█▓▒░ ");
        pb.set_style(style);

        Self { pb }
    }

    /// Record one finished file.
    pub fn advance(&self, outcome: &FileOutcome) {
        self.pb.set_message(display_name(&outcome.source));
        self.pb.inc(1);
    }

    pub fn finish(&self) {
        self.pb.finish_and_clear();
    }
}
