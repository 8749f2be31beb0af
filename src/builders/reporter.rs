use anyhow::Result;
use colored::Colorize;
use std::io::{self, Write};

use crate::builders::rewriter::{FileOutcome, FileReport};

/// Receives progress from the `FileRewriter`.
///
/// The rewriter never prints on its own; everything the user sees about a
/// `fix-toasts` run goes through one of these.
pub trait StatusReporter {
    /// Called once a file has been read and is about to be rewritten.
    ///
    /// Not called for files that do not exist.
    ///
    /// # Arguments
    /// * `file`: The file as listed in the configuration.
    fn file_started(&mut self, file: &str) -> Result<()>;

    /// Called after a file has been handled, whatever the outcome.
    ///
    /// # Arguments
    /// * `report`: What happened to the file.
    fn file_finished(&mut self, report: &FileReport) -> Result<()>;

    /// Called once at the end of a run that did not stop on an error.
    ///
    /// # Arguments
    /// * `reports`: One report per listed file, in list order.
    fn summary(&mut self, reports: &[FileReport]) -> Result<()>;
}

/// Counters over a finished run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunTotals {
    pub scanned: usize,
    pub rewritten: usize,
    pub unchanged: usize,
    pub missing: usize,
    pub replacements: usize,
}

impl RunTotals {
    pub fn from_reports(reports: &[FileReport]) -> Self {
        let mut totals = RunTotals {
            scanned: reports.len(),
            ..RunTotals::default()
        };
        for report in reports {
            match report.outcome {
                FileOutcome::NotFound => totals.missing += 1,
                FileOutcome::Unchanged => totals.unchanged += 1,
                FileOutcome::Rewritten { replacements, .. } => {
                    totals.rewritten += 1;
                    totals.replacements += replacements;
                }
            }
        }
        totals
    }
}

/// Prints one line per file and a closing summary.
///
/// Writes to stdout by default; tests hand it a `Vec<u8>`.
pub struct ConsoleReporter<W: Write = io::Stdout> {
    out: W,
}

impl ConsoleReporter<io::Stdout> {
    pub fn stdout() -> Self {
        Self { out: io::stdout() }
    }
}

impl<W: Write> ConsoleReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Formats the status line for a finished file.
    ///
    /// # Arguments
    /// * `report`: The `FileReport` for the file.
    ///
    /// # Returns
    /// A `String` holding the icon, the file and, for rewrites, the count.
    fn format_outcome(report: &FileReport) -> String {
        match report.outcome {
            FileOutcome::NotFound => {
                format!("❌ File not found: {}", report.full_path.display())
            }
            FileOutcome::Unchanged => format!("ℹ️  No changes needed: {}", report.file),
            FileOutcome::Rewritten {
                replacements,
                written: true,
            } => format!(
                "✅ Fixed toast calls in: {} ({replacements} replaced)",
                report.file
            ),
            FileOutcome::Rewritten {
                replacements,
                written: false,
            } => format!(
                "🔍 Would fix toast calls in: {} ({replacements} to replace)",
                report.file
            ),
        }
    }
}

impl<W: Write> StatusReporter for ConsoleReporter<W> {
    fn file_started(&mut self, file: &str) -> Result<()> {
        writeln!(self.out, "📝 Processing: {file}")?;
        Ok(())
    }

    fn file_finished(&mut self, report: &FileReport) -> Result<()> {
        writeln!(self.out, "{}", Self::format_outcome(report))?;
        Ok(())
    }

    fn summary(&mut self, reports: &[FileReport]) -> Result<()> {
        let totals = RunTotals::from_reports(reports);

        writeln!(self.out, "\n{}", "📈 Summary:".cyan().bold())?;
        writeln!(self.out, "  Files scanned: {}", totals.scanned)?;
        writeln!(self.out, "  Files rewritten: {}", totals.rewritten)?;
        writeln!(self.out, "  Files unchanged: {}", totals.unchanged)?;
        writeln!(self.out, "  Files missing: {}", totals.missing)?;
        writeln!(self.out, "  Calls replaced: {}", totals.replacements)?;
        writeln!(self.out, "\n✨ Toast API fixes complete!")?;
        Ok(())
    }
}
