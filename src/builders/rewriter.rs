use anyhow::{Context, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::builders::reporter::StatusReporter;
use crate::builders::rules::TextRewriter;

/// What happened to one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    NotFound,
    Unchanged,
    /// `written` is false on a dry run.
    Rewritten { replacements: usize, written: bool },
}

#[derive(Debug, Clone)]
pub struct FileReport {
    /// The path as configured, relative to the base directory.
    pub file: String,
    pub full_path: PathBuf,
    pub outcome: FileOutcome,
}

/// Rewrites a list of files in place under `base_dir`.
///
/// Files are handled one at a time with no rollback: an I/O error other than
/// "not found" stops the run, and files rewritten before it stay rewritten.
pub struct FileRewriter<'a> {
    base_dir: PathBuf,
    rewriter: &'a dyn TextRewriter,
    dry_run: bool,
}

impl<'a> FileRewriter<'a> {
    pub fn new(base_dir: impl Into<PathBuf>, rewriter: &'a dyn TextRewriter) -> Self {
        Self {
            base_dir: base_dir.into(),
            rewriter,
            dry_run: false,
        }
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Rewrites a single file, writing it back only if its text changed.
    pub fn rewrite_file(
        &self,
        file: &str,
        reporter: &mut dyn StatusReporter,
    ) -> Result<FileReport> {
        let full_path = self.base_dir.join(file);

        let content = match fs::read_to_string(&full_path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                let report = FileReport {
                    file: file.to_string(),
                    full_path,
                    outcome: FileOutcome::NotFound,
                };
                reporter.file_finished(&report)?;
                return Ok(report);
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", full_path.display()));
            }
        };

        reporter.file_started(file)?;

        let rewrite = self.rewriter.rewrite(&content);
        debug!("{file}: {:?}", rewrite.counts);

        let outcome = if rewrite.content == content {
            FileOutcome::Unchanged
        } else {
            if !self.dry_run {
                fs::write(&full_path, &rewrite.content)
                    .with_context(|| format!("Failed to write {}", full_path.display()))?;
            }
            FileOutcome::Rewritten {
                replacements: rewrite.replacements(),
                written: !self.dry_run,
            }
        };

        let report = FileReport {
            file: file.to_string(),
            full_path,
            outcome,
        };
        reporter.file_finished(&report)?;
        Ok(report)
    }

    /// Rewrites every file in order, then prints the summary.
    pub fn run(&self, files: &[String], reporter: &mut dyn StatusReporter) -> Result<Vec<FileReport>> {
        let mut reports = Vec::with_capacity(files.len());
        for file in files {
            reports.push(self.rewrite_file(file, reporter)?);
        }
        reporter.summary(&reports)?;
        Ok(reports)
    }
}
