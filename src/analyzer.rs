//! Aggregation and reporting of surviving errors across a run's reports.
//!
//! A run under the checker produces one report file per traced process
//! (the program under test plus any children it forked). Analysis happens
//! strictly after all of them have terminated: files are parsed in
//! discovery order, leak-class errors are filtered through the skip
//! policy, and the survivors are kept in file-then-document order. The
//! report files are deleted once parsing is done, on every exit path, so
//! repeated runs never pick up stale files.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::Configuration;
use crate::error::{MemsiftError, Result};
use crate::report::error::ValgrindError;
use crate::report::parser;

/// The outcome of analyzing one run's report files.
///
/// `failed` is a property of the reports alone: a non-empty surviving
/// collection is a failure even if the traced process exited zero, and a
/// traced-process failure with zero surviving errors must not be reported
/// as a memory-error failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Analysis {
    pub errors: Vec<ValgrindError>,
    pub failed: bool,
}

impl Analysis {
    /// Write every surviving error to the sink, blank-line separated, with
    /// target-binary frames marked.
    pub fn report_to<W: io::Write>(&self, config: &Configuration, out: &mut W) -> io::Result<()> {
        for error in &self.errors {
            writeln!(out, "{}", error.render(config))?;
        }
        Ok(())
    }
}

/// Deletes the run's report files when dropped, regardless of how the
/// analysis exited.
struct ReportFiles<'a> {
    files: &'a [PathBuf],
}

impl Drop for ReportFiles<'_> {
    fn drop(&mut self) {
        for path in self.files {
            if let Err(err) = fs::remove_file(path) {
                if err.kind() != io::ErrorKind::NotFound {
                    warn!(report = %path.display(), error = %err, "failed to remove report file");
                }
            }
        }
    }
}

/// List a report directory's files in deterministic (name-sorted) order.
/// The checker writes one file per process id into this directory.
pub fn report_files_in(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Parse and filter all report files of a run.
///
/// Errors are collected in file order, then document order within each
/// file. The skip policy applies to leak-class errors only; everything
/// else always survives. The report files are removed before this
/// returns, on success and on error alike.
pub fn analyze(report_files: &[PathBuf], config: &Configuration) -> Result<Analysis> {
    let _cleanup = ReportFiles {
        files: report_files,
    };

    let mut errors = Vec::new();
    for path in report_files {
        for error in parser::parse_file(path, config)? {
            if error.skip(config) {
                debug!(kind = %error.kind, "dropping non-actionable leak");
                continue;
            }
            errors.push(error);
        }
    }

    info!(
        files = report_files.len(),
        surviving = errors.len(),
        "report analysis complete"
    );
    let failed = !errors.is_empty();
    Ok(Analysis { errors, failed })
}

/// Analyze, render every surviving error to the sink, and signal failure.
///
/// On a non-empty surviving collection this returns
/// [`MemsiftError::ErrorsReported`] after the full rendered output has
/// been written, so the caller's failure path has complete diagnostic
/// context without re-inspecting the analysis.
pub fn check<W: io::Write>(
    report_files: &[PathBuf],
    config: &Configuration,
    out: &mut W,
) -> Result<()> {
    let analysis = analyze(report_files, config)?;
    if analysis.failed {
        analysis.report_to(config, out)?;
        return Err(MemsiftError::ErrorsReported {
            count: analysis.errors.len(),
        });
    }
    Ok(())
}
