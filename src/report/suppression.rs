//! Suppression candidates: round-trip rendering and file lookup.
//!
//! When the checker is asked to generate suppressions, each error carries a
//! suppression block. Rendering reproduces the checker's own brace-delimited
//! suppression-file syntax byte for byte, so the output can be pasted
//! directly into a `.supp` file.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::RuntimeVersion;

/// Whether a suppression pattern matches a function name or an object path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PatternKind {
    Function,
    Object,
}

/// One `fun:`/`obj:` line of a suppression block, in original order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuppressionPattern {
    pub kind: PatternKind,
    pub value: String,
}

/// A suppression candidate emitted by the checker for one error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suppression {
    pub name: String,
    pub kind: String,
    /// Auxiliary kind text (e.g. `match-leak-kinds: definite`). Stored for
    /// callers that want it; not part of the rendered block.
    pub aux: Option<String>,
    pub patterns: Vec<SuppressionPattern>,
}

impl fmt::Display for Suppression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{{")?;
        writeln!(f, "  {}", self.name)?;
        writeln!(f, "  {}", self.kind)?;
        for pattern in &self.patterns {
            match pattern.kind {
                PatternKind::Function => writeln!(f, "  fun:{}", pattern.value)?,
                PatternKind::Object => writeln!(f, "  obj:{}", pattern.value)?,
            }
        }
        writeln!(f, "}}")
    }
}

/// Candidate suppression file names for a binary under a given interpreter,
/// most specific first: `<binary>_<engine>-<version>.<patch>.supp` down to
/// `<binary>_<engine>.supp`. A binary name with path components is reduced
/// to its base name.
pub fn candidate_file_names(binary_name: &str, runtime: &RuntimeVersion) -> Vec<String> {
    let base = binary_base_name(binary_name);
    runtime
        .candidates()
        .into_iter()
        .map(|candidate| format!("{base}_{candidate}.supp"))
        .collect()
}

/// Resolve the suppression files that exist on disk, per directory in the
/// given order, most specific candidate first within each directory. More
/// specific files take precedence implicitly by being listed first.
pub fn resolve_suppression_files(
    binary_name: &str,
    runtime: &RuntimeVersion,
    dirs: &[PathBuf],
) -> Vec<PathBuf> {
    let names = candidate_file_names(binary_name, runtime);
    let mut files = Vec::new();
    for dir in dirs {
        for name in &names {
            let path = dir.join(name);
            if path.is_file() {
                files.push(path);
            }
        }
    }
    files
}

/// Base name of the binary as used in suppression file names.
fn binary_base_name(binary_name: &str) -> &str {
    Path::new(binary_name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(binary_name)
}
