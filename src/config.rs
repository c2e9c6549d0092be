//! Runtime and binary identity for report classification.
//!
//! A [`Configuration`] is constructed once per test invocation and passed
//! by reference into every parse, classification, and aggregation call.
//! There is no process-wide default; the caller owns the value.

use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::report::suppression;

/// Default skip patterns for the CRuby runtime: allocation paths that are
/// reached by calling back into the interpreter and are known not to be
/// leaks in the extension under test.
pub static DEFAULT_SKIP_PATTERNS: Lazy<Vec<FunctionMatcher>> = Lazy::new(|| {
    vec![
        FunctionMatcher::exact("eval_string_with_cref"),
        FunctionMatcher::exact("rb_add_method_cfunc"),
        FunctionMatcher::prefix("rb_check_funcall"),
        // Called for all the different ways to create a Class
        FunctionMatcher::exact("rb_class_boot"),
        FunctionMatcher::exact("rb_enc_raise"),
        FunctionMatcher::exact("rb_exc_raise"),
        FunctionMatcher::exact("rb_extend_object"),
        FunctionMatcher::prefix("rb_funcall"),
        FunctionMatcher::prefix("rb_intern"),
        FunctionMatcher::exact("rb_ivar_set"),
        FunctionMatcher::exact("rb_module_new"),
        FunctionMatcher::exact("rb_raise"),
        FunctionMatcher::prefix("rb_rescue"),
        FunctionMatcher::exact("rb_respond_to"),
        // Threads are released to a cache, so they may be reported as leaked
        FunctionMatcher::exact("rb_thread_create"),
        FunctionMatcher::prefix("rb_yield"),
    ]
});

/// Default directory searched for suppression files.
pub const DEFAULT_SUPPRESSIONS_DIR: &str = "suppressions";

/// An ordered string-matching predicate over function or object names.
#[derive(Debug, Clone)]
pub enum FunctionMatcher {
    /// The name must equal the string exactly.
    Exact(String),
    /// The name must start with the string.
    Prefix(String),
    /// The name must match the regular expression.
    Pattern(Regex),
}

impl FunctionMatcher {
    pub fn exact(name: impl Into<String>) -> Self {
        FunctionMatcher::Exact(name.into())
    }

    pub fn prefix(name: impl Into<String>) -> Self {
        FunctionMatcher::Prefix(name.into())
    }

    pub fn pattern(re: &str) -> Result<Self, regex::Error> {
        Ok(FunctionMatcher::Pattern(Regex::new(re)?))
    }

    pub fn matches(&self, name: &str) -> bool {
        match self {
            FunctionMatcher::Exact(s) => name == s,
            FunctionMatcher::Prefix(s) => name.starts_with(s.as_str()),
            FunctionMatcher::Pattern(re) => re.is_match(name),
        }
    }
}

/// Identity of the running interpreter: engine name, dotted version, and
/// patch level. Used to recognize versioned runtime shared objects and to
/// build the suppression-file fallback chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeVersion {
    pub engine: String,
    pub version: String,
    pub patch: String,
}

impl RuntimeVersion {
    pub fn new(
        engine: impl Into<String>,
        version: impl Into<String>,
        patch: impl Into<String>,
    ) -> Self {
        Self {
            engine: engine.into(),
            version: version.into(),
            patch: patch.into(),
        }
    }

    /// The full identity string, e.g. `ruby-3.1.2.20`.
    pub fn full(&self) -> String {
        format!("{}-{}.{}", self.engine, self.version, self.patch)
    }

    /// Version candidates from most specific to least: the full identity
    /// string, then one fewer trailing version component each step, then
    /// the bare engine name. A project can ship suppressions scoped to an
    /// exact interpreter build, a minor-version family, or any build of
    /// the engine.
    pub fn candidates(&self) -> Vec<String> {
        let full = self.full();
        let mut out = vec![full.clone()];
        let mut cur = full;
        while let Some(idx) = cur.rfind('.') {
            cur.truncate(idx);
            out.push(cur.clone());
        }
        if out.last().map(String::as_str) != Some(self.engine.as_str()) {
            out.push(self.engine.clone());
        }
        out
    }

    /// The versioned shared-object name for this interpreter build, e.g.
    /// `libruby.so.3.1.2` for a `--enable-shared` CRuby.
    pub fn shared_object_name(&self) -> String {
        format!("lib{}.so.{}", self.engine, self.version)
    }
}

/// Immutable per-run identity of the runtime and the binary under test,
/// plus the skip-pattern rules consumed by the stack classifier.
#[derive(Debug, Clone)]
pub struct Configuration {
    /// Name of the extension binary under test, without extension. May
    /// contain path components (e.g. `ext/my_ext`) which must then match
    /// the tail of a frame's object path at component boundaries.
    pub binary_name: String,
    /// Path of the runtime interpreter binary as it appears in frame
    /// object paths.
    pub runtime_path: PathBuf,
    /// Identity of the running interpreter.
    pub runtime_version: RuntimeVersion,
    /// Matchers over object-path file names that identify the runtime when
    /// it is built as a shared library rather than a static binary.
    pub runtime_shared_objects: Vec<FunctionMatcher>,
    /// Ordered skip patterns over function names of runtime frames.
    pub skip_patterns: Vec<FunctionMatcher>,
    /// The binary's one-time initialization entry point. Leaks under it
    /// are bounded by a single execution and are not reported.
    pub init_symbol: String,
    /// Directories searched for suppression files, in precedence order.
    pub suppression_dirs: Vec<PathBuf>,
    /// Whether the checker was asked to emit suppression candidates, which
    /// makes the rendered error output the destination for them.
    pub generate_suppressions: bool,
}

impl Configuration {
    /// Build a configuration with the default CRuby skip patterns, the
    /// `Init_<binary>` entry-point convention, and a shared-object matcher
    /// derived from the runtime version.
    pub fn new(
        binary_name: impl Into<String>,
        runtime_path: impl Into<PathBuf>,
        runtime_version: RuntimeVersion,
    ) -> Self {
        let binary_name = binary_name.into();
        let base = Path::new(&binary_name)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| binary_name.clone());
        let runtime_shared_objects =
            vec![FunctionMatcher::exact(runtime_version.shared_object_name())];
        Self {
            init_symbol: format!("Init_{base}"),
            runtime_shared_objects,
            skip_patterns: DEFAULT_SKIP_PATTERNS.clone(),
            suppression_dirs: vec![PathBuf::from(DEFAULT_SUPPRESSIONS_DIR)],
            generate_suppressions: false,
            binary_name,
            runtime_path: runtime_path.into(),
            runtime_version,
        }
    }

    /// Resolve the suppression files that apply to this configuration, in
    /// the order they should be passed to the checker: per directory, most
    /// specific version candidate first.
    pub fn suppression_files(&self) -> Vec<PathBuf> {
        suppression::resolve_suppression_files(
            &self.binary_name,
            &self.runtime_version,
            &self.suppression_dirs,
        )
    }
}
