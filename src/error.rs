//! Error types for the memsift report analysis engine.
//!
//! Truncated report files are not represented here: the parser recovers
//! from them locally by keeping every complete error element and discarding
//! the trailing fragment.

use thiserror::Error;

/// Main error type for memsift operations.
#[derive(Debug, Error)]
pub enum MemsiftError {
    /// File I/O errors while reading or removing report files
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A report carried a generated suppression block, but the
    /// configuration has nowhere to put it. This means the checker was run
    /// with suppression generation enabled without wiring up the output;
    /// it is an operator error, not a filterable condition.
    #[error(
        "report for `{binary_name}` contains a generated suppression, \
         but suppression output is not configured"
    )]
    SuppressionNotConfigured { binary_name: String },

    /// Raised after aggregation when the surviving-error collection is
    /// non-empty. The full rendered error text has already been written to
    /// the output sink by the time this is returned.
    #[error("Valgrind reported {count} error(s) (e.g. memory leak or use-after-free)")]
    ErrorsReported { count: usize },
}

/// Result type alias for memsift operations
pub type Result<T> = std::result::Result<T, MemsiftError>;
