//! memsift analyzes Valgrind memcheck XML reports produced while exercising
//! a natively-compiled extension binary, and decides which reported errors
//! are actionable defects in that binary versus noise from the surrounding
//! language runtime or the checker's own bookkeeping.
//!
//! The pipeline: one report file per traced process is decoded in streaming
//! fashion ([`report::parser`]), every error's stack is classified frame by
//! frame against the active [`Configuration`], leak-class errors whose
//! allocation path never enters the binary under test are dropped
//! ([`report::stack`]), and the survivors are aggregated, rendered, and
//! signalled as a failure ([`analyzer`]).
//!
//! Invoking the memory checker, deciding process exit codes, and build-task
//! wiring are left to the caller; the crate only consumes the finalized
//! report files and exposes the suppression-file lookup the caller needs to
//! construct the checker command line.

pub mod analyzer;
pub mod config;
pub mod error;
pub mod logging;
pub mod report;

pub use analyzer::{analyze, check, report_files_in, Analysis};
pub use config::{Configuration, FunctionMatcher, RuntimeVersion};
pub use error::{MemsiftError, Result};
pub use report::error::ValgrindError;
