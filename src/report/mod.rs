//! Report record types and the streaming report decoder.
//!
//! A report file decodes into a sequence of [`error::ValgrindError`]
//! records, each owning a [`stack::Stack`] of [`frame::Frame`]s and an
//! optional [`suppression::Suppression`]. Provenance classification is
//! always computed against the caller's configuration, never cached.

pub mod error;
pub mod frame;
pub mod parser;
pub mod stack;
pub mod suppression;

pub use error::ValgrindError;
pub use frame::Frame;
pub use stack::Stack;
pub use suppression::Suppression;
