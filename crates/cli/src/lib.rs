//! Command-line driver for repro
//!
//! The `repro` binary feeds JSON-file collaborators into the pipeline and
//! maps the outcome to a process exit code.

pub mod commands;
pub mod sources;

pub use commands::Commands;
