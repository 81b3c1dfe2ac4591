//! Core domain types, errors, and constants for `repro`.
//!
//! This crate establishes the data structures exchanged between the
//! reproduction pipeline components and the error taxonomy they share.
//!
//! ## Key Components
//!
//! - **`errors`**: The primary `Error` enum and `Result` alias. Variants follow
//!   the failure classes the pipeline distinguishes: transient external
//!   failures, missing tools, installation failures, execution failures and
//!   input errors.
//! - **`types`**: Paper metadata, repository candidates, repository analysis,
//!   environment descriptors and execution results.
//! - **`console`**: The injected sink used for user-facing terminal output.
//! - **`constants`**: Shared defaults such as timeouts, cache ages and file names.

pub mod console;
pub mod constants;
pub mod errors;
pub mod types;

pub use self::{
    console::{ConsoleSink, MemoryConsole, NullConsole, StatusLevel, Stream, TerminalConsole},
    constants::*,
    errors::{Error, Result, ResultExt},
    types::*,
};
