//! Shared utilities for repro
//!
//! Retry with backoff, atomic file writes, XDG directory resolution and
//! tracing initialization. Nothing here knows about pipeline stages.

pub mod atomic_file;
pub mod resilience;
pub mod tracing;
pub mod xdg;

pub use atomic_file::*;
pub use resilience::*;
pub use xdg::*;
