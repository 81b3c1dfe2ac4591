//! Runtime settings for repro
//!
//! Settings resolve in layers: built-in defaults, an optional JSON file,
//! `REPRO_*` environment variables, then command-line flags applied by the
//! binary.

pub mod loader;
pub mod settings;
pub mod validation;

pub use loader::{apply_env, SettingsLoader};
pub use settings::{RetrySettings, Settings};
pub use validation::validate;
