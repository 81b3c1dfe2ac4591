//! Runtime settings for reproduction runs

use repro_core::{
    EnvironmentPreference, DEFAULT_CONDA_PYTHON, DEFAULT_MAX_CAPTURED_OUTPUT_BYTES, DEFAULT_PYTHON,
    DEFAULT_TIMEOUT_MINUTES, DOCKER_BUILD_TIMEOUT, INSTALL_TIMEOUT,
};
use repro_utils::{BackoffConfig, RetryOn, XdgPaths};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Fully resolved settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Parent directory for per-run session directories
    pub work_dir: PathBuf,
    /// Root of the result cache
    pub cache_dir: PathBuf,
    pub use_cache: bool,
    /// Execution timeout used when the caller gives none
    pub timeout_minutes: u64,
    /// Delegate candidate selection to the chooser collaborator
    pub interactive: bool,
    pub environment: EnvironmentPreference,
    pub prefer_docker: bool,
    pub prefer_conda: bool,
    /// Interpreter used to create virtual environments
    pub python: String,
    /// Python version for freshly created conda environments
    pub conda_python: String,
    pub install_timeout_secs: u64,
    pub docker_build_timeout_secs: u64,
    /// Per-stream cap on retained child output
    pub max_captured_output_bytes: usize,
    pub retry: RetrySettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("reproductions"),
            cache_dir: XdgPaths::cache_dir(),
            use_cache: true,
            timeout_minutes: DEFAULT_TIMEOUT_MINUTES,
            interactive: false,
            environment: EnvironmentPreference::Auto,
            prefer_docker: true,
            prefer_conda: false,
            python: DEFAULT_PYTHON.to_string(),
            conda_python: DEFAULT_CONDA_PYTHON.to_string(),
            install_timeout_secs: INSTALL_TIMEOUT.as_secs(),
            docker_build_timeout_secs: DOCKER_BUILD_TIMEOUT.as_secs(),
            max_captured_output_bytes: DEFAULT_MAX_CAPTURED_OUTPUT_BYTES,
            retry: RetrySettings::default(),
        }
    }
}

impl Settings {
    pub fn execution_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_minutes.saturating_mul(60))
    }

    pub fn install_timeout(&self) -> Duration {
        Duration::from_secs(self.install_timeout_secs)
    }

    pub fn docker_build_timeout(&self) -> Duration {
        Duration::from_secs(self.docker_build_timeout_secs)
    }

    /// Backoff policy for network-facing collaborators
    pub fn backoff(&self) -> BackoffConfig {
        BackoffConfig {
            max_attempts: self.retry.max_attempts,
            base_delay: Duration::from_millis(self.retry.base_delay_ms),
            max_delay: Duration::from_millis(self.retry.max_delay_ms),
            multiplier: self.retry.multiplier,
            retry_on: RetryOn::Transient,
        }
    }
}

/// Retry policy as it appears in the settings file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub multiplier: f64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        let network = BackoffConfig::network();
        Self {
            max_attempts: network.max_attempts,
            base_delay_ms: u64::try_from(network.base_delay.as_millis()).unwrap_or(2000),
            max_delay_ms: u64::try_from(network.max_delay.as_millis()).unwrap_or(60_000),
            multiplier: network.multiplier,
        }
    }
}
