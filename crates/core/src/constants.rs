/// Constants used throughout the repro codebase
use std::time::Duration;

// Application identity
pub const APP_NAME: &str = "repro";
pub const ENV_VAR_PREFIX: &str = "REPRO_";

// Execution defaults
pub const DEFAULT_TIMEOUT_MINUTES: u64 = 30;
pub const DEFAULT_MAX_CAPTURED_OUTPUT_BYTES: usize = 8 * 1024 * 1024;

// Provisioning budgets
pub const DOCKER_BUILD_TIMEOUT: Duration = Duration::from_secs(30 * 60);
pub const INSTALL_TIMEOUT: Duration = Duration::from_secs(600);
pub const CONDA_CREATE_TIMEOUT: Duration = Duration::from_secs(300);
pub const TOOL_PROBE_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_IMAGE_NAME: &str = "research_reproducer";
pub const DEFAULT_PYTHON: &str = "python3";
pub const DEFAULT_CONDA_PYTHON: &str = "3.9";

// Cache max-ages, in days
pub const PAPER_CACHE_MAX_AGE_DAYS: i64 = 30;
pub const REPOSITORY_CACHE_MAX_AGE_DAYS: i64 = 7;
pub const ANALYSIS_CACHE_MAX_AGE_DAYS: i64 = 3;

// Session directory layout
pub const REPORT_FILE: &str = "report.json";
pub const CHECKPOINT_FILE: &str = ".checkpoint.json";
pub const REPO_DIR: &str = "repo";
pub const ENVS_DIR: &str = "envs";
pub const LOGS_DIR: &str = "logs";

// Process exit codes
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;
pub const EXIT_INTERRUPTED: i32 = 130;
