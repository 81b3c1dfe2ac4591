use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Outcome of one monitored command execution
///
/// `success` holds exactly when the process exited with code 0 and was not
/// killed by the timeout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    pub command: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub timed_out: bool,
    pub success: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    /// Elapsed wall-clock seconds
    pub execution_time: f64,
    #[serde(default)]
    pub truncated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
}

impl ExecutionResult {
    /// Success rule shared by every construction site
    #[must_use]
    pub fn is_success(exit_code: Option<i32>, timed_out: bool) -> bool {
        exit_code == Some(0) && !timed_out
    }

    /// A result for a command that could not be started at all
    #[must_use]
    pub fn spawn_failure(command: impl Into<String>, error: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            command: command.into(),
            started_at: now,
            ended_at: now,
            exit_code: None,
            stdout: String::new(),
            stderr: String::new(),
            timed_out: false,
            success: false,
            errors: vec![error.into()],
            warnings: Vec::new(),
            execution_time: 0.0,
            truncated: false,
            log_file: None,
        }
    }
}

/// Summary of a sequential test run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestRunSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub results: Vec<ExecutionResult>,
}

impl TestRunSummary {
    #[must_use]
    pub fn from_results(results: Vec<ExecutionResult>) -> Self {
        let passed = results.iter().filter(|r| r.success).count();
        Self {
            total: results.len(),
            passed,
            failed: results.len() - passed,
            results,
        }
    }

    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}
