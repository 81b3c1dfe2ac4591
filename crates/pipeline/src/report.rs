//! The aggregate outcome of one run

use crate::stage::Stage;
use chrono::{DateTime, Utc};
use repro_core::{
    EnvironmentDescriptor, ExecutionResult, PaperMetadata, RepositoryAnalysis, RepositoryCandidate,
};
use repro_diagnose::ExecutionDiagnosis;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Everything a run learned, complete or partial
///
/// Sections stay `None` for stages the run never reached. `haltReason`
/// explains an early stop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub reference: String,
    pub paper: Option<PaperMetadata>,
    #[serde(default)]
    pub candidates: Vec<RepositoryCandidate>,
    pub selected: Option<RepositoryCandidate>,
    pub analysis: Option<RepositoryAnalysis>,
    pub environment: Option<EnvironmentDescriptor>,
    pub command: Option<String>,
    pub execution: Option<ExecutionResult>,
    pub diagnosis: Option<ExecutionDiagnosis>,
    pub success: bool,
    pub last_stage: Option<Stage>,
    pub halt_reason: Option<String>,
    /// Stopped by the caller rather than by a stage failure
    #[serde(default)]
    pub interrupted: bool,
    pub session_dir: PathBuf,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    /// Wall-clock seconds for the whole run
    #[serde(default)]
    pub elapsed_seconds: f64,
}

impl RunReport {
    pub fn new(reference: impl Into<String>, session_dir: PathBuf, started_at: DateTime<Utc>) -> Self {
        Self {
            reference: reference.into(),
            paper: None,
            candidates: Vec::new(),
            selected: None,
            analysis: None,
            environment: None,
            command: None,
            execution: None,
            diagnosis: None,
            success: false,
            last_stage: None,
            halt_reason: None,
            interrupted: false,
            session_dir,
            started_at,
            finished_at: None,
            elapsed_seconds: 0.0,
        }
    }

    pub fn halted(&self) -> bool {
        self.halt_reason.is_some()
    }

    pub fn report_path(&self) -> PathBuf {
        self.session_dir.join(repro_core::REPORT_FILE)
    }

    /// Read a report written by a previous run
    pub fn load(path: &std::path::Path) -> repro_core::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| repro_core::Error::file_system(path, "read report", e))?;
        Ok(serde_json::from_str(&content)?)
    }
}
