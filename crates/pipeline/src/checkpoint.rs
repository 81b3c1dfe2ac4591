//! Per-session audit trail of completed stages
//!
//! The checkpoint file maps each stage name to the time it completed and the
//! data it produced, plus `lastStage`. It is written after every stage and
//! only ever read back for inspection; a rerun starts from the beginning.

use crate::stage::Stage;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use repro_core::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointEntry {
    pub timestamp: DateTime<Utc>,
    pub data: Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    #[serde(rename = "lastStage", default)]
    pub last_stage: Option<Stage>,
    #[serde(flatten)]
    pub stages: IndexMap<String, CheckpointEntry>,
}

impl Checkpoint {
    /// Read a checkpoint file written by a previous run
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::file_system(path, "read checkpoint", e))?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn entry(&self, stage: Stage) -> Option<&CheckpointEntry> {
        self.stages.get(stage.as_str())
    }

    /// Completed stages in the order they were recorded
    pub fn completed(&self) -> Vec<&str> {
        self.stages.keys().map(String::as_str).collect()
    }
}

/// Appends stage entries and rewrites the file after each one
#[derive(Debug)]
pub struct CheckpointWriter {
    path: PathBuf,
    checkpoint: Checkpoint,
}

impl CheckpointWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            checkpoint: Checkpoint::default(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn checkpoint(&self) -> &Checkpoint {
        &self.checkpoint
    }

    /// Record `stage` with its data
    ///
    /// Write failures are logged; the in-memory trail is kept either way.
    pub fn record<T: Serialize + ?Sized>(&mut self, stage: Stage, data: &T) {
        let data = serde_json::to_value(data).unwrap_or_else(|e| {
            tracing::warn!(stage = %stage, error = %e, "checkpoint data is not serializable");
            Value::Null
        });
        self.checkpoint.stages.insert(
            stage.as_str().to_string(),
            CheckpointEntry {
                timestamp: Utc::now(),
                data,
            },
        );
        self.checkpoint.last_stage = Some(stage);

        if let Err(e) = repro_utils::write_json_atomic(&self.path, &self.checkpoint) {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to save checkpoint");
        }
    }
}
