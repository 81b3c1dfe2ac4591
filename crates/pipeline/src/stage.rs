//! Pipeline stages and their forward-only ordering

use repro_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Initialized,
    Discovered,
    Selected,
    Analyzed,
    Provisioned,
    Executed,
    Diagnosed,
    Reported,
}

impl Stage {
    pub const ALL: [Stage; 8] = [
        Stage::Initialized,
        Stage::Discovered,
        Stage::Selected,
        Stage::Analyzed,
        Stage::Provisioned,
        Stage::Executed,
        Stage::Diagnosed,
        Stage::Reported,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Initialized => "initialized",
            Stage::Discovered => "discovered",
            Stage::Selected => "selected",
            Stage::Analyzed => "analyzed",
            Stage::Provisioned => "provisioned",
            Stage::Executed => "executed",
            Stage::Diagnosed => "diagnosed",
            Stage::Reported => "reported",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Furthest completed stage of a run
#[derive(Debug, Clone, Copy, Default)]
pub struct StageTracker {
    current: Option<Stage>,
}

impl StageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<Stage> {
        self.current
    }

    /// Mark `stage` complete; stages may be skipped but never revisited
    pub fn advance(&mut self, stage: Stage) -> Result<()> {
        if let Some(current) = self.current {
            if stage <= current {
                return Err(Error::configuration(format!(
                    "stage '{stage}' cannot follow '{current}'"
                )));
            }
        }
        tracing::debug!(stage = %stage, "stage complete");
        self.current = Some(stage);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stages_are_ordered() {
        assert!(Stage::ALL.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_tracker_moves_forward_only() {
        let mut tracker = StageTracker::new();
        assert_eq!(tracker.current(), None);
        tracker.advance(Stage::Initialized).unwrap();
        tracker.advance(Stage::Discovered).unwrap();
        assert!(tracker.advance(Stage::Discovered).is_err());
        assert!(tracker.advance(Stage::Initialized).is_err());
        tracker.advance(Stage::Reported).unwrap();
        assert_eq!(tracker.current(), Some(Stage::Reported));
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(
            serde_json::to_string(&Stage::Provisioned).unwrap(),
            "\"provisioned\""
        );
    }
}
