//! Environment descriptors produced by the provisioner

use crate::errors::Error;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Strategy that produced an environment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvironmentKind {
    Docker,
    PythonVenv,
    Conda,
    Node,
    Multi,
    #[default]
    None,
}

impl EnvironmentKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            EnvironmentKind::Docker => "docker",
            EnvironmentKind::PythonVenv => "python_venv",
            EnvironmentKind::Conda => "conda",
            EnvironmentKind::Node => "node",
            EnvironmentKind::Multi => "multi",
            EnvironmentKind::None => "none",
        }
    }
}

impl fmt::Display for EnvironmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller preference for which provisioning strategy to use
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvironmentPreference {
    #[default]
    Auto,
    Docker,
    Conda,
    Venv,
    Node,
}

impl FromStr for EnvironmentPreference {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" | "" => Ok(Self::Auto),
            "docker" => Ok(Self::Docker),
            "conda" => Ok(Self::Conda),
            "venv" | "python" | "python_venv" => Ok(Self::Venv),
            "node" | "npm" => Ok(Self::Node),
            other => Err(Error::configuration(format!(
                "unknown environment preference '{other}' (expected auto, docker, conda, venv or node)"
            ))),
        }
    }
}

impl fmt::Display for EnvironmentPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Auto => "auto",
            Self::Docker => "docker",
            Self::Conda => "conda",
            Self::Venv => "venv",
            Self::Node => "node",
        };
        f.write_str(name)
    }
}

/// Result of one provisioning strategy, or an aggregate of several (`multi`)
///
/// The executor derives `PATH` prefixes and extra variables from a descriptor
/// but never mutates it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EnvironmentDescriptor {
    pub kind: EnvironmentKind,
    pub locator_or_path: Option<String>,
    pub activation_command: Option<String>,
    pub success: bool,
    pub errors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interpreter: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_command: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub path_prefixes: Vec<PathBuf>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub env_vars: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub environments: Vec<EnvironmentDescriptor>,
}

impl EnvironmentDescriptor {
    #[must_use]
    pub fn new(kind: EnvironmentKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    /// A failed descriptor carrying a single error
    #[must_use]
    pub fn failed(kind: EnvironmentKind, error: impl Into<String>) -> Self {
        Self {
            kind,
            errors: vec![error.into()],
            ..Self::default()
        }
    }

    /// The no-op environment: run against the host as-is
    #[must_use]
    pub fn host() -> Self {
        Self {
            success: true,
            ..Self::default()
        }
    }

    pub fn push_error(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
    }

    /// Descriptor whose activation applies to execution: the first
    /// successful child for `multi`, otherwise itself
    #[must_use]
    pub fn effective(&self) -> &EnvironmentDescriptor {
        if self.kind == EnvironmentKind::Multi {
            self.environments
                .iter()
                .find(|e| e.success)
                .map_or(self, EnvironmentDescriptor::effective)
        } else {
            self
        }
    }

    /// Container image tag when this environment is a built image
    #[must_use]
    pub fn container_image(&self) -> Option<&str> {
        let effective = self.effective();
        (effective.kind == EnvironmentKind::Docker && effective.success)
            .then_some(effective.locator_or_path.as_deref())
            .flatten()
    }

    /// All errors, including those of aggregated children
    #[must_use]
    pub fn all_errors(&self) -> Vec<String> {
        let mut errors = self.errors.clone();
        for child in &self.environments {
            errors.extend(
                child
                    .all_errors()
                    .into_iter()
                    .map(|e| format!("{}: {e}", child.kind)),
            );
        }
        errors
    }
}
