//! Repository analysis record produced by the structural-analysis collaborator

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Languages that imply a Node package install
const NODE_LANGUAGES: &[&str] = &["JavaScript", "TypeScript"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RepositoryAnalysis {
    pub languages: Vec<String>,
    pub dependencies: Dependencies,
    pub entry_points: Vec<EntryPoint>,
    pub docker_support: bool,
    pub container_files: Vec<String>,
    pub data_requirements: Vec<String>,
    pub gpu_required: bool,
    pub estimated_complexity: Complexity,
}

impl RepositoryAnalysis {
    #[must_use]
    pub fn has_language(&self, language: &str) -> bool {
        self.languages.iter().any(|l| l == language)
    }

    #[must_use]
    pub fn is_python(&self) -> bool {
        self.has_language("Python")
    }

    #[must_use]
    pub fn is_node(&self) -> bool {
        NODE_LANGUAGES.iter().any(|l| self.has_language(l))
    }

    /// First discovered entry-point command, if any
    #[must_use]
    pub fn primary_command(&self) -> Option<&str> {
        self.entry_points
            .iter()
            .map(|e| e.command.trim())
            .find(|c| !c.is_empty())
    }

    /// First container file that is a Dockerfile
    #[must_use]
    pub fn dockerfile(&self) -> Option<&str> {
        self.container_files
            .iter()
            .map(String::as_str)
            .find(|f| {
                std::path::Path::new(f)
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.contains("Dockerfile"))
            })
    }

    /// Total declared packages across languages
    #[must_use]
    pub fn package_count(&self) -> usize {
        self.dependencies.python.as_ref().map_or(0, |p| p.packages.len())
            + self.dependencies.node.as_ref().map_or(0, |n| n.packages.len())
    }
}

/// Per-language dependency information
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Dependencies {
    pub python: Option<PythonDependencies>,
    pub node: Option<NodeDependencies>,
    /// Languages the provisioner has no strategy for (kept for the report)
    #[serde(flatten)]
    pub other: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PythonDependencies {
    pub requirements_files: Vec<String>,
    pub packages: Vec<String>,
    pub setup_py: bool,
    pub pyproject_toml: bool,
    pub conda_env: bool,
    pub conda_files: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NodeDependencies {
    pub package_json: bool,
    pub packages: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EntryPoint {
    pub command: String,
    pub file: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

impl EntryPoint {
    #[must_use]
    pub fn command(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Low,
    Medium,
    High,
    #[default]
    #[serde(other)]
    Unknown,
}

impl Complexity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Complexity::Low => "low",
            Complexity::Medium => "medium",
            Complexity::High => "high",
            Complexity::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Complexity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_collaborator_shape() {
        let json = r#"{
            "languages": ["Python", "TypeScript"],
            "dependencies": {
                "python": {"requirementsFiles": ["requirements.txt"], "setupPy": true},
                "r": {"packages": ["ggplot2"]}
            },
            "entryPoints": [{"command": "python main.py", "type": "python_script"}],
            "dockerSupport": true,
            "containerFiles": ["docker/docker-compose.yml", "docker/Dockerfile.gpu"],
            "estimatedComplexity": "medium"
        }"#;
        let analysis: RepositoryAnalysis = serde_json::from_str(json).unwrap();
        assert!(analysis.is_python());
        assert!(analysis.is_node());
        assert_eq!(analysis.primary_command(), Some("python main.py"));
        assert_eq!(analysis.dockerfile(), Some("docker/Dockerfile.gpu"));
        assert_eq!(analysis.estimated_complexity, Complexity::Medium);
        assert!(analysis.dependencies.other.contains_key("r"));
        let python = analysis.dependencies.python.unwrap();
        assert!(python.setup_py);
        assert_eq!(python.requirements_files, vec!["requirements.txt"]);
    }

    #[test]
    fn test_no_dockerfile_among_compose_files() {
        let analysis = RepositoryAnalysis {
            docker_support: true,
            container_files: vec!["docker-compose.yml".to_string()],
            ..Default::default()
        };
        assert_eq!(analysis.dockerfile(), None);
    }

    #[test]
    fn test_blank_entry_points_are_skipped() {
        let analysis = RepositoryAnalysis {
            entry_points: vec![EntryPoint::command("  "), EntryPoint::command("python run.py")],
            ..Default::default()
        };
        assert_eq!(analysis.primary_command(), Some("python run.py"));
    }
}
