//! Single-text diagnosis

use crate::patterns::{render_fix, PATTERNS};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Characters of the input kept as the diagnosis description
const DESCRIPTION_CHARS: usize = 200;

/// Broad class of a diagnosed failure
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosisCategory {
    Dependency,
    Gpu,
    Data,
    System,
    Network,
    Runtime,
    #[default]
    #[serde(other)]
    Unknown,
}

impl DiagnosisCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dependency => "dependency",
            Self::Gpu => "gpu",
            Self::Data => "data",
            Self::System => "system",
            Self::Network => "network",
            Self::Runtime => "runtime",
            Self::Unknown => "unknown",
        }
    }

    /// Run-level advice for a failure dominated by this category
    pub(crate) fn recommendations(&self) -> &'static [&'static str] {
        match self {
            Self::Dependency => &[
                "Consider creating a fresh virtual environment",
                "Review and install all dependencies from requirements.txt",
            ],
            Self::Gpu => &[
                "Check GPU availability and CUDA installation",
                "Consider running on CPU or cloud GPU service",
            ],
            Self::Data => &[
                "Verify all required data files are downloaded",
                "Check README for data preparation instructions",
            ],
            Self::Network => &[
                "Check internet connectivity",
                "Try increasing timeout settings",
            ],
            Self::System | Self::Runtime | Self::Unknown => &[],
        }
    }
}

impl fmt::Display for DiagnosisCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Facts about the host that sharpen the suggested fixes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DiagnosisContext {
    /// `None` when GPU availability was never probed
    pub gpu_available: Option<bool>,
    pub python_version: Option<String>,
    pub docker_available: bool,
}

/// Explanation and remediation for one piece of failure text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnosis {
    pub error_type: String,
    pub category: DiagnosisCategory,
    pub description: String,
    pub root_cause: Option<String>,
    pub suggested_fixes: Vec<String>,
    pub matched_pattern: bool,
}

impl Diagnosis {
    fn unmatched(text: &str) -> Self {
        Self {
            error_type: "unknown".to_string(),
            category: DiagnosisCategory::Unknown,
            description: text.chars().take(DESCRIPTION_CHARS).collect(),
            root_cause: None,
            suggested_fixes: Vec::new(),
            matched_pattern: false,
        }
    }
}

/// Stateless matcher over the known error patterns
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorDiagnoser;

impl ErrorDiagnoser {
    pub fn new() -> Self {
        Self
    }

    /// Diagnose `text` with the first matching pattern
    ///
    /// Unrecognized text yields an unmatched diagnosis with no fixes; context
    /// suggestions are only added on top of a real match.
    pub fn diagnose(&self, text: &str, context: Option<&DiagnosisContext>) -> Diagnosis {
        let mut diagnosis = Diagnosis::unmatched(text);

        let Some((pattern, captures)) = PATTERNS
            .iter()
            .find_map(|p| p.regex.captures(text).map(|c| (p, c)))
        else {
            return diagnosis;
        };

        let detail = captures.get(1).map(|m| m.as_str());
        diagnosis.error_type = pattern.error_type.to_string();
        diagnosis.category = pattern.category;
        diagnosis.matched_pattern = true;
        diagnosis.root_cause = detail.map(str::to_string);
        diagnosis.suggested_fixes = pattern
            .fixes
            .iter()
            .map(|fix| render_fix(fix, detail))
            .collect();

        if let Some(context) = context {
            diagnosis
                .suggested_fixes
                .extend(context_fixes(diagnosis.category, context));
        }

        tracing::debug!(
            error_type = %diagnosis.error_type,
            category = %diagnosis.category,
            "diagnosed failure"
        );
        diagnosis
    }
}

fn context_fixes(category: DiagnosisCategory, context: &DiagnosisContext) -> Vec<String> {
    let mut fixes = Vec::new();
    if category == DiagnosisCategory::Gpu && context.gpu_available == Some(false) {
        fixes.push("No GPU detected - consider using CPU-only version".to_string());
    }
    if category == DiagnosisCategory::Dependency {
        if let Some(version) = &context.python_version {
            fixes.push(format!("Python version: {version} - check compatibility"));
        }
    }
    if context.docker_available {
        fixes.push("Consider using Docker for better isolation".to_string());
    }
    fixes
}
