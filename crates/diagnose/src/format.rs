//! Human-readable rendering of diagnoses

use crate::aggregate::ExecutionDiagnosis;
use crate::diagnosis::Diagnosis;
use std::fmt::Write;

/// Render one diagnosis as an indented block
pub fn format_diagnosis(diagnosis: &Diagnosis) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Error Type: {}", diagnosis.error_type);
    let _ = writeln!(out, "Category: {}", diagnosis.category);
    if let Some(cause) = &diagnosis.root_cause {
        let _ = writeln!(out, "Root Cause: {cause}");
    }
    if !diagnosis.suggested_fixes.is_empty() {
        out.push_str("\nSuggested Fixes:\n");
        for (i, fix) in diagnosis.suggested_fixes.iter().enumerate() {
            let _ = writeln!(out, "  {}. {fix}", i + 1);
        }
    }
    out
}

/// Render every matched diagnosis of a run followed by its recommendations
pub fn format_execution_diagnosis(diagnosis: &ExecutionDiagnosis) -> String {
    let mut out = String::new();
    for error in diagnosis.errors.iter().filter(|d| d.matched_pattern) {
        out.push_str(&format_diagnosis(error));
        out.push('\n');
    }
    if !diagnosis.recommendations.is_empty() {
        out.push_str("Recommendations:\n");
        for recommendation in &diagnosis.recommendations {
            let _ = writeln!(out, "  • {recommendation}");
        }
    }
    out
}
