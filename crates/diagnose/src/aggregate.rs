//! Diagnosis of a whole execution

use crate::diagnosis::{Diagnosis, DiagnosisCategory, DiagnosisContext, ErrorDiagnoser};
use indexmap::IndexMap;
use repro_core::ExecutionResult;
use serde::{Deserialize, Serialize};

/// Diagnoses for every error of a run plus run-level recommendations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionDiagnosis {
    pub success: bool,
    pub exit_code: Option<i32>,
    pub execution_time: f64,
    pub errors: Vec<Diagnosis>,
    pub warnings: Vec<String>,
    pub recommendations: Vec<String>,
}

impl ExecutionDiagnosis {
    /// The first diagnosis backed by a known pattern
    pub fn primary(&self) -> Option<&Diagnosis> {
        self.errors.iter().find(|d| d.matched_pattern)
    }

    /// Category seen most often among matched diagnoses, earliest on ties
    pub fn dominant_category(&self) -> Option<DiagnosisCategory> {
        let mut counts: IndexMap<DiagnosisCategory, usize> = IndexMap::new();
        for diagnosis in self.errors.iter().filter(|d| d.matched_pattern) {
            *counts.entry(diagnosis.category).or_default() += 1;
        }
        let mut best: Option<(DiagnosisCategory, usize)> = None;
        for (category, count) in counts {
            if best.map_or(true, |(_, top)| count > top) {
                best = Some((category, count));
            }
        }
        best.map(|(category, _)| category)
    }
}

impl ErrorDiagnoser {
    /// Diagnose every recorded error and, when present, the captured stderr
    ///
    /// Stderr contributes only when it matches a known pattern. Failed runs
    /// get recommendations from the dominant category.
    pub fn analyze_execution_result(
        &self,
        result: &ExecutionResult,
        context: Option<&DiagnosisContext>,
    ) -> ExecutionDiagnosis {
        let mut errors: Vec<Diagnosis> = result
            .errors
            .iter()
            .map(|error| self.diagnose(error, context))
            .collect();

        if !result.stderr.trim().is_empty() {
            let diagnosis = self.diagnose(&result.stderr, context);
            if diagnosis.matched_pattern {
                errors.push(diagnosis);
            }
        }

        let mut aggregate = ExecutionDiagnosis {
            success: result.success,
            exit_code: result.exit_code,
            execution_time: result.execution_time,
            errors,
            warnings: result.warnings.clone(),
            recommendations: Vec::new(),
        };

        if !aggregate.success {
            if let Some(category) = aggregate.dominant_category() {
                aggregate
                    .recommendations
                    .extend(category.recommendations().iter().map(|r| (*r).to_string()));
            }
            if aggregate.exit_code != Some(0) {
                aggregate
                    .recommendations
                    .push("Review full error logs for more details".to_string());
            }
        }

        aggregate
    }
}
