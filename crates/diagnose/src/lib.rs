//! Error diagnosis for repro
//!
//! Matches failure text against an ordered table of known error patterns and
//! turns the first hit into a [`Diagnosis`] with remediation suggestions.
//! [`ErrorDiagnoser::analyze_execution_result`] aggregates diagnoses over a
//! whole execution and derives run-level recommendations.

pub mod aggregate;
pub mod diagnosis;
pub mod format;
mod patterns;

pub use aggregate::ExecutionDiagnosis;
pub use diagnosis::{Diagnosis, DiagnosisCategory, DiagnosisContext, ErrorDiagnoser};
pub use format::{format_diagnosis, format_execution_diagnosis};
pub use patterns::quick_fixes;
