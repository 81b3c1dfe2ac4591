use chrono::Utc;
use proptest::prelude::*;
use repro_core::ExecutionResult;
use repro_diagnose::{
    format_diagnosis, format_execution_diagnosis, quick_fixes, DiagnosisCategory,
    DiagnosisContext, ErrorDiagnoser,
};

fn failed_run(exit_code: Option<i32>, errors: &[&str], stderr: &str) -> ExecutionResult {
    let now = Utc::now();
    ExecutionResult {
        command: "python main.py".to_string(),
        started_at: now,
        ended_at: now,
        exit_code,
        stdout: String::new(),
        stderr: stderr.to_string(),
        timed_out: false,
        success: ExecutionResult::is_success(exit_code, false),
        errors: errors.iter().map(|e| (*e).to_string()).collect(),
        warnings: vec!["UserWarning: Warning: old API".to_string()],
        execution_time: 1.5,
        truncated: false,
        log_file: None,
    }
}

#[test]
fn test_dependency_failure_recommends_fresh_environment() {
    let result = failed_run(
        Some(1),
        &[
            "ModuleNotFoundError: No module named 'torch'",
            "ImportError: cannot import name 'Adam'",
        ],
        "Traceback (most recent call last):\nModuleNotFoundError: No module named 'torch'\n",
    );

    let aggregate = ErrorDiagnoser::new().analyze_execution_result(&result, None);

    assert_eq!(aggregate.errors.len(), 3);
    assert_eq!(
        aggregate.dominant_category(),
        Some(DiagnosisCategory::Dependency)
    );
    assert_eq!(
        aggregate.recommendations,
        vec![
            "Consider creating a fresh virtual environment".to_string(),
            "Review and install all dependencies from requirements.txt".to_string(),
            "Review full error logs for more details".to_string(),
        ]
    );
    assert_eq!(aggregate.warnings.len(), 1);
    assert_eq!(aggregate.primary().map(|d| d.error_type.as_str()), Some("ModuleNotFoundError"));
}

#[test]
fn test_unmatched_stderr_is_not_recorded() {
    let result = failed_run(Some(2), &[], "something odd happened\n");

    let aggregate = ErrorDiagnoser::new().analyze_execution_result(&result, None);

    assert!(aggregate.errors.is_empty());
    assert!(aggregate.primary().is_none());
    assert_eq!(
        aggregate.recommendations,
        vec!["Review full error logs for more details".to_string()]
    );
}

#[test]
fn test_category_ties_go_to_first_seen() {
    let result = failed_run(
        Some(1),
        &[
            "FileNotFoundError: [Errno 2] No such file: 'data/x.npy'",
            "ConnectionError: Max retries exceeded",
        ],
        "",
    );

    let aggregate = ErrorDiagnoser::new().analyze_execution_result(&result, None);

    assert_eq!(aggregate.dominant_category(), Some(DiagnosisCategory::Data));
    assert_eq!(
        aggregate.recommendations[0],
        "Verify all required data files are downloaded"
    );
}

#[test]
fn test_timeout_without_exit_code() {
    let mut result = failed_run(None, &["Execution timed out after 5 seconds"], "");
    result.timed_out = true;

    let aggregate = ErrorDiagnoser::new().analyze_execution_result(&result, None);

    // "timed out" is not the connection pattern's "timeout"
    assert!(!aggregate.errors[0].matched_pattern);
    assert_eq!(
        aggregate.recommendations,
        vec!["Review full error logs for more details".to_string()]
    );
}

#[test]
fn test_successful_run_gets_no_recommendations() {
    let now = Utc::now();
    let result = ExecutionResult {
        command: "python main.py".to_string(),
        started_at: now,
        ended_at: now,
        exit_code: Some(0),
        stdout: "done\n".to_string(),
        stderr: String::new(),
        timed_out: false,
        success: true,
        errors: Vec::new(),
        warnings: Vec::new(),
        execution_time: 0.2,
        truncated: false,
        log_file: None,
    };

    let aggregate = ErrorDiagnoser::new().analyze_execution_result(&result, None);

    assert!(aggregate.success);
    assert!(aggregate.errors.is_empty());
    assert!(aggregate.recommendations.is_empty());
}

#[test]
fn test_context_flows_into_each_diagnosis() {
    let result = failed_run(Some(1), &["RuntimeError: CUDA error: no kernel image"], "");
    let context = DiagnosisContext {
        gpu_available: Some(false),
        ..Default::default()
    };

    let aggregate = ErrorDiagnoser::new().analyze_execution_result(&result, Some(&context));

    assert!(aggregate.errors[0]
        .suggested_fixes
        .contains(&"No GPU detected - consider using CPU-only version".to_string()));
    assert_eq!(
        aggregate.recommendations[1],
        "Consider running on CPU or cloud GPU service"
    );
}

#[test]
fn test_formatting() {
    let diagnoser = ErrorDiagnoser::new();
    let diagnosis = diagnoser.diagnose("ModuleNotFoundError: No module named 'scipy'", None);
    let text = format_diagnosis(&diagnosis);
    assert!(text.starts_with("Error Type: ModuleNotFoundError\nCategory: dependency\n"));
    assert!(text.contains("Root Cause: scipy\n"));
    assert!(text.contains("  1. Install the missing package: pip install scipy\n"));

    let result = failed_run(Some(1), &["ModuleNotFoundError: No module named 'scipy'"], "");
    let aggregate = diagnoser.analyze_execution_result(&result, None);
    let text = format_execution_diagnosis(&aggregate);
    assert!(text.contains("Recommendations:\n  • Consider creating a fresh virtual environment\n"));
}

#[test]
fn test_quick_fix_lookup() {
    assert_eq!(quick_fixes("OutOfMemoryError").len(), 5);
    assert_eq!(quick_fixes("ModuleNotFoundError")[0], "Install the missing package: pip install {module}");
}

proptest! {
    #[test]
    fn prop_missing_module_names_are_extracted(module in "[a-z][a-z0-9_]{0,20}") {
        let text = format!("ModuleNotFoundError: No module named '{module}'");
        let d = ErrorDiagnoser::new().diagnose(&text, None);
        prop_assert_eq!(d.error_type.as_str(), "ModuleNotFoundError");
        prop_assert_eq!(d.root_cause.as_deref(), Some(module.as_str()));
        let expected = format!("pip install {module}");
        prop_assert!(d.suggested_fixes.iter().any(|f| f.contains(&expected)));
    }

    #[test]
    fn prop_unmatched_diagnosis_never_suggests(text in "[0-9 ]{0,80}") {
        let d = ErrorDiagnoser::new().diagnose(&text, None);
        prop_assert!(!d.matched_pattern);
        prop_assert!(d.suggested_fixes.is_empty());
    }
}
