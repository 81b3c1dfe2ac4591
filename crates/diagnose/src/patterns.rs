//! The ordered table of known error patterns

use crate::diagnosis::DiagnosisCategory;
use once_cell::sync::Lazy;
use regex::Regex;

/// Placeholder names a fix template may reference
pub(crate) const PLACEHOLDERS: &[&str] = &["{module}", "{key}", "{file}"];

/// Substituted for a placeholder when the pattern captured nothing
pub(crate) const MISSING_DETAIL: &str = "<file>";

pub(crate) struct ErrorPattern {
    pub(crate) error_type: &'static str,
    pub(crate) regex: Regex,
    pub(crate) category: DiagnosisCategory,
    pub(crate) fixes: &'static [&'static str],
}

fn pattern(
    error_type: &'static str,
    source: &str,
    category: DiagnosisCategory,
    fixes: &'static [&'static str],
) -> ErrorPattern {
    ErrorPattern {
        error_type,
        regex: Regex::new(&format!("(?im){source}")).expect("static regex is valid"),
        category,
        fixes,
    }
}

/// Patterns in match priority order; the first hit wins
pub(crate) static PATTERNS: Lazy<Vec<ErrorPattern>> = Lazy::new(|| {
    use DiagnosisCategory::*;
    vec![
        pattern(
            "ModuleNotFoundError",
            r"ModuleNotFoundError: No module named '([\w.]+)'",
            Dependency,
            &[
                "Install the missing package: pip install {module}",
                "Check if package name has changed or been deprecated",
                "Try installing with conda: conda install {module}",
                "Check requirements.txt for correct package name",
            ],
        ),
        pattern(
            "ImportError",
            r"ImportError: cannot import name '(\w+)'",
            Dependency,
            &[
                "Package version mismatch - check requirements.txt for correct version",
                "Try upgrading the package: pip install --upgrade {module}",
                "The import may have been moved in newer versions",
            ],
        ),
        pattern(
            "CUDA_ERROR",
            r"CUDA|RuntimeError: CUDA",
            Gpu,
            &[
                "Install CUDA toolkit matching PyTorch/TensorFlow version",
                "Check GPU availability: nvidia-smi",
                "Set environment to use CPU: export CUDA_VISIBLE_DEVICES=''",
                "Update GPU drivers",
                "Try CPU version of the framework",
            ],
        ),
        pattern(
            "OutOfMemoryError",
            r"OutOfMemoryError|CUDA out of memory",
            Gpu,
            &[
                "Reduce batch size in training/inference",
                "Clear GPU cache: torch.cuda.empty_cache()",
                "Use gradient accumulation instead of large batches",
                "Enable mixed precision training (fp16)",
                "Use a smaller model variant",
            ],
        ),
        pattern(
            "FileNotFoundError",
            r#"FileNotFoundError.*['"](.+?)['"]"#,
            Data,
            &[
                "Download required data files",
                "Check data directory paths in config files",
                "Run data preparation scripts first",
                "Update file paths to match your directory structure",
            ],
        ),
        pattern(
            "PermissionError",
            r#"PermissionError(?:.*?['"](.+?)['"])?"#,
            System,
            &[
                "Check file/directory permissions: ls -la",
                "You may need write permissions: chmod +w {file}",
                "Try running with appropriate permissions",
                "Check if file is being used by another process",
            ],
        ),
        pattern(
            "ConnectionError",
            r"ConnectionError|Connection refused|timeout",
            Network,
            &[
                "Check internet connection",
                "API endpoint may be down - try again later",
                "Check firewall settings",
                "Increase timeout in configuration",
            ],
        ),
        pattern(
            "ValueError",
            r"ValueError: (.+)",
            Runtime,
            &[
                "Check input data format and types",
                "Verify configuration parameters",
                "Look at the specific error message for hints",
                "Check data preprocessing steps",
            ],
        ),
        pattern(
            "KeyError",
            r#"KeyError: ['"](\w+)['"]"#,
            Runtime,
            &[
                "Missing required key '{key}' in config or data",
                "Check configuration file for required fields",
                "Verify data format matches expected structure",
            ],
        ),
        pattern(
            "TypeError",
            r"TypeError: (.+)",
            Runtime,
            &[
                "Type mismatch - check function arguments",
                "May be caused by version incompatibility",
                "Review API documentation for correct types",
            ],
        ),
        pattern(
            "VersionConflict",
            r"version|compatible|compatibility",
            Dependency,
            &[
                "Check package version requirements",
                "Create fresh virtual environment",
                "Use pip freeze to check installed versions",
                "Refer to paper's requirements for exact versions",
            ],
        ),
    ]
});

/// Fill the first placeholder found in `template` with `detail`
pub(crate) fn render_fix(template: &str, detail: Option<&str>) -> String {
    PLACEHOLDERS
        .iter()
        .find(|p| template.contains(*p))
        .map_or_else(
            || template.to_string(),
            |p| template.replace(p, detail.unwrap_or(MISSING_DETAIL)),
        )
}

/// Unrendered fix templates for an error type
pub fn quick_fixes(error_type: &str) -> Vec<String> {
    PATTERNS
        .iter()
        .find(|p| p.error_type == error_type)
        .map_or_else(
            || vec!["No quick fixes available for this error type".to_string()],
            |p| p.fixes.iter().map(|f| (*f).to_string()).collect(),
        )
}
