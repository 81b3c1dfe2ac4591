//! Failure and warning markers in captured output

use indexmap::IndexSet;

/// Substrings that mark a line as an error
const ERROR_MARKERS: &[&str] = &[
    "Error:",
    "ERROR:",
    "Exception:",
    "Traceback",
    "FAILED",
    "ImportError",
    "ModuleNotFoundError",
    "FileNotFoundError",
    "RuntimeError",
    "ValueError",
    "TypeError",
];

const WARNING_MARKERS: &[&str] = &["Warning:", "WARNING:"];

fn scan<'a, I>(lines: I, markers: &[&str]) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut found = IndexSet::new();
    for line in lines {
        if markers.iter().any(|m| line.contains(m)) {
            let trimmed = line.trim();
            if !trimmed.is_empty() {
                found.insert(trimmed.to_string());
            }
        }
    }
    found.into_iter().collect()
}

/// Lines containing an error marker, trimmed and deduplicated in first-seen order
pub fn scan_errors<'a, I>(lines: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    scan(lines, ERROR_MARKERS)
}

/// Lines containing a warning marker, trimmed and deduplicated in first-seen order
pub fn scan_warnings<'a, I>(lines: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    scan(lines, WARNING_MARKERS)
}

#[cfg(test)]
mod tests {
    use super::*;

    const STDERR: &str = "\
Traceback (most recent call last):
  File \"main.py\", line 1, in <module>
    import foo
ModuleNotFoundError: No module named 'foo'
UserWarning: deprecated
WARNING: pip is out of date
ModuleNotFoundError: No module named 'foo'
";

    #[test]
    fn test_errors_are_deduplicated_in_order() {
        let errors = scan_errors(STDERR.lines());
        assert_eq!(
            errors,
            vec![
                "Traceback (most recent call last):",
                "ModuleNotFoundError: No module named 'foo'",
            ]
        );
    }

    #[test]
    fn test_warnings() {
        let warnings = scan_warnings(STDERR.lines());
        assert_eq!(warnings, vec!["UserWarning: deprecated", "WARNING: pip is out of date"]);
    }

    #[test]
    fn test_clean_output() {
        assert!(scan_errors("all good\n".lines()).is_empty());
        assert!(scan_warnings("".lines()).is_empty());
    }
}
