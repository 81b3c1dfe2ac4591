//! Per-run execution log files

use repro_core::ExecutionResult;
use std::path::{Path, PathBuf};

/// Plain-text log body: command, exit code, elapsed time and both streams
pub fn format_log(result: &ExecutionResult) -> String {
    let exit_code = match result.exit_code {
        Some(code) => code.to_string(),
        None if result.timed_out => "none (killed after timeout)".to_string(),
        None => "none".to_string(),
    };
    format!(
        "Command: {}\nExit code: {}\nExecution time: {:.2}s\n\n--- STDOUT ---\n{}\n\n--- STDERR ---\n{}\n",
        result.command, exit_code, result.execution_time, result.stdout, result.stderr
    )
}

/// Free `execution_<unix-ts>.log` path in `dir`, suffixed on collision
pub fn next_log_path(dir: &Path, unix_ts: i64) -> PathBuf {
    let first = dir.join(format!("execution_{unix_ts}.log"));
    if !first.exists() {
        return first;
    }
    (1..)
        .map(|n| dir.join(format!("execution_{unix_ts}_{n}.log")))
        .find(|p| !p.exists())
        .unwrap_or(first)
}

/// Write the log for `result` into `dir`; failures are logged and swallowed
pub fn write_log(dir: &Path, result: &ExecutionResult) -> Option<PathBuf> {
    let path = next_log_path(dir, result.started_at.timestamp());
    match repro_utils::write_atomic_string(&path, &format_log(result)) {
        Ok(()) => Some(path),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "failed to write execution log");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn result() -> ExecutionResult {
        ExecutionResult {
            exit_code: Some(2),
            stdout: "hello\n".into(),
            stderr: "boom\n".into(),
            execution_time: 1.234,
            ..ExecutionResult::spawn_failure("python main.py", "x")
        }
    }

    #[test]
    fn test_format_log() {
        let log = format_log(&result());
        assert!(log.starts_with("Command: python main.py\nExit code: 2\nExecution time: 1.23s\n"));
        assert!(log.contains("--- STDOUT ---\nhello\n"));
        assert!(log.contains("--- STDERR ---\nboom\n"));
    }

    #[test]
    fn test_log_names_do_not_collide() {
        let dir = TempDir::new().unwrap();
        let first = write_log(dir.path(), &result()).unwrap();
        let second = write_log(dir.path(), &result()).unwrap();
        assert_ne!(first, second);
        assert!(first.file_name().unwrap().to_string_lossy().starts_with("execution_"));
        assert!(second.to_string_lossy().ends_with("_1.log"));
    }
}
