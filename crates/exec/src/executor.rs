//! Monitored execution of shell commands

use crate::capture::{spawn_drain, StreamCapture};
use crate::container::container_command;
use crate::gpu::{GpuProbe, StaticGpuProbe};
use crate::log::write_log;
use crate::scan::{scan_errors, scan_warnings};
use chrono::Utc;
use indexmap::IndexSet;
use parking_lot::Mutex;
use repro_core::{
    ConsoleSink, EnvironmentDescriptor, ExecutionResult, StatusLevel, Stream, TestRunSummary,
    DEFAULT_MAX_CAPTURED_OUTPUT_BYTES,
};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tokio::task::JoinHandle;

/// How long to keep draining after the child is gone before giving up on
/// pipes held open by orphaned grandchildren
const DRAIN_GRACE: Duration = Duration::from_secs(2);

/// Errors printed to the console after a failed run
const CONSOLE_ERROR_LIMIT: usize = 5;

/// Runs commands in a repository under an environment's activation
pub struct MonitoredExecutor {
    repo_path: PathBuf,
    env: EnvironmentDescriptor,
    log_dir: Option<PathBuf>,
    console: Arc<dyn ConsoleSink>,
    gpu_probe: Arc<dyn GpuProbe>,
    max_capture: usize,
}

impl MonitoredExecutor {
    pub fn new(
        repo_path: impl Into<PathBuf>,
        env: EnvironmentDescriptor,
        console: Arc<dyn ConsoleSink>,
    ) -> Self {
        Self {
            repo_path: repo_path.into(),
            env,
            log_dir: None,
            console,
            gpu_probe: Arc::new(StaticGpuProbe::none()),
            max_capture: DEFAULT_MAX_CAPTURED_OUTPUT_BYTES,
        }
    }

    /// Persist an execution log per run into `dir`
    pub fn with_log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = Some(dir.into());
        self
    }

    pub fn with_gpu_probe(mut self, probe: Arc<dyn GpuProbe>) -> Self {
        self.gpu_probe = probe;
        self
    }

    /// Per-stream cap on retained output
    pub fn with_max_capture(mut self, bytes: usize) -> Self {
        self.max_capture = bytes;
        self
    }

    pub fn repo_path(&self) -> &Path {
        &self.repo_path
    }

    /// Run `command` with a timeout
    pub async fn execute(&self, command: &str, timeout: Duration) -> ExecutionResult {
        self.execute_with_errors(command, timeout, &[]).await
    }

    /// Run `command`, folding externally detected `errors` into the result
    pub async fn execute_with_errors(
        &self,
        command: &str,
        timeout: Duration,
        errors: &[String],
    ) -> ExecutionResult {
        self.console
            .status(StatusLevel::Info, &format!("Executing: {command}"));
        self.console.status(
            StatusLevel::Info,
            &format!("Working directory: {}", self.repo_path.display()),
        );
        self.console.status(
            StatusLevel::Info,
            &format!("Timeout: {} seconds", timeout.as_secs()),
        );

        let mut result = self.run_process(command, timeout).await;

        let mut all_errors: IndexSet<String> = errors.iter().cloned().collect();
        all_errors.extend(result.errors.drain(..));
        all_errors.extend(scan_errors(result.stderr.lines()));
        result.errors = all_errors.into_iter().collect();
        result.warnings = scan_warnings(result.stderr.lines());

        if let Some(dir) = &self.log_dir {
            result.log_file = write_log(dir, &result);
            if let Some(path) = &result.log_file {
                self.console
                    .status(StatusLevel::Info, &format!("Log saved to: {}", path.display()));
            }
        }

        self.report(&result);
        result
    }

    /// Run `command` inside `image` with the repository mounted
    ///
    /// GPU passthrough is added only when the probe finds a GPU.
    pub async fn execute_in_container(
        &self,
        command: &str,
        image: &str,
        timeout: Duration,
        data_dir: Option<&Path>,
    ) -> ExecutionResult {
        let gpu = self.gpu_probe.probe().await.available();
        if gpu {
            self.console
                .status(StatusLevel::Success, "GPU support enabled");
        }
        let docker = container_command(&self.repo_path, image, command, data_dir, gpu);
        self.execute(&docker, timeout).await
    }

    /// Run every test command in order, without stopping at failures
    pub async fn run_tests(&self, commands: &[String], timeout: Duration) -> TestRunSummary {
        self.console.status(StatusLevel::Info, "Running tests");
        let mut results = Vec::with_capacity(commands.len());
        for command in commands {
            let result = self.execute(command, timeout).await;
            if !result.success {
                self.console
                    .status(StatusLevel::Warning, &format!("Test failed: {command}"));
            }
            results.push(result);
        }

        let summary = TestRunSummary::from_results(results);
        let level = if summary.all_passed() {
            StatusLevel::Success
        } else {
            StatusLevel::Warning
        };
        self.console.status(
            level,
            &format!("Test summary: {}/{} passed", summary.passed, summary.total),
        );
        summary
    }

    async fn run_process(&self, command: &str, timeout: Duration) -> ExecutionResult {
        let started_at = Utc::now();
        let clock = Instant::now();

        let mut cmd = shell_command(command);
        cmd.current_dir(&self.repo_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        self.apply_environment(&mut cmd);
        #[cfg(unix)]
        cmd.process_group(0);

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                tracing::error!(command, error = %e, "failed to spawn command");
                return ExecutionResult::spawn_failure(command, format!("Execution failed: {e}"));
            }
        };
        let pid = child.id();
        tracing::debug!(command, ?pid, "spawned command");
        let mut group = ProcessGroupGuard::new(pid);

        let stdout = Arc::new(Mutex::new(StreamCapture::new(self.max_capture)));
        let stderr = Arc::new(Mutex::new(StreamCapture::new(self.max_capture)));
        let mut drains = Vec::with_capacity(2);
        if let Some(out) = child.stdout.take() {
            drains.push(spawn_drain(
                out,
                Stream::Stdout,
                Arc::clone(&stdout),
                Arc::clone(&self.console),
            ));
        }
        if let Some(err) = child.stderr.take() {
            drains.push(spawn_drain(
                err,
                Stream::Stderr,
                Arc::clone(&stderr),
                Arc::clone(&self.console),
            ));
        }

        let mut errors = Vec::new();
        let (exit_code, timed_out) = match tokio::time::timeout(timeout, child.wait()).await {
            Ok(Ok(status)) => (status.code(), false),
            Ok(Err(e)) => {
                errors.push(format!("Execution failed: {e}"));
                (None, false)
            }
            Err(_) => {
                tracing::warn!(
                    command,
                    timeout_secs = timeout.as_secs(),
                    "command timed out, killing process group"
                );
                kill_process_group(pid);
                if let Err(e) = child.kill().await {
                    tracing::debug!(error = %e, "child already exited");
                }
                self.console.status(
                    StatusLevel::Warning,
                    &format!("Execution timed out after {} seconds", timeout.as_secs()),
                );
                errors.push(format!("Execution timed out after {} seconds", timeout.as_secs()));
                (None, true)
            }
        };

        group.disarm();
        join_drains(drains).await;

        let execution_time = clock.elapsed().as_secs_f64();
        let (stdout_text, stdout_truncated) = {
            let capture = stdout.lock();
            (capture.finish(), capture.truncated())
        };
        let (stderr_text, stderr_truncated) = {
            let capture = stderr.lock();
            (capture.finish(), capture.truncated())
        };

        ExecutionResult {
            command: command.to_string(),
            started_at,
            ended_at: Utc::now(),
            exit_code,
            stdout: stdout_text,
            stderr: stderr_text,
            timed_out,
            success: ExecutionResult::is_success(exit_code, timed_out),
            errors,
            warnings: Vec::new(),
            execution_time,
            truncated: stdout_truncated || stderr_truncated,
            log_file: None,
        }
    }

    /// Prepend the environment's binary directories to `PATH` and set its variables
    fn apply_environment(&self, cmd: &mut Command) {
        let env = self.env.effective();
        if !env.success {
            return;
        }

        if !env.path_prefixes.is_empty() {
            let current = std::env::var_os("PATH").unwrap_or_default();
            let paths = env
                .path_prefixes
                .iter()
                .cloned()
                .chain(std::env::split_paths(&current));
            match std::env::join_paths(paths) {
                Ok(path) => {
                    cmd.env("PATH", path);
                }
                Err(e) => tracing::warn!(error = %e, "cannot extend PATH with environment directories"),
            }
        }
        for (key, value) in &env.env_vars {
            cmd.env(key, OsString::from(value));
        }
    }

    fn report(&self, result: &ExecutionResult) {
        if result.success {
            self.console
                .status(StatusLevel::Success, "Execution completed successfully");
            self.console.status(
                StatusLevel::Info,
                &format!("Time: {:.2}s", result.execution_time),
            );
        } else {
            self.console.status(StatusLevel::Failure, "Execution failed");
            if let Some(code) = result.exit_code {
                self.console
                    .status(StatusLevel::Failure, &format!("Exit code: {code}"));
            }
        }

        if !result.errors.is_empty() {
            self.console.status(StatusLevel::Failure, "Errors detected:");
            for error in result.errors.iter().take(CONSOLE_ERROR_LIMIT) {
                self.console.status(StatusLevel::Failure, &format!("  • {error}"));
            }
        }
    }
}

fn shell_command(command: &str) -> Command {
    if cfg!(windows) {
        let mut cmd = Command::new("cmd");
        cmd.arg("/C").arg(command);
        cmd
    } else {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(command);
        cmd
    }
}

/// Kill the whole process group so shell-spawned children die too
#[cfg(unix)]
fn kill_process_group(pid: Option<u32>) {
    let Some(pid) = pid.and_then(|p| i32::try_from(p).ok()) else {
        return;
    };
    // SAFETY: plain syscall; the group id comes from a child we spawned with process_group(0)
    let rc = unsafe { libc::kill(-pid, libc::SIGKILL) };
    if rc != 0 {
        tracing::debug!(pid, error = %std::io::Error::last_os_error(), "failed to kill process group");
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pid: Option<u32>) {}

/// Kills the child's process group if the run is dropped before the child
/// has been waited for
struct ProcessGroupGuard {
    pid: Option<u32>,
}

impl ProcessGroupGuard {
    fn new(pid: Option<u32>) -> Self {
        Self { pid }
    }

    fn disarm(&mut self) {
        self.pid = None;
    }
}

impl Drop for ProcessGroupGuard {
    fn drop(&mut self) {
        if self.pid.is_some() {
            tracing::debug!(pid = ?self.pid, "execution abandoned, killing process group");
            kill_process_group(self.pid);
        }
    }
}

async fn join_drains(drains: Vec<JoinHandle<()>>) {
    for mut drain in drains {
        match tokio::time::timeout(DRAIN_GRACE, &mut drain).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::debug!(error = %e, "output drain task failed"),
            Err(_) => {
                tracing::debug!("output pipe still open after process exit, abandoning drain");
                drain.abort();
            }
        }
    }
}
