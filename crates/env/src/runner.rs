//! Running setup tools (python, pip, conda, docker, npm, git)
//!
//! Provisioning shells out to existing package managers. The `ToolRunner`
//! seam lets tests script those tools instead of installing them.

use async_trait::async_trait;
use parking_lot::Mutex;
use repro_core::{Error, Result, TOOL_PROBE_TIMEOUT};
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;

/// Lines of tool output kept when a failure is recorded
const FAILURE_TAIL_LINES: usize = 20;

/// One invocation of an external setup tool
#[derive(Debug, Clone, PartialEq)]
pub struct SetupCommand {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub timeout: Duration,
    pub envs: Vec<(String, String)>,
}

impl SetupCommand {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            timeout,
            envs: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    /// Shell-quoted command line, for logs and error messages
    pub fn display(&self) -> String {
        let mut words = Vec::with_capacity(self.args.len() + 1);
        words.push(self.program.as_str());
        words.extend(self.args.iter().map(String::as_str));
        shell_words::join(words)
    }

    /// Bare executable name, used in tool-unavailable errors
    pub fn tool_name(&self) -> String {
        std::path::Path::new(&self.program)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.program.clone())
    }
}

/// Captured result of a setup tool that ran to completion
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SetupOutput {
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl SetupOutput {
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            status: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failed(status: i32, stderr: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    pub fn success(&self) -> bool {
        self.status == Some(0)
    }

    /// Last lines of stderr (or stdout when stderr is empty)
    pub fn failure_summary(&self) -> String {
        let text = if self.stderr.trim().is_empty() {
            &self.stdout
        } else {
            &self.stderr
        };
        let lines: Vec<&str> = text.trim_end().lines().collect();
        let start = lines.len().saturating_sub(FAILURE_TAIL_LINES);
        let tail = lines[start..].join("\n");
        if tail.is_empty() {
            match self.status {
                Some(code) => format!("exited with code {code}"),
                None => "terminated by signal".to_string(),
            }
        } else {
            tail
        }
    }
}

/// Runs external setup tools
///
/// Implementations return `Error::ToolUnavailable` when the executable does
/// not exist and `Error::Timeout` when the command exceeds its budget. A
/// command that runs and exits non-zero is an `Ok` output.
#[async_trait]
pub trait ToolRunner: Send + Sync {
    async fn run(&self, command: &SetupCommand) -> Result<SetupOutput>;

    /// Whether `tool --version` runs successfully
    async fn is_available(&self, tool: &str) -> bool {
        let probe = SetupCommand::new(tool, TOOL_PROBE_TIMEOUT).arg("--version");
        matches!(self.run(&probe).await, Ok(output) if output.success())
    }
}

/// Production runner on tokio processes
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl SystemRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ToolRunner for SystemRunner {
    async fn run(&self, command: &SetupCommand) -> Result<SetupOutput> {
        let is_bare_name = !command.program.contains(std::path::MAIN_SEPARATOR)
            && !command.program.contains('/');
        if is_bare_name && which::which(&command.program).is_err() {
            return Err(Error::tool_unavailable(command.tool_name()));
        }

        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .envs(command.envs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &command.cwd {
            cmd.current_dir(dir);
        }

        tracing::debug!(command = %command.display(), "running setup command");
        let child = cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::tool_unavailable(command.tool_name())
            } else {
                Error::command_execution(command.display(), format!("failed to spawn: {e}"), None)
            }
        })?;

        // Dropping the future on timeout kills the child via kill_on_drop
        match tokio::time::timeout(command.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => Ok(SetupOutput {
                status: output.status.code(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            }),
            Ok(Err(e)) => Err(Error::command_execution(
                command.display(),
                format!("failed to wait for process: {e}"),
                None,
            )),
            Err(_) => Err(Error::timeout(command.display(), command.timeout)),
        }
    }
}

type Handler = Arc<dyn Fn(&SetupCommand) -> Result<SetupOutput> + Send + Sync>;

/// Runner with scripted responses, for tests
///
/// Rules are matched against the shell-quoted command line by prefix, most
/// recently added first. Commands whose tool was marked missing fail with
/// `ToolUnavailable`. Anything else succeeds with empty output.
#[derive(Default, Clone)]
pub struct ScriptedRunner {
    rules: Arc<Mutex<Vec<(String, Handler)>>>,
    missing: Arc<Mutex<Vec<String>>>,
    calls: Arc<Mutex<Vec<SetupCommand>>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Treat `tool` as not installed
    pub fn missing_tool(self, tool: &str) -> Self {
        self.missing.lock().push(tool.to_string());
        self
    }

    /// Respond to commands whose command line starts with `prefix`
    pub fn respond(self, prefix: &str, output: SetupOutput) -> Self {
        self.on(prefix, move |_| Ok(output.clone()))
    }

    /// Run `handler` for commands whose command line starts with `prefix`
    pub fn on<F>(self, prefix: &str, handler: F) -> Self
    where
        F: Fn(&SetupCommand) -> Result<SetupOutput> + Send + Sync + 'static,
    {
        self.rules.lock().push((prefix.to_string(), Arc::new(handler)));
        self
    }

    pub fn calls(&self) -> Vec<SetupCommand> {
        self.calls.lock().clone()
    }

    /// Command lines of every call, in order
    pub fn command_lines(&self) -> Vec<String> {
        self.calls.lock().iter().map(SetupCommand::display).collect()
    }
}

#[async_trait]
impl ToolRunner for ScriptedRunner {
    async fn run(&self, command: &SetupCommand) -> Result<SetupOutput> {
        self.calls.lock().push(command.clone());

        let tool = command.tool_name();
        if self.missing.lock().iter().any(|m| *m == tool) {
            return Err(Error::tool_unavailable(tool));
        }

        let line = command.display();
        let handler = self
            .rules
            .lock()
            .iter()
            .rev()
            .find(|(prefix, _)| line.starts_with(prefix.as_str()))
            .map(|(_, handler)| Arc::clone(handler));

        match handler {
            Some(handler) => handler(command),
            None => Ok(SetupOutput::ok("")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_quotes_arguments() {
        let cmd = SetupCommand::new("pip", Duration::from_secs(1))
            .args(["install", "-r", "my reqs.txt"]);
        assert_eq!(cmd.display(), "pip install -r 'my reqs.txt'");
    }

    #[test]
    fn test_failure_summary_keeps_tail() {
        let stderr: String = (0..50).map(|i| format!("line {i}\n")).collect();
        let output = SetupOutput::failed(1, stderr);
        let summary = output.failure_summary();
        assert!(summary.starts_with("line 30"));
        assert!(summary.ends_with("line 49"));

        assert_eq!(SetupOutput::failed(2, "").failure_summary(), "exited with code 2");
    }

    #[tokio::test]
    async fn test_scripted_runner_rules() {
        let runner = ScriptedRunner::new()
            .missing_tool("conda")
            .respond("pip install -r", SetupOutput::failed(1, "No matching distribution"));

        let pip = SetupCommand::new("/envs/venv/bin/pip", Duration::from_secs(1));
        assert!(runner.run(&pip.clone().arg("--version")).await.unwrap().success());

        let conda = SetupCommand::new("conda", Duration::from_secs(1)).arg("--version");
        assert!(runner.run(&conda).await.unwrap_err().is_tool_unavailable());
        assert!(!runner.is_available("conda").await);

        let install = SetupCommand::new("pip", Duration::from_secs(1)).args(["install", "-r", "r.txt"]);
        assert!(!runner.run(&install).await.unwrap().success());
        assert_eq!(runner.calls().len(), 4);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_system_runner_missing_tool() {
        let cmd = SetupCommand::new("definitely-not-a-real-tool-xyz", Duration::from_secs(5));
        let err = SystemRunner.run(&cmd).await.unwrap_err();
        assert!(err.is_tool_unavailable());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_system_runner_captures_output_and_status() {
        let cmd = SetupCommand::new("sh", Duration::from_secs(5))
            .args(["-c", "echo out; echo err >&2; exit 3"]);
        let output = SystemRunner.run(&cmd).await.unwrap();
        assert_eq!(output.status, Some(3));
        assert_eq!(output.stdout.trim(), "out");
        assert_eq!(output.stderr.trim(), "err");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_system_runner_timeout() {
        let cmd = SetupCommand::new("sleep", Duration::from_millis(100)).arg("5");
        let err = SystemRunner.run(&cmd).await.unwrap_err();
        assert!(matches!(err, Error::Timeout { .. }));
    }
}
