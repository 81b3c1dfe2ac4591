//! Injected console sink for user-facing output
//!
//! Components never print directly. They receive a `ConsoleSink` and send
//! mirrored child-process output and pipeline progress lines through it.

use crossterm::style::Stylize;
use parking_lot::Mutex;
use std::io::{self, IsTerminal, Write};

/// Which child-process stream a line came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stdout,
    Stderr,
}

/// Severity of a progress line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Success,
    Warning,
    Failure,
}

/// Destination for user-facing terminal output
pub trait ConsoleSink: Send + Sync {
    /// Mirror one line of child-process output
    fn output(&self, stream: Stream, line: &str);

    /// Report pipeline progress
    fn status(&self, level: StatusLevel, message: &str);
}

/// Console writing to the real stdout/stderr
pub struct TerminalConsole {
    use_colors: bool,
}

impl TerminalConsole {
    pub fn new() -> Self {
        Self {
            use_colors: io::stderr().is_terminal(),
        }
    }

    pub fn with_colors(use_colors: bool) -> Self {
        Self { use_colors }
    }

    fn colorize(&self, level: StatusLevel, text: &str) -> String {
        if !self.use_colors {
            return text.to_string();
        }

        match level {
            StatusLevel::Info => text.cyan().to_string(),
            StatusLevel::Success => text.green().to_string(),
            StatusLevel::Warning => text.yellow().to_string(),
            StatusLevel::Failure => text.red().to_string(),
        }
    }
}

impl Default for TerminalConsole {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleSink for TerminalConsole {
    fn output(&self, stream: Stream, line: &str) {
        // A closed pipe on our own stdout must not take the run down with it
        let _ = match stream {
            Stream::Stdout => writeln!(io::stdout().lock(), "{line}"),
            Stream::Stderr => writeln!(io::stderr().lock(), "{line}"),
        };
    }

    fn status(&self, level: StatusLevel, message: &str) {
        let symbol = match level {
            StatusLevel::Info => "→",
            StatusLevel::Success => "✓",
            StatusLevel::Warning => "!",
            StatusLevel::Failure => "✗",
        };
        let text = self.colorize(level, &format!("{symbol} {message}"));
        let _ = writeln!(io::stderr().lock(), "{text}");
    }
}

/// Console that discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullConsole;

impl ConsoleSink for NullConsole {
    fn output(&self, _stream: Stream, _line: &str) {}

    fn status(&self, _level: StatusLevel, _message: &str) {}
}

/// Console that records lines in memory
#[derive(Debug, Default)]
pub struct MemoryConsole {
    lines: Mutex<Vec<(Stream, String)>>,
    statuses: Mutex<Vec<(StatusLevel, String)>>,
}

impl MemoryConsole {
    pub fn new() -> Self {
        Self::default()
    }

    /// Output lines recorded for one stream
    pub fn lines(&self, stream: Stream) -> Vec<String> {
        self.lines
            .lock()
            .iter()
            .filter(|(s, _)| *s == stream)
            .map(|(_, l)| l.clone())
            .collect()
    }

    /// Status messages in the order they were reported
    pub fn statuses(&self) -> Vec<(StatusLevel, String)> {
        self.statuses.lock().clone()
    }

    pub fn contains_status(&self, needle: &str) -> bool {
        self.statuses().iter().any(|(_, m)| m.contains(needle))
    }
}

impl ConsoleSink for MemoryConsole {
    fn output(&self, stream: Stream, line: &str) {
        self.lines.lock().push((stream, line.to_string()));
    }

    fn status(&self, level: StatusLevel, message: &str) {
        self.statuses.lock().push((level, message.to_string()));
    }
}
