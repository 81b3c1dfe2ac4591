//! Core error type definitions

use std::path::PathBuf;

/// Result type alias for repro operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for repro operations using thiserror
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration errors
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// Caller input that cannot be acted on (missing repository, no candidates, ...)
    #[error("{message}")]
    Input { message: String },

    /// Network-related errors from external collaborators
    #[error("{}", format_network_error(.endpoint, .message, .status))]
    Network {
        endpoint: String,
        message: String,
        status: Option<u16>,
    },

    /// An external tool (docker, conda, npm, git, ...) is not installed
    #[error("{tool} is not installed or not in PATH")]
    ToolUnavailable { tool: String },

    /// A dependency installation or image build failed
    #[error("failed to install from {origin}: {message}")]
    Install { origin: String, message: String },

    /// Command execution errors
    #[error("{}", format_command_error(.command, .message, .exit_code))]
    CommandExecution {
        command: String,
        message: String,
        exit_code: Option<i32>,
    },

    /// Operation timeout errors
    #[error("operation '{operation}' timed out after {duration:?}")]
    Timeout {
        operation: String,
        duration: std::time::Duration,
    },

    /// File system operations
    #[error("file system {operation} operation failed for '{path}': {source}")]
    FileSystem {
        path: PathBuf,
        operation: String,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// The user interrupted the run
    #[error("interrupted by user")]
    Interrupted,
}

fn format_network_error(endpoint: &str, message: &str, status: &Option<u16>) -> String {
    match status {
        Some(code) => format!("network error for '{endpoint}' (HTTP {code}): {message}"),
        None => format!("network error for '{endpoint}': {message}"),
    }
}

fn format_command_error(command: &str, message: &str, exit_code: &Option<i32>) -> String {
    match exit_code {
        Some(code) => format!("command '{command}' failed with exit code {code}: {message}"),
        None => format!("command '{command}' failed: {message}"),
    }
}

impl Error {
    /// Whether this failure is worth retrying: network timeouts, connection
    /// failures and server-side (5xx) responses. Client errors (4xx) are not.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Network { status, .. } => match status {
                Some(code) => (500..600).contains(code),
                None => true,
            },
            Error::Timeout { .. } => true,
            _ => false,
        }
    }

    /// Whether this failure means a required executable is missing
    #[must_use]
    pub fn is_tool_unavailable(&self) -> bool {
        matches!(self, Error::ToolUnavailable { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_transient_classification() {
        assert!(Error::network("api", "connection reset").is_transient());
        assert!(Error::http("api", 503, "unavailable").is_transient());
        assert!(!Error::http("api", 404, "not found").is_transient());
        assert!(Error::timeout("fetch", Duration::from_secs(10)).is_transient());
        assert!(!Error::configuration("bad").is_transient());
        assert!(!Error::tool_unavailable("docker").is_transient());
    }

    #[test]
    fn test_display_messages() {
        let err = Error::tool_unavailable("conda");
        assert_eq!(err.to_string(), "conda is not installed or not in PATH");

        let err = Error::command_execution("python main.py", "boom", Some(2));
        assert_eq!(
            err.to_string(),
            "command 'python main.py' failed with exit code 2: boom"
        );

        let err = Error::http("https://api.github.com", 502, "bad gateway");
        assert!(err.to_string().contains("HTTP 502"));
    }
}
