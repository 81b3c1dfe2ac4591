//! Retry classification

use repro_core::Error;
use std::sync::Arc;

/// Which errors should trigger a retry
#[derive(Clone, Default)]
pub enum RetryOn {
    /// Retry on all errors
    All,
    /// Retry only on network errors, regardless of status
    Network,
    /// Retry on timeouts, connection failures and 5xx responses
    #[default]
    Transient,
    /// Custom retry predicate
    Custom(Arc<dyn Fn(&Error) -> bool + Send + Sync>),
}

impl RetryOn {
    /// Check if an error should be retried
    pub fn should_retry(&self, error: &Error) -> bool {
        match self {
            RetryOn::All => true,
            RetryOn::Network => matches!(error, Error::Network { .. }),
            RetryOn::Transient => error.is_transient(),
            RetryOn::Custom(predicate) => predicate(error),
        }
    }
}

impl std::fmt::Debug for RetryOn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RetryOn::All => write!(f, "RetryOn::All"),
            RetryOn::Network => write!(f, "RetryOn::Network"),
            RetryOn::Transient => write!(f, "RetryOn::Transient"),
            RetryOn::Custom(_) => write!(f, "RetryOn::Custom(<predicate>)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_skips_client_errors() {
        let on = RetryOn::Transient;
        assert!(on.should_retry(&Error::http("api", 500, "oops")));
        assert!(!on.should_retry(&Error::http("api", 404, "missing")));
        assert!(!on.should_retry(&Error::configuration("bad")));
    }

    #[test]
    fn test_network_retries_any_status() {
        assert!(RetryOn::Network.should_retry(&Error::http("api", 404, "missing")));
    }

    #[test]
    fn test_custom_predicate() {
        let on = RetryOn::Custom(Arc::new(|e| e.is_tool_unavailable()));
        assert!(on.should_retry(&Error::tool_unavailable("git")));
        assert!(!on.should_retry(&Error::network("api", "reset")));
    }
}
