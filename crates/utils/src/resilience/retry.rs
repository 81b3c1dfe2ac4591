//! Retry loop with an injectable sleep

use super::backoff::BackoffConfig;
use async_trait::async_trait;
use parking_lot::Mutex;
use repro_core::Result;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Abstraction over waiting between attempts
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Records requested delays and returns immediately
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    delays: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delays(&self) -> Vec<Duration> {
        self.delays.lock().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.delays.lock().push(duration);
    }
}

/// Runs operations under a backoff policy
#[derive(Clone)]
pub struct Retrier {
    config: BackoffConfig,
    sleeper: Arc<dyn Sleeper>,
}

impl Retrier {
    pub fn new(config: BackoffConfig) -> Self {
        Self::with_sleeper(config, Arc::new(TokioSleeper))
    }

    pub fn with_sleeper(config: BackoffConfig, sleeper: Arc<dyn Sleeper>) -> Self {
        Self { config, sleeper }
    }

    pub fn config(&self) -> &BackoffConfig {
        &self.config
    }

    /// Execute `operation` until it succeeds, fails with a non-retryable
    /// error, or the attempt budget is spent. The last error is returned.
    pub async fn run<F, Fut, T>(&self, name: &str, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match operation().await {
                Ok(value) => {
                    if attempt > 1 {
                        tracing::info!(operation = %name, attempt, "operation succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(error) => {
                    if attempt >= max_attempts || !self.config.retry_on.should_retry(&error) {
                        tracing::debug!(
                            operation = %name,
                            attempt,
                            max_attempts,
                            error = %error,
                            "giving up"
                        );
                        return Err(error);
                    }

                    let delay = self.config.delay_for(attempt);
                    tracing::warn!(
                        operation = %name,
                        attempt,
                        max_attempts,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %error,
                        "operation failed, retrying"
                    );
                    self.sleeper.sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

/// Execute an operation with retry logic on the tokio timer
pub async fn retry<F, Fut, T>(config: &BackoffConfig, operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    Retrier::new(config.clone()).run("operation", operation).await
}
