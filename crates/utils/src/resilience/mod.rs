//! Bounded exponential-backoff retry for failure-prone external calls.
//!
//! ## Key Components
//!
//! - **`BackoffConfig`**: attempt budget and delay curve. Delay computation is
//!   a pure function of the attempt number and the curve parameters.
//! - **`RetryOn`**: which error kinds are worth another attempt.
//! - **`Retrier`**: runs an async operation under a `BackoffConfig`, sleeping
//!   through an injected `Sleeper` so tests never wait for real time.

mod backoff;
mod retry;
mod types;

pub use backoff::{backoff_delay, BackoffConfig};
pub use retry::{retry, RecordingSleeper, Retrier, Sleeper, TokioSleeper};
pub use types::RetryOn;
