//! Settings validation

use crate::settings::Settings;
use repro_core::{Error, Result};

/// Reject settings that would make the pipeline misbehave
pub fn validate(settings: &Settings) -> Result<()> {
    if settings.timeout_minutes == 0 {
        return Err(Error::configuration("timeout_minutes must be at least 1"));
    }

    let retry = &settings.retry;
    if retry.max_attempts == 0 {
        return Err(Error::configuration("retry.max_attempts must be at least 1"));
    }
    if retry.base_delay_ms == 0 {
        return Err(Error::configuration("retry.base_delay_ms must be positive"));
    }
    if !(retry.multiplier.is_finite() && retry.multiplier > 1.0) {
        return Err(Error::configuration(format!(
            "retry.multiplier must be greater than 1, got {}",
            retry.multiplier
        )));
    }
    if retry.max_delay_ms < retry.base_delay_ms {
        return Err(Error::configuration(
            "retry.max_delay_ms must not be smaller than retry.base_delay_ms",
        ));
    }

    if settings.python.trim().is_empty() {
        return Err(Error::configuration("python interpreter name cannot be empty"));
    }

    Ok(())
}
