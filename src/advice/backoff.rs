//! Exponential backoff for rate-limited advice requests

use super::AdviceError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

/// Exponential backoff schedule
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BackoffPolicy {
    pub initial_delay: Duration,
    pub multiplier: f64,
    pub max_delay: Duration,
    /// Total attempts including the first one
    pub max_attempts: u32,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(30),
            multiplier: 2.0,
            max_delay: Duration::from_secs(300),
            max_attempts: 4,
        }
    }
}

impl BackoffPolicy {
    /// Policy that never retries
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Delay before retry number `attempt` (1-based).
    ///
    /// A provider hint wins over the schedule but is still capped at `max_delay`.
    pub fn delay_for(&self, attempt: u32, hint: Option<Duration>) -> Duration {
        let delay = match hint {
            Some(hint) => hint,
            None => {
                let exponent = attempt.saturating_sub(1).min(32) as i32;
                let secs = self.initial_delay.as_secs_f64() * self.multiplier.max(1.0).powi(exponent);
                if secs.is_finite() {
                    Duration::from_secs_f64(secs.min(self.max_delay.as_secs_f64()))
                } else {
                    self.max_delay
                }
            }
        };
        delay.min(self.max_delay)
    }
}

/// Run `operation`, sleeping between attempts while it keeps failing with a
/// retryable error. Non-retryable errors return immediately.
pub fn retry_with_backoff<T, F, S>(
    policy: &BackoffPolicy,
    mut operation: F,
    mut sleep: S,
) -> Result<T, AdviceError>
where
    F: FnMut() -> Result<T, AdviceError>,
    S: FnMut(Duration),
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match operation() {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() && attempt < max_attempts => {
                let delay = policy.delay_for(attempt, err.retry_after());
                warn!(attempt, delay_secs = delay.as_secs_f64(), error = %err, "Retrying advice request");
                sleep(delay);
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
