// Bounded retry with exponential backoff

use crate::config::LlmConfig;
use crate::error::{Error, Result};
use std::time::Duration;
use tracing::{debug, warn};

/// Backoff multiplier between attempts
const BACKOFF_FACTOR: u32 = 2;

/// Outcome of a failed attempt
#[derive(Debug)]
pub enum AttemptError {
    /// Worth trying again (transport error, rate limit, server error, empty answer)
    Transient(Error),
    /// Retrying cannot help (authentication, bad request)
    Permanent(Error),
}

impl AttemptError {
    pub fn into_error(self) -> Error {
        match self {
            AttemptError::Transient(e) | AttemptError::Permanent(e) => e,
        }
    }
}

/// Retry settings for generation calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &LlmConfig) -> Self {
        Self {
            max_attempts: config.max_retries.max(1),
            base_delay: Duration::from_millis(config.base_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
        }
    }

    /// Delay after failed attempt `attempt` (1-based): `base * 2^(attempt-1)`,
    /// capped at `max_delay`
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        let factor = BACKOFF_FACTOR.saturating_pow(exponent);
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    /// Run `op` until it succeeds, fails permanently or attempts run out,
    /// sleeping the thread between attempts
    pub fn run<T>(&self, op: impl FnMut(u32) -> std::result::Result<T, AttemptError>) -> Result<T> {
        self.run_with_sleep(op, std::thread::sleep)
    }

    /// `run` with an injectable sleep
    pub fn run_with_sleep<T>(
        &self,
        mut op: impl FnMut(u32) -> std::result::Result<T, AttemptError>,
        mut sleep: impl FnMut(Duration),
    ) -> Result<T> {
        let mut attempt = 1;
        loop {
            match op(attempt) {
                Ok(value) => return Ok(value),
                Err(AttemptError::Permanent(e)) => return Err(e),
                Err(AttemptError::Transient(e)) => {
                    if attempt >= self.max_attempts {
                        warn!("Giving up after {} attempts: {}", attempt, e);
                        return Err(e);
                    }
                    let delay = self.delay_for(attempt);
                    debug!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "Attempt failed, retrying: {}",
                        e
                    );
                    sleep(delay);
                    attempt += 1;
                }
            }
        }
    }
}
