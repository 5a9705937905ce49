//! Retry policy with bounded exponential backoff

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use log::{debug, warn};

/// Errors that can tell the retry layer whether another attempt is worthwhile.
pub trait RetryableError {
    /// True for faults that a later attempt may not hit again.
    fn is_transient(&self) -> bool;

    /// Server-suggested minimum delay before the next attempt.
    fn retry_after(&self) -> Option<Duration> {
        None
    }
}

impl RetryableError for crate::api::StoreError {
    fn is_transient(&self) -> bool {
        crate::api::StoreError::is_transient(self)
    }

    fn retry_after(&self) -> Option<Duration> {
        crate::api::StoreError::retry_after(self)
    }
}

/// Backoff parameters. These are policy, not constants: callers tune them
/// through configuration rather than the engine hard-coding a curve.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts, including the first one. 1 disables retrying.
    pub max_attempts: u32,
    /// Delay before the second attempt.
    pub base_delay: Duration,
    /// Ceiling for any single delay.
    pub max_delay: Duration,
    /// Multiplier applied to the delay after each failed attempt.
    pub backoff_multiplier: f64,
    /// Randomize each delay to 50-100% of its nominal value.
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// Fewer attempts, longer waits. For shared production spreadsheets.
    pub fn conservative() -> Self {
        Self {
            max_attempts: 2,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            backoff_multiplier: 3.0,
            jitter: true,
        }
    }

    /// More attempts, shorter waits. For development against test sheets.
    pub fn aggressive() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(10),
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }

    /// Single attempt, no waiting. For tests.
    pub fn disabled() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            backoff_multiplier: 1.0,
            jitter: false,
        }
    }

    /// Nominal delay before attempt `attempt + 1` (1-based attempts).
    fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = self.backoff_multiplier.powi(attempt.saturating_sub(1) as i32);
        let nominal = self.base_delay.mul_f64(factor);
        nominal.min(self.max_delay)
    }
}

/// Executes an operation, retrying transient failures with exponential backoff.
#[derive(Debug, Clone, Default)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Run `operation` until it succeeds, fails non-transiently, or the
    /// attempt budget is spent. On exhaustion the last error is returned.
    ///
    /// The policy does not know whether `operation` is idempotent. Fetches
    /// and cell updates are; appends are not, so a retried append after an
    /// ambiguous failure (request sent, response lost) can duplicate rows.
    /// That risk is inherent to the backing store and is accepted here
    /// rather than hidden.
    pub async fn execute<T, E, F, Fut>(&self, name: &str, mut operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: RetryableError + Display,
    {
        let mut attempt = 1;
        loop {
            match operation().await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!("{} succeeded on attempt {}", name, attempt);
                    }
                    return Ok(value);
                }
                Err(err) if !err.is_transient() => {
                    debug!("{} failed non-transiently: {}", name, err);
                    return Err(err);
                }
                Err(err) if attempt >= self.config.max_attempts => {
                    warn!(
                        "{} failed after {} attempt(s), giving up: {}",
                        name, attempt, err
                    );
                    return Err(err);
                }
                Err(err) => {
                    let mut delay = self.config.delay_for_attempt(attempt);
                    if let Some(suggested) = err.retry_after() {
                        delay = delay.max(suggested);
                    }
                    if self.config.jitter && !delay.is_zero() {
                        delay = delay.mul_f64(0.5 + rand::random::<f64>() * 0.5);
                    }
                    warn!(
                        "{} failed on attempt {} ({}), retrying in {:?}",
                        name, attempt, err, delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
