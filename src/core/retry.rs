//! Deadline-bounded retry around the single-attempt charge
//!
//! `RetryPolicy` calls [`ChargeEngine::attempt_charge`] until the attempt
//! reaches a decision (authorized or declined), a non-retryable error occurs,
//! or the deadline passes while attempts keep conflicting.
//!
//! # Backoff
//!
//! After each conflict the loop sleeps for the current backoff and awaits
//! that sleep before issuing the next attempt. The first interval is
//! `base_delay`; each following one is multiplied by `backoff_factor`.
//! Intervals are clamped to the time left before the deadline.
//!
//! # Outcomes
//!
//! - `Ok(ChargeResult)` - authorized or declined, both final
//! - `Err(ChargeError::ContentionExhausted)` - the deadline passed while still
//!   conflicting; the balance is unknown, so this is never reported as a decline
//! - any other `Err` - propagated from the first attempt that raised it

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, warn};

use super::engine::ChargeEngine;
use super::traits::AccountStore;
use crate::types::{AccountId, ChargeError, ChargeResult};

/// Configuration for conflict retries
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryConfig {
    /// Wait before the first retry
    pub base_delay: Duration,
    /// Multiplier applied to the wait after every retry
    pub backoff_factor: f64,
    /// Total time allowed for retries when no explicit deadline is given
    pub deadline: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(50),
            backoff_factor: 1.6,
            deadline: Duration::from_millis(2000),
        }
    }
}

impl RetryConfig {
    /// Create a new RetryConfig, replacing invalid values with defaults
    ///
    /// A zero base delay, a factor below 1.0 or not finite, and a zero
    /// deadline are each replaced by the default with a warning.
    pub fn new(base_delay: Duration, backoff_factor: f64, deadline: Duration) -> Self {
        let default = Self::default();

        let base_delay = if base_delay.is_zero() {
            warn!(
                ?base_delay,
                default = ?default.base_delay,
                "Invalid retry base delay, using default"
            );
            default.base_delay
        } else {
            base_delay
        };

        let backoff_factor = if !backoff_factor.is_finite() || backoff_factor < 1.0 {
            warn!(
                backoff_factor,
                default = default.backoff_factor,
                "Invalid retry backoff factor, using default"
            );
            default.backoff_factor
        } else {
            backoff_factor
        };

        let deadline = if deadline.is_zero() {
            warn!(
                ?deadline,
                default = ?default.deadline,
                "Invalid charge deadline, using default"
            );
            default.deadline
        } else {
            deadline
        };

        Self {
            base_delay,
            backoff_factor,
            deadline,
        }
    }

    /// Backoff following `current`, never longer than `cap`
    fn next_backoff(&self, current: Duration, cap: Duration) -> Duration {
        Duration::try_from_secs_f64(current.as_secs_f64() * self.backoff_factor)
            .unwrap_or(cap)
            .min(cap)
    }
}

/// Retries conflicting charge attempts with exponential backoff
pub struct RetryPolicy<S> {
    engine: ChargeEngine<S>,
    config: RetryConfig,
}

impl<S> Clone for RetryPolicy<S> {
    fn clone(&self) -> Self {
        Self {
            engine: self.engine.clone(),
            config: self.config,
        }
    }
}

impl<S: AccountStore> RetryPolicy<S> {
    pub fn new(engine: ChargeEngine<S>, config: RetryConfig) -> Self {
        Self { engine, config }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Charge with the configured default deadline
    pub async fn charge(
        &self,
        account: &AccountId,
        amount: u64,
    ) -> Result<ChargeResult, ChargeError> {
        self.charge_safe(account, amount, self.config.deadline).await
    }

    /// Charge, retrying conflicts until `deadline` has elapsed
    ///
    /// # Returns
    ///
    /// * `Ok(ChargeResult)` - the first authorized or declined outcome
    /// * `Err(ChargeError::ContentionExhausted)` - conflicts persisted past the deadline
    /// * `Err(ChargeError::Connection)` / `Err(ChargeError::CorruptBalance)` - not retried
    pub async fn charge_safe(
        &self,
        account: &AccountId,
        amount: u64,
        deadline: Duration,
    ) -> Result<ChargeResult, ChargeError> {
        let start = Instant::now();
        let mut backoff = self.config.base_delay.min(deadline);
        let mut attempts: u32 = 0;

        loop {
            attempts = attempts.saturating_add(1);

            let error = match self.engine.attempt_charge(account, amount).await {
                Err(error) if error.is_conflict() => error,
                outcome => return outcome,
            };

            let elapsed = start.elapsed();
            if elapsed >= deadline {
                warn!(
                    %account,
                    amount,
                    attempts,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Giving up charge after sustained contention"
                );
                return Err(ChargeError::contention_exhausted(
                    account.as_str(),
                    attempts,
                    elapsed,
                ));
            }

            let wait = backoff.min(deadline - elapsed);
            debug!(
                %account,
                attempt = attempts,
                wait_ms = wait.as_millis() as u64,
                %error,
                "Charge conflicted, backing off"
            );
            tokio::time::sleep(wait).await;
            backoff = self.config.next_backoff(backoff, deadline);
        }
    }
}
