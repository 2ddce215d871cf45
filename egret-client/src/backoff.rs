//! Reconnection retry policy.
//!
//! Delay growth and attempt budgeting are pure functions of the
//! configuration and the attempt number, so retry behavior can be unit
//! tested without a clock or a socket.

use std::time::Duration;

use egret_core::RandomProvider;

use crate::client::ClientConfig;

/// Retry policy derived from a [`ClientConfig`].
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    enabled: bool,
    max_attempts: Option<u32>,
    base: Duration,
    max: Duration,
    multiplier: f64,
    jitter: bool,
}

impl RetryPolicy {
    /// Build the policy from a validated configuration.
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            enabled: config.reconnect,
            max_attempts: config.max_reconnect_attempts,
            base: config.retry_base_delay,
            max: config.retry_max_delay,
            multiplier: config.retry_multiplier,
            jitter: config.jitter,
        }
    }

    /// Whether reconnection attempt number `attempt` (zero-based) should
    /// be made.
    ///
    /// Returns false when reconnection is disabled, or when a bounded
    /// attempt budget is exhausted.
    pub fn should_retry(&self, attempt: u32) -> bool {
        self.enabled && self.max_attempts.is_none_or(|max| attempt < max)
    }

    /// Delay to wait before attempt number `attempt` (zero-based).
    ///
    /// Grows as `base * multiplier^attempt`, saturating at the configured
    /// maximum. With jitter enabled the delay is sampled uniformly from
    /// `[delay / 2, delay)` to desynchronize clients reconnecting after a
    /// shared outage.
    pub fn next_delay<R: RandomProvider>(&self, attempt: u32, random: &R) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let raw = self.base.as_secs_f64() * self.multiplier.powi(exponent);
        let capped = if raw.is_finite() {
            raw.min(self.max.as_secs_f64())
        } else {
            self.max.as_secs_f64()
        };
        let delay = if self.jitter {
            random.random_range(capped / 2.0..capped)
        } else {
            capped
        };
        Duration::from_secs_f64(delay)
    }
}
