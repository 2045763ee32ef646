// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Progressive backoff for bounded retry loops.
//!
//! [`ProgressiveBackoff`] is a small per-call value type: it owns the
//! remaining-attempts budget and computes a capped exponential delay for
//! each retry. Construct one per discovery call; there is no shared state.
//!
//! The schedule is deterministic and non-decreasing: `base * 2^n`, saturating
//! at the configured cap. The caller performs the actual sleep, which keeps
//! the type trivially testable.

use std::time::Duration;

/// Configuration for retry backoff.
#[derive(Debug, Clone, Copy)]
pub struct BackoffConfig {
    /// Base delay for the first retry (ms).
    pub base_ms: u32,
    /// Maximum delay cap (ms).
    pub max_ms: u32,
    /// Maximum number of retries before giving up.
    pub max_retries: u32,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            base_ms: 1000,
            max_ms: 32_000,
            max_retries: 10,
        }
    }
}

impl BackoffConfig {
    /// Create with custom base and max delays.
    pub fn new(base_ms: u32, max_ms: u32) -> Self {
        Self {
            base_ms,
            max_ms,
            ..Default::default()
        }
    }

    /// Set maximum retries.
    pub fn with_max_retries(mut self, max: u32) -> Self {
        self.max_retries = max;
        self
    }
}

/// Per-call retry budget with a capped exponential delay schedule.
#[derive(Debug, Clone)]
pub struct ProgressiveBackoff {
    config: BackoffConfig,
    /// Retries consumed so far.
    used: u32,
}

impl ProgressiveBackoff {
    /// Create a backoff with the default configuration.
    pub fn new() -> Self {
        Self::with_config(BackoffConfig::default())
    }

    /// Create with custom configuration.
    pub fn with_config(config: BackoffConfig) -> Self {
        Self { config, used: 0 }
    }

    /// Retries still available.
    pub fn attempts_remaining(&self) -> u32 {
        self.config.max_retries.saturating_sub(self.used)
    }

    /// Retries consumed so far.
    pub fn attempts_used(&self) -> u32 {
        self.used
    }

    /// Consume one retry and return the delay to sleep before it.
    ///
    /// Returns `None` once the budget is exhausted; the counter never goes
    /// negative and repeated calls after exhaustion keep returning `None`.
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.used >= self.config.max_retries {
            return None;
        }
        let delay = self.calculate_delay(self.used);
        self.used += 1;
        Some(delay)
    }

    /// Delay for the given zero-based retry index: `base * 2^n`, capped.
    fn calculate_delay(&self, retry_index: u32) -> Duration {
        let delay_ms = self
            .config
            .base_ms
            .saturating_mul(2u32.saturating_pow(retry_index));
        Duration::from_millis(u64::from(delay_ms.min(self.config.max_ms)))
    }
}

impl Default for ProgressiveBackoff {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_schedule_doubles_until_cap() {
        let mut backoff = ProgressiveBackoff::with_config(BackoffConfig {
            base_ms: 100,
            max_ms: 500,
            max_retries: 5,
        });

        let delays: Vec<u64> = std::iter::from_fn(|| backoff.next_delay())
            .map(|d| d.as_millis() as u64)
            .collect();
        assert_eq!(delays, vec![100, 200, 400, 500, 500]);
    }

    #[test]
    fn test_schedule_is_non_decreasing() {
        let mut backoff = ProgressiveBackoff::with_config(BackoffConfig {
            base_ms: 250,
            max_ms: 8000,
            max_retries: 12,
        });

        let mut previous = Duration::ZERO;
        while let Some(delay) = backoff.next_delay() {
            assert!(delay >= previous);
            previous = delay;
        }
        assert_eq!(backoff.attempts_used(), 12);
    }

    #[test]
    fn test_exhaustion_is_sticky() {
        let mut backoff = ProgressiveBackoff::with_config(BackoffConfig::new(10, 100));
        while backoff.next_delay().is_some() {}

        assert_eq!(backoff.attempts_remaining(), 0);
        assert!(backoff.next_delay().is_none());
        assert!(backoff.next_delay().is_none());
        // Counter stays at the budget, never past it.
        assert_eq!(backoff.attempts_used(), BackoffConfig::default().max_retries);
    }

    #[test]
    fn test_zero_retry_budget() {
        let mut backoff =
            ProgressiveBackoff::with_config(BackoffConfig::new(10, 100).with_max_retries(0));
        assert_eq!(backoff.attempts_remaining(), 0);
        assert!(backoff.next_delay().is_none());
    }

    #[test]
    fn test_large_index_saturates_at_cap() {
        let mut backoff = ProgressiveBackoff::with_config(BackoffConfig {
            base_ms: 1000,
            max_ms: 30_000,
            max_retries: 64,
        });

        let last = std::iter::from_fn(|| backoff.next_delay()).last().unwrap();
        assert_eq!(last, Duration::from_millis(30_000));
    }
}
