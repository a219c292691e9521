use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Retries the version counter makes after its first attempt.
pub const MAX_RETRIES: u32 = 3;

/// Exponential backoff with random jitter between retry attempts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Backoff {
    /// Delay before the first retry, in milliseconds. Zero disables backoff.
    pub initial_delay_ms: u64,
    /// Upper bound on any single delay, in milliseconds.
    pub max_delay_ms: u64,
    /// Growth factor between consecutive retries.
    pub multiplier: f64,
    /// Fraction of the delay randomly added or subtracted (0.0 to 1.0).
    pub jitter_factor: f64,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            initial_delay_ms: 25,
            max_delay_ms: 500,
            multiplier: 2.0,
            jitter_factor: 0.2,
        }
    }
}

impl Backoff {
    /// Retry immediately.
    pub fn none() -> Self {
        Self {
            initial_delay_ms: 0,
            max_delay_ms: 0,
            multiplier: 1.0,
            jitter_factor: 0.0,
        }
    }

    /// Delay before retry number `retry` (1-based).
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        if self.initial_delay_ms == 0 || retry == 0 {
            return Duration::ZERO;
        }
        let exponent = (retry - 1).min(i32::MAX as u32) as i32;
        let base = (self.initial_delay_ms as f64) * self.multiplier.powi(exponent);
        let capped = base.min(self.max_delay_ms as f64);

        let jitter_factor = self.jitter_factor.clamp(0.0, 1.0);
        let jitter = if jitter_factor > 0.0 {
            rand::thread_rng().gen_range(-1.0..=1.0) * capped * jitter_factor
        } else {
            0.0
        };
        Duration::from_millis((capped + jitter).max(0.0) as u64)
    }
}

/// Bounded retry budget: `max_retries` extra attempts after the first one.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: MAX_RETRIES,
            backoff: Backoff::default(),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, backoff: Backoff) -> Self {
        Self {
            max_retries,
            backoff,
        }
    }

    /// Same retry budget, no waiting between attempts.
    pub fn immediate(max_retries: u32) -> Self {
        Self::new(max_retries, Backoff::none())
    }

    /// Total attempts, the first one included.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        self.backoff.delay_for_retry(retry)
    }
}
