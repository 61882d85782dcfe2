//! Exponential backoff with jitter for provider retries

use std::time::Duration;

use rand::Rng;

/// Backoff configuration
#[derive(Debug, Clone)]
pub struct BackoffConfig {
    /// Initial delay in milliseconds
    pub initial_delay_ms: u64,
    /// Maximum delay in milliseconds
    pub max_delay_ms: u64,
    /// Multiplier for exponential growth
    pub multiplier: f64,
    /// Jitter factor (0.0 to 1.0)
    pub jitter_factor: f64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: 200,
            max_delay_ms: 5_000,
            multiplier: 2.0,
            jitter_factor: 0.1,
        }
    }
}

/// Exponential backoff calculator.
///
/// Delays grow as `initial * multiplier^attempt`, capped at the maximum,
/// with jitter applied so concurrent retries spread out.
pub struct ExponentialBackoff {
    config: BackoffConfig,
    attempt: u32,
}

impl ExponentialBackoff {
    pub fn new(config: BackoffConfig) -> Self {
        Self { config, attempt: 0 }
    }

    /// Get the delay to wait before the next attempt
    pub fn next_delay(&mut self) -> Duration {
        let exponent = self.attempt.min(16);
        self.attempt += 1;

        let base = self.config.initial_delay_ms as f64 * self.config.multiplier.powi(exponent as i32);
        let capped = base.min(self.config.max_delay_ms as f64);

        let with_jitter = if self.config.jitter_factor > 0.0 {
            let jitter_range = capped * self.config.jitter_factor;
            let jitter = rand::rng().random_range(-jitter_range..=jitter_range);
            capped + jitter
        } else {
            capped
        };

        Duration::from_millis(with_jitter.max(1.0) as u64)
    }

    /// Number of delays handed out so far
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Reset to the initial delay
    pub fn reset(&mut self) {
        self.attempt = 0;
    }
}
