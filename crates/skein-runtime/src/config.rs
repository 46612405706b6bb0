//! # Environment-Based Configuration
//!
//! Coordinator configuration with environment variable overrides, so poll
//! cadence and retry budgets can change per deployment without rebuilds.
//!
//! ## Environment Variables
//!
//! - `SKEIN_POLL_INTERVAL` - Wait between status polls, humantime format (default: 500ms)
//! - `SKEIN_RUN_TIMEOUT` - Wall-clock budget per run, measured from `start_run` (default: 2m)
//! - `SKEIN_RETRY_MAX_ATTEMPTS` - Attempts per remote call before a transient failure is fatal (default: 3)
//! - `SKEIN_RETRY_BASE_DELAY` - First retry backoff, doubled per attempt, humantime format (default: 200ms)

use std::env;
use std::time::Duration;

/// Error type for configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid environment variable '{key}': {message}")]
    InvalidEnvVar { key: String, message: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Bounded retry with exponential backoff for single transient remote calls.
///
/// Applies to one poll or one submission at a time; terminal run states are
/// never retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per call, including the first (minimum 1)
    pub max_attempts: u32,

    /// Backoff before the first retry; doubles per subsequent attempt
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Maximum backoff between attempts regardless of doubling
    pub const MAX_DELAY: Duration = Duration::from_secs(10);

    /// A policy that never retries
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
        }
    }

    /// Backoff to wait after the given failed attempt (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay
            .saturating_mul(factor)
            .min(Self::MAX_DELAY)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(200),
        }
    }
}

/// Configuration for a [`RunCoordinator`](crate::RunCoordinator)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinatorConfig {
    /// Wait between status polls; the only suspension point per iteration
    pub poll_interval: Duration,

    /// Wall-clock budget per run, measured from `start_run`
    pub run_timeout: Duration,

    /// Retry policy for transient remote failures
    pub retry: RetryPolicy,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(500),
            run_timeout: Duration::from_secs(120),
            retry: RetryPolicy::default(),
        }
    }
}

impl CoordinatorConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(interval) = parse_duration_env("SKEIN_POLL_INTERVAL")? {
            config.poll_interval = interval;
        }
        if let Some(timeout) = parse_duration_env("SKEIN_RUN_TIMEOUT")? {
            config.run_timeout = timeout;
        }
        if let Some(attempts) = parse_u32_env("SKEIN_RETRY_MAX_ATTEMPTS")? {
            config.retry.max_attempts = attempts;
        }
        if let Some(delay) = parse_duration_env("SKEIN_RETRY_BASE_DELAY")? {
            config.retry.base_delay = delay;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate invariants regardless of where the values came from
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval.is_zero() {
            return Err(ConfigError::ValidationError(
                "poll_interval must be greater than zero".to_string(),
            ));
        }
        if self.run_timeout.is_zero() {
            return Err(ConfigError::ValidationError(
                "run_timeout must be greater than zero".to_string(),
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::ValidationError(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_duration_env(key: &str) -> Result<Option<Duration>, ConfigError> {
    match env::var(key) {
        Ok(raw) => humantime::parse_duration(&raw)
            .map(Some)
            .map_err(|e| ConfigError::InvalidEnvVar {
                key: key.to_string(),
                message: e.to_string(),
            }),
        Err(_) => Ok(None),
    }
}

fn parse_u32_env(key: &str) -> Result<Option<u32>, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .parse::<u32>()
            .map(Some)
            .map_err(|e| ConfigError::InvalidEnvVar {
                key: key.to_string(),
                message: e.to_string(),
            }),
        Err(_) => Ok(None),
    }
}
