//! Retry with exponential backoff for calls to slow-starting servers.

use crate::error::HarnessError;
use rand::Rng;

/// Configuration for retrying calls that time out.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts (0 = no retries).
    pub max_retries: u32,
    /// Initial delay in milliseconds before the first retry.
    pub initial_delay_ms: u64,
    /// Maximum delay in milliseconds between retries.
    pub max_delay_ms: u64,
    /// Multiplier applied to the delay after each attempt.
    pub backoff_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_delay_ms: 250,
            max_delay_ms: 5_000,
            backoff_factor: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Default backoff with the given number of retries.
    pub fn with_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }
}

/// Returns `true` if the call may succeed when issued again.
///
/// Only timeouts qualify: a dead transport or an error object will not change
/// on a second attempt.
pub fn is_retryable(error: &HarnessError) -> bool {
    matches!(error, HarnessError::Timeout { .. })
}

/// Delay in milliseconds before retry `attempt` (0-based).
///
/// `initial_delay_ms * backoff_factor^attempt` with ±25% jitter, clamped to
/// `max_delay_ms`.
pub fn calculate_delay(policy: &RetryPolicy, attempt: u32) -> u64 {
    let base = policy.initial_delay_ms as f64 * policy.backoff_factor.powi(attempt as i32);
    let clamped = base.min(policy.max_delay_ms as f64);

    let jitter_factor = rand::rng().random_range(0.75..=1.25);
    let jittered = clamped * jitter_factor;

    (jittered as u64).min(policy.max_delay_ms)
}
