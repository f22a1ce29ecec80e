//! Backoff delays and retry decisions
//!
//! This module computes how long to wait between attempts and, given a
//! classified failure, whether another attempt should happen at all.

use crate::types::{BackoffKind, ErrorKind, RetryPolicy};
use rand::Rng;
use std::fmt;
use std::time::Duration;

/// Calculate the delay before the next attempt
///
/// # Arguments
///
/// * `policy` - The retry policy containing backoff kind and timing parameters
/// * `attempt` - The attempt that just failed (1-indexed)
/// * `jitter` - Whether to add up to 25% random variation
///
/// # Example
///
/// ```rust
/// use rebound_core::retry::calculate_delay;
/// use rebound_core::types::RetryPolicy;
///
/// let policy = RetryPolicy::default();
///
/// let delays: Vec<u128> = (1..=5)
///     .map(|attempt| calculate_delay(&policy, attempt, false).as_millis())
///     .collect();
/// assert_eq!(delays, vec![2000, 4000, 8000, 16000, 16000]);
/// ```
pub fn calculate_delay(policy: &RetryPolicy, attempt: u32, jitter: bool) -> Duration {
    // Attempt 0 is outside the contract; treat it as the first attempt
    let attempt = attempt.max(1);

    let base_delay_ms = match policy.backoff {
        BackoffKind::Constant => policy.initial_delay_ms,

        BackoffKind::Linear => policy.initial_delay_ms.saturating_mul(u64::from(attempt)),

        BackoffKind::Exponential => {
            let factor = 1u64.checked_shl(attempt - 1).unwrap_or(u64::MAX);
            policy.initial_delay_ms.saturating_mul(factor)
        }
    };

    let capped_delay_ms = base_delay_ms.min(policy.max_delay_ms);

    let final_delay_ms = if jitter && capped_delay_ms > 0 {
        let jitter_range = capped_delay_ms / 4;
        capped_delay_ms + rand::rng().random_range(0..=jitter_range)
    } else {
        capped_delay_ms
    };

    Duration::from_millis(final_delay_ms)
}

/// Why the attempt loop stopped without success
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The kind is listed as fail-fast
    FailFast,
    /// The kind is not listed as retryable
    NotRetryable,
    /// The last allowed attempt failed
    Exhausted,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StopReason::FailFast => "fail-fast",
            StopReason::NotRetryable => "not retryable",
            StopReason::Exhausted => "attempts exhausted",
        })
    }
}

/// Outcome of a failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Wait, then try again
    RetryAfter(Duration),
    /// Give up
    Stop(StopReason),
}

/// Decide what follows a failed attempt
///
/// Fail-fast kinds are checked before retryable kinds, so a kind listed in
/// both never retries. Kinds listed in neither stop immediately.
pub fn decide(policy: &RetryPolicy, kind: ErrorKind, attempt: u32, jitter: bool) -> RetryDecision {
    if policy.is_fail_fast(kind) {
        RetryDecision::Stop(StopReason::FailFast)
    } else if !policy.is_retryable(kind) {
        RetryDecision::Stop(StopReason::NotRetryable)
    } else if attempt >= policy.max_attempts {
        RetryDecision::Stop(StopReason::Exhausted)
    } else {
        RetryDecision::RetryAfter(calculate_delay(policy, attempt, jitter))
    }
}
