//! Retry building blocks for phase execution
//!
//! This module holds the pieces the engine composes into its attempt loop:
//!
//! - `PhaseFailure`: the captured failure of a unit of work
//! - `ErrorClassifier`: maps a failure to an `ErrorKind` (substring-based by default)
//! - `calculate_delay` / `decide`: backoff and the retry-or-stop decision
//! - `RecoveryObserver`: callbacks for attempts and rollbacks, with a
//!   `TracingObserver` for logging and a `StatsObserver` for counting
//!
//! # Example
//!
//! ```rust
//! use rebound_core::retry::{decide, RetryDecision, StopReason};
//! use rebound_core::types::{ErrorKind, RetryPolicy};
//! use std::time::Duration;
//!
//! let policy = RetryPolicy::default();
//!
//! assert_eq!(
//!     decide(&policy, ErrorKind::Network, 1, false),
//!     RetryDecision::RetryAfter(Duration::from_millis(2000))
//! );
//! assert_eq!(
//!     decide(&policy, ErrorKind::Auth, 1, false),
//!     RetryDecision::Stop(StopReason::FailFast)
//! );
//! ```

mod backoff;
mod classifier;
mod failure;
mod observer;

pub use backoff::{calculate_delay, decide, RetryDecision, StopReason};
pub use classifier::{classify_message, ClosureClassifier, DefaultClassifier, ErrorClassifier};
pub use failure::PhaseFailure;
pub use observer::{NoOpObserver, RecoveryObserver, StatsObserver, TracingObserver};

#[cfg(test)]
mod tests;
