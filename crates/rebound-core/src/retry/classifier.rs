//! Failure classification
//!
//! Maps a [`PhaseFailure`] to the closed [`ErrorKind`] label set that retry
//! policies are written against. The default classifier looks for known
//! substrings in the lower-cased failure message; callers can pass their own
//! [`ErrorClassifier`] for a single `execute` call.

use super::failure::PhaseFailure;
use crate::types::ErrorKind;

const NETWORK_PATTERNS: &[&str] = &["network", "econnrefused", "fetch"];
const TIMEOUT_PATTERNS: &[&str] = &["timeout", "etimedout"];
const AUTH_PATTERNS: &[&str] = &["auth", "unauthorized", "401"];
const PERMISSION_PATTERNS: &[&str] = &["permission", "forbidden", "403"];
const INVALID_INPUT_PATTERNS: &[&str] = &["invalid", "validation"];

/// Assigns an [`ErrorKind`] to a failure
///
/// # Example
///
/// ```rust
/// use rebound_core::retry::{ErrorClassifier, PhaseFailure};
/// use rebound_core::types::ErrorKind;
///
/// struct QuotaClassifier;
///
/// impl ErrorClassifier for QuotaClassifier {
///     fn classify(&self, failure: &PhaseFailure) -> ErrorKind {
///         match failure.message() {
///             Some(msg) if msg.contains("quota") => ErrorKind::Timeout,
///             _ => ErrorKind::Unknown,
///         }
///     }
/// }
/// ```
pub trait ErrorClassifier: Send + Sync {
    fn classify(&self, failure: &PhaseFailure) -> ErrorKind;
}

/// Substring-based classifier used when no other is supplied
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultClassifier;

impl ErrorClassifier for DefaultClassifier {
    fn classify(&self, failure: &PhaseFailure) -> ErrorKind {
        classify_message(failure.message())
    }
}

/// A classifier backed by a closure
pub struct ClosureClassifier<F> {
    classify: F,
}

impl<F> ClosureClassifier<F> {
    pub fn new(classify: F) -> Self {
        Self { classify }
    }
}

impl<F> ErrorClassifier for ClosureClassifier<F>
where
    F: Fn(&PhaseFailure) -> ErrorKind + Send + Sync,
{
    fn classify(&self, failure: &PhaseFailure) -> ErrorKind {
        (self.classify)(failure)
    }
}

impl<T: ErrorClassifier + ?Sized> ErrorClassifier for &T {
    fn classify(&self, failure: &PhaseFailure) -> ErrorKind {
        (**self).classify(failure)
    }
}

/// Classify a raw failure message
///
/// Categories are checked in order: network, timeout, auth, permission,
/// invalid input. Anything else with a message is transient; no message at
/// all is unknown.
pub fn classify_message(message: Option<&str>) -> ErrorKind {
    let Some(message) = message else {
        return ErrorKind::Unknown;
    };
    let message = message.to_lowercase();
    let matches_any = |patterns: &[&str]| patterns.iter().any(|p| message.contains(p));

    if matches_any(NETWORK_PATTERNS) {
        ErrorKind::Network
    } else if matches_any(TIMEOUT_PATTERNS) {
        ErrorKind::Timeout
    } else if matches_any(AUTH_PATTERNS) {
        ErrorKind::Auth
    } else if matches_any(PERMISSION_PATTERNS) {
        ErrorKind::Permission
    } else if matches_any(INVALID_INPUT_PATTERNS) {
        ErrorKind::InvalidInput
    } else {
        ErrorKind::Transient
    }
}
