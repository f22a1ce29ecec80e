//! Retry policy types
//!
//! A [`RetryPolicy`] decides how many times a phase is attempted, how long to
//! wait between attempts and which classified failures may be retried.

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Closed set of labels a failure can be classified into
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Connection refused, fetch failures and similar
    #[serde(alias = "network_error")]
    Network,

    /// Operation timed out
    Timeout,

    /// Authentication rejected
    #[serde(alias = "auth_error")]
    Auth,

    /// Authenticated but not allowed
    #[serde(alias = "permission_denied")]
    Permission,

    /// Caller supplied bad input
    #[serde(alias = "invalid-input")]
    InvalidInput,

    /// Any other failure that carried a message
    #[serde(alias = "transient_failure")]
    Transient,

    /// Failure without a message
    #[serde(alias = "unknown_error")]
    Unknown,
}

impl ErrorKind {
    /// Every kind, in declaration order
    pub const ALL: [ErrorKind; 7] = [
        ErrorKind::Network,
        ErrorKind::Timeout,
        ErrorKind::Auth,
        ErrorKind::Permission,
        ErrorKind::InvalidInput,
        ErrorKind::Transient,
        ErrorKind::Unknown,
    ];

    /// Canonical label
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Network => "network",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Auth => "auth",
            ErrorKind::Permission => "permission",
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::Transient => "transient",
            ErrorKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ErrorKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "network" | "network_error" => Ok(ErrorKind::Network),
            "timeout" => Ok(ErrorKind::Timeout),
            "auth" | "auth_error" => Ok(ErrorKind::Auth),
            "permission" | "permission_denied" => Ok(ErrorKind::Permission),
            "invalid_input" => Ok(ErrorKind::InvalidInput),
            "transient" | "transient_failure" => Ok(ErrorKind::Transient),
            "unknown" | "unknown_error" => Ok(ErrorKind::Unknown),
            _ => Err(Error::unknown_error_kind(s)),
        }
    }
}

/// How the wait between attempts grows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum BackoffKind {
    /// Same delay every time
    #[serde(alias = "fixed")]
    Constant,

    /// `initial * attempt`
    Linear,

    /// `initial * 2^(attempt - 1)` (default)
    #[default]
    Exponential,
}

impl fmt::Display for BackoffKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BackoffKind::Constant => "constant",
            BackoffKind::Linear => "linear",
            BackoffKind::Exponential => "exponential",
        })
    }
}

impl FromStr for BackoffKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "constant" | "fixed" => Ok(BackoffKind::Constant),
            "linear" => Ok(BackoffKind::Linear),
            "exponential" => Ok(BackoffKind::Exponential),
            other => Err(Error::invalid_config(format!(
                "Unknown backoff kind: {}. Valid kinds: constant, linear, exponential",
                other
            ))),
        }
    }
}

/// Retry policy for a phase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first one
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Backoff curve
    #[serde(default)]
    pub backoff: BackoffKind,

    /// Delay after the first failed attempt, in milliseconds
    #[serde(default = "default_initial_delay")]
    pub initial_delay_ms: u64,

    /// Upper bound on any single delay, in milliseconds
    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,

    /// Kinds that allow another attempt
    #[serde(rename = "retry-on", default = "default_retryable_kinds")]
    pub retryable_kinds: BTreeSet<ErrorKind>,

    /// Kinds that abort immediately, whatever attempts remain
    #[serde(rename = "fail-fast-on", default = "default_fail_fast_kinds")]
    pub fail_fast_kinds: BTreeSet<ErrorKind>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff: BackoffKind::default(),
            initial_delay_ms: default_initial_delay(),
            max_delay_ms: default_max_delay(),
            retryable_kinds: default_retryable_kinds(),
            fail_fast_kinds: default_fail_fast_kinds(),
        }
    }
}

impl RetryPolicy {
    /// Whether a failure of this kind may be retried
    pub fn is_retryable(&self, kind: ErrorKind) -> bool {
        self.retryable_kinds.contains(&kind)
    }

    /// Whether a failure of this kind stops the phase immediately
    pub fn is_fail_fast(&self, kind: ErrorKind) -> bool {
        self.fail_fast_kinds.contains(&kind)
    }

    /// Kinds listed as both retryable and fail-fast
    ///
    /// Fail-fast is checked first at runtime, so these kinds never retry.
    pub fn overlapping_kinds(&self) -> Vec<ErrorKind> {
        self.retryable_kinds
            .intersection(&self.fail_fast_kinds)
            .copied()
            .collect()
    }

    /// Kinds listed in neither set; these stop without retrying
    pub fn unlisted_kinds(&self) -> Vec<ErrorKind> {
        ErrorKind::ALL
            .iter()
            .copied()
            .filter(|kind| !self.is_retryable(*kind) && !self.is_fail_fast(*kind))
            .collect()
    }
}

fn default_max_attempts() -> u32 {
    3
}
fn default_initial_delay() -> u64 {
    2000
}
fn default_max_delay() -> u64 {
    16000
}
fn default_retryable_kinds() -> BTreeSet<ErrorKind> {
    [ErrorKind::Network, ErrorKind::Timeout, ErrorKind::Transient]
        .into_iter()
        .collect()
}
fn default_fail_fast_kinds() -> BTreeSet<ErrorKind> {
    [ErrorKind::Auth, ErrorKind::Permission, ErrorKind::InvalidInput]
        .into_iter()
        .collect()
}

/// Field-by-field overrides for a [`RetryPolicy`]
///
/// Fields left as `None` inherit the default policy's value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct RetryPolicyOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backoff: Option<BackoffKind>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_delay_ms: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_delay_ms: Option<u64>,

    #[serde(rename = "retry-on", default, skip_serializing_if = "Option::is_none")]
    pub retryable_kinds: Option<BTreeSet<ErrorKind>>,

    #[serde(rename = "fail-fast-on", default, skip_serializing_if = "Option::is_none")]
    pub fail_fast_kinds: Option<BTreeSet<ErrorKind>>,
}

impl RetryPolicyOverrides {
    /// Overlay these overrides on `base`
    pub fn apply_to(&self, base: RetryPolicy) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts.unwrap_or(base.max_attempts),
            backoff: self.backoff.unwrap_or(base.backoff),
            initial_delay_ms: self.initial_delay_ms.unwrap_or(base.initial_delay_ms),
            max_delay_ms: self.max_delay_ms.unwrap_or(base.max_delay_ms),
            retryable_kinds: self
                .retryable_kinds
                .clone()
                .unwrap_or(base.retryable_kinds),
            fail_fast_kinds: self
                .fail_fast_kinds
                .clone()
                .unwrap_or(base.fail_fast_kinds),
        }
    }

    /// Overrides that reproduce `policy` exactly
    pub fn from_policy(policy: &RetryPolicy) -> Self {
        Self {
            max_attempts: Some(policy.max_attempts),
            backoff: Some(policy.backoff),
            initial_delay_ms: Some(policy.initial_delay_ms),
            max_delay_ms: Some(policy.max_delay_ms),
            retryable_kinds: Some(policy.retryable_kinds.clone()),
            fail_fast_kinds: Some(policy.fail_fast_kinds.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_retry_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.backoff, BackoffKind::Exponential);
        assert_eq!(policy.initial_delay_ms, 2000);
        assert_eq!(policy.max_delay_ms, 16000);
        assert!(policy.is_retryable(ErrorKind::Network));
        assert!(policy.is_retryable(ErrorKind::Timeout));
        assert!(policy.is_retryable(ErrorKind::Transient));
        assert!(policy.is_fail_fast(ErrorKind::Auth));
        assert!(policy.is_fail_fast(ErrorKind::Permission));
        assert!(policy.is_fail_fast(ErrorKind::InvalidInput));
        assert!(policy.overlapping_kinds().is_empty());
        assert_eq!(policy.unlisted_kinds(), vec![ErrorKind::Unknown]);
    }

    #[test]
    fn test_error_kind_parses_long_form_aliases() {
        assert_eq!("network_error".parse::<ErrorKind>().unwrap(), ErrorKind::Network);
        assert_eq!(
            "transient_failure".parse::<ErrorKind>().unwrap(),
            ErrorKind::Transient
        );
        assert_eq!(
            "permission_denied".parse::<ErrorKind>().unwrap(),
            ErrorKind::Permission
        );
        assert_eq!("invalid-input".parse::<ErrorKind>().unwrap(), ErrorKind::InvalidInput);
        assert!("disk_full".parse::<ErrorKind>().is_err());
    }

    #[test]
    fn test_error_kind_display_round_trips() {
        for kind in ErrorKind::ALL {
            assert_eq!(kind.to_string().parse::<ErrorKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_overrides_replace_only_given_fields() {
        let overrides = RetryPolicyOverrides {
            max_attempts: Some(5),
            backoff: Some(BackoffKind::Linear),
            ..Default::default()
        };

        let policy = overrides.apply_to(RetryPolicy::default());
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.backoff, BackoffKind::Linear);
        assert_eq!(policy.initial_delay_ms, 2000);
        assert_eq!(policy.retryable_kinds, default_retryable_kinds());
    }

    #[test]
    fn test_overrides_replace_kind_sets_wholesale() {
        let overrides = RetryPolicyOverrides {
            retryable_kinds: Some([ErrorKind::Network].into_iter().collect()),
            ..Default::default()
        };

        let policy = overrides.apply_to(RetryPolicy::default());
        assert!(policy.is_retryable(ErrorKind::Network));
        assert!(!policy.is_retryable(ErrorKind::Timeout));
    }

    #[test]
    fn test_overlapping_kinds_detected() {
        let mut policy = RetryPolicy::default();
        policy.retryable_kinds.insert(ErrorKind::Auth);
        assert_eq!(policy.overlapping_kinds(), vec![ErrorKind::Auth]);
    }

    #[test]
    fn test_policy_yaml_uses_kebab_case() {
        let yaml = r#"
max-attempts: 2
backoff: constant
initial-delay-ms: 500
max-delay-ms: 2000
retry-on: [transient_failure]
fail-fast-on: []
"#;
        let policy: RetryPolicy = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(policy.max_attempts, 2);
        assert_eq!(policy.backoff, BackoffKind::Constant);
        assert!(policy.is_retryable(ErrorKind::Transient));
        assert!(policy.fail_fast_kinds.is_empty());
    }
}
