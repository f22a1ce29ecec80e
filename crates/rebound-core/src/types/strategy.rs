//! Recovery strategy types
//!
//! A [`RecoveryStrategy`] is the fully-resolved policy bound to one phase
//! name. Callers describe it partially through [`StrategyOverrides`]; the
//! registry fills the gaps from the defaults.

use super::policy::{RetryPolicy, RetryPolicyOverrides};
use futures::future::BoxFuture;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use crate::error::Error;
use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;

/// Partial success is accepted unless a strategy says otherwise
pub const DEFAULT_ALLOW_PARTIAL_SUCCESS: bool = true;

/// Completion percentage needed for partial success unless a strategy says otherwise
pub const DEFAULT_MINIMUM_COMPLETION_PERCENTAGE: f64 = 60.0;

/// Compensating callable attached to a rollback action
pub type RollbackFn = Arc<dyn Fn() -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

/// What a rollback action compensates for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum RollbackKind {
    /// Undo files or other artifacts the phase produced
    #[serde(alias = "revert-files", alias = "revert_files")]
    RevertArtifacts,

    /// Put in-memory or persisted state back
    #[serde(alias = "restore_state")]
    RestoreState,

    /// Release locks, temp dirs, connections
    #[serde(alias = "cleanup-resources", alias = "cleanup_resources")]
    ReleaseResources,

    /// Anything else
    #[default]
    Custom,
}

impl fmt::Display for RollbackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RollbackKind::RevertArtifacts => "revert-artifacts",
            RollbackKind::RestoreState => "restore-state",
            RollbackKind::ReleaseResources => "release-resources",
            RollbackKind::Custom => "custom",
        })
    }
}

impl FromStr for RollbackKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "revert-artifacts" | "revert-files" => Ok(RollbackKind::RevertArtifacts),
            "restore-state" => Ok(RollbackKind::RestoreState),
            "release-resources" | "cleanup-resources" => Ok(RollbackKind::ReleaseResources),
            "custom" => Ok(RollbackKind::Custom),
            other => Err(Error::invalid_config(format!(
                "Unknown rollback kind: {}. Valid kinds: revert-artifacts, restore-state, release-resources, custom",
                other
            ))),
        }
    }
}

/// A described compensating step, optionally executable
///
/// Actions loaded from configuration are descriptive only; attach a handler
/// in code with [`RollbackAction::with_handler`].
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RollbackAction {
    #[serde(default)]
    pub kind: RollbackKind,

    pub description: String,

    #[serde(skip)]
    handler: Option<RollbackFn>,
}

impl RollbackAction {
    /// Create a descriptive action without a handler
    pub fn new(kind: RollbackKind, description: impl Into<String>) -> Self {
        Self {
            kind,
            description: description.into(),
            handler: None,
        }
    }

    /// Attach the callable that performs the compensation
    pub fn with_handler<F, Fut>(mut self, handler: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.handler = Some(Arc::new(move || handler().boxed()));
        self
    }

    /// Whether running this action does anything beyond logging
    pub fn has_handler(&self) -> bool {
        self.handler.is_some()
    }

    /// Run the handler, if any
    pub async fn run(&self) -> anyhow::Result<()> {
        match &self.handler {
            Some(handler) => handler().await,
            None => Ok(()),
        }
    }
}

impl fmt::Debug for RollbackAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RollbackAction")
            .field("kind", &self.kind)
            .field("description", &self.description)
            .field("has_handler", &self.has_handler())
            .finish()
    }
}

/// Resolved recovery policy for one phase
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct RecoveryStrategy {
    pub phase_name: String,
    pub retry_policy: RetryPolicy,
    /// Executed in order on failure, best-effort
    pub rollback_actions: Vec<RollbackAction>,
    /// Caller-interpreted hint; the engine never runs it
    pub fallback_label: Option<String>,
    pub allow_partial_success: bool,
    /// 0-100
    pub minimum_completion_percentage: f64,
}

impl RecoveryStrategy {
    /// Strategy built from defaults alone
    pub fn default_for(phase_name: impl Into<String>) -> Self {
        Self::from_overrides(phase_name, StrategyOverrides::default())
    }

    /// Merge `overrides` over the defaults
    ///
    /// The retry policy merges one level deep; every other field is taken
    /// as given or defaulted. `max_attempts` below 1 is raised to 1 and the
    /// completion percentage is clamped to 0-100.
    pub fn from_overrides(phase_name: impl Into<String>, overrides: StrategyOverrides) -> Self {
        let phase_name = phase_name.into();

        let mut retry_policy = match &overrides.retry_policy {
            Some(policy) => policy.apply_to(RetryPolicy::default()),
            None => RetryPolicy::default(),
        };
        if retry_policy.max_attempts == 0 {
            tracing::warn!(phase = %phase_name, "max-attempts of 0 raised to 1");
            retry_policy.max_attempts = 1;
        }

        let overlap = retry_policy.overlapping_kinds();
        if !overlap.is_empty() {
            tracing::warn!(
                phase = %phase_name,
                kinds = ?overlap,
                "kinds listed as both retryable and fail-fast will fail fast"
            );
        }

        let requested = overrides
            .minimum_completion_percentage
            .unwrap_or(DEFAULT_MINIMUM_COMPLETION_PERCENTAGE);
        let minimum_completion_percentage = if requested.is_nan() {
            DEFAULT_MINIMUM_COMPLETION_PERCENTAGE
        } else {
            requested.clamp(0.0, 100.0)
        };
        if minimum_completion_percentage != requested {
            tracing::warn!(
                phase = %phase_name,
                requested,
                applied = minimum_completion_percentage,
                "minimum completion percentage out of range"
            );
        }

        Self {
            phase_name,
            retry_policy,
            rollback_actions: overrides.rollback_actions.unwrap_or_default(),
            fallback_label: overrides.fallback_label,
            allow_partial_success: overrides
                .allow_partial_success
                .unwrap_or(DEFAULT_ALLOW_PARTIAL_SUCCESS),
            minimum_completion_percentage,
        }
    }
}

/// Caller-supplied subset of a [`RecoveryStrategy`]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct StrategyOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_policy: Option<RetryPolicyOverrides>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rollback_actions: Option<Vec<RollbackAction>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_label: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_partial_success: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_completion_percentage: Option<f64>,
}

impl StrategyOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicyOverrides) -> Self {
        self.retry_policy = Some(policy);
        self
    }

    /// Append a rollback action
    pub fn with_rollback_action(mut self, action: RollbackAction) -> Self {
        self.rollback_actions.get_or_insert_with(Vec::new).push(action);
        self
    }

    pub fn with_fallback(mut self, label: impl Into<String>) -> Self {
        self.fallback_label = Some(label.into());
        self
    }

    pub fn with_partial_success(mut self, allow: bool, minimum_percentage: f64) -> Self {
        self.allow_partial_success = Some(allow);
        self.minimum_completion_percentage = Some(minimum_percentage);
        self
    }
}
