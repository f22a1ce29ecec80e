//! Strategy configuration
//!
//! Strategies can be described in YAML under a `phases` map keyed by phase
//! name. Each entry is a [`StrategyOverrides`]; omitted fields take the
//! registration defaults when the entry is resolved or registered.

mod loader;

pub use loader::ConfigLoader;

use crate::engine::RecoveryManager;
use crate::error::{Error, Result};
use crate::retry::RecoveryObserver;
use crate::types::{RecoveryStrategy, RetryPolicy, StrategyOverrides};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A set of named strategy definitions
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct RecoveryConfig {
    #[serde(default)]
    pub phases: BTreeMap<String, StrategyOverrides>,
}

impl RecoveryConfig {
    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml_ng::from_str(content)?)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    /// Check every phase for values registration would have to correct
    ///
    /// Kinds listed as both retryable and fail-fast, and an initial delay
    /// above the cap, are only warned about. Delays are clamped to the cap.
    pub fn validate(&self) -> Result<()> {
        for (phase, overrides) in &self.phases {
            let policy = overrides
                .retry_policy
                .as_ref()
                .map(|p| p.apply_to(RetryPolicy::default()))
                .unwrap_or_default();

            if policy.max_attempts == 0 {
                return Err(Error::invalid_policy(phase, "max-attempts must be at least 1"));
            }
            if policy.initial_delay_ms > policy.max_delay_ms {
                tracing::warn!(
                    phase = %phase,
                    initial_delay_ms = policy.initial_delay_ms,
                    max_delay_ms = policy.max_delay_ms,
                    "initial delay exceeds the cap, every retry waits max-delay-ms"
                );
            }
            if let Some(pct) = overrides.minimum_completion_percentage {
                if !(0.0..=100.0).contains(&pct) {
                    return Err(Error::invalid_policy(
                        phase,
                        format!("minimum-completion-percentage must be within 0-100, got {}", pct),
                    ));
                }
            }

            let overlap = policy.overlapping_kinds();
            if !overlap.is_empty() {
                tracing::warn!(
                    phase = %phase,
                    kinds = ?overlap,
                    "kinds listed as both retryable and fail-fast will fail fast"
                );
            }
        }
        Ok(())
    }

    /// Overlay `other`; its phases replace same-named entries wholesale
    pub fn merge(&mut self, other: RecoveryConfig) {
        self.phases.extend(other.phases);
    }

    pub fn get(&self, phase_name: &str) -> Option<&StrategyOverrides> {
        self.phases.get(phase_name)
    }

    /// Overrides for a named preset
    pub fn preset(&self, name: &str) -> Result<&StrategyOverrides> {
        self.phases
            .get(name)
            .ok_or_else(|| Error::unknown_preset(name))
    }

    pub fn phase_names(&self) -> impl Iterator<Item = &str> {
        self.phases.keys().map(String::as_str)
    }

    /// Every phase resolved against the defaults, in name order
    pub fn resolved(&self) -> Vec<RecoveryStrategy> {
        self.phases
            .iter()
            .map(|(name, overrides)| RecoveryStrategy::from_overrides(name.as_str(), overrides.clone()))
            .collect()
    }

    /// Register every phase with `manager`
    pub fn apply<O: RecoveryObserver>(&self, manager: &RecoveryManager<O>) {
        for (name, overrides) in &self.phases {
            manager.register_strategy(name.as_str(), overrides.clone());
        }
        tracing::debug!(phases = self.phases.len(), "registered configured strategies");
    }
}
