//! Recovery strategy registry
//!
//! Holds one resolved [`RecoveryStrategy`] per phase name. Registration
//! merges caller overrides over the defaults and replaces any earlier entry
//! for the same name wholesale.

use crate::types::{RecoveryStrategy, StrategyOverrides};
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct StrategyRegistry {
    strategies: HashMap<String, RecoveryStrategy>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve `overrides` and store the result under `phase_name`
    ///
    /// Returns the strategy that was replaced, if any.
    pub fn register(
        &mut self,
        phase_name: impl Into<String>,
        overrides: StrategyOverrides,
    ) -> Option<RecoveryStrategy> {
        let strategy = RecoveryStrategy::from_overrides(phase_name, overrides);
        tracing::debug!(
            phase = %strategy.phase_name,
            max_attempts = strategy.retry_policy.max_attempts,
            backoff = %strategy.retry_policy.backoff,
            rollback_actions = strategy.rollback_actions.len(),
            "registered recovery strategy"
        );
        self.strategies
            .insert(strategy.phase_name.clone(), strategy)
    }

    pub fn get(&self, phase_name: &str) -> Option<&RecoveryStrategy> {
        self.strategies.get(phase_name)
    }

    /// Look up a strategy, registering the default one if the phase is unknown
    pub fn get_or_register_default(&mut self, phase_name: &str) -> &RecoveryStrategy {
        self.strategies
            .entry(phase_name.to_string())
            .or_insert_with(|| {
                tracing::warn!(phase = %phase_name, "no strategy registered, using default policy");
                RecoveryStrategy::default_for(phase_name)
            })
    }

    pub fn contains(&self, phase_name: &str) -> bool {
        self.strategies.contains_key(phase_name)
    }

    /// Registered phase names, sorted
    pub fn phases(&self) -> Vec<String> {
        let mut phases: Vec<String> = self.strategies.keys().cloned().collect();
        phases.sort();
        phases
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    pub fn clear(&mut self) {
        self.strategies.clear();
    }
}
