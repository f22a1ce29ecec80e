//! Phase execution engine
//!
//! [`RecoveryManager`] runs named units of work under their registered
//! [`RecoveryStrategy`]: it retries per classification and backoff, rolls
//! back on failure, writes checkpoints on success and keeps the execution
//! history that [`RecoveryReport`] is computed from.
//!
//! Registry, history and checkpoints live behind a single mutex. The lock is
//! never held across the unit of work, a backoff sleep or a rollback
//! handler, so different phases can be driven concurrently from one manager.

use std::future::Future;
use std::time::Instant;

use chrono::Utc;
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::checkpoint::{Checkpoint, CheckpointStore};
use crate::history::{evaluate_partial, ExecutionHistory, PartialVerdict};
use crate::registry::StrategyRegistry;
use crate::report::RecoveryReport;
use crate::retry::{
    decide, DefaultClassifier, ErrorClassifier, PhaseFailure, RecoveryObserver, RetryDecision,
    TracingObserver,
};
use crate::rollback::run_rollback;
use crate::types::{
    ExecutionResult, ExecutionState, PhaseStatus, RecoveryStrategy, StrategyOverrides,
};

/// Prefix of the error returned when a failed phase has a fallback label
pub const FALLBACK_REQUIRED_PREFIX: &str = "fallback required: ";

#[derive(Debug, Default)]
struct EngineState {
    registry: StrategyRegistry,
    history: ExecutionHistory,
    checkpoints: CheckpointStore,
}

/// Builder for configuring a [`RecoveryManager`]
///
/// # Example
///
/// ```rust
/// use rebound_core::retry::StatsObserver;
/// use rebound_core::RecoveryManager;
/// use std::sync::Arc;
///
/// let stats = Arc::new(StatsObserver::new());
/// let manager = RecoveryManager::builder()
///     .with_observer(stats.clone())
///     .with_jitter(false)
///     .build();
/// ```
pub struct RecoveryManagerBuilder<O = TracingObserver> {
    observer: O,
    jitter: bool,
}

impl Default for RecoveryManagerBuilder<TracingObserver> {
    fn default() -> Self {
        Self::new()
    }
}

impl RecoveryManagerBuilder<TracingObserver> {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self {
            observer: TracingObserver,
            jitter: false,
        }
    }
}

impl<O> RecoveryManagerBuilder<O> {
    /// Set the observer
    pub fn with_observer<O2>(self, observer: O2) -> RecoveryManagerBuilder<O2> {
        RecoveryManagerBuilder {
            observer,
            jitter: self.jitter,
        }
    }

    /// Enable or disable jitter on backoff delays
    ///
    /// Disabled by default, so delays follow the policy exactly.
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn build(self) -> RecoveryManager<O> {
        RecoveryManager {
            state: Mutex::new(EngineState::default()),
            observer: self.observer,
            jitter: self.jitter,
        }
    }
}

/// Failure recovery engine
pub struct RecoveryManager<O = TracingObserver> {
    state: Mutex<EngineState>,
    observer: O,
    jitter: bool,
}

impl Default for RecoveryManager<TracingObserver> {
    fn default() -> Self {
        Self::new()
    }
}

impl RecoveryManager<TracingObserver> {
    /// Manager with the tracing observer and no jitter
    pub fn new() -> Self {
        RecoveryManagerBuilder::new().build()
    }

    pub fn builder() -> RecoveryManagerBuilder<TracingObserver> {
        RecoveryManagerBuilder::new()
    }
}

impl<O> RecoveryManager<O>
where
    O: RecoveryObserver,
{
    /// Register the strategy for `phase_name`, replacing any earlier one
    pub fn register_strategy(&self, phase_name: impl Into<String>, overrides: StrategyOverrides) {
        self.state.lock().registry.register(phase_name, overrides);
    }

    /// Resolved strategy for `phase_name`
    pub fn strategy(&self, phase_name: &str) -> Option<RecoveryStrategy> {
        self.state.lock().registry.get(phase_name).cloned()
    }

    /// Registered phase names, sorted
    pub fn registered_phases(&self) -> Vec<String> {
        self.state.lock().registry.phases()
    }

    /// Run `op` for `phase_name` using the default classifier
    ///
    /// See [`execute_with_classifier`](Self::execute_with_classifier).
    pub async fn execute<T, E, F, Fut>(&self, phase_name: &str, op: F) -> ExecutionResult<T>
    where
        T: Serialize,
        E: Into<PhaseFailure>,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.execute_with_classifier(phase_name, op, &DefaultClassifier)
            .await
    }

    /// Run `op` for `phase_name`, classifying failures with `classifier`
    ///
    /// An unregistered phase gets the default strategy registered first.
    /// Exactly one [`ExecutionState`] is appended per call. On success the
    /// result is checkpointed as `{completed: true, result}`; on failure the
    /// strategy's rollback actions run and the returned error is either the
    /// final failure message or `"fallback required: <label>"`.
    pub async fn execute_with_classifier<T, E, F, Fut, C>(
        &self,
        phase_name: &str,
        mut op: F,
        classifier: &C,
    ) -> ExecutionResult<T>
    where
        T: Serialize,
        E: Into<PhaseFailure>,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        C: ErrorClassifier + ?Sized,
    {
        let (strategy, run_id) = {
            let mut state = self.state.lock();
            let strategy = state.registry.get_or_register_default(phase_name).clone();
            let run_id = state.history.start(phase_name);
            (strategy, run_id)
        };
        let policy = &strategy.retry_policy;
        let start = Instant::now();
        let mut attempt = 0;

        let (failure, kind, reason) = loop {
            attempt += 1;
            self.update_record(run_id, |record| record.attempt = attempt);
            self.observer
                .on_attempt_start(phase_name, attempt, policy.max_attempts);

            match op().await {
                Ok(result) => {
                    self.observer
                        .on_success(phase_name, attempt, start.elapsed());
                    self.record_success(phase_name, run_id, &result);
                    return ExecutionResult::succeeded(result);
                }
                Err(err) => {
                    let failure: PhaseFailure = err.into();
                    let kind = classifier.classify(&failure);

                    match decide(policy, kind, attempt, self.jitter) {
                        RetryDecision::RetryAfter(delay) => {
                            self.observer
                                .on_attempt_failed(phase_name, attempt, kind, &failure, delay);
                            if !delay.is_zero() {
                                tokio::time::sleep(delay).await;
                            }
                        }
                        RetryDecision::Stop(reason) => break (failure, kind, reason),
                    }
                }
            }
        };

        self.observer
            .on_gave_up(phase_name, attempt, kind, reason, &failure);

        let error = failure.to_string();
        // A reset during the run drops the record; nothing is re-created for it
        self.update_record(run_id, |record| {
            record.status = PhaseStatus::Failed;
            record.end_time = Some(Utc::now());
            record.error = Some(error.clone());
        });

        run_rollback(phase_name, &strategy.rollback_actions, &self.observer).await;

        match &strategy.fallback_label {
            Some(label) => {
                tracing::info!(phase = %phase_name, fallback = %label, "fallback required");
                ExecutionResult::failed(format!("{}{}", FALLBACK_REQUIRED_PREFIX, label))
            }
            None => ExecutionResult::failed(error),
        }
    }

    /// Store a caller snapshot for `phase_name`, replacing any earlier one
    pub fn save_checkpoint(&self, phase_name: &str, data: Map<String, Value>) {
        self.state.lock().checkpoints.save(phase_name, data);
    }

    pub fn load_checkpoint(&self, phase_name: &str) -> Option<Checkpoint> {
        self.state.lock().checkpoints.load(phase_name).cloned()
    }

    /// Accept `completed` of `total` as partial success when it clears the
    /// strategy's minimum completion percentage
    ///
    /// On acceptance the phase's most recent history record becomes
    /// `partial`. Unregistered phases are never accepted. The strategy's
    /// `allow_partial_success` flag is advisory and is not consulted here.
    pub fn evaluate_partial_success(&self, phase_name: &str, completed: u64, total: u64) -> bool {
        let mut guard = self.state.lock();
        let state = &mut *guard;

        let Some(strategy) = state.registry.get(phase_name) else {
            tracing::debug!(phase = %phase_name, "partial success rejected: no strategy registered");
            return false;
        };

        match evaluate_partial(strategy, completed, total) {
            PartialVerdict::Accepted { percentage } => {
                tracing::info!(
                    phase = %phase_name,
                    completion = format_args!("{:.1}%", percentage),
                    "partial success accepted"
                );
                match state.history.latest_for_mut(phase_name) {
                    Some(record) => record.status = PhaseStatus::Partial,
                    None => tracing::debug!(phase = %phase_name, "no execution record to mark partial"),
                }
                true
            }
            verdict => {
                tracing::debug!(phase = %phase_name, ?verdict, "partial success rejected");
                false
            }
        }
    }

    /// Summary of everything executed so far
    pub fn report(&self) -> RecoveryReport {
        RecoveryReport::from_history(self.state.lock().history.records())
    }

    /// Snapshot of the execution history, oldest first
    pub fn history(&self) -> Vec<ExecutionState> {
        self.state.lock().history.records().to_vec()
    }

    /// Clear strategies, history and checkpoints
    pub fn reset(&self) {
        let mut state = self.state.lock();
        state.registry.clear();
        state.history.clear();
        state.checkpoints.clear();
        tracing::debug!("recovery manager reset");
    }

    fn update_record<F>(&self, run_id: Uuid, f: F) -> bool
    where
        F: FnOnce(&mut ExecutionState),
    {
        let found = self.state.lock().history.update(run_id, f);
        if !found {
            tracing::debug!(%run_id, "execution record no longer present");
        }
        found
    }

    fn record_success<T: Serialize>(&self, phase_name: &str, run_id: Uuid, result: &T) {
        let result = serde_json::to_value(result).unwrap_or_else(|e| {
            tracing::warn!(phase = %phase_name, error = %e, "result not serializable, checkpointing null");
            Value::Null
        });

        let mut data = Map::new();
        data.insert("completed".to_string(), Value::Bool(true));
        data.insert("result".to_string(), result);

        let mut state = self.state.lock();
        let found = state.history.update(run_id, |record| {
            record.status = PhaseStatus::Success;
            record.end_time = Some(Utc::now());
            record.checkpoint_data = Some(data.clone());
        });
        if found {
            state.checkpoints.save(phase_name, data);
        } else {
            tracing::debug!(phase = %phase_name, %run_id, "run outlived a reset, checkpoint skipped");
        }
    }
}
