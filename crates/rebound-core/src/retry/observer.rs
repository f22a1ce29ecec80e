//! Recovery observation and logging
//!
//! This module provides the `RecoveryObserver` trait for monitoring phase
//! attempts and rollbacks, and a `TracingObserver` implementation that logs
//! using the `tracing` crate.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use super::backoff::StopReason;
use super::failure::PhaseFailure;
use crate::rollback::RollbackOutcome;
use crate::types::{ErrorKind, RollbackAction};

/// Observer trait for phase execution events
///
/// Implement this trait to receive callbacks while the engine runs a phase.
/// This is useful for logging, metrics collection, or debugging.
///
/// # Example
///
/// ```rust
/// use rebound_core::retry::{PhaseFailure, RecoveryObserver, StopReason};
/// use rebound_core::types::ErrorKind;
/// use std::time::Duration;
///
/// struct MetricsObserver {
///     // Your metrics client here
/// }
///
/// impl RecoveryObserver for MetricsObserver {
///     fn on_attempt_start(&self, phase: &str, attempt: u32, max_attempts: u32) {}
///
///     fn on_attempt_failed(
///         &self,
///         phase: &str,
///         attempt: u32,
///         kind: ErrorKind,
///         failure: &PhaseFailure,
///         delay: Duration,
///     ) {
///     }
///
///     fn on_success(&self, phase: &str, attempt: u32, total_duration: Duration) {}
///
///     fn on_gave_up(
///         &self,
///         phase: &str,
///         attempt: u32,
///         kind: ErrorKind,
///         reason: StopReason,
///         failure: &PhaseFailure,
///     ) {
///     }
/// }
/// ```
pub trait RecoveryObserver: Send + Sync {
    /// Called when an attempt is about to start
    ///
    /// # Arguments
    ///
    /// * `phase` - The phase being executed
    /// * `attempt` - The attempt number (1-indexed)
    /// * `max_attempts` - The maximum number of attempts configured
    fn on_attempt_start(&self, phase: &str, attempt: u32, max_attempts: u32);

    /// Called when an attempt fails and will be retried after `delay`
    fn on_attempt_failed(
        &self,
        phase: &str,
        attempt: u32,
        kind: ErrorKind,
        failure: &PhaseFailure,
        delay: Duration,
    );

    /// Called when the phase succeeds
    ///
    /// # Arguments
    ///
    /// * `phase` - The phase being executed
    /// * `attempt` - The attempt number that succeeded (1-indexed)
    /// * `total_duration` - Total time spent across all attempts
    fn on_success(&self, phase: &str, attempt: u32, total_duration: Duration);

    /// Called when the attempt loop stops without success
    fn on_gave_up(
        &self,
        phase: &str,
        attempt: u32,
        kind: ErrorKind,
        reason: StopReason,
        failure: &PhaseFailure,
    );

    /// Called before rollback actions run
    fn on_rollback_started(&self, phase: &str, actions: usize) {
        let _ = (phase, actions);
    }

    /// Called when a single rollback action fails; the rollback continues
    fn on_rollback_action_failed(&self, phase: &str, action: &RollbackAction, error: &anyhow::Error) {
        let _ = (phase, action, error);
    }

    /// Called after all rollback actions ran, or when there were none
    fn on_rollback_finished(&self, phase: &str, outcome: &RollbackOutcome) {
        let _ = (phase, outcome);
    }
}

/// A no-op observer that does nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpObserver;

impl RecoveryObserver for NoOpObserver {
    fn on_attempt_start(&self, _phase: &str, _attempt: u32, _max_attempts: u32) {}

    fn on_attempt_failed(
        &self,
        _phase: &str,
        _attempt: u32,
        _kind: ErrorKind,
        _failure: &PhaseFailure,
        _delay: Duration,
    ) {
    }

    fn on_success(&self, _phase: &str, _attempt: u32, _total_duration: Duration) {}

    fn on_gave_up(
        &self,
        _phase: &str,
        _attempt: u32,
        _kind: ErrorKind,
        _reason: StopReason,
        _failure: &PhaseFailure,
    ) {
    }
}

/// An observer that logs execution events using the `tracing` crate
///
/// # Log Levels
///
/// - `on_attempt_start`: DEBUG
/// - `on_attempt_failed`: WARN
/// - `on_success`: INFO (if > 1 attempt) or DEBUG (first attempt)
/// - `on_gave_up`: ERROR when exhausted, WARN otherwise
/// - rollback events: INFO, with action failures at WARN
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl RecoveryObserver for TracingObserver {
    fn on_attempt_start(&self, phase: &str, attempt: u32, max_attempts: u32) {
        tracing::debug!(
            phase = %phase,
            attempt = attempt,
            max_attempts = max_attempts,
            "starting attempt"
        );
    }

    fn on_attempt_failed(
        &self,
        phase: &str,
        attempt: u32,
        kind: ErrorKind,
        failure: &PhaseFailure,
        delay: Duration,
    ) {
        tracing::warn!(
            phase = %phase,
            attempt = attempt,
            kind = %kind,
            error = %failure,
            delay_ms = delay.as_millis() as u64,
            "attempt failed, will retry"
        );
    }

    fn on_success(&self, phase: &str, attempt: u32, total_duration: Duration) {
        if attempt > 1 {
            tracing::info!(
                phase = %phase,
                attempt = attempt,
                total_duration_ms = total_duration.as_millis() as u64,
                "succeeded after retry"
            );
        } else {
            tracing::debug!(
                phase = %phase,
                duration_ms = total_duration.as_millis() as u64,
                "succeeded on first attempt"
            );
        }
    }

    fn on_gave_up(
        &self,
        phase: &str,
        attempt: u32,
        kind: ErrorKind,
        reason: StopReason,
        failure: &PhaseFailure,
    ) {
        match reason {
            StopReason::Exhausted => tracing::error!(
                phase = %phase,
                attempts = attempt,
                kind = %kind,
                error = %failure,
                "all attempts exhausted"
            ),
            StopReason::FailFast | StopReason::NotRetryable => tracing::warn!(
                phase = %phase,
                attempt = attempt,
                kind = %kind,
                reason = %reason,
                error = %failure,
                "giving up without retry"
            ),
        }
    }

    fn on_rollback_started(&self, phase: &str, actions: usize) {
        tracing::info!(phase = %phase, actions = actions, "starting rollback");
    }

    fn on_rollback_action_failed(&self, phase: &str, action: &RollbackAction, error: &anyhow::Error) {
        tracing::warn!(
            phase = %phase,
            action = %action.description,
            kind = %action.kind,
            error = %error,
            "rollback action failed"
        );
    }

    fn on_rollback_finished(&self, phase: &str, outcome: &RollbackOutcome) {
        if outcome.is_noop() {
            tracing::info!(phase = %phase, "no rollback performed");
        } else {
            tracing::info!(
                phase = %phase,
                attempted = outcome.attempted,
                failed = outcome.failed,
                "rollback finished"
            );
        }
    }
}

/// An observer that collects statistics about phase execution
///
/// Useful for testing and metrics collection.
#[derive(Debug, Default)]
pub struct StatsObserver {
    /// Attempt start events
    pub attempt_starts: AtomicU32,
    /// Failed attempts that were retried
    pub failures: AtomicU32,
    /// Success events
    pub successes: AtomicU32,
    /// Runs that stopped after the last allowed attempt
    pub exhaustions: AtomicU32,
    /// Runs that stopped early on a fail-fast or non-retryable kind
    pub cancellations: AtomicU32,
    /// Rollback sequences started
    pub rollbacks: AtomicU32,
    /// Individual rollback actions that failed
    pub rollback_failures: AtomicU32,
}

impl StatsObserver {
    /// Create a new stats observer
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attempt_starts(&self) -> u32 {
        self.attempt_starts.load(Ordering::SeqCst)
    }

    pub fn failures(&self) -> u32 {
        self.failures.load(Ordering::SeqCst)
    }

    pub fn successes(&self) -> u32 {
        self.successes.load(Ordering::SeqCst)
    }

    pub fn exhaustions(&self) -> u32 {
        self.exhaustions.load(Ordering::SeqCst)
    }

    pub fn cancellations(&self) -> u32 {
        self.cancellations.load(Ordering::SeqCst)
    }

    pub fn rollbacks(&self) -> u32 {
        self.rollbacks.load(Ordering::SeqCst)
    }

    pub fn rollback_failures(&self) -> u32 {
        self.rollback_failures.load(Ordering::SeqCst)
    }
}

impl RecoveryObserver for StatsObserver {
    fn on_attempt_start(&self, _phase: &str, _attempt: u32, _max_attempts: u32) {
        self.attempt_starts.fetch_add(1, Ordering::SeqCst);
    }

    fn on_attempt_failed(
        &self,
        _phase: &str,
        _attempt: u32,
        _kind: ErrorKind,
        _failure: &PhaseFailure,
        _delay: Duration,
    ) {
        self.failures.fetch_add(1, Ordering::SeqCst);
    }

    fn on_success(&self, _phase: &str, _attempt: u32, _total_duration: Duration) {
        self.successes.fetch_add(1, Ordering::SeqCst);
    }

    fn on_gave_up(
        &self,
        _phase: &str,
        _attempt: u32,
        _kind: ErrorKind,
        reason: StopReason,
        _failure: &PhaseFailure,
    ) {
        match reason {
            StopReason::Exhausted => self.exhaustions.fetch_add(1, Ordering::SeqCst),
            StopReason::FailFast | StopReason::NotRetryable => {
                self.cancellations.fetch_add(1, Ordering::SeqCst)
            }
        };
    }

    fn on_rollback_started(&self, _phase: &str, _actions: usize) {
        self.rollbacks.fetch_add(1, Ordering::SeqCst);
    }

    fn on_rollback_action_failed(
        &self,
        _phase: &str,
        _action: &RollbackAction,
        _error: &anyhow::Error,
    ) {
        self.rollback_failures.fetch_add(1, Ordering::SeqCst);
    }
}

/// Implement RecoveryObserver for Arc<T> where T: RecoveryObserver
impl<T: RecoveryObserver + ?Sized> RecoveryObserver for std::sync::Arc<T> {
    fn on_attempt_start(&self, phase: &str, attempt: u32, max_attempts: u32) {
        (**self).on_attempt_start(phase, attempt, max_attempts)
    }

    fn on_attempt_failed(
        &self,
        phase: &str,
        attempt: u32,
        kind: ErrorKind,
        failure: &PhaseFailure,
        delay: Duration,
    ) {
        (**self).on_attempt_failed(phase, attempt, kind, failure, delay)
    }

    fn on_success(&self, phase: &str, attempt: u32, total_duration: Duration) {
        (**self).on_success(phase, attempt, total_duration)
    }

    fn on_gave_up(
        &self,
        phase: &str,
        attempt: u32,
        kind: ErrorKind,
        reason: StopReason,
        failure: &PhaseFailure,
    ) {
        (**self).on_gave_up(phase, attempt, kind, reason, failure)
    }

    fn on_rollback_started(&self, phase: &str, actions: usize) {
        (**self).on_rollback_started(phase, actions)
    }

    fn on_rollback_action_failed(&self, phase: &str, action: &RollbackAction, error: &anyhow::Error) {
        (**self).on_rollback_action_failed(phase, action, error)
    }

    fn on_rollback_finished(&self, phase: &str, outcome: &RollbackOutcome) {
        (**self).on_rollback_finished(phase, outcome)
    }
}

/// Implement RecoveryObserver for Box<T> where T: RecoveryObserver
impl<T: RecoveryObserver + ?Sized> RecoveryObserver for Box<T> {
    fn on_attempt_start(&self, phase: &str, attempt: u32, max_attempts: u32) {
        (**self).on_attempt_start(phase, attempt, max_attempts)
    }

    fn on_attempt_failed(
        &self,
        phase: &str,
        attempt: u32,
        kind: ErrorKind,
        failure: &PhaseFailure,
        delay: Duration,
    ) {
        (**self).on_attempt_failed(phase, attempt, kind, failure, delay)
    }

    fn on_success(&self, phase: &str, attempt: u32, total_duration: Duration) {
        (**self).on_success(phase, attempt, total_duration)
    }

    fn on_gave_up(
        &self,
        phase: &str,
        attempt: u32,
        kind: ErrorKind,
        reason: StopReason,
        failure: &PhaseFailure,
    ) {
        (**self).on_gave_up(phase, attempt, kind, reason, failure)
    }

    fn on_rollback_started(&self, phase: &str, actions: usize) {
        (**self).on_rollback_started(phase, actions)
    }

    fn on_rollback_action_failed(&self, phase: &str, action: &RollbackAction, error: &anyhow::Error) {
        (**self).on_rollback_action_failed(phase, action, error)
    }

    fn on_rollback_finished(&self, phase: &str, outcome: &RollbackOutcome) {
        (**self).on_rollback_finished(phase, outcome)
    }
}
