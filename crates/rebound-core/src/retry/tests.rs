//! Integration tests for the retry module
//!
//! These tests drive classification, retry decisions and observers together
//! through the engine's attempt loop.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::retry::{
    calculate_delay, classify_message, decide, NoOpObserver, PhaseFailure, RecoveryObserver,
    RetryDecision, StatsObserver, StopReason, TracingObserver,
};
use crate::rollback::RollbackOutcome;
use crate::types::{
    BackoffKind, ErrorKind, ExecutionResult, RetryPolicy, RetryPolicyOverrides, RollbackAction,
    RollbackKind, StrategyOverrides,
};
use crate::RecoveryManager;

/// Create a test policy with short delays
fn quick_overrides(max_attempts: u32, backoff: BackoffKind) -> StrategyOverrides {
    StrategyOverrides::new().with_retry_policy(RetryPolicyOverrides {
        max_attempts: Some(max_attempts),
        backoff: Some(backoff),
        initial_delay_ms: Some(1),
        max_delay_ms: Some(10),
        ..Default::default()
    })
}

/// Observer that records every callback as a short event string
#[derive(Default)]
struct RecordingObserver {
    events: Mutex<Vec<String>>,
}

impl RecordingObserver {
    fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    fn push(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }
}

impl RecoveryObserver for RecordingObserver {
    fn on_attempt_start(&self, _phase: &str, attempt: u32, max_attempts: u32) {
        self.push(format!("start {}/{}", attempt, max_attempts));
    }

    fn on_attempt_failed(
        &self,
        _phase: &str,
        attempt: u32,
        kind: ErrorKind,
        _failure: &PhaseFailure,
        _delay: Duration,
    ) {
        self.push(format!("failed {} {}", attempt, kind));
    }

    fn on_success(&self, _phase: &str, attempt: u32, _total_duration: Duration) {
        self.push(format!("success {}", attempt));
    }

    fn on_gave_up(
        &self,
        _phase: &str,
        attempt: u32,
        kind: ErrorKind,
        reason: StopReason,
        _failure: &PhaseFailure,
    ) {
        self.push(format!("gave up {} {} {}", attempt, kind, reason));
    }

    fn on_rollback_started(&self, _phase: &str, actions: usize) {
        self.push(format!("rollback {}", actions));
    }

    fn on_rollback_finished(&self, _phase: &str, outcome: &RollbackOutcome) {
        self.push(format!("rolled back {}/{}", outcome.failed, outcome.attempted));
    }
}

// ============================================================================
// Classification and decision
// ============================================================================

#[test]
fn test_default_policy_decisions_by_message() {
    let policy = RetryPolicy::default();

    let cases = [
        ("fetch failed", RetryDecision::RetryAfter(Duration::from_millis(2000))),
        ("ETIMEDOUT", RetryDecision::RetryAfter(Duration::from_millis(2000))),
        ("something odd", RetryDecision::RetryAfter(Duration::from_millis(2000))),
        ("401 Unauthorized", RetryDecision::Stop(StopReason::FailFast)),
        ("403 Forbidden", RetryDecision::Stop(StopReason::FailFast)),
        ("invalid schema", RetryDecision::Stop(StopReason::FailFast)),
    ];

    for (message, expected) in cases {
        let kind = classify_message(Some(message));
        assert_eq!(decide(&policy, kind, 1, false), expected, "message: {}", message);
    }

    assert_eq!(
        decide(&policy, classify_message(None), 1, false),
        RetryDecision::Stop(StopReason::NotRetryable)
    );
}

#[test]
fn test_decision_delays_follow_backoff() {
    let policy = RetryPolicy {
        max_attempts: 5,
        ..RetryPolicy::default()
    };

    let delays: Vec<Duration> = (1..5)
        .map(|attempt| match decide(&policy, ErrorKind::Network, attempt, false) {
            RetryDecision::RetryAfter(delay) => delay,
            RetryDecision::Stop(reason) => panic!("unexpected stop: {}", reason),
        })
        .collect();

    let expected: Vec<Duration> = (1..5)
        .map(|attempt| calculate_delay(&policy, attempt, false))
        .collect();
    assert_eq!(delays, expected);
    assert_eq!(
        decide(&policy, ErrorKind::Network, 5, false),
        RetryDecision::Stop(StopReason::Exhausted)
    );
}

#[test]
fn test_jitter_stays_within_quarter() {
    let policy = RetryPolicy::default();
    for _ in 0..50 {
        let delay = calculate_delay(&policy, 2, true);
        assert!(delay >= Duration::from_millis(4000));
        assert!(delay <= Duration::from_millis(5000));
    }
}

// ============================================================================
// Observer sequences through the engine
// ============================================================================

#[tokio::test]
async fn test_event_sequence_retry_then_success() {
    let observer = Arc::new(RecordingObserver::default());
    let manager = RecoveryManager::builder()
        .with_observer(observer.clone())
        .build();
    manager.register_strategy("fetch", quick_overrides(3, BackoffKind::Linear));

    let calls = Arc::new(AtomicU32::new(0));
    let result = manager
        .execute("fetch", || {
            let calls = calls.clone();
            async move {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(PhaseFailure::new("network unreachable"))
                } else {
                    Ok(42)
                }
            }
        })
        .await;

    assert_eq!(result.result, Some(42));
    assert_eq!(
        observer.events(),
        vec!["start 1/3", "failed 1 network", "start 2/3", "success 2"]
    );
}

#[tokio::test]
async fn test_event_sequence_fail_fast_with_rollback() {
    let observer = Arc::new(RecordingObserver::default());
    let manager = RecoveryManager::builder()
        .with_observer(observer.clone())
        .build();
    manager.register_strategy(
        "deploy",
        quick_overrides(3, BackoffKind::Constant)
            .with_rollback_action(RollbackAction::new(RollbackKind::RestoreState, "restore state"))
            .with_rollback_action(
                RollbackAction::new(RollbackKind::Custom, "notify").with_handler(|| async {
                    Err(anyhow::anyhow!("notifier offline"))
                }),
            ),
    );

    let result: ExecutionResult<()> = manager
        .execute("deploy", || async { Err(PhaseFailure::new("permission denied")) })
        .await;

    assert!(!result.is_success());
    assert_eq!(
        observer.events(),
        vec![
            "start 1/3",
            "gave up 1 permission fail-fast",
            "rollback 2",
            "rolled back 1/2",
        ]
    );
}

#[tokio::test]
async fn test_event_sequence_no_rollback_actions() {
    let observer = Arc::new(RecordingObserver::default());
    let manager = RecoveryManager::builder()
        .with_observer(observer.clone())
        .build();
    manager.register_strategy("lint", quick_overrides(2, BackoffKind::Constant));

    let _: ExecutionResult<()> = manager
        .execute("lint", || async { Err(PhaseFailure::new("flaky")) })
        .await;

    assert_eq!(
        observer.events(),
        vec![
            "start 1/2",
            "failed 1 transient",
            "start 2/2",
            "gave up 2 transient attempts exhausted",
            "rolled back 0/0",
        ]
    );
}

#[tokio::test]
async fn test_boxed_and_noop_observers() {
    let boxed: Box<dyn RecoveryObserver> = Box::new(StatsObserver::new());
    let manager = RecoveryManager::builder().with_observer(boxed).build();
    let result = manager
        .execute("a", || async { Ok::<_, PhaseFailure>("ok") })
        .await;
    assert!(result.is_success());

    let manager = RecoveryManager::builder().with_observer(NoOpObserver).build();
    let result = manager
        .execute("a", || async { Ok::<_, PhaseFailure>("ok") })
        .await;
    assert!(result.is_success());

    let manager = RecoveryManager::builder()
        .with_observer(TracingObserver)
        .with_jitter(true)
        .build();
    let result = manager
        .execute("a", || async { Ok::<_, PhaseFailure>("ok") })
        .await;
    assert!(result.is_success());
}

#[tokio::test]
async fn test_stats_count_rollback_failures() {
    let stats = Arc::new(StatsObserver::new());
    let manager = RecoveryManager::builder()
        .with_observer(stats.clone())
        .build();
    manager.register_strategy(
        "gen",
        quick_overrides(1, BackoffKind::Constant).with_rollback_action(
            RollbackAction::new(RollbackKind::RevertArtifacts, "revert")
                .with_handler(|| async { Err(anyhow::anyhow!("locked")) }),
        ),
    );

    let _: ExecutionResult<()> = manager
        .execute("gen", || async { Err(PhaseFailure::new("boom")) })
        .await;

    assert_eq!(stats.rollbacks(), 1);
    assert_eq!(stats.rollback_failures(), 1);
    assert_eq!(stats.exhaustions(), 1);
}
