//! Best-effort rollback of a failed phase

use crate::retry::RecoveryObserver;
use crate::types::RollbackAction;

/// Tally of one rollback sequence
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RollbackOutcome {
    /// Actions visited
    pub attempted: usize,
    /// Actions whose handler returned an error
    pub failed: usize,
}

impl RollbackOutcome {
    /// True when the strategy had no rollback actions
    pub fn is_noop(&self) -> bool {
        self.attempted == 0
    }
}

/// Run `actions` in order
///
/// A failing action is reported to the observer and the sequence moves on;
/// errors never propagate to the caller.
pub async fn run_rollback<O>(phase: &str, actions: &[RollbackAction], observer: &O) -> RollbackOutcome
where
    O: RecoveryObserver + ?Sized,
{
    let mut outcome = RollbackOutcome::default();

    if !actions.is_empty() {
        observer.on_rollback_started(phase, actions.len());
    }

    for action in actions {
        outcome.attempted += 1;
        tracing::debug!(phase = %phase, action = %action.description, "running rollback action");

        if let Err(e) = action.run().await {
            outcome.failed += 1;
            observer.on_rollback_action_failed(phase, action, &e);
        }
    }

    observer.on_rollback_finished(phase, &outcome);
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::StatsObserver;
    use crate::types::RollbackKind;
    use std::sync::{Arc, Mutex};

    #[tokio::test]
    async fn test_no_actions_is_noop() {
        let observer = StatsObserver::new();
        let outcome = run_rollback("p", &[], &observer).await;
        assert!(outcome.is_noop());
        assert_eq!(observer.rollbacks(), 0);
    }

    #[tokio::test]
    async fn test_failure_does_not_stop_later_actions() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let first = order.clone();
        let third = order.clone();

        let actions = vec![
            RollbackAction::new(RollbackKind::RevertArtifacts, "revert files").with_handler(
                move || {
                    let order = first.clone();
                    async move {
                        order.lock().unwrap().push("revert");
                        Ok(())
                    }
                },
            ),
            RollbackAction::new(RollbackKind::RestoreState, "restore state")
                .with_handler(|| async { Err(anyhow::anyhow!("state store offline")) }),
            RollbackAction::new(RollbackKind::ReleaseResources, "release lock").with_handler(
                move || {
                    let order = third.clone();
                    async move {
                        order.lock().unwrap().push("release");
                        Ok(())
                    }
                },
            ),
        ];

        let observer = StatsObserver::new();
        let outcome = run_rollback("deploy", &actions, &observer).await;

        assert_eq!(outcome, RollbackOutcome { attempted: 3, failed: 1 });
        assert_eq!(*order.lock().unwrap(), vec!["revert", "release"]);
        assert_eq!(observer.rollbacks(), 1);
        assert_eq!(observer.rollback_failures(), 1);
    }

    #[tokio::test]
    async fn test_descriptive_actions_count_as_attempted() {
        let actions = vec![RollbackAction::new(RollbackKind::Custom, "notify team")];
        let outcome = run_rollback("p", &actions, &StatsObserver::new()).await;
        assert_eq!(outcome, RollbackOutcome { attempted: 1, failed: 0 });
    }
}
