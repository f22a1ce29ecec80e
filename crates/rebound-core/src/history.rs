//! Execution history and partial-success evaluation
//!
//! The history is append-only and ordered by insertion, which is also
//! chronological order. Records are only mutated by the run that owns them,
//! plus the partial-success evaluation which may relabel a phase's latest
//! record as [`PhaseStatus::Partial`].

use crate::types::{ExecutionState, PhaseStatus, RecoveryStrategy};
use uuid::Uuid;

#[derive(Debug, Default)]
pub struct ExecutionHistory {
    records: Vec<ExecutionState>,
}

impl ExecutionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a new in-progress record for `phase` and return its id
    pub fn start(&mut self, phase: &str) -> Uuid {
        let mut state = ExecutionState::new(phase);
        state.status = PhaseStatus::InProgress;
        let id = state.id;
        self.records.push(state);
        id
    }

    /// Mutate the record with `id`
    ///
    /// Returns false if the record is gone, which happens when the history
    /// was reset while the run was still in flight.
    pub fn update<F>(&mut self, id: Uuid, f: F) -> bool
    where
        F: FnOnce(&mut ExecutionState),
    {
        match self.records.iter_mut().find(|r| r.id == id) {
            Some(record) => {
                f(record);
                true
            }
            None => false,
        }
    }

    /// Most recent record for `phase`
    pub fn latest_for(&self, phase: &str) -> Option<&ExecutionState> {
        self.records.iter().rev().find(|r| r.phase == phase)
    }

    pub fn latest_for_mut(&mut self, phase: &str) -> Option<&mut ExecutionState> {
        self.records.iter_mut().rev().find(|r| r.phase == phase)
    }

    pub fn records(&self) -> &[ExecutionState] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}

/// Result of judging an incomplete outcome against a strategy
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PartialVerdict {
    /// Completion cleared the bar
    Accepted { percentage: f64 },
    /// Completion fell short
    BelowThreshold { percentage: f64, required: f64 },
    /// `total` was zero, so no percentage exists
    NoWork,
}

impl PartialVerdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, PartialVerdict::Accepted { .. })
    }
}

/// Judge `completed` out of `total` against `strategy`
pub fn evaluate_partial(strategy: &RecoveryStrategy, completed: u64, total: u64) -> PartialVerdict {
    if total == 0 {
        return PartialVerdict::NoWork;
    }

    let percentage = completed as f64 / total as f64 * 100.0;
    if percentage >= strategy.minimum_completion_percentage {
        PartialVerdict::Accepted { percentage }
    } else {
        PartialVerdict::BelowThreshold {
            percentage,
            required: strategy.minimum_completion_percentage,
        }
    }
}
