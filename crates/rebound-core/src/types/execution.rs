//! Execution records and results

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use crate::error::Error;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Lifecycle of one phase run
///
/// `Pending -> InProgress -> {Success, Failed}`; a later partial-success
/// evaluation may move the latest record to `Partial`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseStatus {
    Pending,
    InProgress,
    Success,
    Failed,
    Partial,
}

impl PhaseStatus {
    /// Whether this status can serve as a resume point
    pub fn is_completed(&self) -> bool {
        matches!(self, PhaseStatus::Success | PhaseStatus::Partial)
    }
}

impl fmt::Display for PhaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PhaseStatus::Pending => "pending",
            PhaseStatus::InProgress => "in_progress",
            PhaseStatus::Success => "success",
            PhaseStatus::Failed => "failed",
            PhaseStatus::Partial => "partial",
        })
    }
}

impl FromStr for PhaseStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "pending" => Ok(PhaseStatus::Pending),
            "in_progress" => Ok(PhaseStatus::InProgress),
            "success" => Ok(PhaseStatus::Success),
            "failed" => Ok(PhaseStatus::Failed),
            "partial" => Ok(PhaseStatus::Partial),
            other => Err(Error::invalid_config(format!("Unknown phase status: {}", other))),
        }
    }
}

/// One record per `execute` call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionState {
    pub id: Uuid,
    pub phase: String,
    /// Attempts made so far; updated in place while the run is in progress
    pub attempt: u32,
    pub status: PhaseStatus,
    pub start_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkpoint_data: Option<Map<String, Value>>,
}

impl ExecutionState {
    /// New pending record starting now
    pub fn new(phase: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            phase: phase.into(),
            attempt: 0,
            status: PhaseStatus::Pending,
            start_time: Utc::now(),
            end_time: None,
            error: None,
            checkpoint_data: None,
        }
    }

    /// Retries beyond the first attempt
    pub fn retries(&self) -> u32 {
        self.attempt.saturating_sub(1)
    }

    /// Wall time of a finished run
    pub fn duration(&self) -> Option<chrono::Duration> {
        self.end_time.map(|end| end - self.start_time)
    }
}

/// What `execute` hands back to the caller
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionResult<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ExecutionResult<T> {
    pub fn succeeded(result: T) -> Self {
        Self {
            success: true,
            result: Some(result),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            result: None,
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Convert into a plain `Result`
    pub fn into_result(self) -> Result<T, String> {
        match (self.success, self.result) {
            (true, Some(result)) => Ok(result),
            _ => Err(self
                .error
                .unwrap_or_else(|| "phase did not produce a result".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_labels() {
        assert_eq!("in-progress".parse::<PhaseStatus>().unwrap(), PhaseStatus::InProgress);
        assert!("done".parse::<PhaseStatus>().is_err());
    }

    #[test]
    fn test_new_state_is_pending() {
        let state = ExecutionState::new("analyze");
        assert_eq!(state.status, PhaseStatus::Pending);
        assert_eq!(state.attempt, 0);
        assert_eq!(state.retries(), 0);
        assert!(state.duration().is_none());
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&PhaseStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
        assert_eq!(PhaseStatus::InProgress.to_string(), "in_progress");
    }

    #[test]
    fn test_completed_statuses() {
        assert!(PhaseStatus::Success.is_completed());
        assert!(PhaseStatus::Partial.is_completed());
        assert!(!PhaseStatus::Failed.is_completed());
        assert!(!PhaseStatus::InProgress.is_completed());
    }

    #[test]
    fn test_result_into_result() {
        let ok = ExecutionResult::succeeded(7);
        assert!(ok.is_success());
        assert_eq!(ok.into_result(), Ok(7));

        let failed: ExecutionResult<i32> = ExecutionResult::failed("fallback required: cache");
        assert!(!failed.is_success());
        assert_eq!(
            failed.into_result(),
            Err("fallback required: cache".to_string())
        );
    }
}
