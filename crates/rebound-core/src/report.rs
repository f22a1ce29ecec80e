//! Recovery report aggregation
//!
//! A [`RecoveryReport`] is computed fresh from the execution history on every
//! call. Nothing is cached.

use crate::error::Error;
use crate::types::{ExecutionState, PhaseStatus};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Overall outcome across all recorded phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallStatus {
    Success,
    PartialSuccess,
    Failed,
}

impl fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OverallStatus::Success => "success",
            OverallStatus::PartialSuccess => "partial_success",
            OverallStatus::Failed => "failed",
        })
    }
}

impl FromStr for OverallStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "success" => Ok(OverallStatus::Success),
            "partial_success" => Ok(OverallStatus::PartialSuccess),
            "failed" => Ok(OverallStatus::Failed),
            other => Err(Error::invalid_config(format!("Unknown overall status: {}", other))),
        }
    }
}

/// Summary of an execution history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoveryReport {
    pub total_phases: usize,
    pub completed_phases: usize,
    pub failed_phases: usize,
    pub partial_phases: usize,
    /// Sum of `attempt - 1` over all records
    pub total_retries: u32,
    /// One per failed record
    pub rollbacks_performed: usize,
    pub overall_status: OverallStatus,
    /// `"<phase>: <error>"` for every record carrying an error
    pub issues: Vec<String>,
    /// Last phase, in history order, that ended `success` or `partial`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resume_point: Option<String>,
}

impl RecoveryReport {
    pub fn from_history(records: &[ExecutionState]) -> Self {
        let count = |status: PhaseStatus| records.iter().filter(|r| r.status == status).count();

        let completed_phases = count(PhaseStatus::Success);
        let failed_phases = count(PhaseStatus::Failed);
        let partial_phases = count(PhaseStatus::Partial);

        let total_retries = records.iter().map(ExecutionState::retries).sum();

        let issues = records
            .iter()
            .filter_map(|r| r.error.as_ref().map(|e| format!("{}: {}", r.phase, e)))
            .collect();

        let overall_status = if failed_phases == 0 {
            OverallStatus::Success
        } else if completed_phases + partial_phases > failed_phases {
            OverallStatus::PartialSuccess
        } else {
            OverallStatus::Failed
        };

        let resume_point = records
            .iter()
            .rev()
            .find(|r| r.status.is_completed())
            .map(|r| r.phase.clone());

        Self {
            total_phases: records.len(),
            completed_phases,
            failed_phases,
            partial_phases,
            total_retries,
            rollbacks_performed: failed_phases,
            overall_status,
            issues,
            resume_point,
        }
    }
}

impl fmt::Display for RecoveryReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Overall status:  {}", self.overall_status)?;
        writeln!(
            f,
            "Phases:          {} total, {} succeeded, {} partial, {} failed",
            self.total_phases, self.completed_phases, self.partial_phases, self.failed_phases
        )?;
        writeln!(f, "Retries:         {}", self.total_retries)?;
        writeln!(f, "Rollbacks:       {}", self.rollbacks_performed)?;
        match &self.resume_point {
            Some(phase) => writeln!(f, "Resume point:    {}", phase)?,
            None => writeln!(f, "Resume point:    none")?,
        }
        if !self.issues.is_empty() {
            writeln!(f, "Issues:")?;
            for issue in &self.issues {
                writeln!(f, "  - {}", issue)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(phase: &str, status: PhaseStatus, attempt: u32, error: Option<&str>) -> ExecutionState {
        let mut state = ExecutionState::new(phase);
        state.status = status;
        state.attempt = attempt;
        state.error = error.map(str::to_string);
        state
    }

    #[test]
    fn test_empty_history() {
        let report = RecoveryReport::from_history(&[]);
        assert_eq!(report.total_phases, 0);
        assert_eq!(report.total_retries, 0);
        assert_eq!(report.overall_status, OverallStatus::Success);
        assert!(report.issues.is_empty());
        assert!(report.resume_point.is_none());
    }

    #[test]
    fn test_one_success_one_failure_is_failed() {
        let records = vec![
            record("collect", PhaseStatus::Success, 1, None),
            record("generate", PhaseStatus::Failed, 2, Some("invalid manifest")),
        ];

        let report = RecoveryReport::from_history(&records);
        assert_eq!(report.overall_status, OverallStatus::Failed);
        assert_eq!(report.completed_phases, 1);
        assert_eq!(report.failed_phases, 1);
        assert_eq!(report.rollbacks_performed, 1);
        assert_eq!(report.total_retries, 1);
        assert_eq!(report.issues, vec!["generate: invalid manifest"]);
        assert_eq!(report.resume_point.as_deref(), Some("collect"));
    }

    #[test]
    fn test_majority_completed_is_partial_success() {
        let records = vec![
            record("collect", PhaseStatus::Success, 1, None),
            record("generate", PhaseStatus::Failed, 3, Some("network down")),
            record("validate", PhaseStatus::Partial, 1, None),
        ];

        let report = RecoveryReport::from_history(&records);
        assert_eq!(report.overall_status, OverallStatus::PartialSuccess);
        assert_eq!(report.partial_phases, 1);
        assert_eq!(report.total_retries, 2);
        assert_eq!(report.resume_point.as_deref(), Some("validate"));
    }

    #[test]
    fn test_resume_point_skips_trailing_failures() {
        let records = vec![
            record("a", PhaseStatus::Success, 1, None),
            record("b", PhaseStatus::Partial, 1, None),
            record("c", PhaseStatus::Failed, 1, Some("auth rejected")),
        ];

        let report = RecoveryReport::from_history(&records);
        assert_eq!(report.resume_point.as_deref(), Some("b"));
    }

    #[test]
    fn test_in_progress_counts_toward_total_only() {
        let records = vec![record("a", PhaseStatus::InProgress, 2, None)];

        let report = RecoveryReport::from_history(&records);
        assert_eq!(report.total_phases, 1);
        assert_eq!(report.completed_phases, 0);
        assert_eq!(report.total_retries, 1);
        assert_eq!(report.overall_status, OverallStatus::Success);
    }

    #[test]
    fn test_json_and_display() {
        let records = vec![record("generate", PhaseStatus::Failed, 1, Some("forbidden"))];
        let report = RecoveryReport::from_history(&records);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["overall_status"], "failed");
        assert!(json.get("resume_point").is_none());

        let text = report.to_string();
        assert!(text.contains("Overall status:  failed"));
        assert_eq!("partial-success".parse::<OverallStatus>().unwrap(), OverallStatus::PartialSuccess);
        assert!(text.contains("  - generate: forbidden"));
    }
}
