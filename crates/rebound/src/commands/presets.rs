//! List loaded recovery strategies

use anyhow::Result;
use camino::Utf8Path;
use rebound_core::types::{ErrorKind, RecoveryStrategy};
use std::collections::BTreeSet;
use tabled::{settings::Style, Table, Tabled};

use crate::cli::PresetsArgs;
use crate::output;

#[derive(Tabled)]
struct StrategyRow {
    phase: String,
    attempts: u32,
    backoff: String,
    #[tabled(rename = "delay (ms)")]
    delay: String,
    #[tabled(rename = "retry on")]
    retry_on: String,
    #[tabled(rename = "fail fast on")]
    fail_fast_on: String,
    rollback: usize,
    fallback: String,
    partial: String,
}

impl From<&RecoveryStrategy> for StrategyRow {
    fn from(strategy: &RecoveryStrategy) -> Self {
        let policy = &strategy.retry_policy;
        Self {
            phase: strategy.phase_name.clone(),
            attempts: policy.max_attempts,
            backoff: policy.backoff.to_string(),
            delay: format!("{}-{}", policy.initial_delay_ms, policy.max_delay_ms),
            retry_on: join_kinds(&policy.retryable_kinds),
            fail_fast_on: join_kinds(&policy.fail_fast_kinds),
            rollback: strategy.rollback_actions.len(),
            fallback: strategy
                .fallback_label
                .clone()
                .unwrap_or_else(|| "-".to_string()),
            partial: if strategy.allow_partial_success {
                format!("≥{}%", strategy.minimum_completion_percentage)
            } else {
                "no".to_string()
            },
        }
    }
}

fn join_kinds(kinds: &BTreeSet<ErrorKind>) -> String {
    if kinds.is_empty() {
        return "-".to_string();
    }
    kinds
        .iter()
        .map(ErrorKind::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn run(args: PresetsArgs, config: Option<&Utf8Path>) -> Result<()> {
    let strategies = super::load_config(config)?.resolved();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&strategies)?);
        return Ok(());
    }

    if strategies.is_empty() {
        output::warning("No strategies configured");
        return Ok(());
    }

    output::header("Recovery strategies");
    let rows: Vec<StrategyRow> = strategies.iter().map(StrategyRow::from).collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{}", table);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rebound_core::types::StrategyOverrides;

    #[test]
    fn test_row_for_default_strategy() {
        let row = StrategyRow::from(&RecoveryStrategy::default_for("build"));
        assert_eq!(row.phase, "build");
        assert_eq!(row.attempts, 3);
        assert_eq!(row.backoff, "exponential");
        assert_eq!(row.delay, "2000-16000");
        assert_eq!(row.retry_on, "network, timeout, transient");
        assert_eq!(row.fail_fast_on, "auth, permission, invalid_input");
        assert_eq!(row.fallback, "-");
        assert_eq!(row.partial, "≥60%");
    }

    #[test]
    fn test_row_without_partial_success() {
        let strategy = RecoveryStrategy::from_overrides(
            "codegen",
            StrategyOverrides::new().with_partial_success(false, 100.0),
        );
        assert_eq!(StrategyRow::from(&strategy).partial, "no");
    }

    #[test]
    fn test_empty_kind_set() {
        assert_eq!(join_kinds(&BTreeSet::new()), "-");
    }
}
