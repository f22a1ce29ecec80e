//! Show the backoff schedule for a phase

use anyhow::Result;
use camino::Utf8Path;
use rebound_core::retry::calculate_delay;
use rebound_core::types::{RecoveryStrategy, RetryPolicy};
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use crate::cli::BackoffArgs;
use crate::output;

#[derive(Debug, Serialize, Tabled, PartialEq)]
struct ScheduleRow {
    /// Failed attempt the delay follows
    attempt: u32,
    delay_ms: u64,
    /// Time spent waiting so far
    total_ms: u64,
}

/// Delays after each of the first `failed_attempts` failures, without jitter
fn schedule(policy: &RetryPolicy, failed_attempts: u32) -> Vec<ScheduleRow> {
    let mut total_ms: u64 = 0;
    (1..=failed_attempts)
        .map(|attempt| {
            let delay_ms = calculate_delay(policy, attempt, false).as_millis() as u64;
            total_ms = total_ms.saturating_add(delay_ms);
            ScheduleRow {
                attempt,
                delay_ms,
                total_ms,
            }
        })
        .collect()
}

pub fn run(args: BackoffArgs, config: Option<&Utf8Path>) -> Result<()> {
    let config = super::load_config(config)?;

    let strategy = match config.get(&args.phase) {
        Some(overrides) => RecoveryStrategy::from_overrides(args.phase.as_str(), overrides.clone()),
        None => {
            output::warning(&format!(
                "No strategy configured for '{}', showing the default policy",
                args.phase
            ));
            RecoveryStrategy::default_for(args.phase.as_str())
        }
    };
    let policy = &strategy.retry_policy;

    // The last allowed attempt is never followed by a delay
    let failed_attempts = args
        .attempts
        .unwrap_or_else(|| policy.max_attempts.saturating_sub(1));
    let rows = schedule(policy, failed_attempts);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    output::header(&format!("Backoff for {}", strategy.phase_name));
    output::kv("Backoff", &policy.backoff.to_string());
    output::kv("Max attempts", &policy.max_attempts.to_string());
    output::kv(
        "Delay bounds",
        &format!("{}ms - {}ms", policy.initial_delay_ms, policy.max_delay_ms),
    );

    if rows.is_empty() {
        output::info("No retries: the first failure is final");
        return Ok(());
    }

    let mut table = Table::new(&rows);
    table.with(Style::rounded());
    println!("{}", table);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rebound_core::types::BackoffKind;

    #[test]
    fn test_default_exponential_schedule() {
        let rows = schedule(&RetryPolicy::default(), 5);
        let delays: Vec<u64> = rows.iter().map(|r| r.delay_ms).collect();
        assert_eq!(delays, vec![2000, 4000, 8000, 16000, 16000]);
        assert_eq!(rows.last().map(|r| r.total_ms), Some(46000));
    }

    #[test]
    fn test_linear_schedule() {
        let policy = RetryPolicy {
            backoff: BackoffKind::Linear,
            initial_delay_ms: 500,
            max_delay_ms: 1200,
            ..RetryPolicy::default()
        };
        let delays: Vec<u64> = schedule(&policy, 3).iter().map(|r| r.delay_ms).collect();
        assert_eq!(delays, vec![500, 1000, 1200]);
    }

    #[test]
    fn test_zero_attempts_is_empty() {
        assert!(schedule(&RetryPolicy::default(), 0).is_empty());
    }
}
