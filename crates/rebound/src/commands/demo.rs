//! Run the preset scenario end to end
//!
//! Three phases run against the loaded strategies: knowledge collection
//! succeeds, validation fails once with a transient error and is accepted
//! as partial, and code generation fails validation of its input and is
//! rolled back.

use anyhow::{Context, Result};
use camino::Utf8Path;
use rebound_core::types::{ExecutionState, StrategyOverrides};
use rebound_core::{
    format_intervention_request, PhaseFailure, RecoveryConfig, RecoveryManager, RecoveryReport,
};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use crate::cli::DemoArgs;
use crate::output;

const KNOWLEDGE: &str = "knowledge-collection";
const VALIDATION: &str = "validation";
const CODE_GENERATION: &str = "code-generation";

pub async fn run(args: DemoArgs, config: Option<&Utf8Path>) -> Result<()> {
    let config = super::load_config(config)?;

    let spinner = output::spinner("Running demo phases...");
    let outcome = run_scenario(&config).await;
    spinner.finish_and_clear();
    let Scenario {
        report,
        history,
        failures,
    } = outcome?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    output::header("Phases");
    for record in &history {
        output::phase_record(record);
    }

    output::header("Recovery report");
    print!("{}", report);

    for (phase, error) in failures {
        output::error(&format!("{} failed: {}", phase, error));
        println!(
            "{}",
            format_intervention_request(
                &phase,
                &error,
                &[
                    "Fix the input and rerun this phase".to_string(),
                    format!("Resume from {}", report.resume_point.as_deref().unwrap_or("the start")),
                    "Abort the workflow".to_string(),
                ],
            )
        );
    }

    output::overall(report.overall_status, report.resume_point.as_deref());
    Ok(())
}

/// Attach logging handlers to the descriptive rollback actions of a preset
fn with_logged_rollback(mut overrides: StrategyOverrides, phase: &'static str) -> StrategyOverrides {
    overrides.rollback_actions = overrides.rollback_actions.map(|actions| {
        actions
            .into_iter()
            .map(|action| {
                let description = action.description.clone();
                action.with_handler(move || {
                    let description = description.clone();
                    async move {
                        tracing::info!(phase, action = %description, "rollback step executed");
                        Ok(())
                    }
                })
            })
            .collect()
    });
    overrides
}

/// What the demo phases left behind
struct Scenario {
    report: RecoveryReport,
    history: Vec<ExecutionState>,
    /// Failed phase and its returned error
    failures: Vec<(String, String)>,
}

async fn run_scenario(config: &RecoveryConfig) -> Result<Scenario> {
    let manager = RecoveryManager::new();
    let mut failures = Vec::new();

    register_presets(&manager, config)?;

    let knowledge = manager
        .execute(KNOWLEDGE, || async {
            Ok::<_, PhaseFailure>(vec!["api reference", "style guide", "examples"])
        })
        .await;
    if let Some(error) = knowledge.error {
        failures.push((KNOWLEDGE.to_string(), error));
    }

    let validator_calls = Arc::new(AtomicU32::new(0));
    let validation = manager
        .execute(VALIDATION, || {
            let calls = validator_calls.clone();
            async move {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(PhaseFailure::new("validator crashed mid-run"))
                } else {
                    Ok(9u32)
                }
            }
        })
        .await;
    match validation.into_result() {
        Ok(passed) => {
            manager.evaluate_partial_success(VALIDATION, u64::from(passed), 10);
        }
        Err(error) => failures.push((VALIDATION.to_string(), error)),
    }

    let generation: rebound_core::types::ExecutionResult<()> = manager
        .execute(CODE_GENERATION, || async {
            Err(PhaseFailure::new("invalid template: missing field `name`"))
        })
        .await;
    if let Some(error) = generation.error {
        failures.push((CODE_GENERATION.to_string(), error));
    }

    Ok(Scenario {
        report: manager.report(),
        history: manager.history(),
        failures,
    })
}

fn register_presets(manager: &RecoveryManager, config: &RecoveryConfig) -> Result<()> {
    for phase in [KNOWLEDGE, VALIDATION, CODE_GENERATION] {
        let overrides = config
            .preset(phase)
            .with_context(|| format!("The demo needs the '{}' preset", phase))?
            .clone();
        manager.register_strategy(phase, with_logged_rollback(overrides, phase));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rebound_core::types::PhaseStatus;
    use rebound_core::{ConfigLoader, OverallStatus};

    #[tokio::test(start_paused = true)]
    async fn test_scenario_report() {
        let config = ConfigLoader::embedded_presets().unwrap();
        let Scenario {
            report,
            history,
            failures,
        } = run_scenario(&config).await.unwrap();

        assert_eq!(report.total_phases, 3);
        assert_eq!(report.completed_phases, 1);
        assert_eq!(report.partial_phases, 1);
        assert_eq!(report.failed_phases, 1);
        assert_eq!(report.total_retries, 1);
        assert_eq!(report.overall_status, OverallStatus::PartialSuccess);
        assert_eq!(report.resume_point.as_deref(), Some(VALIDATION));

        let statuses: Vec<PhaseStatus> = history.iter().map(|r| r.status).collect();
        assert_eq!(
            statuses,
            vec![PhaseStatus::Success, PhaseStatus::Partial, PhaseStatus::Failed]
        );
        assert_eq!(history[1].attempt, 2);

        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, CODE_GENERATION);
        assert_eq!(failures[0].1, "invalid template: missing field `name`");
    }

    #[tokio::test]
    async fn test_scenario_requires_presets() {
        let err = run_scenario(&RecoveryConfig::default()).await.err().unwrap();
        assert!(err.to_string().contains("preset"));
    }

    #[test]
    fn test_logged_rollback_attaches_handlers() {
        let config = ConfigLoader::embedded_presets().unwrap();
        let overrides =
            with_logged_rollback(config.preset(CODE_GENERATION).unwrap().clone(), CODE_GENERATION);
        let actions = overrides.rollback_actions.unwrap();
        assert!(actions.iter().all(|a| a.has_handler()));
    }
}
