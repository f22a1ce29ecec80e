//! Terminal output for recovery runs
//!
//! Status lines go to stdout, problems to stderr. Phase and overall statuses
//! share one colour scheme: green for success, yellow for partial, red for
//! failed.

use console::{style, StyledObject};
use indicatif::{ProgressBar, ProgressStyle};
use rebound_core::types::{ExecutionState, PhaseStatus};
use rebound_core::OverallStatus;

pub fn error(msg: &str) {
    eprintln!("{} {}", style("✗").red().bold(), msg);
}

pub fn warning(msg: &str) {
    eprintln!("{} {}", style("⚠").yellow().bold(), msg);
}

pub fn info(msg: &str) {
    println!("{} {}", style("ℹ").blue().bold(), msg);
}

pub fn header(msg: &str) {
    println!("\n{}", style(msg).bold().underlined());
}

pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", style(key).dim(), value);
}

/// Coloured label for a phase status
pub fn phase_status(status: PhaseStatus) -> StyledObject<String> {
    let label = style(status.to_string());
    match status {
        PhaseStatus::Success => label.green(),
        PhaseStatus::Partial => label.yellow(),
        PhaseStatus::Failed => label.red(),
        PhaseStatus::Pending | PhaseStatus::InProgress => label.dim(),
    }
}

/// One line per execution record: marker, phase, status and attempts
pub fn phase_record(record: &ExecutionState) {
    let marker = match record.status {
        PhaseStatus::Success => style("✓").green().bold(),
        PhaseStatus::Partial => style("◐").yellow().bold(),
        PhaseStatus::Failed => style("✗").red().bold(),
        PhaseStatus::Pending | PhaseStatus::InProgress => style("…").dim(),
    };
    let attempts = if record.attempt == 1 { "attempt" } else { "attempts" };
    println!(
        "{} {:<22} {} ({} {})",
        marker,
        record.phase,
        phase_status(record.status),
        record.attempt,
        attempts
    );
}

/// Closing line for a whole run
pub fn overall(status: OverallStatus, resume_point: Option<&str>) {
    match status {
        OverallStatus::Success => {
            println!("{} {}", style("✓").green().bold(), "All phases recovered")
        }
        OverallStatus::PartialSuccess => println!(
            "{} Partially recovered, resume from {}",
            style("◐").yellow().bold(),
            resume_point.unwrap_or("the start")
        ),
        OverallStatus::Failed => error(&format!(
            "Recovery failed, resume from {}",
            resume_point.unwrap_or("the start")
        )),
    }
}

/// Spinner shown while phases run
pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(spinner_style) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
        pb.set_style(spinner_style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}
