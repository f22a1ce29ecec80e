//! CLI argument parsing with clap

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};

/// Rebound - failure recovery for multi-phase workflows
#[derive(Parser, Debug)]
#[command(name = "rebound")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to a strategies YAML file (defaults to ~/.rebound/strategies.yaml)
    #[arg(short, long, global = true)]
    pub config: Option<Utf8PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the loaded recovery strategies
    Presets(PresetsArgs),

    /// Show the backoff schedule for a phase
    Backoff(BackoffArgs),

    /// Run the preset scenario and print its recovery report
    Demo(DemoArgs),

    /// Print a manual intervention request
    Intervene(InterveneArgs),
}

#[derive(Args, Debug)]
pub struct PresetsArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct BackoffArgs {
    /// Phase name; unknown phases use the default policy
    pub phase: String,

    /// Number of failed attempts to show (defaults to max-attempts - 1)
    #[arg(short, long)]
    pub attempts: Option<u32>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct DemoArgs {
    /// Output the report as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct InterveneArgs {
    /// Phase that could not recover
    pub phase: String,

    /// Final error message
    #[arg(short, long)]
    pub error: String,

    /// Option to offer (repeatable)
    #[arg(short, long = "option")]
    pub options: Vec<String>,
}
