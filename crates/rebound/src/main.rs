//! Rebound CLI - per-phase retry, rollback and recovery reporting
//!
//! This is the main entry point for the Rebound command-line interface.

mod cli;
mod commands;
mod output;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Presets(args) => commands::presets::run(args, cli.config.as_deref()),
        Commands::Backoff(args) => commands::backoff::run(args, cli.config.as_deref()),
        Commands::Demo(args) => commands::demo::run(args, cli.config.as_deref()).await,
        Commands::Intervene(args) => commands::intervene::run(args),
    }
}

/// Initialize tracing with appropriate verbosity
fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            // Retry warnings and rollback notices show by default
            0 => EnvFilter::new("warn"),
            1 => EnvFilter::new("info"),
            2 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}
