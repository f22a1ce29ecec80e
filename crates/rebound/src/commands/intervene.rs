//! Print a manual intervention request

use anyhow::Result;
use rebound_core::format_intervention_request;

use crate::cli::InterveneArgs;

/// Options offered when none are given on the command line
fn default_options() -> Vec<String> {
    vec![
        "Retry the phase".to_string(),
        "Skip the phase and continue".to_string(),
        "Abort the workflow".to_string(),
    ]
}

pub fn run(args: InterveneArgs) -> Result<()> {
    let options = if args.options.is_empty() {
        default_options()
    } else {
        args.options
    };

    print!(
        "{}",
        format_intervention_request(&args.phase, &args.error, &options)
    );
    Ok(())
}
