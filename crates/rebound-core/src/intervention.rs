//! Manual intervention requests

/// Render a request asking a human to resolve a phase that recovery could not
///
/// Options are numbered from 1 in the order given.
pub fn format_intervention_request(phase: &str, error: &str, options: &[String]) -> String {
    let numbered = options
        .iter()
        .enumerate()
        .map(|(i, option)| format!("{}. {}", i + 1, option))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "\n## Manual intervention required\n\n\
         ### Situation\n\
         Automatic recovery failed for phase \"{phase}\".\n\n\
         ### Error\n\
         {error}\n\n\
         ### Options\n\
         {numbered}\n\n\
         ### Next step\n\
         Choose one of the options above, or describe another way to resolve the problem.\n"
    )
}
