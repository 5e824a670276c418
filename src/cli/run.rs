//! Run command implementation.

use super::output::format_text;
use super::{CliError, OutputFormat, Overrides, seed_or_random};
use isosim::skirmish::run_skirmish;

/// Execute the run command.
///
/// # Errors
///
/// Returns an error if the configuration or layout cannot be loaded.
pub(crate) fn execute(
    seed: Option<u64>,
    overrides: &Overrides,
    format: OutputFormat,
) -> Result<(), CliError> {
    let config = overrides.resolve()?;
    let seed = seed_or_random(seed);

    if format == OutputFormat::Text {
        println!("Running skirmish with seed {seed}...");
        println!();
    }

    let result = run_skirmish(seed, &config)?;

    match format {
        OutputFormat::Text => {
            print!("{}", format_text(&result));
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&result)?;
            println!("{json}");
        }
    }

    Ok(())
}
