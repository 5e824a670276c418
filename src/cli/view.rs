//! View command implementation.

use super::{CliError, Overrides, ViewFormat, seed_or_random};
use isosim::export::{PlayerView, render_llm};
use isosim::skirmish::Skirmish;

/// Execute the view command.
///
/// # Errors
///
/// Returns an error if the configuration or layout cannot be loaded, or the
/// player does not exist.
pub(crate) fn execute(
    ticks: u64,
    player: u8,
    seed: Option<u64>,
    overrides: &Overrides,
    format: ViewFormat,
) -> Result<(), CliError> {
    let config = overrides.resolve()?;
    let seed = seed_or_random(seed);
    let state = config.initial_state(seed)?;
    if state.player(player).is_none() {
        return Err(CliError::new(format!("No player {player} in this layout")));
    }

    let mut skirmish = Skirmish::new(state, &config, seed);
    while skirmish.state().tick() < ticks && !skirmish.state().game_over {
        skirmish.advance();
    }

    let view = PlayerView::capture(skirmish.state(), player)
        .ok_or_else(|| CliError::new(format!("No player {player} in this layout")))?;

    match format {
        ViewFormat::Json => {
            let json = serde_json::to_string_pretty(&view)?;
            println!("{json}");
        }
        ViewFormat::Llm => {
            print!("{}", render_llm(&view));
        }
    }

    Ok(())
}
