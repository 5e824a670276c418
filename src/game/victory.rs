//! Defeat and victory detection.

use std::collections::HashSet;

use log::info;

use crate::game::{Map, Player, PlayerId};

/// How a finished game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOutcome {
    /// One player outlasted every other.
    Victory(PlayerId),
    /// Nobody survived.
    Draw,
}

impl GameOutcome {
    /// The winner, if any.
    #[must_use]
    pub const fn winner(self) -> Option<PlayerId> {
        match self {
            GameOutcome::Victory(id) => Some(id),
            GameOutcome::Draw => None,
        }
    }
}

/// Mark players without buildings as defeated and decide the game.
///
/// Returns the outcome once the game is decided. Games that started with
/// fewer than two players never end this way.
pub(crate) fn check_victory(
    map: &Map,
    players: &mut [Player],
    started_with: usize,
) -> Option<GameOutcome> {
    let standing: HashSet<PlayerId> = map.buildings().map(|(_, b)| b.owner).collect();
    for player in players.iter_mut().filter(|p| p.is_active()) {
        if !standing.contains(&player.id) {
            player.eliminate();
            info!("player {} ({}) has been defeated", player.id, player.name);
        }
    }

    if started_with < 2 {
        return None;
    }
    let mut survivors = players.iter_mut().filter(|p| p.is_active());
    match (survivors.next(), survivors.next()) {
        (Some(winner), None) => {
            winner.victorious = true;
            info!("player {} ({}) wins", winner.id, winner.name);
            Some(GameOutcome::Victory(winner.id))
        }
        (None, _) => {
            info!("no players remain, the game is a draw");
            Some(GameOutcome::Draw)
        }
        _ => None,
    }
}
