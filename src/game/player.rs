//! Player state management.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::game::{Age, Resources};

/// Unique identifier for a player.
pub type PlayerId = u8;

/// Who is driving a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerKind {
    /// A person at the UI (or an external tool-calling client).
    Human,
    /// The built-in scripted opponent.
    Scripted,
}

impl fmt::Display for PlayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayerKind::Human => write!(f, "human"),
            PlayerKind::Scripted => write!(f, "scripted"),
        }
    }
}

/// Stockpile every player starts with.
pub const STARTING_RESOURCES: Resources = Resources {
    food: 200.0,
    wood: 200.0,
    metal: 50.0,
    gold: 100.0,
    knowledge: 0.0,
    oil: 0.0,
};

/// Default storage cap for each resource.
pub const DEFAULT_STORAGE_CAP: f64 = 1000.0;

/// State for a single player.
#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    /// Unique identifier.
    pub id: PlayerId,
    /// Who drives this player.
    pub kind: PlayerKind,
    /// Display name.
    pub name: String,
    /// Current age.
    pub age: Age,
    /// Stockpile.
    pub resources: Resources,
    /// Income per tick computed on the last tick.
    pub rates: Resources,
    /// Maximum stockpile per resource.
    pub storage_cap: Resources,
    /// Live units.
    pub population: u32,
    /// Maximum population.
    pub population_cap: u32,
    /// Lost every building.
    pub defeated: bool,
    /// Last player standing.
    pub victorious: bool,
}

impl Player {
    /// Create a player with starting resources.
    #[must_use]
    pub fn new(id: PlayerId, kind: PlayerKind, name: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            name: name.into(),
            age: Age::Classical,
            resources: STARTING_RESOURCES,
            rates: Resources::ZERO,
            storage_cap: Resources::splat(DEFAULT_STORAGE_CAP),
            population: 0,
            population_cap: Age::Classical.population_bonus(),
            defeated: false,
            victorious: false,
        }
    }

    /// A human-driven player.
    #[must_use]
    pub fn human(id: PlayerId, name: impl Into<String>) -> Self {
        Self::new(id, PlayerKind::Human, name)
    }

    /// A scripted player.
    #[must_use]
    pub fn scripted(id: PlayerId, name: impl Into<String>) -> Self {
        Self::new(id, PlayerKind::Scripted, name)
    }

    /// Whether the player can still act.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        !self.defeated
    }

    /// Mark the player as defeated.
    pub fn eliminate(&mut self) {
        self.defeated = true;
        self.victorious = false;
    }

    /// Clamp every resource into `[0, storage_cap]`.
    pub fn clamp_resources(&mut self) {
        self.resources
            .add_clamped(&Resources::ZERO, &self.storage_cap);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_creation() {
        let player = Player::human(1, "Alice");
        assert_eq!(player.id, 1);
        assert_eq!(player.kind, PlayerKind::Human);
        assert_eq!(player.age, Age::Classical);
        assert!(player.is_active());
        assert!(player.storage_cap.covers(&player.resources));
    }

    #[test]
    fn test_player_eliminate() {
        let mut player = Player::scripted(2, "Bot");
        player.victorious = true;
        player.eliminate();
        assert!(player.defeated);
        assert!(!player.victorious);
        assert!(!player.is_active());
    }

    #[test]
    fn test_clamp_resources() {
        let mut player = Player::human(1, "Alice");
        player.resources.food = 5000.0;
        player.resources.wood = -3.0;
        player.clamp_resources();
        assert!((player.resources.food - DEFAULT_STORAGE_CAP).abs() < 1e-9);
        assert!(player.resources.wood.abs() < 1e-9);
    }
}
