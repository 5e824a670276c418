//! Error types for the command API.

use std::fmt;

use crate::game::{Age, BuildingKind, Coord, Deposit, PlayerId, Resources, UnitKind};

/// Why a tile cannot hold a new building.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockedReason {
    /// The tile is water.
    Water,
    /// The tile is a mountain.
    Mountain,
    /// The tile holds a forest, metal or oil deposit.
    Deposit,
    /// Another building already covers the tile.
    Occupied,
}

impl fmt::Display for BlockedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockedReason::Water => write!(f, "water"),
            BlockedReason::Mountain => write!(f, "a mountain"),
            BlockedReason::Deposit => write!(f, "a resource deposit"),
            BlockedReason::Occupied => write!(f, "another building"),
        }
    }
}

/// A rejected command.
///
/// Every variant renders to a sentence that a human player or an AI client
/// can act on. A command that fails never mutates the world.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandError {
    /// The game has already ended.
    GameOver,
    /// No player with this id exists.
    UnknownPlayer(PlayerId),
    /// The player has been defeated and can no longer act.
    PlayerDefeated(PlayerId),
    /// The player cannot pay the cost.
    InsufficientResources {
        /// Amount still missing per resource (zero where the player has enough).
        missing: Resources,
    },
    /// The player's age is too low for the requested building or unit.
    AgeTooLow {
        /// Age the item requires.
        required: Age,
        /// Age the player is in.
        current: Age,
    },
    /// The footprint leaves the map.
    OutOfBounds {
        /// Requested origin.
        coord: Coord,
    },
    /// A footprint tile cannot be built on.
    TileBlocked {
        /// First blocked tile.
        coord: Coord,
        /// What is in the way.
        reason: BlockedReason,
    },
    /// A footprint tile lies outside the player's territory.
    OutsideTerritory {
        /// First tile outside territory.
        coord: Coord,
    },
    /// A resource building does not touch its deposit.
    MissingAdjacency {
        /// The building being placed.
        kind: BuildingKind,
        /// The deposit it needs.
        deposit: Deposit,
    },
    /// No building owned by the player at the given tile.
    NoBuildingAt {
        /// Requested tile.
        coord: Coord,
    },
    /// The building is still under construction.
    UnderConstruction {
        /// The building's kind.
        kind: BuildingKind,
    },
    /// The building cannot train the requested unit.
    CannotTrain {
        /// The building's kind.
        building: BuildingKind,
        /// The requested unit.
        unit: UnitKind,
    },
    /// The population cap leaves no room for another unit.
    PopulationCapReached {
        /// Current population plus queued units.
        used: u32,
        /// Current population cap.
        cap: u32,
    },
    /// The building's production queue is full.
    QueueFull {
        /// Queue capacity.
        capacity: usize,
    },
    /// The task name is not one of the accepted orders.
    UnknownTask(String),
    /// None of the given ids named a live unit of the player.
    NoValidUnits,
    /// The target of a gather order does not produce anything.
    NotAResourceBuilding {
        /// The building's kind.
        kind: BuildingKind,
    },
    /// The building at the target tile is fully built.
    AlreadyConstructed {
        /// The building's kind.
        kind: BuildingKind,
    },
    /// The player is already in the final age.
    FinalAge,
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::GameOver => write!(f, "The game is over"),
            CommandError::UnknownPlayer(id) => write!(f, "Unknown player {id}"),
            CommandError::PlayerDefeated(id) => {
                write!(f, "Player {id} has been defeated and cannot act")
            }
            CommandError::InsufficientResources { missing } => {
                write!(f, "Insufficient resources: need {missing} more")
            }
            CommandError::AgeTooLow { required, current } => {
                write!(f, "Requires the {required} age (currently {current})")
            }
            CommandError::OutOfBounds { coord } => {
                write!(f, "Footprint at ({}, {}) extends off the map", coord.x, coord.y)
            }
            CommandError::TileBlocked { coord, reason } => {
                write!(f, "Tile ({}, {}) is blocked by {reason}", coord.x, coord.y)
            }
            CommandError::OutsideTerritory { coord } => write!(
                f,
                "Tile ({}, {}) is outside your territory",
                coord.x, coord.y
            ),
            CommandError::MissingAdjacency { kind, deposit } => {
                write!(f, "{kind} must be placed adjacent to {deposit}")
            }
            CommandError::NoBuildingAt { coord } => {
                write!(f, "You have no building at ({}, {})", coord.x, coord.y)
            }
            CommandError::UnderConstruction { kind } => {
                write!(f, "{kind} is still under construction")
            }
            CommandError::CannotTrain { building, unit } => {
                write!(f, "{building} cannot train {unit}")
            }
            CommandError::PopulationCapReached { used, cap } => {
                write!(f, "Population cap reached ({used}/{cap}); build more houses")
            }
            CommandError::QueueFull { capacity } => {
                write!(f, "Production queue is full ({capacity} units)")
            }
            CommandError::UnknownTask(task) => write!(
                f,
                "Unknown task '{task}' (expected move, attack, gather, build, patrol or garrison)"
            ),
            CommandError::NoValidUnits => write!(f, "None of the given unit ids are yours"),
            CommandError::NotAResourceBuilding { kind } => {
                write!(f, "{kind} has no resource to gather")
            }
            CommandError::AlreadyConstructed { kind } => write!(f, "{kind} is already complete"),
            CommandError::FinalAge => write!(f, "Already in the final age"),
        }
    }
}

impl std::error::Error for CommandError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adjacency_message_names_forest() {
        let err = CommandError::MissingAdjacency {
            kind: BuildingKind::WoodcuttersCamp,
            deposit: Deposit::Forest,
        };
        let message = err.to_string();
        assert!(message.contains("forest"));
        assert!(message.contains("Woodcutter's Camp"));
    }

    #[test]
    fn test_insufficient_resources_lists_missing() {
        let missing = Resources {
            wood: 25.0,
            ..Resources::ZERO
        };
        let message = CommandError::InsufficientResources { missing }.to_string();
        assert!(message.contains("25 wood"));
        assert!(!message.contains("food"));
    }
}
