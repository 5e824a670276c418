//! Game invariants - sanity checks that detect bugs.
//!
//! These should never trigger in a correctly implemented game. If they do,
//! a rule somewhere wrote an impossible value.

use crate::game::{GameState, Map};

/// Slack allowed on floating-point bounds.
const EPSILON: f64 = 1e-6;

/// Invariant violation error.
#[derive(Debug, Clone)]
pub struct InvariantViolation {
    /// Description of the violated invariant.
    pub message: String,
}

impl std::fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Invariant violation: {}", self.message)
    }
}

impl std::error::Error for InvariantViolation {}

fn violation(message: String) -> InvariantViolation {
    InvariantViolation { message }
}

/// Check all game invariants.
///
/// Returns a list of violations found, or empty if all invariants hold.
#[must_use]
pub fn check_invariants(state: &GameState) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();

    for player in &state.players {
        for resource in crate::game::Resource::ALL {
            let amount = player.resources.get(resource);
            let cap = player.storage_cap.get(resource);
            if amount < -EPSILON || amount > cap + EPSILON {
                violations.push(violation(format!(
                    "Player {} holds {amount} {} outside [0, {cap}]",
                    player.id,
                    resource.name()
                )));
            }
        }

        let live = state.units_of(player.id).count();
        if usize::try_from(player.population).ok() != Some(live) {
            violations.push(violation(format!(
                "Player {} population {} but {live} live units",
                player.id, player.population
            )));
        }

        if player.defeated && state.map.buildings().any(|(_, b)| b.owner == player.id) {
            violations.push(violation(format!(
                "Defeated player {} still owns buildings",
                player.id
            )));
        }
    }

    check_buildings(&state.map, &mut violations);

    for unit in &state.units {
        if unit.health < 0.0 || unit.health > unit.max_health + 1e-3 {
            violations.push(violation(format!(
                "{} health {} outside [0, {}]",
                unit.id, unit.health, unit.max_health
            )));
        }
        if state.player(unit.owner).is_none() {
            violations.push(violation(format!(
                "{} belongs to unknown player {}",
                unit.id, unit.owner
            )));
        }
    }

    violations
}

fn check_buildings(map: &Map, violations: &mut Vec<InvariantViolation>) {
    for (origin, building) in map.buildings() {
        if !(0.0..=100.0).contains(&building.progress) {
            violations.push(violation(format!(
                "{} progress {} outside [0, 100]",
                building.id, building.progress
            )));
        }
        if building.health < 0.0 || building.health > building.max_health {
            violations.push(violation(format!(
                "{} health {} outside [0, {}]",
                building.id, building.health, building.max_health
            )));
        }
        for coord in map.footprint(origin, building.kind) {
            if map.occupant(coord) != Some(origin) {
                violations.push(violation(format!(
                    "{} footprint tile {coord} not indexed to {origin}",
                    building.id
                )));
            }
            if map.get(coord).and_then(|t| t.owner) != Some(building.owner) {
                violations.push(violation(format!(
                    "{} footprint tile {coord} not owned by player {}",
                    building.id, building.owner
                )));
            }
        }
    }
}

/// Assert all game invariants hold, panicking if any are violated.
///
/// Only active in debug builds. No-op in release builds.
///
/// # Panics
///
/// Panics with detailed message if any invariant is violated.
#[cfg(debug_assertions)]
pub fn assert_invariants(state: &GameState) {
    let violations = check_invariants(state);
    if !violations.is_empty() {
        let messages: Vec<_> = violations.iter().map(|v| v.message.as_str()).collect();
        panic!("Game invariant violations:\n  - {}", messages.join("\n  - "));
    }
}

/// No-op in release builds.
#[cfg(not(debug_assertions))]
pub fn assert_invariants(_state: &GameState) {}
