// Unwrap and long literals are fine in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::unreadable_literal))]
//! Isosim: the deterministic tick-based simulation core of an isometric RTS.
//!
//! One call to [`advance`] moves the world one discrete step. External actors
//! (the UI, a scripted opponent, an LLM tool-calling client) mutate the world
//! only through the validating command API on [`GameState`] between ticks, and
//! read it only through the player-scoped [`export::PlayerView`].
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │   Skirmish runner / CLI / clients   │
//! ├──────────────────┬──────────────────┤
//! │  Command API     │  Player export   │
//! ├──────────────────┴──────────────────┤
//! │  Tick pipeline: territory → economy │
//! │  → construction → units → victory   │
//! └─────────────────────────────────────┘
//! ```

pub mod error;
pub mod export;
pub mod game;
pub mod skirmish;

pub use error::CommandError;

// Re-export key game types at crate root for convenience
pub use game::{
    Age, Building, BuildingId, BuildingKind, Command, CommandOutcome, Coord, GameState, Map,
    Player, PlayerId, Position, Resource, Resources, Terrain, Tile, Unit, UnitId, UnitKind,
    UnitTask,
};

/// Advance a world by one tick.
///
/// This is the functional face of [`GameState::step`]: the state is consumed
/// and the next state returned. A state whose game is already over is returned
/// unchanged.
#[must_use]
pub fn advance(mut state: GameState) -> GameState {
    state.step();
    state
}
