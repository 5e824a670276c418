//! Skirmish runner for Isosim games.
//!
//! Provides a pure function interface: `(seed, config) -> SkirmishResult`
//!
//! The runner handles:
//! - Layout loading (built-in or from a file)
//! - Scripted opponents deciding every few ticks through the command API
//! - Stepping the world until one player is left or the tick limit is hit
//! - Per-player statistics

mod layout;
mod opponent;

pub use layout::{DEFAULT_LAYOUT, LayoutError, STARTING_CITIZENS, parse_layout};
pub use opponent::{
    ADVANCE_THRESHOLD, ATTACK_GROUP, MAX_PLACEMENT_ATTEMPTS, MILITARY_THRESHOLD,
    ScriptedOpponent, TARGET_BOATS, TARGET_CITIZENS,
};

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::export::PlayerView;
use crate::game::{Age, GameState, PlayerId, assert_invariants};

/// Tick limit when none is configured.
pub const DEFAULT_MAX_TICKS: u64 = 6000;

/// Ticks between two decisions of a scripted opponent.
pub const DEFAULT_DECISION_INTERVAL: u64 = 10;

/// Run-level configuration.
///
/// Loads from JSON; every field is optional:
///
/// ```json
/// { "max_ticks": 4000, "decision_interval": 5, "layout": "maps/duel.txt" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SkirmishConfig {
    /// Maximum ticks before the game is abandoned.
    pub max_ticks: u64,
    /// Ticks between opponent decisions.
    pub decision_interval: u64,
    /// Layout file; the built-in map when absent.
    pub layout: Option<PathBuf>,
}

impl Default for SkirmishConfig {
    fn default() -> Self {
        Self {
            max_ticks: DEFAULT_MAX_TICKS,
            decision_interval: DEFAULT_DECISION_INTERVAL,
            layout: None,
        }
    }
}

impl SkirmishConfig {
    /// Read a configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid JSON, or
    /// holds out-of-range values.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let config: Self =
            serde_json::from_str(&text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the values make a playable game.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_ticks == 0 {
            return Err(ConfigError::Invalid("max_ticks must be at least 1".into()));
        }
        if self.decision_interval == 0 {
            return Err(ConfigError::Invalid(
                "decision_interval must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Build the starting state for `seed`.
    ///
    /// # Errors
    ///
    /// Returns an error if the layout file cannot be read or parsed.
    pub fn initial_state(&self, seed: u64) -> Result<GameState, ConfigError> {
        let text = match &self.layout {
            Some(path) => std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
                path: path.clone(),
                message: e.to_string(),
            })?,
            None => DEFAULT_LAYOUT.to_string(),
        };
        Ok(parse_layout(&text, seed)?)
    }
}

/// Error type for configuration and layout loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A file could not be read.
    Io {
        /// The file.
        path: PathBuf,
        /// The OS error.
        message: String,
    },
    /// The configuration is not valid JSON for [`SkirmishConfig`].
    Parse(String),
    /// A value is out of range.
    Invalid(String),
    /// The layout is malformed.
    Layout(LayoutError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, message } => write!(f, "Cannot read {}: {message}", path.display()),
            Self::Parse(msg) | Self::Invalid(msg) => write!(f, "Invalid configuration: {msg}"),
            Self::Layout(e) => write!(f, "Invalid layout: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Layout(e) => Some(e),
            _ => None,
        }
    }
}

impl From<LayoutError> for ConfigError {
    fn from(e: LayoutError) -> Self {
        Self::Layout(e)
    }
}

/// Statistics for a single player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerSummary {
    /// Player identifier.
    pub id: PlayerId,
    /// Display name.
    pub name: String,
    /// Age reached.
    pub age: Age,
    /// Lost every building.
    pub defeated: bool,
    /// Won the game.
    pub victorious: bool,
    /// Live units at the end.
    pub population: u32,
    /// Buildings standing at the end.
    pub buildings: usize,
    /// Commands the game accepted.
    pub commands_accepted: u32,
    /// Commands the game rejected.
    pub commands_rejected: u32,
    /// Units trained.
    pub units_trained: u32,
    /// Units killed.
    pub units_lost: u32,
    /// Buildings destroyed.
    pub buildings_lost: u32,
    /// Tick the player was defeated (None if it survived).
    pub defeated_at: Option<u64>,
}

impl PlayerSummary {
    fn new(id: PlayerId, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            age: Age::default(),
            defeated: false,
            victorious: false,
            population: 0,
            buildings: 0,
            commands_accepted: 0,
            commands_rejected: 0,
            units_trained: 0,
            units_lost: 0,
            buildings_lost: 0,
            defeated_at: None,
        }
    }
}

/// Final result of a skirmish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkirmishResult {
    /// The seed used for this game.
    pub seed: u64,
    /// The winning player (None on a draw or when the tick limit is hit).
    pub winner: Option<PlayerId>,
    /// Ticks simulated.
    pub ticks: u64,
    /// Whether the game reached an outcome before the tick limit.
    pub finished: bool,
    /// Per-player statistics, in player order.
    pub players: Vec<PlayerSummary>,
}

/// Play a full skirmish between scripted opponents.
///
/// Deterministic: the same seed and configuration always produce the same
/// result.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the layout cannot be
/// loaded.
pub fn run_skirmish(seed: u64, config: &SkirmishConfig) -> Result<SkirmishResult, ConfigError> {
    config.validate()?;
    let state = config.initial_state(seed)?;
    Ok(play_skirmish(state, config, seed))
}

/// Play `state` to the end with every active player scripted.
#[must_use]
pub fn play_skirmish(state: GameState, config: &SkirmishConfig, seed: u64) -> SkirmishResult {
    let mut skirmish = Skirmish::new(state, config, seed);
    info!(
        "skirmish seed {seed}: {} players, up to {} ticks",
        skirmish.state.players.len(),
        config.max_ticks
    );
    while !skirmish.state.game_over && skirmish.state.tick() < config.max_ticks {
        skirmish.advance();
    }
    let result = skirmish.finish();
    info!(
        "skirmish seed {seed} ended after {} ticks, winner {:?}",
        result.ticks, result.winner
    );
    result
}

/// A game in progress with every player scripted.
#[derive(Debug)]
pub struct Skirmish {
    state: GameState,
    opponents: Vec<ScriptedOpponent>,
    tally: HashMap<PlayerId, PlayerSummary>,
    interval: u64,
    seed: u64,
}

impl Skirmish {
    /// Seat one scripted opponent per player of `state`.
    #[must_use]
    pub fn new(state: GameState, config: &SkirmishConfig, seed: u64) -> Self {
        let opponents = state
            .players
            .iter()
            .map(|p| ScriptedOpponent::new(p.id, seed))
            .collect();
        let tally = state
            .players
            .iter()
            .map(|p| (p.id, PlayerSummary::new(p.id, &p.name)))
            .collect();
        Self {
            state,
            opponents,
            tally,
            interval: config.decision_interval.max(1),
            seed,
        }
    }

    /// The current world.
    #[must_use]
    pub const fn state(&self) -> &GameState {
        &self.state
    }

    /// Let the opponents act if a decision is due, then step one tick.
    pub fn advance(&mut self) {
        let Self {
            state,
            opponents,
            tally,
            interval,
            ..
        } = self;
        if state.tick() % *interval == 0 {
            for opponent in opponents.iter_mut() {
                let player = opponent.player();
                if state.player(player).is_none_or(|p| p.defeated) {
                    continue;
                }
                let Some(view) = PlayerView::capture(state, player) else {
                    continue;
                };
                opponent.take_turn(&view, |command| {
                    let outcome = state.execute(player, command);
                    if let Some(entry) = tally.get_mut(&player) {
                        if outcome.success {
                            entry.commands_accepted += 1;
                        } else {
                            entry.commands_rejected += 1;
                        }
                    }
                    outcome
                });
            }
        }

        let report = state.step();
        for (_, owner) in &report.spawned {
            if let Some(entry) = tally.get_mut(owner) {
                entry.units_trained += 1;
            }
        }
        for (_, owner) in &report.killed {
            if let Some(entry) = tally.get_mut(owner) {
                entry.units_lost += 1;
            }
        }
        for (_, owner) in &report.demolished {
            if let Some(entry) = tally.get_mut(owner) {
                entry.buildings_lost += 1;
            }
        }
        for id in &report.defeated {
            debug!("player {id} defeated at tick {}", report.tick);
            if let Some(entry) = tally.get_mut(id) {
                entry.defeated_at = Some(report.tick);
            }
        }
        assert_invariants(state);
    }

    /// Stop and summarize.
    #[must_use]
    pub fn finish(mut self) -> SkirmishResult {
        let state = &self.state;
        let players = state
            .players
            .iter()
            .filter_map(|p| {
                let mut summary = self.tally.remove(&p.id)?;
                summary.age = p.age;
                summary.defeated = p.defeated;
                summary.victorious = p.victorious;
                summary.population = p.population;
                summary.buildings = state.map.buildings().filter(|(_, b)| b.owner == p.id).count();
                Some(summary)
            })
            .collect();
        SkirmishResult {
            seed: self.seed,
            winner: state.winner,
            ticks: state.tick(),
            finished: state.game_over,
            players,
        }
    }
}
