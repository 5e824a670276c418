//! Game layer for Isosim.
//!
//! Implements the simulation rules:
//! - Map with terrain, deposits, buildings and territory
//! - Static building/unit/age catalog
//! - Players with resources, storage caps and population
//! - Per-tick pipeline: territory, economy, construction, unit behaviour, victory
//! - Command API for external actors

mod behavior;
mod catalog;
mod combat;
mod commands;
mod construction;
mod economy;
mod invariants;
mod map;
mod pathfinding;
mod player;
mod rng;
mod state;
mod territory;
mod unit;
mod victory;

pub use behavior::{
    AGGRO_RADIUS, ATTRITION_DAMAGE, ATTRITION_INTERVAL, AUTO_WORK_RADIUS, FLEE_DETECTION_RADIUS,
    FLEE_DISTANCE, FLEE_REACTION_DELAY, IDLE_THRESHOLD_BASE, IDLE_THRESHOLD_JITTER,
};
pub use catalog::{
    Age, BuildingCategory, BuildingKind, BuildingStats, CombatClass, Deposit, Resource, Resources,
    UnitKind, UnitStats,
};
pub use combat::{
    MELEE_VS_BUILDING, RANGED_VS_BUILDING, SIEGE_VS_BUILDING, building_damage,
    building_damage_multiplier, building_in_range, can_engage, distance_to_footprint,
};
pub use commands::{Command, CommandOutcome, OrderTask, formation_offsets};
pub use construction::{
    BASE_CONSTRUCTION_SPEED, BUILDER_BONUS, MAX_QUEUE_LENGTH, PRODUCTION_INCREMENT,
};
pub use economy::{
    BASE_GATHER_RATE, FISHING_SPOT_BONUS, FISHING_SPOT_RADIUS, MIN_POPULATION_CAP, WorkerCensus,
    compute_rates, gather_rate, population_cap,
};
pub use invariants::{InvariantViolation, assert_invariants, check_invariants};
pub use map::{Building, BuildingId, Coord, Map, Position, Terrain, Tile};
pub use pathfinding::{
    ARRIVAL_THRESHOLD, BASE_STEP, LINE_SAMPLE_STEP, Mobility, PathStep, SEARCH_ITERATION_LIMIT,
    approach_point, approach_points, is_passable, next_step, step_toward,
};
pub use player::{DEFAULT_STORAGE_CAP, Player, PlayerId, PlayerKind, STARTING_RESOURCES};
pub use rng::Rng;
pub use state::{DEFAULT_SEED, GameState, TickReport};
pub use territory::{
    CityCenterRecord, SpatialIndex, TERRITORY_RADIUS, refresh_territory, resolve_owner,
};
pub use unit::{TaskTarget, Unit, UnitId, UnitTask};
pub use victory::GameOutcome;
