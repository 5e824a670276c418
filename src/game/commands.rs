//! Command API: validation and execution of player orders between ticks.
//!
//! Every command is checked in full before anything is written, so a
//! rejected command leaves the state untouched.

use std::f32::consts::TAU;
use std::fmt;
use std::str::FromStr;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::CommandError;
use crate::game::construction::MAX_QUEUE_LENGTH;
use crate::game::economy::population_cap;
use crate::game::pathfinding::{Mobility, approach_points};
use crate::game::territory::refresh_territory;
use crate::game::{
    Age, BuildingId, BuildingKind, Coord, GameState, Map, PlayerId, Position, TaskTarget, UnitId,
    UnitKind, UnitTask,
};

/// Distance between formation rings.
const FORMATION_SPACING: f32 = 0.8;

/// Units in the first formation ring; ring `k` holds `k` times as many.
const FORMATION_RING_SIZE: usize = 6;

/// Formation scale for units that find every approach tile already taken.
const CROWD_SPACING: f32 = 0.35;

/// A player order, as submitted by a UI or an external client.
///
/// Deserializes from tagged JSON such as
/// `{"command": "place_building", "building": "farm", "x": 4, "y": 7}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    /// Place a building with its top-left corner at `(x, y)`.
    PlaceBuilding {
        /// Kind to build.
        building: BuildingKind,
        /// Origin column.
        x: u16,
        /// Origin row.
        y: u16,
    },
    /// Queue a unit at the building covering `(x, y)`.
    QueueUnit {
        /// Kind to train.
        unit: UnitKind,
        /// Any column of the building's footprint.
        x: u16,
        /// Any row of the building's footprint.
        y: u16,
    },
    /// Order units to a tile.
    SendUnits {
        /// Unit ids, parsed leniently.
        unit_ids: Vec<String>,
        /// Target column.
        x: u16,
        /// Target row.
        y: u16,
        /// One of `move`, `attack`, `gather`, `build`, `patrol`, `garrison`.
        task: String,
    },
    /// Advance to the next age.
    AdvanceAge,
}

/// Result of [`GameState::execute`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandOutcome {
    /// Whether the command was applied.
    pub success: bool,
    /// What happened, or why nothing did.
    pub message: String,
}

impl CommandOutcome {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

impl From<CommandError> for CommandOutcome {
    fn from(err: CommandError) -> Self {
        Self {
            success: false,
            message: err.to_string(),
        }
    }
}

/// Order kinds accepted by [`GameState::send_units`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderTask {
    /// Walk to the tile.
    Move,
    /// Attack whatever stands there.
    Attack,
    /// Work the resource building at the tile.
    Gather,
    /// Help construct the building at the tile.
    Build,
    /// Walk back and forth between the current position and the tile.
    Patrol,
    /// Shelter in the building at the tile.
    Garrison,
}

impl OrderTask {
    /// Whether the order needs an owned building at the target tile.
    #[must_use]
    pub const fn needs_building(self) -> bool {
        matches!(self, OrderTask::Gather | OrderTask::Build | OrderTask::Garrison)
    }
}

impl FromStr for OrderTask {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "move" => Ok(OrderTask::Move),
            "attack" => Ok(OrderTask::Attack),
            "gather" => Ok(OrderTask::Gather),
            "build" => Ok(OrderTask::Build),
            "patrol" => Ok(OrderTask::Patrol),
            "garrison" => Ok(OrderTask::Garrison),
            _ => Err(CommandError::UnknownTask(s.to_string())),
        }
    }
}

impl fmt::Display for OrderTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OrderTask::Move => "move",
            OrderTask::Attack => "attack",
            OrderTask::Gather => "gather",
            OrderTask::Build => "build",
            OrderTask::Patrol => "patrol",
            OrderTask::Garrison => "garrison",
        };
        f.write_str(name)
    }
}

/// Offsets for `count` units: the first at the center, then rings of
/// `6k` units at radius `0.8k`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn formation_offsets(count: usize) -> Vec<(f32, f32)> {
    let mut offsets = Vec::with_capacity(count);
    if count == 0 {
        return offsets;
    }
    offsets.push((0.0, 0.0));
    let mut ring = 1usize;
    while offsets.len() < count {
        let slots = FORMATION_RING_SIZE * ring;
        let radius = FORMATION_SPACING * ring as f32;
        for slot in 0..slots.min(count - offsets.len()) {
            let angle = TAU * slot as f32 / slots as f32;
            offsets.push((radius * angle.cos(), radius * angle.sin()));
        }
        ring += 1;
    }
    offsets
}

/// Formation targets around the center of `tile`, shifted as a whole so
/// every target lies on the map.
fn formation_targets(map: &Map, tile: Coord, count: usize) -> Vec<Position> {
    let center = tile.center();
    let offsets = formation_offsets(count);
    let high_x = f32::from(map.width()) - 0.01;
    let high_y = f32::from(map.height()) - 0.01;
    let shift = |lo: f32, hi: f32, max: f32| {
        if lo < 0.0 {
            -lo
        } else if hi > max {
            max - hi
        } else {
            0.0
        }
    };
    let (min_x, max_x) = offsets.iter().fold((f32::MAX, f32::MIN), |(lo, hi), &(dx, _)| {
        (lo.min(center.x + dx), hi.max(center.x + dx))
    });
    let (min_y, max_y) = offsets.iter().fold((f32::MAX, f32::MIN), |(lo, hi), &(_, dy)| {
        (lo.min(center.y + dy), hi.max(center.y + dy))
    });
    let sx = shift(min_x, max_x, high_x);
    let sy = shift(min_y, max_y, high_y);
    offsets
        .into_iter()
        .map(|(dx, dy)| Position::new(center.x + dx + sx, center.y + dy + sy))
        .collect()
}

impl GameState {
    /// Run a command on behalf of `player`.
    pub fn execute(&mut self, player: PlayerId, command: Command) -> CommandOutcome {
        let result = match command {
            Command::PlaceBuilding { building, x, y } => self
                .place_building(player, building, x, y)
                .map(|id| format!("Placed {building} ({id}) at ({x}, {y})")),
            Command::QueueUnit { unit, x, y } => self
                .queue_unit(player, unit, x, y)
                .map(|queued| format!("Queued {unit} ({queued} in queue)")),
            Command::SendUnits {
                unit_ids,
                x,
                y,
                task,
            } => self
                .send_units(player, &unit_ids, x, y, &task)
                .map(|count| format!("Sent {count} unit(s) to {task} at ({x}, {y})")),
            Command::AdvanceAge => self
                .advance_age(player)
                .map(|age| format!("Advanced to the {age} age")),
        };
        match result {
            Ok(message) => CommandOutcome::ok(message),
            Err(err) => {
                debug!("player {player} command rejected: {err}");
                err.into()
            }
        }
    }

    /// Index of `player` if it may act.
    fn acting_player(&self, player: PlayerId) -> Result<usize, CommandError> {
        if self.game_over {
            return Err(CommandError::GameOver);
        }
        let index = self
            .players
            .iter()
            .position(|p| p.id == player)
            .ok_or(CommandError::UnknownPlayer(player))?;
        if self.players[index].defeated {
            return Err(CommandError::PlayerDefeated(player));
        }
        Ok(index)
    }

    /// Place a building with its origin at `(x, y)`.
    ///
    /// # Errors
    ///
    /// Returns the first failed placement rule.
    pub fn place_building(
        &mut self,
        player: PlayerId,
        kind: BuildingKind,
        x: u16,
        y: u16,
    ) -> Result<BuildingId, CommandError> {
        let index = self.acting_player(player)?;
        let origin = Coord::new(x, y);
        let stats = kind.stats();
        let owner = &self.players[index];

        if !self.map.footprint_fits(origin, kind) {
            return Err(CommandError::OutOfBounds { coord: origin });
        }
        if owner.age < stats.min_age {
            return Err(CommandError::AgeTooLow {
                required: stats.min_age,
                current: owner.age,
            });
        }
        if !owner.resources.covers(&stats.cost) {
            return Err(CommandError::InsufficientResources {
                missing: owner.resources.shortfall(&stats.cost),
            });
        }
        for coord in self.map.footprint(origin, kind) {
            if let Some(reason) = self.map.build_blocker(coord) {
                return Err(CommandError::TileBlocked { coord, reason });
            }
        }
        if !kind.defines_territory()
            && let Some(coord) = self
                .map
                .footprint(origin, kind)
                .find(|&c| self.map.get(c).and_then(|t| t.owner) != Some(player))
        {
            return Err(CommandError::OutsideTerritory { coord });
        }
        if let Some(deposit) = stats.deposit
            && !self.map.touches(origin, kind, deposit)
        {
            return Err(CommandError::MissingAdjacency { kind, deposit });
        }

        let id = self
            .map
            .place_building(origin, kind, player)
            .ok_or(CommandError::OutOfBounds { coord: origin })?;
        self.players[index].resources.subtract(&stats.cost);
        if kind.defines_territory() {
            refresh_territory(&mut self.map);
        }
        debug!("player {player} placed {kind} {id} at {origin}");
        Ok(id)
    }

    /// Queue `kind` at the building covering `(x, y)`. Returns the queue length.
    ///
    /// # Errors
    ///
    /// Returns the first failed production rule.
    pub fn queue_unit(
        &mut self,
        player: PlayerId,
        kind: UnitKind,
        x: u16,
        y: u16,
    ) -> Result<usize, CommandError> {
        let index = self.acting_player(player)?;
        let coord = Coord::new(x, y);
        let owner = &self.players[index];
        let (_, building) = self
            .map
            .building_at(coord)
            .filter(|(_, b)| b.owner == player)
            .ok_or(CommandError::NoBuildingAt { coord })?;
        if !building.is_complete() {
            return Err(CommandError::UnderConstruction {
                kind: building.kind,
            });
        }
        if !building.kind.stats().trains.contains(&kind) {
            return Err(CommandError::CannotTrain {
                building: building.kind,
                unit: kind,
            });
        }
        let stats = kind.stats();
        if owner.age < stats.min_age {
            return Err(CommandError::AgeTooLow {
                required: stats.min_age,
                current: owner.age,
            });
        }
        let used = owner.population + self.queued_units(player);
        if used >= owner.population_cap {
            return Err(CommandError::PopulationCapReached {
                used,
                cap: owner.population_cap,
            });
        }
        if !owner.resources.covers(&stats.cost) {
            return Err(CommandError::InsufficientResources {
                missing: owner.resources.shortfall(&stats.cost),
            });
        }
        if building.queue.len() >= MAX_QUEUE_LENGTH {
            return Err(CommandError::QueueFull {
                capacity: MAX_QUEUE_LENGTH,
            });
        }

        let id = building.id;
        self.players[index].resources.subtract(&stats.cost);
        let building = self
            .map
            .building_mut(id)
            .ok_or(CommandError::NoBuildingAt { coord })?;
        building.queue.push_back(kind);
        debug!("player {player} queued {kind} at {id}");
        Ok(building.queue.len())
    }

    /// Units waiting in `player`'s production queues.
    #[must_use]
    pub fn queued_units(&self, player: PlayerId) -> u32 {
        let queued: usize = self
            .map
            .buildings()
            .filter(|(_, b)| b.owner == player)
            .map(|(_, b)| b.queue.len())
            .sum();
        u32::try_from(queued).unwrap_or(u32::MAX)
    }

    /// Order the listed units to `(x, y)`. Returns how many units took the order.
    ///
    /// Ids that do not parse or do not name a live unit of `player` are skipped.
    ///
    /// # Errors
    ///
    /// Fails on an unknown task, an off-map tile, no usable unit, or a
    /// building order without an owned building at the tile.
    pub fn send_units(
        &mut self,
        player: PlayerId,
        unit_ids: &[String],
        x: u16,
        y: u16,
        task: &str,
    ) -> Result<usize, CommandError> {
        self.acting_player(player)?;
        let order: OrderTask = task.parse()?;
        let tile = Coord::new(x, y);
        if !self.map.in_bounds(tile) {
            return Err(CommandError::OutOfBounds { coord: tile });
        }

        let mut selected: Vec<usize> = Vec::new();
        for raw in unit_ids {
            let Ok(id) = raw.parse::<UnitId>() else {
                continue;
            };
            if let Some(i) = self
                .units
                .iter()
                .position(|u| u.id == id && u.owner == player && u.is_alive())
                && !selected.contains(&i)
            {
                selected.push(i);
            }
        }
        if selected.is_empty() {
            return Err(CommandError::NoValidUnits);
        }

        if order.needs_building() {
            self.order_to_building(player, &selected, tile, order)?;
        } else {
            let targets = formation_targets(&self.map, tile, selected.len());
            let enemy_building = self
                .map
                .building_at(tile)
                .filter(|(_, b)| b.owner != player)
                .map(|(_, b)| b.id);
            for (&i, &destination) in selected.iter().zip(&targets) {
                let unit = &mut self.units[i];
                unit.go_idle();
                match order {
                    OrderTask::Move => {
                        unit.task = UnitTask::Move;
                        unit.target = Some(TaskTarget::Position(destination));
                    }
                    OrderTask::Attack => {
                        unit.task = UnitTask::Attack;
                        unit.target = Some(enemy_building.map_or(
                            TaskTarget::Position(destination),
                            TaskTarget::Building,
                        ));
                    }
                    OrderTask::Patrol => {
                        unit.task = UnitTask::Patrol;
                        unit.patrol_origin = Some(unit.position);
                        unit.target = Some(TaskTarget::Position(destination));
                    }
                    OrderTask::Gather | OrderTask::Build | OrderTask::Garrison => {}
                }
                unit.walk_to(destination);
            }
        }
        debug!("player {player} sent {} unit(s) to {order} at {tile}", selected.len());
        Ok(selected.len())
    }

    /// Gather, build and garrison orders: every unit heads for its own
    /// approach point of the owned building at `tile`.
    ///
    /// Units claim the nearest free tile around the footprint in selection
    /// order. Once the ring is used up, the rest crowd around their nearest
    /// tile in a tight formation.
    fn order_to_building(
        &mut self,
        player: PlayerId,
        selected: &[usize],
        tile: Coord,
        order: OrderTask,
    ) -> Result<(), CommandError> {
        let (origin, building) = self
            .map
            .building_at(tile)
            .filter(|(_, b)| b.owner == player)
            .ok_or(CommandError::NoBuildingAt { coord: tile })?;
        let (id, kind) = (building.id, building.kind);
        let task = match order {
            OrderTask::Gather => {
                let resource = kind
                    .stats()
                    .produces
                    .ok_or(CommandError::NotAResourceBuilding { kind })?;
                UnitTask::Gather(resource)
            }
            OrderTask::Build if building.is_complete() => {
                return Err(CommandError::AlreadyConstructed { kind });
            }
            OrderTask::Build => UnitTask::Build,
            _ => UnitTask::Garrison,
        };
        let crowd = formation_offsets(selected.len());
        let mut claimed: Vec<Position> = Vec::with_capacity(selected.len());
        for &i in selected {
            let from = self.units[i].position;
            let mobility = Mobility::of(self.units[i].kind);
            let spots = approach_points(&self.map, origin, kind, from, mobility);
            let free = spots
                .iter()
                .copied()
                .find(|spot| !claimed.iter().any(|c| c.distance(*spot) < 0.01));
            let destination = free.unwrap_or_else(|| {
                let base = spots
                    .first()
                    .copied()
                    .unwrap_or_else(|| Map::footprint_center(origin, kind));
                let (dx, dy) = crowd.get(claimed.len()).copied().unwrap_or_default();
                Position::new(base.x + dx * CROWD_SPACING, base.y + dy * CROWD_SPACING)
                    .clamp_to(self.map.width(), self.map.height())
            });
            claimed.push(destination);
            let unit = &mut self.units[i];
            unit.go_idle();
            unit.task = task;
            unit.target = Some(TaskTarget::Building(id));
            unit.walk_to(destination);
        }
        Ok(())
    }

    /// Pay the age cost and move `player` into the next age.
    ///
    /// # Errors
    ///
    /// Fails in the final age or when the player cannot pay.
    pub fn advance_age(&mut self, player: PlayerId) -> Result<Age, CommandError> {
        let index = self.acting_player(player)?;
        let owner = &self.players[index];
        let (Some(next), Some(cost)) = (owner.age.next(), owner.age.advance_cost()) else {
            return Err(CommandError::FinalAge);
        };
        if !owner.resources.covers(&cost) {
            return Err(CommandError::InsufficientResources {
                missing: owner.resources.shortfall(&cost),
            });
        }
        let owner = &mut self.players[index];
        owner.resources.subtract(&cost);
        owner.age = next;
        owner.population_cap = population_cap(&self.map, owner);
        info!("player {player} ({}) entered the {next} age", owner.name);
        Ok(next)
    }
}
