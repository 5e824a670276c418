//! Units and their tasks.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::game::{Age, BuildingId, PlayerId, Position, Resource, UnitKind, UnitStats};

/// Unique unit identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(pub u32);

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unit-{}", self.0)
    }
}

impl FromStr for UnitId {
    type Err = String;

    /// Parses `12`, `unit-12`, `unit_12`, `unit12` and `#12`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let lower = trimmed.to_ascii_lowercase();
        let digits = lower
            .strip_prefix("unit")
            .map(|rest| rest.trim_start_matches(['-', '_', ' ']))
            .or_else(|| lower.strip_prefix('#'))
            .unwrap_or(&lower);
        digits
            .parse::<u32>()
            .map(UnitId)
            .map_err(|_| format!("invalid unit id '{trimmed}'"))
    }
}

/// What a unit is doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitTask {
    /// Nothing.
    #[default]
    Idle,
    /// Walking to a point.
    Move,
    /// Working at a resource building.
    Gather(Resource),
    /// Constructing a building.
    Build,
    /// Fighting.
    Attack,
    /// Running from soldiers.
    Flee,
    /// Sheltering in a building.
    Garrison,
    /// Walking back and forth between two points.
    Patrol,
}

impl fmt::Display for UnitTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitTask::Idle => write!(f, "idle"),
            UnitTask::Move => write!(f, "move"),
            UnitTask::Gather(resource) => write!(f, "gather-{resource}"),
            UnitTask::Build => write!(f, "build"),
            UnitTask::Attack => write!(f, "attack"),
            UnitTask::Flee => write!(f, "flee"),
            UnitTask::Garrison => write!(f, "garrison"),
            UnitTask::Patrol => write!(f, "patrol"),
        }
    }
}

/// What a task points at.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskTarget {
    /// A point on the map.
    Position(Position),
    /// Another unit.
    Unit(UnitId),
    /// A building.
    Building(BuildingId),
}

/// A unit instance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Unit {
    /// Identifier.
    pub id: UnitId,
    /// Owner.
    pub owner: PlayerId,
    /// Kind.
    pub kind: UnitKind,
    /// Continuous position in tile units.
    pub position: Position,
    /// Current health.
    pub health: f32,
    /// Maximum health, scaled by the creation age.
    pub max_health: f32,
    /// Damage per hit, scaled by the creation age.
    pub attack: f32,
    /// Current task.
    pub task: UnitTask,
    /// Task target.
    pub target: Option<TaskTarget>,
    /// Where the unit is walking.
    pub move_target: Option<Position>,
    /// Whether the unit is walking.
    pub moving: bool,
    /// Ticks until the next attack.
    pub attack_cooldown: u32,
    /// Tick at which the unit became idle and stationary.
    pub idle_since: Option<u64>,
    /// Idle ticks before looking for work.
    pub idle_threshold: u64,
    /// Tick at which enemy soldiers were first spotted nearby.
    pub spotted_since: Option<u64>,
    /// The other patrol endpoint.
    pub patrol_origin: Option<Position>,
    /// Owner's age when the unit was created.
    pub created_age: Age,
}

impl Unit {
    /// Create an idle unit, scaling military stats by `age`.
    #[must_use]
    pub fn new(
        id: UnitId,
        kind: UnitKind,
        owner: PlayerId,
        position: Position,
        age: Age,
        idle_threshold: u64,
    ) -> Self {
        let stats = kind.stats();
        let scale = if kind.is_military() {
            age.military_scale()
        } else {
            1.0
        };
        let max_health = stats.max_health * scale;
        Self {
            id,
            owner,
            kind,
            position,
            health: max_health,
            max_health,
            attack: stats.attack * scale,
            task: UnitTask::Idle,
            target: None,
            move_target: None,
            moving: false,
            attack_cooldown: 0,
            idle_since: None,
            idle_threshold,
            spotted_since: None,
            patrol_origin: None,
            created_age: age,
        }
    }

    /// Static stats of the unit's kind.
    #[must_use]
    pub fn stats(&self) -> UnitStats {
        self.kind.stats()
    }

    /// Whether the unit still has health.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.health > 0.0
    }

    /// Whether the unit is a soldier.
    #[must_use]
    pub fn is_military(&self) -> bool {
        self.kind.is_military()
    }

    /// Start walking toward `destination`.
    pub fn walk_to(&mut self, destination: Position) {
        self.move_target = Some(destination);
        self.moving = true;
        self.idle_since = None;
    }

    /// Stop walking.
    pub fn halt(&mut self) {
        self.move_target = None;
        self.moving = false;
    }

    /// Drop the task and stand still.
    pub fn go_idle(&mut self) {
        self.halt();
        self.task = UnitTask::Idle;
        self.target = None;
        self.patrol_origin = None;
    }

    /// Take `amount` damage, flooring health at zero.
    pub fn take_damage(&mut self, amount: f32) {
        self.health = (self.health - amount).max(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_id_lenient_parse() {
        for text in ["12", "unit-12", "#12", "unit_12", "Unit12", " unit-12 "] {
            assert_eq!(text.parse::<UnitId>(), Ok(UnitId(12)), "{text}");
        }
        assert!("twelve".parse::<UnitId>().is_err());
        assert!("unit-".parse::<UnitId>().is_err());
    }

    #[test]
    fn test_military_stats_scale_with_age() {
        let base = Unit::new(UnitId(1), UnitKind::Infantry, 1, Position::default(), Age::Classical, 30);
        let late = Unit::new(UnitId(2), UnitKind::Infantry, 1, Position::default(), Age::Industrial, 30);
        assert!((late.max_health - base.max_health * 1.3).abs() < 1e-3);
        assert!((late.attack - base.attack * 1.3).abs() < 1e-3);
    }

    #[test]
    fn test_civilians_do_not_scale() {
        let base = Unit::new(UnitId(1), UnitKind::Citizen, 1, Position::default(), Age::Classical, 30);
        let late = Unit::new(UnitId(2), UnitKind::Citizen, 1, Position::default(), Age::Modern, 30);
        assert!((late.max_health - base.max_health).abs() < f32::EPSILON);
    }

    #[test]
    fn test_take_damage_floors_at_zero() {
        let mut unit = Unit::new(UnitId(1), UnitKind::Citizen, 1, Position::default(), Age::Classical, 30);
        unit.take_damage(1000.0);
        assert!(unit.health.abs() < f32::EPSILON);
        assert!(!unit.is_alive());
    }

    #[test]
    fn test_task_display() {
        assert_eq!(UnitTask::Gather(Resource::Food).to_string(), "gather-food");
        assert_eq!(UnitTask::Patrol.to_string(), "patrol");
    }
}
