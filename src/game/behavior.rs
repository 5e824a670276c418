//! Unit behaviour engine.
//!
//! Every live unit runs the same rules once per tick, in unit-list order:
//!
//! 1. Idle auto-work (citizens and fishing boats)
//! 2. Auto-aggro (soldiers that are idle, moving or patrolling)
//! 3. Civilian flee
//! 4. Movement integration
//! 5. Combat
//! 6. Attrition in foreign territory
//!
//! Later rules see what earlier rules wrote. Units that die stay in the list
//! (ignored by every scan) until the state removes them at the end of the tick.
//!
//! # Attack precedence
//!
//! A unit target is kept until it dies or disappears. A coordinate order
//! re-scans every tick and switches to the best enemy unit within
//! [`AGGRO_RADIUS`] (soldiers before civilians, then distance); failing that,
//! an enemy building or unit on the ordered tile. Auto-aggro never overrides
//! an attack order.

// Positions are f32; unit ids feed the ring angle
#![allow(clippy::cast_precision_loss)]

use std::collections::HashMap;

use log::debug;

use crate::game::combat::{building_damage, building_in_range, can_engage};
use crate::game::pathfinding::{
    ARRIVAL_THRESHOLD, BASE_STEP, Mobility, PathStep, approach_point, is_passable, next_step,
    step_toward,
};
use crate::game::{
    BuildingId, BuildingKind, Coord, Map, PlayerId, Position, Resource, Rng, TaskTarget, Unit,
    UnitId, UnitKind, UnitTask, WorkerCensus,
};

/// Radius within which soldiers pick fights on their own.
pub const AGGRO_RADIUS: f32 = 6.0;

/// Radius within which civilians notice enemy soldiers.
pub const FLEE_DETECTION_RADIUS: f32 = 5.0;

/// Ticks between spotting a threat and running.
pub const FLEE_REACTION_DELAY: u64 = 5;

/// Distance covered by one flight.
pub const FLEE_DISTANCE: f32 = 4.0;

/// Radius within which idle workers look for a job.
pub const AUTO_WORK_RADIUS: f32 = 15.0;

/// Ticks between attrition hits.
pub const ATTRITION_INTERVAL: u64 = 20;

/// Damage per attrition hit.
pub const ATTRITION_DAMAGE: f32 = 2.0;

/// Idle ticks before auto-work, before jitter.
pub const IDLE_THRESHOLD_BASE: u64 = 30;

/// Upper bound (exclusive) of the per-unit idle threshold jitter.
pub const IDLE_THRESHOLD_JITTER: u32 = 30;

/// Half-width of the random spread applied to workers on arrival.
const SETTLE_JITTER: f32 = 0.3;

/// Radius of the ring soldiers spread on when they arrive.
const RING_RADIUS: f32 = 0.35;

/// A coordinate attack counts as done within this distance of its point.
const SETTLED_RADIUS: f32 = RING_RADIUS + 2.0 * ARRIVAL_THRESHOLD;

/// Golden angle in radians.
const GOLDEN_ANGLE: f32 = 2.399_963;

/// Idle threshold for a new unit.
pub(crate) fn roll_idle_threshold(rng: &mut Rng) -> u64 {
    IDLE_THRESHOLD_BASE + u64::from(rng.next_u32(IDLE_THRESHOLD_JITTER))
}

/// A building destroyed during the tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Demolition {
    pub(crate) id: BuildingId,
    pub(crate) owner: PlayerId,
}

/// Mutable view of the world the unit rules operate on.
#[derive(Debug)]
pub(crate) struct World<'a> {
    map: &'a mut Map,
    units: &'a mut [Unit],
    census: &'a mut WorkerCensus,
    rng: &'a mut Rng,
    tick: u64,
    index: HashMap<UnitId, usize>,
    demolished: Vec<Demolition>,
}

impl<'a> World<'a> {
    pub(crate) fn new(
        map: &'a mut Map,
        units: &'a mut [Unit],
        census: &'a mut WorkerCensus,
        rng: &'a mut Rng,
        tick: u64,
    ) -> Self {
        let index = units.iter().enumerate().map(|(i, u)| (u.id, i)).collect();
        Self {
            map,
            units,
            census,
            rng,
            tick,
            index,
            demolished: Vec::new(),
        }
    }

    /// Run every rule for every live unit. Returns the buildings destroyed.
    pub(crate) fn run(mut self) -> Vec<Demolition> {
        for i in 0..self.units.len() {
            if !self.units[i].is_alive() {
                continue;
            }
            self.drop_stale_target(i);
            self.idle_auto_work(i);
            self.auto_aggro(i);
            self.flee(i);
            self.integrate_movement(i);
            self.resolve_combat(i);
            self.attrition(i);
        }
        self.demolished
    }

    /// Targets pointing at a vanished building, or a builder whose building
    /// is finished, fall back to idle.
    fn drop_stale_target(&mut self, i: usize) {
        let unit = &self.units[i];
        let Some(TaskTarget::Building(id)) = unit.target else {
            return;
        };
        let stale = match self.map.building(id) {
            None => true,
            Some(building) => unit.task == UnitTask::Build && building.is_complete(),
        };
        if stale {
            self.units[i].go_idle();
        }
    }

    fn idle_auto_work(&mut self, i: usize) {
        let tick = self.tick;
        let unit = &mut self.units[i];
        if !unit.kind.is_worker() {
            return;
        }
        if unit.task != UnitTask::Idle || unit.moving {
            unit.idle_since = None;
            return;
        }
        let since = *unit.idle_since.get_or_insert(tick);
        if tick.saturating_sub(since) < unit.idle_threshold {
            return;
        }

        let Some((id, origin, kind, resource)) = self.find_work(i) else {
            self.units[i].idle_since = Some(tick);
            return;
        };
        let unit = &self.units[i];
        let destination = approach_point(
            self.map,
            origin,
            kind,
            unit.position,
            Mobility::of(unit.kind),
        );
        let unit = &mut self.units[i];
        unit.task = UnitTask::Gather(resource);
        unit.target = Some(TaskTarget::Building(id));
        unit.walk_to(destination);
        self.census.add_assigned(id);
    }

    /// Nearest owned, complete resource building with a free slot: fewest
    /// assigned workers first, then distance.
    fn find_work(&self, i: usize) -> Option<(BuildingId, Coord, BuildingKind, Resource)> {
        let unit = &self.units[i];
        let mut best: Option<((u32, f32), (BuildingId, Coord, BuildingKind, Resource))> = None;
        for (origin, building) in self.map.buildings() {
            if building.owner != unit.owner || !building.is_complete() {
                continue;
            }
            let stats = building.kind.stats();
            let Some(resource) = stats.produces else {
                continue;
            };
            let is_dock = building.kind == BuildingKind::Dock;
            if is_dock != (unit.kind == UnitKind::FishingBoat) {
                continue;
            }
            let distance = unit
                .position
                .distance(Map::footprint_center(origin, building.kind));
            if distance > AUTO_WORK_RADIUS {
                continue;
            }
            let assigned = self.census.assigned(building.id);
            if assigned >= stats.worker_capacity {
                continue;
            }
            let key = (assigned, distance);
            if best.is_none_or(|(best_key, _)| key < best_key) {
                best = Some((key, (building.id, origin, building.kind, resource)));
            }
        }
        best.map(|(_, found)| found)
    }

    /// Best enemy unit `i` can fight within `radius`: soldiers before
    /// civilians, then distance, then list order.
    fn nearest_enemy(&self, i: usize, radius: f32) -> Option<usize> {
        let me = &self.units[i];
        let mut best: Option<((bool, f32), usize)> = None;
        for (j, other) in self.units.iter().enumerate() {
            if j == i
                || !other.is_alive()
                || other.owner == me.owner
                || !can_engage(me.kind, other.kind)
            {
                continue;
            }
            let distance = me.position.distance(other.position);
            if distance > radius {
                continue;
            }
            let key = (!other.is_military(), distance);
            if best.is_none_or(|(best_key, _)| key < best_key) {
                best = Some((key, j));
            }
        }
        best.map(|(_, j)| j)
    }

    fn auto_aggro(&mut self, i: usize) {
        let unit = &self.units[i];
        if !unit.is_military()
            || !matches!(unit.task, UnitTask::Idle | UnitTask::Move | UnitTask::Patrol)
        {
            return;
        }
        let Some(j) = self.nearest_enemy(i, AGGRO_RADIUS) else {
            return;
        };
        let target = self.units[j].id;
        let unit = &mut self.units[i];
        unit.task = UnitTask::Attack;
        unit.target = Some(TaskTarget::Unit(target));
        unit.patrol_origin = None;
        unit.halt();
    }

    fn flee(&mut self, i: usize) {
        let unit = &self.units[i];
        if unit.is_military() || unit.task == UnitTask::Garrison {
            return;
        }
        let (position, owner) = (unit.position, unit.owner);

        let mut sum = Position::default();
        let mut count = 0u32;
        for other in self.units.iter() {
            if other.is_alive()
                && other.owner != owner
                && other.is_military()
                && position.distance(other.position) <= FLEE_DETECTION_RADIUS
            {
                sum.x += other.position.x;
                sum.y += other.position.y;
                count += 1;
            }
        }

        let tick = self.tick;
        let (width, height) = (self.map.width(), self.map.height());
        let unit = &mut self.units[i];
        if count == 0 {
            unit.spotted_since = None;
            if unit.task == UnitTask::Flee {
                unit.go_idle();
            }
            return;
        }
        let since = *unit.spotted_since.get_or_insert(tick);
        if tick.saturating_sub(since) < FLEE_REACTION_DELAY {
            return;
        }
        if unit.task == UnitTask::Flee && unit.moving {
            return;
        }

        let n = count as f32;
        let dx = position.x - sum.x / n;
        let dy = position.y - sum.y / n;
        let length = dx.hypot(dy);
        let (ux, uy) = if length > f32::EPSILON {
            (dx / length, dy / length)
        } else {
            (1.0, 0.0)
        };
        let destination = Position::new(
            position.x + ux * FLEE_DISTANCE,
            position.y + uy * FLEE_DISTANCE,
        )
        .clamp_to(width, height);
        unit.task = UnitTask::Flee;
        unit.target = None;
        unit.patrol_origin = None;
        unit.walk_to(destination);
    }

    fn integrate_movement(&mut self, i: usize) {
        let unit = &self.units[i];
        if !unit.moving {
            return;
        }
        let Some(goal) = unit.move_target else {
            self.units[i].halt();
            return;
        };
        let step = next_step(self.map, unit.position, goal, Mobility::of(unit.kind));
        match step {
            PathStep::Toward(waypoint) => {
                let distance = unit.stats().speed * BASE_STEP;
                let next = step_toward(unit.position, waypoint, distance)
                    .clamp_to(self.map.width(), self.map.height());
                self.units[i].position = next;
            }
            PathStep::Arrived => self.settle(i, goal),
            PathStep::Blocked => {
                let unit = &mut self.units[i];
                unit.halt();
                if !matches!(unit.task, UnitTask::Idle | UnitTask::Flee) {
                    debug!("{} {} blocked, dropping {}", unit.kind, unit.id, unit.task);
                    unit.go_idle();
                }
            }
        }
    }

    /// Arrival handling per task.
    fn settle(&mut self, i: usize, goal: Position) {
        match self.units[i].task {
            UnitTask::Gather(_) | UnitTask::Build | UnitTask::Garrison => {
                let dx = self.rng.range_f32(-SETTLE_JITTER, SETTLE_JITTER);
                let dy = self.rng.range_f32(-SETTLE_JITTER, SETTLE_JITTER);
                self.nudge(i, dx, dy);
                self.units[i].halt();
            }
            UnitTask::Patrol => {
                let unit = &mut self.units[i];
                match unit.patrol_origin {
                    Some(other_end) => {
                        unit.patrol_origin = Some(goal);
                        unit.target = Some(TaskTarget::Position(other_end));
                        unit.walk_to(other_end);
                    }
                    None => unit.go_idle(),
                }
            }
            UnitTask::Move => {
                self.spread_on_ring(i);
                self.units[i].go_idle();
            }
            UnitTask::Attack => {
                if matches!(self.units[i].target, Some(TaskTarget::Position(_))) {
                    self.spread_on_ring(i);
                }
                self.units[i].halt();
            }
            UnitTask::Flee | UnitTask::Idle => self.units[i].halt(),
        }
    }

    /// Place an arriving soldier on a ring around its goal, spread by unit id.
    fn spread_on_ring(&mut self, i: usize) {
        if self.units[i].is_military() {
            let angle = self.units[i].id.0 as f32 * GOLDEN_ANGLE;
            self.nudge(i, angle.cos() * RING_RADIUS, angle.sin() * RING_RADIUS);
        }
    }

    /// Shift a unit by `(dx, dy)` if it lands on a tile it may stand on.
    fn nudge(&mut self, i: usize, dx: f32, dy: f32) {
        let unit = &self.units[i];
        let candidate = Position::new(unit.position.x + dx, unit.position.y + dy)
            .clamp_to(self.map.width(), self.map.height());
        if is_passable(self.map, candidate.tile(), Mobility::of(unit.kind)) {
            self.units[i].position = candidate;
        }
    }

    fn resolve_combat(&mut self, i: usize) {
        let unit = &mut self.units[i];
        unit.attack_cooldown = unit.attack_cooldown.saturating_sub(1);
        if unit.task != UnitTask::Attack {
            return;
        }
        if unit.attack <= 0.0 {
            unit.go_idle();
            return;
        }
        if let Some(TaskTarget::Position(point)) = unit.target {
            self.retarget_coordinate(i, point);
        }
        match self.units[i].target {
            Some(TaskTarget::Unit(id)) => self.engage_unit(i, id),
            Some(TaskTarget::Building(id)) => self.engage_building(i, id),
            Some(TaskTarget::Position(point)) => {
                let unit = &mut self.units[i];
                if !unit.moving {
                    if unit.position.distance(point) < SETTLED_RADIUS {
                        unit.go_idle();
                    } else {
                        unit.walk_to(point);
                    }
                }
            }
            None => self.units[i].go_idle(),
        }
    }

    /// Turn a coordinate order into a concrete target when one is available.
    fn retarget_coordinate(&mut self, i: usize, point: Position) {
        if let Some(j) = self.nearest_enemy(i, AGGRO_RADIUS) {
            self.units[i].target = Some(TaskTarget::Unit(self.units[j].id));
            return;
        }
        let tile = point.tile();
        let owner = self.units[i].owner;
        if let Some((_, building)) = self.map.building_at(tile)
            && building.owner != owner
        {
            self.units[i].target = Some(TaskTarget::Building(building.id));
            return;
        }
        let me = &self.units[i];
        let standing = self.units.iter().find(|other| {
            other.is_alive()
                && other.owner != owner
                && other.position.tile() == tile
                && can_engage(me.kind, other.kind)
        });
        if let Some(other) = standing {
            let id = other.id;
            self.units[i].target = Some(TaskTarget::Unit(id));
        }
    }

    fn engage_unit(&mut self, i: usize, id: UnitId) {
        let Some(&j) = self.index.get(&id) else {
            self.units[i].go_idle();
            return;
        };
        let (me, target) = (&self.units[i], &self.units[j]);
        if j == i
            || !target.is_alive()
            || target.owner == me.owner
            || !can_engage(me.kind, target.kind)
        {
            self.units[i].go_idle();
            return;
        }
        let (attacker, damage, stats) = (me.id, me.attack, me.stats());
        let target_position = target.position;
        if me.position.distance(target_position) > stats.range {
            self.units[i].walk_to(target_position);
            return;
        }

        let unit = &mut self.units[i];
        unit.halt();
        if unit.attack_cooldown > 0 {
            return;
        }
        unit.attack_cooldown = stats.cooldown;
        let target = &mut self.units[j];
        target.take_damage(damage);
        if !target.is_alive() {
            debug!("{} {} killed by {attacker}", target.kind, target.id);
        }
    }

    fn engage_building(&mut self, i: usize, id: BuildingId) {
        let me = &self.units[i];
        let (attacker, unit_kind, attack, position) = (me.id, me.kind, me.attack, me.position);
        let stats = me.stats();
        let (Some(origin), Some(building)) = (self.map.origin_of(id), self.map.building(id)) else {
            self.units[i].go_idle();
            return;
        };
        if building.owner == me.owner {
            self.units[i].go_idle();
            return;
        }
        let kind = building.kind;
        if !building_in_range(self.map, position, origin, stats.range) {
            let destination =
                approach_point(self.map, origin, kind, position, Mobility::of(unit_kind));
            if me.move_target != Some(destination) || !me.moving {
                self.units[i].walk_to(destination);
            }
            return;
        }

        let unit = &mut self.units[i];
        unit.halt();
        if unit.attack_cooldown > 0 {
            return;
        }
        unit.attack_cooldown = stats.cooldown;
        let Some(building) = self.map.building_mut(id) else {
            return;
        };
        building.health = (building.health - building_damage(unit_kind, attack)).max(0.0);
        if building.health > 0.0 {
            return;
        }
        let owner = building.owner;
        self.map.demolish(id);
        debug!("{kind} {id} of player {owner} destroyed by {attacker}");
        self.demolished.push(Demolition { id, owner });
        self.units[i].go_idle();
    }

    fn attrition(&mut self, i: usize) {
        if self.tick % ATTRITION_INTERVAL != 0 {
            return;
        }
        let unit = &self.units[i];
        let foreign = self
            .map
            .get(unit.position.tile())
            .and_then(|t| t.owner)
            .is_some_and(|owner| owner != unit.owner);
        if foreign {
            self.units[i].take_damage(ATTRITION_DAMAGE);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Age;

    fn unit(id: u32, kind: UnitKind, owner: PlayerId, x: f32, y: f32) -> Unit {
        Unit::new(UnitId(id), kind, owner, Position::new(x, y), Age::Classical, IDLE_THRESHOLD_BASE)
    }

    fn run(map: &mut Map, units: &mut [Unit], tick: u64) -> Vec<Demolition> {
        let mut census = WorkerCensus::take(units);
        let mut rng = Rng::new(1);
        World::new(map, units, &mut census, &mut rng, tick).run()
    }

    #[test]
    fn test_mutual_auto_aggro() {
        let mut map = Map::new(20, 20).unwrap();
        let mut units = vec![
            unit(1, UnitKind::Infantry, 1, 5.5, 5.5),
            unit(2, UnitKind::Infantry, 2, 9.5, 5.5),
        ];
        run(&mut map, &mut units, 1);
        assert_eq!(units[0].task, UnitTask::Attack);
        assert_eq!(units[0].target, Some(TaskTarget::Unit(UnitId(2))));
        assert_eq!(units[1].target, Some(TaskTarget::Unit(UnitId(1))));
        assert!(units[0].moving && units[1].moving);

        let before = units[0].position.distance(units[1].position);
        run(&mut map, &mut units, 2);
        assert!(units[0].position.distance(units[1].position) < before);
    }

    #[test]
    fn test_aggro_prefers_soldiers() {
        let mut map = Map::new(20, 20).unwrap();
        let mut units = vec![
            unit(1, UnitKind::Archer, 1, 5.5, 5.5),
            unit(2, UnitKind::Citizen, 2, 6.5, 5.5),
            unit(3, UnitKind::Infantry, 2, 9.5, 5.5),
        ];
        run(&mut map, &mut units, 1);
        assert_eq!(units[0].target, Some(TaskTarget::Unit(UnitId(3))));
    }

    #[test]
    fn test_melee_ignores_ships() {
        let mut map = Map::new(20, 20).unwrap();
        for y in 0..20 {
            map.set(Coord::new(8, y), crate::game::Tile::water());
        }
        let mut units = vec![
            unit(1, UnitKind::Infantry, 1, 6.5, 5.5),
            unit(2, UnitKind::Galley, 2, 8.5, 5.5),
        ];
        units[1].task = UnitTask::Garrison;
        run(&mut map, &mut units, 1);
        assert_eq!(units[0].task, UnitTask::Idle);
    }

    #[test]
    fn test_civilian_flees_after_delay() {
        let mut map = Map::new(30, 30).unwrap();
        let mut units = vec![
            unit(1, UnitKind::Citizen, 1, 10.5, 10.5),
            unit(2, UnitKind::Infantry, 2, 14.5, 10.5),
        ];
        // Keep the soldier busy so it does not chase
        units[1].task = UnitTask::Garrison;
        for tick in 1..=FLEE_REACTION_DELAY {
            run(&mut map, &mut units, tick);
            assert_ne!(units[0].task, UnitTask::Flee);
        }
        run(&mut map, &mut units, FLEE_REACTION_DELAY + 1);
        assert_eq!(units[0].task, UnitTask::Flee);
        let destination = units[0].move_target.unwrap();
        assert!(destination.x < 10.5);
    }

    #[test]
    fn test_idle_worker_finds_farm() {
        let mut map = Map::new(20, 20).unwrap();
        let farm = map.place_building(Coord::new(5, 5), BuildingKind::Farm, 1).unwrap();
        map.building_mut(farm).unwrap().progress = 100.0;
        let mut units = vec![unit(1, UnitKind::Citizen, 1, 2.5, 2.5)];
        for tick in 1..=IDLE_THRESHOLD_BASE {
            run(&mut map, &mut units, tick);
            assert_eq!(units[0].task, UnitTask::Idle);
        }
        run(&mut map, &mut units, IDLE_THRESHOLD_BASE + 1);
        assert_eq!(units[0].task, UnitTask::Gather(Resource::Food));
        assert_eq!(units[0].target, Some(TaskTarget::Building(farm)));
        assert!(units[0].moving);
    }

    #[test]
    fn test_worker_ignores_full_building() {
        let mut map = Map::new(20, 20).unwrap();
        let camp = map.place_building(Coord::new(5, 5), BuildingKind::Market, 1).unwrap();
        map.building_mut(camp).unwrap().progress = 100.0;
        let mut units: Vec<Unit> = (1..=3)
            .map(|id| {
                let mut u = unit(id, UnitKind::Citizen, 1, 4.5, 4.5);
                u.task = UnitTask::Gather(Resource::Gold);
                u.target = Some(TaskTarget::Building(camp));
                u
            })
            .collect();
        let mut idle = unit(4, UnitKind::Citizen, 1, 3.5, 3.5);
        idle.idle_since = Some(0);
        units.push(idle);
        run(&mut map, &mut units, 100);
        assert_eq!(units[3].task, UnitTask::Idle);
    }

    #[test]
    fn test_attack_destroys_building() {
        let mut map = Map::new(20, 20).unwrap();
        let house = map.place_building(Coord::new(5, 5), BuildingKind::House, 2).unwrap();
        map.building_mut(house).unwrap().health = 1.0;
        let mut units = vec![unit(1, UnitKind::Catapult, 1, 4.5, 5.5)];
        units[0].task = UnitTask::Attack;
        units[0].target = Some(TaskTarget::Building(house));
        let demolished = run(&mut map, &mut units, 1);
        assert_eq!(demolished.len(), 1);
        assert_eq!(demolished[0].owner, 2);
        assert!(map.building(house).is_none());
        assert_eq!(units[0].task, UnitTask::Idle);
    }

    #[test]
    fn test_coordinate_attack_converts_to_unit_target() {
        let mut map = Map::new(30, 30).unwrap();
        let mut units = vec![
            unit(1, UnitKind::Infantry, 1, 5.5, 5.5),
            unit(2, UnitKind::Citizen, 2, 8.5, 5.5),
        ];
        units[0].task = UnitTask::Attack;
        units[0].target = Some(TaskTarget::Position(Position::new(25.5, 25.5)));
        units[0].walk_to(Position::new(25.5, 25.5));
        run(&mut map, &mut units, 1);
        assert_eq!(units[0].target, Some(TaskTarget::Unit(UnitId(2))));
    }

    #[test]
    fn test_attack_move_arrivals_spread_on_ring() {
        let mut map = Map::new(20, 20).unwrap();
        let point = Position::new(9.5, 5.5);
        let mut units = vec![
            unit(1, UnitKind::Infantry, 1, 5.5, 5.0),
            unit(2, UnitKind::Infantry, 1, 5.5, 6.0),
        ];
        for u in &mut units {
            u.task = UnitTask::Attack;
            u.target = Some(TaskTarget::Position(point));
            u.walk_to(point);
        }
        for tick in 1..=300 {
            run(&mut map, &mut units, tick);
        }
        for u in &units {
            assert_eq!(u.task, UnitTask::Idle);
            assert!(!u.moving);
            assert!(u.position.distance(point) < SETTLED_RADIUS);
        }
        assert!(units[0].position.distance(units[1].position) > 0.1);
    }

    #[test]
    fn test_unit_target_is_sticky() {
        let mut map = Map::new(30, 30).unwrap();
        let mut units = vec![
            unit(1, UnitKind::Infantry, 1, 5.5, 5.5),
            unit(2, UnitKind::Citizen, 2, 10.5, 5.5),
            unit(3, UnitKind::Infantry, 2, 6.5, 5.5),
        ];
        units[0].task = UnitTask::Attack;
        units[0].target = Some(TaskTarget::Unit(UnitId(2)));
        units[2].task = UnitTask::Garrison;
        run(&mut map, &mut units, 1);
        assert_eq!(units[0].target, Some(TaskTarget::Unit(UnitId(2))));
    }

    #[test]
    fn test_attrition_in_foreign_territory() {
        let mut map = Map::new(20, 20).unwrap();
        map.get_mut(Coord::new(3, 3)).unwrap().owner = Some(2);
        let mut units = vec![
            unit(1, UnitKind::Citizen, 1, 3.5, 3.5),
            unit(2, UnitKind::Citizen, 2, 3.6, 3.6),
        ];
        let full = units[0].health;
        run(&mut map, &mut units, ATTRITION_INTERVAL - 1);
        assert!((units[0].health - full).abs() < f32::EPSILON);
        run(&mut map, &mut units, ATTRITION_INTERVAL);
        assert!((units[0].health - (full - ATTRITION_DAMAGE)).abs() < 1e-6);
        assert!((units[1].health - full).abs() < f32::EPSILON);
    }

    #[test]
    fn test_patrol_swaps_endpoints() {
        let mut map = Map::new(20, 20).unwrap();
        let mut units = vec![unit(1, UnitKind::Citizen, 1, 5.5, 5.5)];
        let start = Position::new(5.5, 5.5);
        let end = Position::new(5.55, 5.5);
        units[0].task = UnitTask::Patrol;
        units[0].patrol_origin = Some(start);
        units[0].target = Some(TaskTarget::Position(end));
        units[0].walk_to(end);
        run(&mut map, &mut units, 1);
        assert_eq!(units[0].task, UnitTask::Patrol);
        assert_eq!(units[0].move_target, Some(start));
        assert_eq!(units[0].patrol_origin, Some(end));
    }

    #[test]
    fn test_stale_gather_target_goes_idle() {
        let mut map = Map::new(20, 20).unwrap();
        let mut units = vec![unit(1, UnitKind::Citizen, 1, 5.5, 5.5)];
        units[0].task = UnitTask::Gather(Resource::Food);
        units[0].target = Some(TaskTarget::Building(BuildingId(99)));
        run(&mut map, &mut units, 1);
        assert_eq!(units[0].task, UnitTask::Idle);
    }

    #[test]
    fn test_roll_idle_threshold_range() {
        let mut rng = Rng::new(5);
        for _ in 0..100 {
            let threshold = roll_idle_threshold(&mut rng);
            assert!((IDLE_THRESHOLD_BASE..IDLE_THRESHOLD_BASE + 30).contains(&threshold));
        }
    }
}
