//! Economy: worker census, per-tick resource rates and population caps.
//!
//! # Income model
//!
//! Each completed building that gathers a resource yields
//!
//! ```text
//! rate = min(working, capacity) × BASE_GATHER_RATE × multiplier
//! ```
//!
//! where `working` counts units with a gather task on that building id that
//! have stopped moving. City-tier buildings and wonders add a passive income
//! that needs no workers. Nothing under construction yields anything.

use std::collections::HashMap;

use crate::game::{
    BuildingId, BuildingKind, Coord, Map, Player, PlayerId, Resources, TaskTarget, Unit, UnitTask,
};

/// Resource per worker per tick before the building multiplier.
pub const BASE_GATHER_RATE: f64 = 0.05;

/// Population cap floor.
pub const MIN_POPULATION_CAP: u32 = 5;

/// Chebyshev radius around a dock searched for fishing spots.
pub const FISHING_SPOT_RADIUS: u16 = 3;

/// Dock multiplier bonus with a fishing spot in range.
pub const FISHING_SPOT_BONUS: f64 = 0.5;

/// Units counted per building, taken in one scan of the unit list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkerCensus {
    working: HashMap<BuildingId, u32>,
    assigned: HashMap<BuildingId, u32>,
    builders: HashMap<BuildingId, u32>,
}

impl WorkerCensus {
    /// Count gatherers and builders. Dead units are skipped.
    #[must_use]
    pub fn take(units: &[Unit]) -> Self {
        let mut census = Self::default();
        for unit in units.iter().filter(|u| u.is_alive()) {
            let Some(TaskTarget::Building(id)) = unit.target else {
                continue;
            };
            match unit.task {
                UnitTask::Gather(_) => {
                    *census.assigned.entry(id).or_default() += 1;
                    if !unit.moving {
                        *census.working.entry(id).or_default() += 1;
                    }
                }
                UnitTask::Build if !unit.moving => {
                    *census.builders.entry(id).or_default() += 1;
                }
                _ => {}
            }
        }
        census
    }

    /// Gatherers standing at the building.
    #[must_use]
    pub fn working(&self, id: BuildingId) -> u32 {
        self.working.get(&id).copied().unwrap_or(0)
    }

    /// Gatherers assigned to the building, walking or not.
    #[must_use]
    pub fn assigned(&self, id: BuildingId) -> u32 {
        self.assigned.get(&id).copied().unwrap_or(0)
    }

    /// Builders standing at the building.
    #[must_use]
    pub fn builders(&self, id: BuildingId) -> u32 {
        self.builders.get(&id).copied().unwrap_or(0)
    }

    /// Record one more assigned gatherer (used while handing out work mid-tick).
    pub fn add_assigned(&mut self, id: BuildingId) {
        *self.assigned.entry(id).or_default() += 1;
    }
}

/// Income of one building kind for a number of working units.
#[must_use]
pub fn gather_rate(working: u32, capacity: u32, multiplier: f64) -> f64 {
    f64::from(working.min(capacity)) * BASE_GATHER_RATE * multiplier
}

/// Whether a fishing spot lies within [`FISHING_SPOT_RADIUS`] of `origin`.
fn has_fishing_spot_near(map: &Map, origin: Coord) -> bool {
    let r = i32::from(FISHING_SPOT_RADIUS);
    (-r..=r).any(|dy| {
        (-r..=r).any(|dx| {
            origin
                .offset(dx, dy, map.width(), map.height())
                .and_then(|c| map.get(c))
                .is_some_and(|t| t.has_fishing_spot)
        })
    })
}

/// Per-tick income of `player`.
#[must_use]
pub fn compute_rates(map: &Map, census: &WorkerCensus, player: PlayerId) -> Resources {
    let mut rates = Resources::ZERO;
    for (origin, building) in map.buildings() {
        if building.owner != player || !building.is_complete() {
            continue;
        }
        let stats = building.kind.stats();
        if let Some(resource) = stats.produces {
            let mut multiplier = stats.rate_multiplier;
            if building.kind == BuildingKind::Dock && has_fishing_spot_near(map, origin) {
                multiplier *= 1.0 + FISHING_SPOT_BONUS;
            }
            *rates.get_mut(resource) +=
                gather_rate(census.working(building.id), stats.worker_capacity, multiplier);
        }
        rates.accumulate(&stats.passive_income);
    }
    rates
}

/// Population cap of `player`: age bonus plus housing, at least [`MIN_POPULATION_CAP`].
#[must_use]
pub fn population_cap(map: &Map, player: &Player) -> u32 {
    let housing: u32 = map
        .buildings()
        .filter(|(_, b)| b.owner == player.id && b.is_complete())
        .map(|(_, b)| b.kind.stats().housing)
        .sum();
    (player.age.population_bonus() + housing).max(MIN_POPULATION_CAP)
}

/// Apply one tick of income to every active player and recompute caps.
pub(crate) fn apply_economy(map: &Map, players: &mut [Player], census: &WorkerCensus) {
    for player in players.iter_mut().filter(|p| p.is_active()) {
        let rates = compute_rates(map, census, player.id);
        player.resources.add_clamped(&rates, &player.storage_cap);
        player.rates = rates;
        player.population_cap = population_cap(map, player);
    }
}

/// Kani formal verification proofs.
///
/// Run with: `cargo kani`
#[cfg(kani)]
mod kani_proofs {
    use super::*;

    /// Income never goes negative and never exceeds the full-capacity rate.
    #[kani::proof]
    fn prove_gather_rate_bounded() {
        let working: u32 = kani::any();
        let capacity: u32 = kani::any();
        kani::assume(capacity <= 8);

        let rate = gather_rate(working, capacity, 1.0);
        assert!(rate >= 0.0);
        assert!(rate <= f64::from(capacity) * BASE_GATHER_RATE);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Age, Position, Resource, Tile, UnitId, UnitKind};

    fn citizen(id: u32, owner: PlayerId) -> Unit {
        Unit::new(UnitId(id), UnitKind::Citizen, owner, Position::new(0.5, 0.5), Age::Classical, 30)
    }

    fn gatherer(id: u32, building: BuildingId, moving: bool) -> Unit {
        let mut unit = citizen(id, 1);
        unit.task = UnitTask::Gather(Resource::Food);
        unit.target = Some(TaskTarget::Building(building));
        unit.moving = moving;
        unit
    }

    fn completed_farm(map: &mut Map, origin: Coord, owner: PlayerId) -> BuildingId {
        let id = map.place_building(origin, BuildingKind::Farm, owner).unwrap();
        map.building_mut(id).unwrap().progress = 100.0;
        id
    }

    #[test]
    fn test_census_counts_only_stationary_gatherers() {
        let id = BuildingId(7);
        let units = vec![gatherer(1, id, false), gatherer(2, id, true), citizen(3, 1)];
        let census = WorkerCensus::take(&units);
        assert_eq!(census.working(id), 1);
        assert_eq!(census.assigned(id), 2);
        assert_eq!(census.builders(id), 0);
    }

    #[test]
    fn test_census_skips_dead_units() {
        let id = BuildingId(1);
        let mut dead = gatherer(1, id, false);
        dead.health = 0.0;
        let census = WorkerCensus::take(&[dead]);
        assert_eq!(census.working(id), 0);
    }

    #[test]
    fn test_rate_scales_with_workers_up_to_capacity() {
        let mut map = Map::new(10, 10).unwrap();
        let id = completed_farm(&mut map, Coord::new(2, 2), 1);
        let units: Vec<Unit> = (0..6).map(|i| gatherer(i, id, false)).collect();
        let rates = compute_rates(&map, &WorkerCensus::take(&units), 1);
        assert!((rates.food - 4.0 * BASE_GATHER_RATE).abs() < 1e-9);
    }

    #[test]
    fn test_no_income_under_construction() {
        let mut map = Map::new(10, 10).unwrap();
        let id = map
            .place_building(Coord::new(2, 2), BuildingKind::Farm, 1)
            .unwrap();
        let units = vec![gatherer(1, id, false)];
        let rates = compute_rates(&map, &WorkerCensus::take(&units), 1);
        assert!(rates.food.abs() < 1e-12);
    }

    #[test]
    fn test_passive_income_from_city_center() {
        let mut map = Map::new(10, 10).unwrap();
        let id = map
            .place_building(Coord::new(2, 2), BuildingKind::CityCenter, 1)
            .unwrap();
        map.building_mut(id).unwrap().progress = 100.0;
        let rates = compute_rates(&map, &WorkerCensus::default(), 1);
        assert!(rates.gold > 0.0);
        assert!(rates.food.abs() < 1e-12);
        assert!(compute_rates(&map, &WorkerCensus::default(), 2).gold.abs() < 1e-12);
    }

    #[test]
    fn test_dock_fishing_bonus() {
        let mut map = Map::new(10, 10).unwrap();
        let id = map
            .place_building(Coord::new(4, 4), BuildingKind::Dock, 1)
            .unwrap();
        map.building_mut(id).unwrap().progress = 100.0;
        let units = vec![gatherer(1, id, false)];
        let census = WorkerCensus::take(&units);
        let plain = compute_rates(&map, &census, 1).food;

        map.set(Coord::new(6, 6), Tile::fishing_water());
        let boosted = compute_rates(&map, &census, 1).food;
        assert!((boosted - plain * 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_full_storage_is_unchanged_without_workers() {
        let mut map = Map::new(10, 10).unwrap();
        completed_farm(&mut map, Coord::new(2, 2), 1);
        let mut players = vec![Player::human(1, "Alice")];
        players[0].resources.food = players[0].storage_cap.food;
        apply_economy(&map, &mut players, &WorkerCensus::default());
        assert!((players[0].resources.food - players[0].storage_cap.food).abs() < 1e-12);
    }

    #[test]
    fn test_population_cap_floor_and_housing() {
        let mut map = Map::new(10, 10).unwrap();
        let player = Player::human(1, "Alice");
        assert_eq!(population_cap(&map, &player), 5);

        let house = map
            .place_building(Coord::new(1, 1), BuildingKind::House, 1)
            .unwrap();
        assert_eq!(population_cap(&map, &player), 5);
        map.building_mut(house).unwrap().progress = 100.0;
        assert_eq!(population_cap(&map, &player), 10);
    }
}
