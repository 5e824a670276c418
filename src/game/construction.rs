//! Construction progress and unit production.

// Builder counts are small
#![allow(clippy::cast_precision_loss)]

use log::debug;

use crate::game::pathfinding::{Mobility, is_passable};
use crate::game::{BuildingId, Coord, Map, PlayerId, Position, Terrain, UnitKind, WorkerCensus};

/// Progress per tick with nobody building.
pub const BASE_CONSTRUCTION_SPEED: f32 = 0.5;

/// Extra progress per tick for each builder on site.
pub const BUILDER_BONUS: f32 = 1.5;

/// Production queue capacity.
pub const MAX_QUEUE_LENGTH: usize = 5;

/// Production progress per tick.
pub const PRODUCTION_INCREMENT: u32 = 1;

/// A unit finished by a production queue this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Spawn {
    pub(crate) kind: UnitKind,
    pub(crate) owner: PlayerId,
    pub(crate) position: Position,
    pub(crate) building: BuildingId,
}

/// Advance construction and production on every building.
///
/// Returns the units whose training finished, in building-id order.
pub(crate) fn advance_construction(map: &mut Map, census: &WorkerCensus) -> Vec<Spawn> {
    let mut spawns = Vec::new();
    for id in map.building_ids() {
        let Some(building) = map.building_mut(id) else {
            continue;
        };
        if !building.is_complete() {
            let builders = census.builders(id) as f32;
            building.progress =
                (building.progress + BASE_CONSTRUCTION_SPEED + builders * BUILDER_BONUS).min(100.0);
            if building.is_complete() {
                debug!("{} {id} of player {} completed", building.kind, building.owner);
            }
            continue;
        }

        let Some(&head) = building.queue.front() else {
            continue;
        };
        building.production_progress += PRODUCTION_INCREMENT;
        if building.production_progress < head.stats().build_time {
            continue;
        }
        building.queue.pop_front();
        building.production_progress = 0;
        let owner = building.owner;
        if let Some(position) = spawn_position(map, id, head) {
            spawns.push(Spawn {
                kind: head,
                owner,
                position,
                building: id,
            });
        }
    }
    spawns
}

/// Where a freshly trained unit appears.
///
/// Land units take the first passable tile around the footprint, starting
/// below it; naval units take the first adjacent water tile. Either falls
/// back to the footprint center.
pub(crate) fn spawn_position(map: &Map, id: BuildingId, kind: UnitKind) -> Option<Position> {
    let origin = map.origin_of(id)?;
    let building_kind = map.building(id)?.kind;
    let mobility = Mobility::of(kind);
    let found = map.surrounding(origin, building_kind).into_iter().find(|&c| {
        is_passable(map, c, mobility)
            && (mobility == Mobility::Land
                || map.get(c).is_some_and(|t| t.terrain == Terrain::Water))
    });
    Some(found.map_or_else(
        || Map::footprint_center(origin, building_kind),
        Coord::center,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Age, BuildingKind, TaskTarget, Tile, Unit, UnitId, UnitTask};

    #[test]
    fn test_construction_base_speed() {
        let mut map = Map::new(10, 10).unwrap();
        let id = map.place_building(Coord::new(1, 1), BuildingKind::House, 1).unwrap();
        advance_construction(&mut map, &WorkerCensus::default());
        assert!((map.building(id).unwrap().progress - BASE_CONSTRUCTION_SPEED).abs() < 1e-6);
    }

    #[test]
    fn test_builders_speed_up_and_progress_clamps() {
        let mut map = Map::new(10, 10).unwrap();
        let id = map.place_building(Coord::new(1, 1), BuildingKind::House, 1).unwrap();
        let mut builder = Unit::new(UnitId(1), UnitKind::Citizen, 1, Position::new(0.5, 0.5), Age::Classical, 30);
        builder.task = UnitTask::Build;
        builder.target = Some(TaskTarget::Building(id));
        let census = WorkerCensus::take(&[builder]);

        advance_construction(&mut map, &census);
        let expected = BASE_CONSTRUCTION_SPEED + BUILDER_BONUS;
        assert!((map.building(id).unwrap().progress - expected).abs() < 1e-6);

        for _ in 0..200 {
            advance_construction(&mut map, &census);
        }
        assert!((map.building(id).unwrap().progress - 100.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_queue_drains_after_build_time() {
        let mut map = Map::new(10, 10).unwrap();
        let id = map
            .place_building(Coord::new(3, 3), BuildingKind::CityCenter, 1)
            .unwrap();
        {
            let building = map.building_mut(id).unwrap();
            building.progress = 100.0;
            building.queue.push_back(UnitKind::Citizen);
        }
        let build_time = UnitKind::Citizen.stats().build_time;
        for _ in 1..build_time {
            assert!(advance_construction(&mut map, &WorkerCensus::default()).is_empty());
        }
        let spawns = advance_construction(&mut map, &WorkerCensus::default());
        assert_eq!(spawns.len(), 1);
        assert_eq!(spawns[0].kind, UnitKind::Citizen);
        // first tile of the ring below the footprint
        assert_eq!(spawns[0].position, Coord::new(2, 6).center());
        let building = map.building(id).unwrap();
        assert!(building.queue.is_empty());
        assert_eq!(building.production_progress, 0);
    }

    #[test]
    fn test_incomplete_building_does_not_produce() {
        let mut map = Map::new(10, 10).unwrap();
        let id = map.place_building(Coord::new(3, 3), BuildingKind::Barracks, 1).unwrap();
        map.building_mut(id).unwrap().queue.push_back(UnitKind::Infantry);
        advance_construction(&mut map, &WorkerCensus::default());
        assert_eq!(map.building(id).unwrap().production_progress, 0);
    }

    #[test]
    fn test_naval_spawn_on_water() {
        let mut map = Map::new(10, 10).unwrap();
        map.set(Coord::new(5, 4), Tile::water());
        let id = map.place_building(Coord::new(4, 4), BuildingKind::Dock, 1).unwrap();
        assert_eq!(
            spawn_position(&map, id, UnitKind::FishingBoat),
            Some(Coord::new(5, 4).center())
        );
        assert_eq!(
            spawn_position(&map, id, UnitKind::Citizen),
            Some(Coord::new(3, 5).center())
        );
    }

    #[test]
    fn test_naval_spawn_falls_back_to_center() {
        let mut map = Map::new(10, 10).unwrap();
        let id = map.place_building(Coord::new(4, 4), BuildingKind::Dock, 1).unwrap();
        assert_eq!(
            spawn_position(&map, id, UnitKind::Galley),
            Some(Position::new(4.5, 4.5))
        );
    }
}
