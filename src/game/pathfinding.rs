//! Pathfinding: tile passability, a straight-line check and a bounded greedy
//! best-first fallback.
//!
//! [`next_step`] never plans a whole route. It answers "where should this unit
//! head right now", and the movement integrator asks again next tick.

// Sampling and stepping mix f32 positions with integer tile coordinates
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use log::trace;

use crate::game::{BuildingKind, Coord, Map, Position, Terrain, UnitKind};

/// Distance below which a unit counts as arrived.
pub const ARRIVAL_THRESHOLD: f32 = 0.2;

/// Spacing of the samples taken along a straight segment.
pub const LINE_SAMPLE_STEP: f32 = 0.25;

/// Maximum tiles expanded by the fallback search.
pub const SEARCH_ITERATION_LIMIT: usize = 200;

/// Tiles moved per tick by a unit of speed 1.0.
pub const BASE_STEP: f32 = 0.1;

/// Which surfaces a unit moves on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mobility {
    /// Walks on land.
    Land,
    /// Sails on water.
    Naval,
}

impl Mobility {
    /// Mobility of a unit kind.
    #[must_use]
    pub fn of(kind: UnitKind) -> Self {
        if kind.is_naval() {
            Mobility::Naval
        } else {
            Mobility::Land
        }
    }
}

/// Result of one pathfinding query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathStep {
    /// The unit is at (or against) its goal.
    Arrived,
    /// Head toward this waypoint.
    Toward(Position),
    /// No route found within the search budget.
    Blocked,
}

/// Whether a unit with `mobility` may stand on `coord`.
#[must_use]
pub fn is_passable(map: &Map, coord: Coord, mobility: Mobility) -> bool {
    let Some(tile) = map.get(coord) else {
        return false;
    };
    if tile.terrain == Terrain::Mountain || tile.is_deposit() {
        return false;
    }
    if let Some((_, building)) = map.building_at(coord) {
        return match mobility {
            Mobility::Land => building.kind.is_road() && tile.terrain != Terrain::Water,
            Mobility::Naval => building.kind.is_dock(),
        };
    }
    match mobility {
        Mobility::Land => tile.terrain != Terrain::Water,
        Mobility::Naval => tile.terrain == Terrain::Water,
    }
}

/// Decide where a unit at `start` should head to reach `goal`.
///
/// A goal on an impassable tile is reached once the unit stands next to it.
#[must_use]
pub fn next_step(map: &Map, start: Position, goal: Position, mobility: Mobility) -> PathStep {
    if start.distance(goal) < ARRIVAL_THRESHOLD {
        return PathStep::Arrived;
    }

    let start_tile = start.tile();
    let goal_tile = goal.tile();
    let goal_open = is_passable(map, goal_tile, mobility);
    if !goal_open && start_tile.chebyshev(goal_tile) <= 1 {
        return PathStep::Arrived;
    }

    if line_is_clear(map, start, goal, goal_open, mobility) {
        return PathStep::Toward(goal);
    }

    match search(map, start_tile, goal_tile, goal_open, mobility) {
        Some(first) => PathStep::Toward(first.center()),
        None => {
            trace!("no path from {start_tile} to {goal_tile} within {SEARCH_ITERATION_LIMIT} expansions");
            PathStep::Blocked
        }
    }
}

/// Sample the segment every [`LINE_SAMPLE_STEP`]; the start tile and a
/// closed goal tile are exempt. A diagonal hop between samples must not cut a
/// closed corner.
fn line_is_clear(
    map: &Map,
    start: Position,
    goal: Position,
    goal_open: bool,
    mobility: Mobility,
) -> bool {
    let start_tile = start.tile();
    let goal_tile = goal.tile();
    let samples = (start.distance(goal) / LINE_SAMPLE_STEP).ceil().max(1.0) as u32;
    let mut previous = start_tile;
    for i in 1..=samples {
        let t = i as f32 / samples as f32;
        let point = Position::new(
            start.x + (goal.x - start.x) * t,
            start.y + (goal.y - start.y) * t,
        );
        if point.x < 0.0 || point.y < 0.0 {
            return false;
        }
        let tile = point.tile();
        if tile == previous {
            continue;
        }
        let exempt = tile == start_tile || (tile == goal_tile && !goal_open);
        if !exempt && !is_passable(map, tile, mobility) {
            return false;
        }
        let dx = i32::from(tile.x) - i32::from(previous.x);
        let dy = i32::from(tile.y) - i32::from(previous.y);
        if dx != 0 && dy != 0 && !corner_is_open(map, previous, dx.signum(), dy.signum(), mobility) {
            return false;
        }
        previous = tile;
    }
    true
}

/// Entry in the search frontier: lower Manhattan distance first, then the
/// earlier insertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OpenNode {
    distance: u32,
    seq: u32,
    coord: Coord,
}

impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering to make BinaryHeap behave like a min-heap.
        (other.distance, other.seq).cmp(&(self.distance, self.seq))
    }
}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

const NEIGHBOR_OFFSETS: [(i32, i32); 8] = [
    (0, -1),
    (1, 0),
    (0, 1),
    (-1, 0),
    (1, -1),
    (1, 1),
    (-1, 1),
    (-1, -1),
];

/// Greedy best-first search; returns the first tile of the path found.
fn search(
    map: &Map,
    start: Coord,
    goal: Coord,
    goal_open: bool,
    mobility: Mobility,
) -> Option<Coord> {
    let reached = |c: Coord| {
        if goal_open {
            c == goal
        } else {
            c.chebyshev(goal) <= 1
        }
    };

    let mut came_from: HashMap<Coord, Coord> = HashMap::new();
    let mut open = BinaryHeap::new();
    let mut seq = 0u32;
    came_from.insert(start, start);
    open.push(OpenNode {
        distance: start.manhattan(goal),
        seq,
        coord: start,
    });

    for _ in 0..SEARCH_ITERATION_LIMIT {
        let node = open.pop()?;
        if node.coord != start && reached(node.coord) {
            return first_step(&came_from, start, node.coord);
        }
        for (dx, dy) in NEIGHBOR_OFFSETS {
            let Some(next) = node.coord.offset(dx, dy, map.width(), map.height()) else {
                continue;
            };
            if came_from.contains_key(&next) || !is_passable(map, next, mobility) {
                continue;
            }
            if dx != 0 && dy != 0 && !corner_is_open(map, node.coord, dx, dy, mobility) {
                continue;
            }
            came_from.insert(next, node.coord);
            seq += 1;
            open.push(OpenNode {
                distance: next.manhattan(goal),
                seq,
                coord: next,
            });
        }
    }
    None
}

/// A diagonal move needs both orthogonal tiles it passes between to be open.
fn corner_is_open(map: &Map, from: Coord, dx: i32, dy: i32, mobility: Mobility) -> bool {
    let (w, h) = (map.width(), map.height());
    let side_a = from.offset(dx, 0, w, h);
    let side_b = from.offset(0, dy, w, h);
    side_a.is_some_and(|c| is_passable(map, c, mobility))
        && side_b.is_some_and(|c| is_passable(map, c, mobility))
}

fn first_step(came_from: &HashMap<Coord, Coord>, start: Coord, end: Coord) -> Option<Coord> {
    let mut current = end;
    loop {
        let parent = *came_from.get(&current)?;
        if parent == start {
            return Some(current);
        }
        current = parent;
    }
}

/// Move from `from` toward `to` by at most `step`.
#[must_use]
pub fn step_toward(from: Position, to: Position, step: f32) -> Position {
    let distance = from.distance(to);
    if distance <= step || distance <= f32::EPSILON {
        return to;
    }
    let ratio = step / distance;
    Position::new(
        from.x + (to.x - from.x) * ratio,
        from.y + (to.y - from.y) * ratio,
    )
}

/// The passable tile center around a footprint closest to `from`.
///
/// Falls back to the footprint center when every surrounding tile is closed.
#[must_use]
pub fn approach_point(
    map: &Map,
    origin: Coord,
    kind: BuildingKind,
    from: Position,
    mobility: Mobility,
) -> Position {
    approach_points(map, origin, kind, from, mobility)
        .first()
        .copied()
        .unwrap_or_else(|| Map::footprint_center(origin, kind))
}

/// Every passable tile center around a footprint, nearest to `from` first.
///
/// Equal distances keep the ring order of [`Map::surrounding`].
#[must_use]
pub fn approach_points(
    map: &Map,
    origin: Coord,
    kind: BuildingKind,
    from: Position,
    mobility: Mobility,
) -> Vec<Position> {
    let mut spots: Vec<(f32, Position)> = map
        .surrounding(origin, kind)
        .into_iter()
        .filter(|&coord| is_passable(map, coord, mobility))
        .map(|coord| {
            let center = coord.center();
            (from.distance(center), center)
        })
        .collect();
    spots.sort_by(|a, b| a.0.total_cmp(&b.0));
    spots.into_iter().map(|(_, p)| p).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Tile;

    fn walk(map: &Map, mut pos: Position, goal: Position, mobility: Mobility) -> (Position, bool) {
        for _ in 0..2000 {
            match next_step(map, pos, goal, mobility) {
                PathStep::Arrived => return (pos, true),
                PathStep::Toward(waypoint) => pos = step_toward(pos, waypoint, BASE_STEP),
                PathStep::Blocked => return (pos, false),
            }
        }
        (pos, false)
    }

    #[test]
    fn test_arrived_when_close() {
        let map = Map::new(5, 5).unwrap();
        let step = next_step(&map, Position::new(1.5, 1.5), Position::new(1.6, 1.5), Mobility::Land);
        assert_eq!(step, PathStep::Arrived);
    }

    #[test]
    fn test_clear_line_heads_straight_for_goal() {
        let map = Map::new(10, 10).unwrap();
        let goal = Position::new(8.5, 8.5);
        assert_eq!(
            next_step(&map, Position::new(1.5, 1.5), goal, Mobility::Land),
            PathStep::Toward(goal)
        );
    }

    #[test]
    fn test_routes_around_wall() {
        let mut map = Map::new(12, 12).unwrap();
        for y in 0..9 {
            map.set(Coord::new(6, y), Tile::mountain());
        }
        let goal = Position::new(10.5, 2.5);
        let (end, arrived) = walk(&map, Position::new(2.5, 2.5), goal, Mobility::Land);
        assert!(arrived);
        assert!(end.distance(goal) < ARRIVAL_THRESHOLD);
    }

    #[test]
    fn test_lake_blocks_land_units() {
        let mut map = Map::new(20, 10).unwrap();
        for y in 0..10 {
            map.set(Coord::new(10, y), Tile::water());
        }
        let step = next_step(&map, Position::new(2.5, 5.5), Position::new(17.5, 5.5), Mobility::Land);
        assert_eq!(step, PathStep::Blocked);
    }

    #[test]
    fn test_naval_units_need_water() {
        let mut map = Map::new(10, 10).unwrap();
        map.set(Coord::new(3, 3), Tile::water());
        assert!(is_passable(&map, Coord::new(3, 3), Mobility::Naval));
        assert!(!is_passable(&map, Coord::new(3, 3), Mobility::Land));
        assert!(!is_passable(&map, Coord::new(4, 3), Mobility::Naval));
    }

    #[test]
    fn test_buildings_block_except_roads_and_docks() {
        let mut map = Map::new(10, 10).unwrap();
        map.place_building(Coord::new(1, 1), BuildingKind::House, 1).unwrap();
        map.place_building(Coord::new(3, 1), BuildingKind::Road, 1).unwrap();
        map.place_building(Coord::new(5, 1), BuildingKind::Dock, 1).unwrap();
        assert!(!is_passable(&map, Coord::new(1, 1), Mobility::Land));
        assert!(is_passable(&map, Coord::new(3, 1), Mobility::Land));
        assert!(!is_passable(&map, Coord::new(5, 1), Mobility::Land));
        assert!(is_passable(&map, Coord::new(5, 1), Mobility::Naval));
    }

    #[test]
    fn test_deposits_block_everyone() {
        let mut map = Map::new(10, 10).unwrap();
        map.set(Coord::new(2, 2), Tile::forest(50));
        map.set(Coord::new(3, 2), Tile::oil());
        assert!(!is_passable(&map, Coord::new(2, 2), Mobility::Land));
        assert!(!is_passable(&map, Coord::new(3, 2), Mobility::Land));
        assert!(!is_passable(&map, Coord::new(20, 2), Mobility::Land));
    }

    #[test]
    fn test_arrives_next_to_closed_goal() {
        let mut map = Map::new(10, 10).unwrap();
        map.place_building(Coord::new(5, 5), BuildingKind::House, 1).unwrap();
        let (end, arrived) = walk(&map, Position::new(1.5, 1.5), Coord::new(5, 5).center(), Mobility::Land);
        assert!(arrived);
        assert!(end.tile().chebyshev(Coord::new(5, 5)) <= 1);
    }

    #[test]
    fn test_no_diagonal_corner_cutting() {
        let mut map = Map::new(3, 3).unwrap();
        map.set(Coord::new(1, 0), Tile::mountain());
        map.set(Coord::new(0, 1), Tile::mountain());
        let step = next_step(&map, Position::new(0.5, 0.5), Position::new(2.5, 2.5), Mobility::Land);
        assert_eq!(step, PathStep::Blocked);
    }

    #[test]
    fn test_approach_point_picks_nearest_open_tile() {
        let map = Map::new(10, 10).unwrap();
        let point = approach_point(&map, Coord::new(4, 4), BuildingKind::Farm, Position::new(0.5, 0.5), Mobility::Land);
        assert_eq!(point, Coord::new(3, 3).center());
    }

    #[test]
    fn test_step_toward_does_not_overshoot() {
        let to = Position::new(1.05, 1.0);
        assert_eq!(step_toward(Position::new(1.0, 1.0), to, BASE_STEP), to);
        let moved = step_toward(Position::new(0.0, 0.0), Position::new(10.0, 0.0), BASE_STEP);
        assert!((moved.x - BASE_STEP).abs() < 1e-6);
    }
}
