//! Map, tile and building types.
//!
//! Buildings live on their origin tile only. The map keeps an occupancy index
//! (covered tile -> origin) and a building-id index alongside the tiles, both
//! updated in [`Map::place_building`] and [`Map::demolish`], so footprint
//! lookups never search the grid.

// Grid math converts between u16 coordinates, i32 offsets and f32 positions
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss
)]

use std::collections::{BTreeMap, VecDeque};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::BlockedReason;
use crate::game::{BuildingKind, Deposit, PlayerId, UnitKind};

/// A tile coordinate.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct Coord {
    /// X coordinate (column).
    pub x: u16,
    /// Y coordinate (row).
    pub y: u16,
}

impl Coord {
    /// Create a new coordinate.
    #[must_use]
    pub const fn new(x: u16, y: u16) -> Self {
        Self { x, y }
    }

    /// Center of the tile in continuous coordinates.
    #[must_use]
    pub fn center(self) -> Position {
        Position::new(f32::from(self.x) + 0.5, f32::from(self.y) + 0.5)
    }

    /// Offset by `(dx, dy)`, or `None` if the result leaves `width` x `height`.
    #[must_use]
    pub fn offset(self, dx: i32, dy: i32, width: u16, height: u16) -> Option<Coord> {
        let x = i32::from(self.x) + dx;
        let y = i32::from(self.y) + dy;
        if x < 0 || y < 0 || x >= i32::from(width) || y >= i32::from(height) {
            return None;
        }
        Some(Coord::new(x as u16, y as u16))
    }

    /// Chebyshev (king-move) distance.
    #[must_use]
    pub fn chebyshev(self, other: Coord) -> u16 {
        self.x.abs_diff(other.x).max(self.y.abs_diff(other.y))
    }

    /// Manhattan distance.
    #[must_use]
    pub fn manhattan(self, other: Coord) -> u32 {
        u32::from(self.x.abs_diff(other.x)) + u32::from(self.y.abs_diff(other.y))
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A continuous position in tile units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    /// X in tiles.
    pub x: f32,
    /// Y in tiles.
    pub y: f32,
}

impl Position {
    /// Create a new position.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// The tile containing this position. Negative components floor to zero.
    #[must_use]
    pub fn tile(self) -> Coord {
        Coord::new(
            self.x.floor().clamp(0.0, f32::from(u16::MAX)) as u16,
            self.y.floor().clamp(0.0, f32::from(u16::MAX)) as u16,
        )
    }

    /// Euclidean distance.
    #[must_use]
    pub fn distance(self, other: Position) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        dx.hypot(dy)
    }

    /// Clamp into a `width` x `height` map, staying inside the last tile.
    #[must_use]
    pub fn clamp_to(self, width: u16, height: u16) -> Position {
        let max_x = f32::from(width) - 0.01;
        let max_y = f32::from(height) - 0.01;
        Position::new(self.x.clamp(0.0, max_x), self.y.clamp(0.0, max_y))
    }
}

/// Terrain of a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Terrain {
    /// Open land.
    #[default]
    Grass,
    /// Lakes, rivers and sea.
    Water,
    /// Impassable highland.
    Mountain,
    /// Woodland; a wood deposit.
    Forest,
}

/// Unique building identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BuildingId(pub u32);

impl fmt::Display for BuildingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "building-{}", self.0)
    }
}

/// A building instance.
#[derive(Debug, Clone, PartialEq)]
pub struct Building {
    /// Identifier, unique for the lifetime of the map.
    pub id: BuildingId,
    /// Kind.
    pub kind: BuildingKind,
    /// Owner.
    pub owner: PlayerId,
    /// Current health.
    pub health: f32,
    /// Maximum health.
    pub max_health: f32,
    /// Construction progress in `[0, 100]`.
    pub progress: f32,
    /// Units waiting to be trained, head first.
    pub queue: VecDeque<UnitKind>,
    /// Ticks spent on the head of the queue.
    pub production_progress: u32,
}

impl Building {
    /// A freshly placed building: full health, zero progress.
    #[must_use]
    pub fn new(id: BuildingId, kind: BuildingKind, owner: PlayerId) -> Self {
        let max_health = kind.stats().max_health;
        Self {
            id,
            kind,
            owner,
            health: max_health,
            max_health,
            progress: 0.0,
            queue: VecDeque::new(),
            production_progress: 0,
        }
    }

    /// Whether construction has finished.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.progress >= 100.0
    }
}

/// A single tile on the map.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Tile {
    /// Terrain.
    pub terrain: Terrain,
    /// Building whose origin is this tile.
    pub building: Option<Building>,
    /// Territory owner.
    pub owner: Option<PlayerId>,
    /// Forest density, 0-100.
    pub forest_density: u8,
    /// Metal deposit.
    pub has_metal: bool,
    /// Oil deposit.
    pub has_oil: bool,
    /// Fishing spot (water tiles).
    pub has_fishing_spot: bool,
}

impl Tile {
    /// A tile of the given terrain with no deposits.
    #[must_use]
    pub fn new(terrain: Terrain) -> Self {
        Self {
            terrain,
            ..Self::default()
        }
    }

    /// Grass.
    #[must_use]
    pub fn grass() -> Self {
        Self::new(Terrain::Grass)
    }

    /// Water.
    #[must_use]
    pub fn water() -> Self {
        Self::new(Terrain::Water)
    }

    /// Water with a fishing spot.
    #[must_use]
    pub fn fishing_water() -> Self {
        Self {
            has_fishing_spot: true,
            ..Self::water()
        }
    }

    /// Mountain.
    #[must_use]
    pub fn mountain() -> Self {
        Self::new(Terrain::Mountain)
    }

    /// Forest of the given density.
    #[must_use]
    pub fn forest(density: u8) -> Self {
        Self {
            forest_density: density.min(100),
            ..Self::new(Terrain::Forest)
        }
    }

    /// Grass with a metal deposit.
    #[must_use]
    pub fn metal() -> Self {
        Self {
            has_metal: true,
            ..Self::grass()
        }
    }

    /// Grass with an oil deposit.
    #[must_use]
    pub fn oil() -> Self {
        Self {
            has_oil: true,
            ..Self::grass()
        }
    }

    /// Whether the tile holds a resource deposit (forest, metal or oil).
    #[must_use]
    pub fn is_deposit(&self) -> bool {
        self.terrain == Terrain::Forest || self.has_metal || self.has_oil
    }

    /// Whether the tile provides the given deposit.
    #[must_use]
    pub fn provides(&self, deposit: Deposit) -> bool {
        match deposit {
            Deposit::Forest => self.terrain == Terrain::Forest,
            Deposit::Metal => self.has_metal,
            Deposit::Oil => self.has_oil,
            Deposit::Water => self.terrain == Terrain::Water,
        }
    }
}

/// The game map.
#[derive(Debug, Clone, PartialEq)]
pub struct Map {
    width: u16,
    height: u16,
    /// Tiles in row-major order.
    tiles: Vec<Tile>,
    /// Covered tile -> origin of the building covering it.
    occupancy: Vec<Option<Coord>>,
    /// Building id -> origin.
    origins: BTreeMap<BuildingId, Coord>,
    next_building_id: u32,
}

impl Map {
    /// Create a new map filled with grass.
    ///
    /// Returns `None` if width or height is zero.
    #[must_use]
    pub fn new(width: u16, height: u16) -> Option<Self> {
        if width == 0 || height == 0 {
            return None;
        }
        let size = usize::from(width) * usize::from(height);
        Some(Self {
            width,
            height,
            tiles: vec![Tile::grass(); size],
            occupancy: vec![None; size],
            origins: BTreeMap::new(),
            next_building_id: 1,
        })
    }

    /// Width in tiles.
    #[must_use]
    pub const fn width(&self) -> u16 {
        self.width
    }

    /// Height in tiles.
    #[must_use]
    pub const fn height(&self) -> u16 {
        self.height
    }

    /// Raw tiles in row-major order.
    #[must_use]
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    /// Whether a coordinate is on the map.
    #[must_use]
    pub const fn in_bounds(&self, coord: Coord) -> bool {
        coord.x < self.width && coord.y < self.height
    }

    fn index(&self, coord: Coord) -> Option<usize> {
        self.in_bounds(coord)
            .then(|| usize::from(coord.y) * usize::from(self.width) + usize::from(coord.x))
    }

    /// Tile at a coordinate.
    #[must_use]
    pub fn get(&self, coord: Coord) -> Option<&Tile> {
        self.index(coord).map(|idx| &self.tiles[idx])
    }

    /// Mutable tile at a coordinate.
    ///
    /// Use [`Map::place_building`] and [`Map::demolish`] to add or remove
    /// buildings; writing `building` directly bypasses the indices.
    #[must_use]
    pub fn get_mut(&mut self, coord: Coord) -> Option<&mut Tile> {
        self.index(coord).map(|idx| &mut self.tiles[idx])
    }

    /// Replace the terrain of a tile. Any building on it is kept.
    ///
    /// Returns `false` if the coordinate is out of bounds.
    pub fn set(&mut self, coord: Coord, tile: Tile) -> bool {
        let Some(idx) = self.index(coord) else {
            return false;
        };
        let slot = &mut self.tiles[idx];
        let building = slot.building.take();
        let owner = slot.owner;
        *slot = Tile {
            building,
            owner,
            ..tile
        };
        true
    }

    /// Iterate over all coordinates and tiles in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (Coord, &Tile)> {
        let width = usize::from(self.width);
        self.tiles.iter().enumerate().map(move |(idx, tile)| {
            let x = (idx % width) as u16;
            let y = (idx / width) as u16;
            (Coord::new(x, y), tile)
        })
    }

    /// Iterate over all coordinates and mutable tiles in row-major order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Coord, &mut Tile)> {
        let width = usize::from(self.width);
        self.tiles.iter_mut().enumerate().map(move |(idx, tile)| {
            let x = (idx % width) as u16;
            let y = (idx / width) as u16;
            (Coord::new(x, y), tile)
        })
    }

    /// Tiles whose territory belongs to `player`.
    pub fn tiles_owned_by(&self, player: PlayerId) -> impl Iterator<Item = (Coord, &Tile)> {
        self.iter().filter(move |(_, tile)| tile.owner == Some(player))
    }

    /// Number of tiles owned by `player`.
    #[must_use]
    pub fn count_territory(&self, player: PlayerId) -> usize {
        self.tiles_owned_by(player).count()
    }

    /// Origin of the building covering `coord`, if any. O(1).
    #[must_use]
    pub fn occupant(&self, coord: Coord) -> Option<Coord> {
        self.index(coord).and_then(|idx| self.occupancy[idx])
    }

    /// Building covering `coord` (any footprint tile), with its origin.
    #[must_use]
    pub fn building_at(&self, coord: Coord) -> Option<(Coord, &Building)> {
        let origin = self.occupant(coord)?;
        self.get(origin)?.building.as_ref().map(|b| (origin, b))
    }

    /// Origin of a building.
    #[must_use]
    pub fn origin_of(&self, id: BuildingId) -> Option<Coord> {
        self.origins.get(&id).copied()
    }

    /// Building by id.
    #[must_use]
    pub fn building(&self, id: BuildingId) -> Option<&Building> {
        let origin = self.origin_of(id)?;
        self.get(origin)?.building.as_ref()
    }

    /// Mutable building by id.
    pub fn building_mut(&mut self, id: BuildingId) -> Option<&mut Building> {
        let origin = self.origin_of(id)?;
        self.get_mut(origin)?.building.as_mut()
    }

    /// Ids of all buildings, ascending (placement order).
    #[must_use]
    pub fn building_ids(&self) -> Vec<BuildingId> {
        self.origins.keys().copied().collect()
    }

    /// Number of buildings on the map.
    #[must_use]
    pub fn building_count(&self) -> usize {
        self.origins.len()
    }

    /// All buildings with their origins, in row-major order of the origin.
    pub fn buildings(&self) -> impl Iterator<Item = (Coord, &Building)> {
        self.iter()
            .filter_map(|(coord, tile)| tile.building.as_ref().map(|b| (coord, b)))
    }

    /// Whether `kind` placed at `origin` stays on the map.
    #[must_use]
    pub fn footprint_fits(&self, origin: Coord, kind: BuildingKind) -> bool {
        let (w, h) = kind.size();
        u32::from(origin.x) + u32::from(w) <= u32::from(self.width)
            && u32::from(origin.y) + u32::from(h) <= u32::from(self.height)
    }

    /// Footprint tiles of `kind` at `origin`, clipped to the map.
    pub fn footprint(&self, origin: Coord, kind: BuildingKind) -> impl Iterator<Item = Coord> {
        let (w, h) = kind.size();
        let (width, height) = (self.width, self.height);
        (0..h).flat_map(move |dy| {
            (0..w).filter_map(move |dx| {
                origin.offset(i32::from(dx), i32::from(dy), width, height)
            })
        })
    }

    /// Center of a footprint in continuous coordinates.
    #[must_use]
    pub fn footprint_center(origin: Coord, kind: BuildingKind) -> Position {
        let (w, h) = kind.size();
        Position::new(
            f32::from(origin.x) + f32::from(w) / 2.0,
            f32::from(origin.y) + f32::from(h) / 2.0,
        )
    }

    /// The ring of on-map tiles surrounding a footprint.
    ///
    /// Order: the row below (left to right), the column to the right
    /// (bottom to top), the row above (right to left), then the column to
    /// the left (top to bottom).
    #[must_use]
    pub fn surrounding(&self, origin: Coord, kind: BuildingKind) -> Vec<Coord> {
        let (w, h) = kind.size();
        let (w, h) = (i32::from(w), i32::from(h));
        let mut offsets = Vec::with_capacity(2 * (w + h) as usize + 4);
        for dx in -1..=w {
            offsets.push((dx, h));
        }
        for dy in (0..h).rev() {
            offsets.push((w, dy));
        }
        for dx in (-1..=w).rev() {
            offsets.push((dx, -1));
        }
        for dy in 0..h {
            offsets.push((-1, dy));
        }
        offsets
            .into_iter()
            .filter_map(|(dx, dy)| origin.offset(dx, dy, self.width, self.height))
            .collect()
    }

    /// Whether a footprint touches (8-neighbourhood) a tile providing `deposit`.
    #[must_use]
    pub fn touches(&self, origin: Coord, kind: BuildingKind, deposit: Deposit) -> bool {
        self.surrounding(origin, kind)
            .into_iter()
            .any(|c| self.get(c).is_some_and(|t| t.provides(deposit)))
    }

    /// Why a tile cannot take part in a new footprint, if it cannot.
    #[must_use]
    pub fn build_blocker(&self, coord: Coord) -> Option<BlockedReason> {
        let tile = self.get(coord)?;
        if self.occupant(coord).is_some() {
            Some(BlockedReason::Occupied)
        } else if tile.terrain == Terrain::Water {
            Some(BlockedReason::Water)
        } else if tile.terrain == Terrain::Mountain {
            Some(BlockedReason::Mountain)
        } else if tile.is_deposit() {
            Some(BlockedReason::Deposit)
        } else {
            None
        }
    }

    /// Write a new building at `origin` and claim its footprint for `owner`.
    ///
    /// Only checks that the footprint fits and is unoccupied; placement rules
    /// live in the command layer. Returns `None` if either check fails.
    pub fn place_building(
        &mut self,
        origin: Coord,
        kind: BuildingKind,
        owner: PlayerId,
    ) -> Option<BuildingId> {
        if !self.footprint_fits(origin, kind) {
            return None;
        }
        let cells: Vec<Coord> = self.footprint(origin, kind).collect();
        if cells.iter().any(|&c| self.occupant(c).is_some()) {
            return None;
        }

        let id = BuildingId(self.next_building_id);
        self.next_building_id += 1;
        for &cell in &cells {
            if let Some(idx) = self.index(cell) {
                self.occupancy[idx] = Some(origin);
                self.tiles[idx].owner = Some(owner);
            }
        }
        if let Some(idx) = self.index(origin) {
            self.tiles[idx].building = Some(Building::new(id, kind, owner));
        }
        self.origins.insert(id, origin);
        Some(id)
    }

    /// Remove a building, clearing its occupancy and footprint ownership.
    pub fn demolish(&mut self, id: BuildingId) -> Option<Building> {
        let origin = self.origins.remove(&id)?;
        let idx = self.index(origin)?;
        let building = self.tiles[idx].building.take()?;
        let cells: Vec<Coord> = self.footprint(origin, building.kind).collect();
        for cell in cells {
            if let Some(idx) = self.index(cell) {
                self.occupancy[idx] = None;
                self.tiles[idx].owner = None;
            }
        }
        Some(building)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_creation() {
        let map = Map::new(10, 12).unwrap();
        assert_eq!(map.width(), 10);
        assert_eq!(map.height(), 12);
        assert!(Map::new(0, 10).is_none());
        assert!(Map::new(10, 0).is_none());
    }

    #[test]
    fn test_map_bounds() {
        let map = Map::new(10, 10).unwrap();
        assert!(map.in_bounds(Coord::new(9, 9)));
        assert!(!map.in_bounds(Coord::new(10, 0)));
        assert!(map.get(Coord::new(0, 10)).is_none());
    }

    #[test]
    fn test_position_tile_and_center() {
        assert_eq!(Position::new(3.7, 1.2).tile(), Coord::new(3, 1));
        assert_eq!(Position::new(-0.5, 2.0).tile(), Coord::new(0, 2));
        assert_eq!(Coord::new(2, 5).center(), Position::new(2.5, 5.5));
    }

    #[test]
    fn test_place_building_fills_occupancy() {
        let mut map = Map::new(10, 10).unwrap();
        let id = map
            .place_building(Coord::new(2, 2), BuildingKind::Farm, 1)
            .unwrap();
        for (x, y) in [(2, 2), (3, 2), (2, 3), (3, 3)] {
            assert_eq!(map.occupant(Coord::new(x, y)), Some(Coord::new(2, 2)));
            assert_eq!(map.get(Coord::new(x, y)).unwrap().owner, Some(1));
        }
        assert_eq!(map.occupant(Coord::new(4, 2)), None);
        let (origin, building) = map.building_at(Coord::new(3, 3)).unwrap();
        assert_eq!(origin, Coord::new(2, 2));
        assert_eq!(building.id, id);
        assert!(!building.is_complete());
    }

    #[test]
    fn test_place_building_rejects_overlap_and_overflow() {
        let mut map = Map::new(10, 10).unwrap();
        map.place_building(Coord::new(2, 2), BuildingKind::Farm, 1)
            .unwrap();
        assert!(
            map.place_building(Coord::new(3, 3), BuildingKind::House, 2)
                .is_none()
        );
        assert!(
            map.place_building(Coord::new(8, 8), BuildingKind::CityCenter, 1)
                .is_none()
        );
    }

    #[test]
    fn test_demolish_clears_indices() {
        let mut map = Map::new(10, 10).unwrap();
        let id = map
            .place_building(Coord::new(4, 4), BuildingKind::CityCenter, 1)
            .unwrap();
        let removed = map.demolish(id).unwrap();
        assert_eq!(removed.kind, BuildingKind::CityCenter);
        assert!(map.building(id).is_none());
        assert_eq!(map.occupant(Coord::new(5, 5)), None);
        assert_eq!(map.get(Coord::new(6, 6)).unwrap().owner, None);
        assert_eq!(map.building_count(), 0);
        assert!(map.demolish(id).is_none());
    }

    #[test]
    fn test_surrounding_starts_below() {
        let map = Map::new(10, 10).unwrap();
        let ring = map.surrounding(Coord::new(4, 4), BuildingKind::House);
        assert_eq!(ring.len(), 8);
        assert_eq!(ring[0], Coord::new(3, 5));
        assert!(!ring.contains(&Coord::new(4, 4)));
    }

    #[test]
    fn test_surrounding_clips_at_edges() {
        let map = Map::new(10, 10).unwrap();
        let ring = map.surrounding(Coord::new(0, 0), BuildingKind::House);
        assert_eq!(ring.len(), 3);
    }

    #[test]
    fn test_touches_forest_diagonally() {
        let mut map = Map::new(10, 10).unwrap();
        map.set(Coord::new(5, 5), Tile::forest(80));
        assert!(map.touches(Coord::new(4, 4), BuildingKind::WoodcuttersCamp, Deposit::Forest));
        assert!(!map.touches(Coord::new(2, 2), BuildingKind::WoodcuttersCamp, Deposit::Forest));
    }

    #[test]
    fn test_build_blocker() {
        let mut map = Map::new(10, 10).unwrap();
        map.set(Coord::new(1, 1), Tile::water());
        map.set(Coord::new(2, 1), Tile::mountain());
        map.set(Coord::new(3, 1), Tile::metal());
        assert_eq!(map.build_blocker(Coord::new(1, 1)), Some(BlockedReason::Water));
        assert_eq!(map.build_blocker(Coord::new(2, 1)), Some(BlockedReason::Mountain));
        assert_eq!(map.build_blocker(Coord::new(3, 1)), Some(BlockedReason::Deposit));
        assert_eq!(map.build_blocker(Coord::new(4, 1)), None);
    }

    #[test]
    fn test_set_keeps_building() {
        let mut map = Map::new(10, 10).unwrap();
        map.place_building(Coord::new(1, 1), BuildingKind::House, 1)
            .unwrap();
        map.set(Coord::new(1, 1), Tile::grass());
        assert!(map.get(Coord::new(1, 1)).unwrap().building.is_some());
    }
}
