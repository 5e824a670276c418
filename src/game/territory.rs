//! Territory: the per-tick spatial index of city centers and the nearest-center
//! ownership resolver.
//!
//! The index is extracted once per refresh so resolving every tile costs
//! `tiles x centers`, not `tiles x tiles`.

use crate::game::{Coord, Map, PlayerId, Position};

/// Radius, in tiles, of the territory around every city-center-class building.
pub const TERRITORY_RADIUS: f32 = 8.0;

/// A territory-defining building reduced to what the resolver needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CityCenterRecord {
    /// Center of the building footprint.
    pub center: Position,
    /// Owner of the building.
    pub owner: PlayerId,
}

/// City-center-class buildings extracted from the map in row-major order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpatialIndex {
    centers: Vec<CityCenterRecord>,
}

impl SpatialIndex {
    /// Extract every city-center-class building, complete or not.
    #[must_use]
    pub fn build(map: &Map) -> Self {
        let centers = map
            .buildings()
            .filter(|(_, b)| b.kind.defines_territory())
            .map(|(origin, b)| CityCenterRecord {
                center: Map::footprint_center(origin, b.kind),
                owner: b.owner,
            })
            .collect();
        Self { centers }
    }

    /// The extracted records.
    #[must_use]
    pub fn centers(&self) -> &[CityCenterRecord] {
        &self.centers
    }

    /// Resolve the owner of one tile against this index.
    #[must_use]
    pub fn owner_of(&self, coord: Coord) -> Option<PlayerId> {
        resolve_owner(coord, &self.centers)
    }
}

/// Owner of the nearest center within [`TERRITORY_RADIUS`] of the tile center.
///
/// Ties go to the first record.
#[must_use]
pub fn resolve_owner(coord: Coord, centers: &[CityCenterRecord]) -> Option<PlayerId> {
    let point = coord.center();
    let mut best: Option<(f32, PlayerId)> = None;
    for record in centers {
        let distance = point.distance(record.center);
        if distance > TERRITORY_RADIUS {
            continue;
        }
        if best.is_none_or(|(best_distance, _)| distance < best_distance) {
            best = Some((distance, record.owner));
        }
    }
    best.map(|(_, owner)| owner)
}

/// Rewrite every tile's owner.
///
/// Tiles covered by a building keep the building's owner; all other tiles get
/// the resolved territory owner.
pub fn refresh_territory(map: &mut Map) {
    let index = SpatialIndex::build(map);
    let owners: Vec<Option<PlayerId>> = map
        .iter()
        .map(|(coord, _)| match map.building_at(coord) {
            Some((_, building)) => Some(building.owner),
            None => index.owner_of(coord),
        })
        .collect();
    for ((_, tile), owner) in map.iter_mut().zip(owners) {
        tile.owner = owner;
    }
}
