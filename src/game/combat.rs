//! Combat rules: reach, range and damage.
//!
//! Siege engines wreck buildings, archers barely scratch them. Land melee
//! units cannot fight ships at all.

use crate::game::{BuildingKind, CombatClass, Coord, Map, Position, UnitKind};

/// Damage multiplier against buildings for a siege attacker.
pub const SIEGE_VS_BUILDING: f32 = 3.0;

/// Damage multiplier against buildings for a melee attacker.
pub const MELEE_VS_BUILDING: f32 = 1.0;

/// Damage multiplier against buildings for a ranged attacker.
pub const RANGED_VS_BUILDING: f32 = 0.5;

/// Multiplier applied to a unit's attack when it hits a building.
#[must_use]
pub const fn building_damage_multiplier(class: CombatClass) -> f32 {
    match class {
        CombatClass::Siege => SIEGE_VS_BUILDING,
        CombatClass::Melee | CombatClass::Civilian => MELEE_VS_BUILDING,
        CombatClass::Ranged => RANGED_VS_BUILDING,
    }
}

/// Damage dealt by one hit of `attack` from `kind` against a building.
#[must_use]
pub fn building_damage(kind: UnitKind, attack: f32) -> f32 {
    attack * building_damage_multiplier(kind.stats().class)
}

/// Whether `attacker` can ever hit `target`.
///
/// Units without attack never engage. Land units without range cannot reach ships.
#[must_use]
pub fn can_engage(attacker: UnitKind, target: UnitKind) -> bool {
    let stats = attacker.stats();
    if stats.attack <= 0.0 {
        return false;
    }
    let melee = matches!(stats.class, CombatClass::Melee | CombatClass::Civilian);
    !(melee && !stats.naval && target.is_naval())
}

/// Distance from `position` to the nearest point of a footprint.
#[must_use]
pub fn distance_to_footprint(position: Position, origin: Coord, kind: BuildingKind) -> f32 {
    let (w, h) = kind.size();
    let min_x = f32::from(origin.x);
    let min_y = f32::from(origin.y);
    let max_x = min_x + f32::from(w);
    let max_y = min_y + f32::from(h);
    let dx = (min_x - position.x).max(0.0).max(position.x - max_x);
    let dy = (min_y - position.y).max(0.0).max(position.y - max_y);
    dx.hypot(dy)
}

/// Whether a building is within weapon `range` of `position`.
#[must_use]
pub fn building_in_range(map: &Map, position: Position, origin: Coord, range: f32) -> bool {
    map.get(origin)
        .and_then(|t| t.building.as_ref())
        .is_some_and(|b| distance_to_footprint(position, origin, b.kind) <= range)
}

/// Kani formal verification proofs.
///
/// Run with: `cargo kani`
#[cfg(kani)]
mod kani_proofs {
    use super::*;

    /// Every combat class hits buildings for a positive multiple of its attack.
    #[kani::proof]
    fn prove_building_multiplier_positive() {
        let class = match kani::any::<u8>() % 4 {
            0 => CombatClass::Civilian,
            1 => CombatClass::Melee,
            2 => CombatClass::Ranged,
            _ => CombatClass::Siege,
        };
        assert!(building_damage_multiplier(class) > 0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_building_multipliers() {
        assert!((building_damage(UnitKind::Catapult, 10.0) - 30.0).abs() < 1e-6);
        assert!((building_damage(UnitKind::Infantry, 10.0) - 10.0).abs() < 1e-6);
        assert!((building_damage(UnitKind::Archer, 10.0) - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_land_melee_cannot_reach_ships() {
        assert!(!can_engage(UnitKind::Infantry, UnitKind::Galley));
        assert!(!can_engage(UnitKind::Cavalry, UnitKind::FishingBoat));
        assert!(can_engage(UnitKind::Archer, UnitKind::Galley));
        assert!(can_engage(UnitKind::Galley, UnitKind::Infantry));
        assert!(can_engage(UnitKind::Infantry, UnitKind::Citizen));
    }

    #[test]
    fn test_units_without_attack_never_engage() {
        assert!(!can_engage(UnitKind::FishingBoat, UnitKind::Galley));
    }

    #[test]
    fn test_distance_to_footprint() {
        let origin = Coord::new(4, 4);
        let kind = BuildingKind::Farm;
        assert!(distance_to_footprint(Position::new(5.0, 5.0), origin, kind).abs() < 1e-6);
        assert!((distance_to_footprint(Position::new(3.5, 4.5), origin, kind) - 0.5).abs() < 1e-6);
        assert!((distance_to_footprint(Position::new(9.0, 5.0), origin, kind) - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_building_in_range() {
        let mut map = Map::new(10, 10).unwrap();
        map.place_building(Coord::new(4, 4), BuildingKind::House, 1).unwrap();
        assert!(building_in_range(&map, Position::new(3.5, 4.5), Coord::new(4, 4), 1.0));
        assert!(!building_in_range(&map, Position::new(0.5, 0.5), Coord::new(4, 4), 1.0));
        assert!(!building_in_range(&map, Position::new(0.5, 0.5), Coord::new(0, 0), 10.0));
    }
}
