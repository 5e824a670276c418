//! Condensed, player-scoped view of the world.
//!
//! A [`PlayerView`] is everything one player is allowed to know: its own
//! economy, buildings and units in full, plus whatever enemy buildings,
//! enemy units and resource sites lie within sight. Scripted opponents and
//! external clients read the game only through this view.

mod text;

pub use text::render_llm;

use serde::Serialize;

use crate::game::{
    Age, BuildingKind, Coord, Deposit, GameState, Map, PlayerId, Position, Resources, UnitKind,
    UnitTask, WorkerCensus,
};

/// Sight radius of a unit, in tiles.
pub const UNIT_SIGHT: f32 = 6.0;

/// Sight radius of a building, measured from its footprint center.
pub const BUILDING_SIGHT: f32 = 8.0;

/// Radius around own buildings within which enemy soldiers count as an attack.
pub const DEFENSE_RADIUS: f32 = 10.0;

/// The capturing player's economy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EconomyView {
    /// Player id.
    pub id: PlayerId,
    /// Display name.
    pub name: String,
    /// Current age.
    pub age: Age,
    /// Stockpile.
    pub resources: Resources,
    /// Income per tick.
    pub rates: Resources,
    /// Stockpile cap.
    pub storage_cap: Resources,
    /// Live units.
    pub population: u32,
    /// Population cap.
    pub population_cap: u32,
    /// Units waiting in production queues.
    pub queued: u32,
    /// Cost of the next age, if any.
    pub next_age_cost: Option<Resources>,
}

/// Public information about another player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RivalView {
    /// Player id.
    pub id: PlayerId,
    /// Display name.
    pub name: String,
    /// Current age, known only while one of their buildings is in sight.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<Age>,
    /// Whether the player is out.
    pub defeated: bool,
}

/// One of the capturing player's buildings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OwnBuildingView {
    /// Building id number.
    pub id: u32,
    /// Kind.
    pub kind: BuildingKind,
    /// Footprint origin column.
    pub x: u16,
    /// Footprint origin row.
    pub y: u16,
    /// Current health.
    pub health: f32,
    /// Maximum health.
    pub max_health: f32,
    /// Construction progress in `[0, 100]`.
    pub progress: f32,
    /// Production queue, head first.
    pub queue: Vec<UnitKind>,
    /// Gatherers assigned.
    pub workers: u32,
    /// Gatherer capacity.
    pub capacity: u32,
}

/// One of the capturing player's units.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OwnUnitView {
    /// Id as accepted by the command API (`unit-12`).
    pub id: String,
    /// Kind.
    pub kind: UnitKind,
    /// Position.
    pub position: Position,
    /// Current health.
    pub health: f32,
    /// Current task.
    pub task: UnitTask,
    /// Whether the unit is walking.
    pub moving: bool,
}

/// An enemy building within sight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EnemyBuildingView {
    /// Owner.
    pub owner: PlayerId,
    /// Kind.
    pub kind: BuildingKind,
    /// Footprint origin column.
    pub x: u16,
    /// Footprint origin row.
    pub y: u16,
    /// Current health.
    pub health: f32,
}

/// An enemy unit within sight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EnemyUnitView {
    /// Owner.
    pub owner: PlayerId,
    /// Kind.
    pub kind: UnitKind,
    /// Position.
    pub position: Position,
    /// Current health.
    pub health: f32,
}

/// A resource tile within sight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResourceSite {
    /// Column.
    pub x: u16,
    /// Row.
    pub y: u16,
    /// What the tile offers.
    pub deposit: Deposit,
    /// Whether the tile is a fishing spot.
    pub fishing_spot: bool,
}

/// How worried the player should be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreatLevel {
    /// No enemy soldiers in sight.
    None,
    /// Enemy soldiers in sight, but fewer than ours.
    Low,
    /// Enemy soldiers in sight matching or outnumbering ours.
    High,
}

/// Derived summary of the situation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assessment {
    /// Citizens and fishing boats doing nothing.
    pub idle_workers: u32,
    /// Own soldiers.
    pub military_units: u32,
    /// Enemy soldiers in sight.
    pub visible_enemy_military: u32,
    /// Sum of attack over own soldiers.
    pub army_strength: f32,
    /// Sum of attack over visible enemy soldiers.
    pub visible_enemy_strength: f32,
    /// Threat level.
    pub threat: ThreatLevel,
    /// Enemy soldiers close to one of our buildings.
    pub under_attack: bool,
    /// Population slots left, counting queued units.
    pub housing_headroom: u32,
    /// Resource with the lowest stockpile.
    pub scarcest: crate::game::Resource,
    /// Whether the next age is affordable now.
    pub can_advance: bool,
    /// Short advice lines.
    pub advice: Vec<String>,
}

/// Everything one player can see.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerView {
    /// Tick of the capture.
    pub tick: u64,
    /// Map width.
    pub width: u16,
    /// Map height.
    pub height: u16,
    /// Whether the game has ended.
    pub game_over: bool,
    /// Own economy.
    pub economy: EconomyView,
    /// Other players.
    pub rivals: Vec<RivalView>,
    /// Own buildings, row-major.
    pub buildings: Vec<OwnBuildingView>,
    /// Own live units, in creation order.
    pub units: Vec<OwnUnitView>,
    /// Enemy buildings within sight.
    pub enemy_buildings: Vec<EnemyBuildingView>,
    /// Enemy units within sight.
    pub enemy_units: Vec<EnemyUnitView>,
    /// Resource tiles within sight.
    pub resource_sites: Vec<ResourceSite>,
    /// Tiles within sight.
    pub visible_tiles: usize,
    /// Tiles owned.
    pub territory: usize,
    /// Situation summary.
    pub assessment: Assessment,
}

/// Per-tile visibility for one player.
#[derive(Debug, Clone)]
struct Sight {
    width: u16,
    visible: Vec<bool>,
}

impl Sight {
    fn compute(state: &GameState, player: PlayerId) -> Self {
        let map = &state.map;
        let mut sight = Self {
            width: map.width(),
            visible: vec![false; usize::from(map.width()) * usize::from(map.height())],
        };
        for unit in state.units_of(player) {
            sight.reveal(map, unit.position, UNIT_SIGHT);
        }
        for (origin, building) in map.buildings().filter(|(_, b)| b.owner == player) {
            sight.reveal(map, Map::footprint_center(origin, building.kind), BUILDING_SIGHT);
        }
        sight
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn reveal(&mut self, map: &Map, from: Position, radius: f32) {
        let center = from.tile();
        let r = radius.ceil() as i32;
        for dy in -r..=r {
            for dx in -r..=r {
                let Some(coord) = center.offset(dx, dy, map.width(), map.height()) else {
                    continue;
                };
                if coord.center().distance(from) <= radius {
                    let idx = usize::from(coord.y) * usize::from(self.width) + usize::from(coord.x);
                    self.visible[idx] = true;
                }
            }
        }
    }

    fn sees(&self, coord: Coord) -> bool {
        let idx = usize::from(coord.y) * usize::from(self.width) + usize::from(coord.x);
        self.visible.get(idx).copied().unwrap_or(false)
    }

    fn count(&self) -> usize {
        self.visible.iter().filter(|v| **v).count()
    }
}

impl PlayerView {
    /// Capture what `player` can see. Returns `None` for an unknown player.
    #[must_use]
    pub fn capture(state: &GameState, player: PlayerId) -> Option<Self> {
        let owner = state.player(player)?;
        let map = &state.map;
        let sight = Sight::compute(state, player);
        let census = WorkerCensus::take(&state.units);
        let queued = state.queued_units(player);

        let economy = EconomyView {
            id: owner.id,
            name: owner.name.clone(),
            age: owner.age,
            resources: owner.resources,
            rates: owner.rates,
            storage_cap: owner.storage_cap,
            population: owner.population,
            population_cap: owner.population_cap,
            queued,
            next_age_cost: owner.age.advance_cost(),
        };


        let mut buildings = Vec::new();
        let mut enemy_buildings = Vec::new();
        for (origin, building) in map.buildings() {
            if building.owner == player {
                buildings.push(OwnBuildingView {
                    id: building.id.0,
                    kind: building.kind,
                    x: origin.x,
                    y: origin.y,
                    health: building.health,
                    max_health: building.max_health,
                    progress: building.progress,
                    queue: building.queue.iter().copied().collect(),
                    workers: census.assigned(building.id),
                    capacity: building.kind.stats().worker_capacity,
                });
            } else if map.footprint(origin, building.kind).any(|c| sight.sees(c)) {
                enemy_buildings.push(EnemyBuildingView {
                    owner: building.owner,
                    kind: building.kind,
                    x: origin.x,
                    y: origin.y,
                    health: building.health,
                });
            }
        }

        let rivals = state
            .players
            .iter()
            .filter(|p| p.id != player)
            .map(|p| RivalView {
                id: p.id,
                name: p.name.clone(),
                age: enemy_buildings
                    .iter()
                    .any(|b| b.owner == p.id)
                    .then_some(p.age),
                defeated: p.defeated,
            })
            .collect();

        let units: Vec<OwnUnitView> = state
            .units_of(player)
            .map(|u| OwnUnitView {
                id: u.id.to_string(),
                kind: u.kind,
                position: u.position,
                health: u.health,
                task: u.task,
                moving: u.moving,
            })
            .collect();

        let enemy_units: Vec<EnemyUnitView> = state
            .units
            .iter()
            .filter(|u| u.owner != player && u.is_alive() && sight.sees(u.position.tile()))
            .map(|u| EnemyUnitView {
                owner: u.owner,
                kind: u.kind,
                position: u.position,
                health: u.health,
            })
            .collect();

        let resource_sites = map
            .iter()
            .filter(|(coord, _)| sight.sees(*coord))
            .filter_map(|(coord, tile)| {
                let deposit = [Deposit::Forest, Deposit::Metal, Deposit::Oil]
                    .into_iter()
                    .find(|d| tile.provides(*d))
                    .or(tile.has_fishing_spot.then_some(Deposit::Water))?;
                Some(ResourceSite {
                    x: coord.x,
                    y: coord.y,
                    deposit,
                    fishing_spot: tile.has_fishing_spot,
                })
            })
            .collect();

        let assessment = assess(state, player, &economy, &units, &enemy_units);

        Some(Self {
            tick: state.tick(),
            width: map.width(),
            height: map.height(),
            game_over: state.game_over,
            economy,
            rivals,
            buildings,
            units,
            enemy_buildings,
            enemy_units,
            resource_sites,
            visible_tiles: sight.count(),
            territory: map.count_territory(player),
            assessment,
        })
    }

    /// Own units whose task is idle and that are not walking.
    pub fn idle_units(&self) -> impl Iterator<Item = &OwnUnitView> {
        self.units
            .iter()
            .filter(|u| !u.moving && u.task == UnitTask::Idle)
    }

    /// Own buildings of `kind`.
    pub fn buildings_of(&self, kind: BuildingKind) -> impl Iterator<Item = &OwnBuildingView> {
        self.buildings.iter().filter(move |b| b.kind == kind)
    }
}

fn assess(
    state: &GameState,
    player: PlayerId,
    economy: &EconomyView,
    units: &[OwnUnitView],
    enemy_units: &[EnemyUnitView],
) -> Assessment {
    let idle_workers = units
        .iter()
        .filter(|u| u.kind.is_worker() && !u.moving && u.task == UnitTask::Idle)
        .count();
    let own_military: Vec<&OwnUnitView> = units.iter().filter(|u| u.kind.is_military()).collect();
    let enemy_military: Vec<&EnemyUnitView> =
        enemy_units.iter().filter(|u| u.kind.is_military()).collect();
    let army_strength: f32 = state
        .units_of(player)
        .filter(|u| u.is_military())
        .map(|u| u.attack)
        .sum();
    let visible_enemy_strength: f32 = enemy_military.iter().map(|u| u.kind.stats().attack).sum();

    let threat = if enemy_military.is_empty() {
        ThreatLevel::None
    } else if enemy_military.len() < own_military.len() {
        ThreatLevel::Low
    } else {
        ThreatLevel::High
    };
    let under_attack = state
        .map
        .buildings()
        .filter(|(_, b)| b.owner == player)
        .any(|(origin, b)| {
            let center = Map::footprint_center(origin, b.kind);
            enemy_military
                .iter()
                .any(|u| u.position.distance(center) <= DEFENSE_RADIUS)
        });

    let used = economy.population + economy.queued;
    let housing_headroom = economy.population_cap.saturating_sub(used);
    let scarcest = [
        crate::game::Resource::Food,
        crate::game::Resource::Wood,
        crate::game::Resource::Metal,
        crate::game::Resource::Gold,
    ]
    .into_iter()
    .min_by(|a, b| economy.resources.get(*a).total_cmp(&economy.resources.get(*b)))
    .unwrap_or(crate::game::Resource::Food);
    let can_advance = economy
        .next_age_cost
        .is_some_and(|cost| economy.resources.covers(&cost));

    let mut advice = Vec::new();
    if under_attack {
        advice.push("Enemy soldiers are near your buildings; gather your army".to_string());
    }
    if idle_workers > 0 {
        advice.push(format!("{idle_workers} worker(s) idle; assign them to gather"));
    }
    if housing_headroom == 0 {
        advice.push("Population capped; build houses".to_string());
    }
    if can_advance {
        advice.push(format!(
            "You can afford to advance from the {} age",
            economy.age
        ));
    }
    if threat == ThreatLevel::High && !under_attack {
        advice.push("Enemy army in sight outnumbers yours; train soldiers".to_string());
    }

    Assessment {
        idle_workers: u32::try_from(idle_workers).unwrap_or(u32::MAX),
        military_units: u32::try_from(own_military.len()).unwrap_or(u32::MAX),
        visible_enemy_military: u32::try_from(enemy_military.len()).unwrap_or(u32::MAX),
        army_strength,
        visible_enemy_strength,
        threat,
        under_attack,
        housing_headroom,
        scarcest,
        can_advance,
        advice,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Player, Tile};

    fn game() -> GameState {
        let map = Map::new(40, 40).unwrap();
        let players = vec![Player::human(1, "Alice"), Player::scripted(2, "Bot")];
        let mut state = GameState::new(map, players);
        for p in &mut state.players {
            p.resources = Resources::splat(900.0);
        }
        state.place_building(1, BuildingKind::CityCenter, 2, 2).unwrap();
        state.place_building(2, BuildingKind::CityCenter, 34, 34).unwrap();
        state
    }

    #[test]
    fn test_capture_unknown_player() {
        assert!(PlayerView::capture(&game(), 9).is_none());
    }

    #[test]
    fn test_distant_enemy_hidden() {
        let state = game();
        let view = PlayerView::capture(&state, 1).unwrap();
        assert_eq!(view.buildings.len(), 1);
        assert!(view.enemy_buildings.is_empty());
        assert_eq!(view.rivals.len(), 1);
        assert!(view.visible_tiles > 0);
        assert!(view.visible_tiles < 40 * 40);
    }

    #[test]
    fn test_scout_reveals_enemy() {
        let mut state = game();
        state.spawn_unit(UnitKind::Cavalry, 1, Position::new(31.5, 31.5));
        state.spawn_unit(UnitKind::Infantry, 2, Position::new(33.5, 31.5));
        let view = PlayerView::capture(&state, 1).unwrap();
        assert_eq!(view.enemy_buildings.len(), 1);
        assert_eq!(view.enemy_buildings[0].kind, BuildingKind::CityCenter);
        assert_eq!(view.enemy_units.len(), 1);
        assert_eq!(view.assessment.threat, ThreatLevel::High);
        assert_eq!(view.rivals[0].age, Some(Age::Classical));
    }

    #[test]
    fn test_rival_age_hidden_out_of_sight() {
        let mut state = game();
        state.players[1].age = Age::Industrial;
        state.spawn_unit(UnitKind::Infantry, 2, Position::new(20.5, 20.5));
        let view = PlayerView::capture(&state, 1).unwrap();
        assert!(view.enemy_buildings.is_empty());
        assert_eq!(view.rivals[0].id, 2);
        assert_eq!(view.rivals[0].age, None);
        let json = serde_json::to_string(&view).unwrap();
        assert!(!json.contains("industrial"), "{json}");

        state.spawn_unit(UnitKind::Cavalry, 1, Position::new(31.5, 31.5));
        let view = PlayerView::capture(&state, 1).unwrap();
        assert_eq!(view.rivals[0].age, Some(Age::Industrial));
    }

    #[test]
    fn test_resource_sites_within_sight() {
        let mut state = game();
        state.map.set(Coord::new(5, 9), Tile::forest(50));
        state.map.set(Coord::new(30, 5), Tile::metal());
        let view = PlayerView::capture(&state, 1).unwrap();
        assert!(view
            .resource_sites
            .iter()
            .any(|s| s.x == 5 && s.y == 9 && s.deposit == Deposit::Forest));
        assert!(!view.resource_sites.iter().any(|s| s.x == 30));
    }

    #[test]
    fn test_assessment_idle_workers_and_attack() {
        let mut state = game();
        state.spawn_unit(UnitKind::Citizen, 1, Position::new(6.5, 6.5));
        state.spawn_unit(UnitKind::Infantry, 2, Position::new(8.5, 8.5));
        let view = PlayerView::capture(&state, 1).unwrap();
        assert_eq!(view.assessment.idle_workers, 1);
        assert!(view.assessment.under_attack);
        assert!(!view.assessment.advice.is_empty());
        assert_eq!(view.idle_units().count(), 1);
    }

    #[test]
    fn test_view_serializes() {
        let view = PlayerView::capture(&game(), 1).unwrap();
        let json = serde_json::to_string(&view).unwrap();
        assert!(json.contains("\"economy\""));
        assert!(json.contains("city_center"));
    }
}
