//! Priority-driven scripted opponent.
//!
//! The opponent sees the game only through a [`PlayerView`] and acts only by
//! submitting [`Command`]s, exactly like an external client would. Each turn
//! it works down a fixed list of priorities:
//!
//! 1. advance the age when affordable and the economy is established
//! 2. send every soldier at enemies threatening its buildings
//! 3. put idle workers on construction sites, then on gathering
//! 4. place at most one new building
//! 5. queue citizens, soldiers and boats
//! 6. attack once enough soldiers stand idle

use std::collections::HashSet;

use log::trace;

use crate::export::{OwnBuildingView, OwnUnitView, PlayerView};
use crate::game::{
    BuildingKind, Command, CommandOutcome, Coord, Deposit, PlayerId, Position, Resources, Rng,
    UnitKind,
};

/// Citizens the opponent trains before it stops.
pub const TARGET_CITIZENS: usize = 14;

/// Citizens needed before soldiers are trained.
pub const MILITARY_THRESHOLD: usize = 6;

/// Citizens needed before the opponent spends on an age advance.
pub const ADVANCE_THRESHOLD: usize = 8;

/// Idle soldiers needed to launch an attack.
pub const ATTACK_GROUP: usize = 8;

/// Fishing boats the opponent keeps.
pub const TARGET_BOATS: usize = 2;

/// Placement attempts per turn.
pub const MAX_PLACEMENT_ATTEMPTS: usize = 24;

/// Production queue length the opponent fills each building to.
const QUEUE_TARGET: usize = 2;

/// Headroom below which a house is wanted.
const HOUSING_MARGIN: u32 = 2;

/// Farthest ring searched around the city center.
const MAX_SPIRAL_RADIUS: i32 = 7;

/// A scripted player.
#[derive(Debug, Clone, Copy)]
pub struct ScriptedOpponent {
    player: PlayerId,
    rng: Rng,
}

/// What one turn needs to know beyond the view.
struct Turn<'a> {
    view: &'a PlayerView,
    home: Position,
    budget: Resources,
    headroom: u32,
    busy: HashSet<&'a str>,
}

impl<'a> Turn<'a> {
    fn affordable(&self, cost: &Resources) -> bool {
        self.budget.covers(cost)
    }

    fn idle(&self) -> impl Iterator<Item = &'a OwnUnitView> + '_ {
        self.view
            .idle_units()
            .filter(|u| !self.busy.contains(u.id.as_str()))
    }

    fn count(&self, kind: BuildingKind) -> usize {
        self.view.buildings_of(kind).count()
    }

    fn units(&self, kind: UnitKind) -> usize {
        let alive = self.view.units.iter().filter(|u| u.kind == kind).count();
        let queued: usize = self
            .view
            .buildings
            .iter()
            .map(|b| b.queue.iter().filter(|k| **k == kind).count())
            .sum();
        alive + queued
    }
}

impl ScriptedOpponent {
    /// Create an opponent for `player`. Its placement jitter is drawn from `seed`.
    #[must_use]
    pub fn new(player: PlayerId, seed: u64) -> Self {
        Self {
            player,
            rng: Rng::new(seed ^ u64::from(player).wrapping_mul(0x9E37_79B9_7F4A_7C15)),
        }
    }

    /// The player this opponent drives.
    #[must_use]
    pub const fn player(&self) -> PlayerId {
        self.player
    }

    /// Decide and submit this turn's commands.
    ///
    /// `submit` applies one command to the game and reports the outcome.
    pub fn take_turn(
        &mut self,
        view: &PlayerView,
        mut submit: impl FnMut(Command) -> CommandOutcome,
    ) {
        if view.game_over {
            return;
        }
        let Some(home) = home_of(view) else {
            return;
        };
        let mut turn = Turn {
            view,
            home: home.center(),
            budget: view.economy.resources,
            headroom: view.assessment.housing_headroom,
            busy: HashSet::new(),
        };

        advance(&mut turn, &mut submit);
        defend(&mut turn, &mut submit);
        assign_workers(&mut turn, &mut submit);
        self.place(&mut turn, &mut submit);
        train(&mut turn, &mut submit);
        attack(&mut turn, &mut submit);
    }

    fn place(&mut self, turn: &mut Turn<'_>, submit: &mut impl FnMut(Command) -> CommandOutcome) {
        if turn.view.buildings.iter().any(|b| b.progress < 100.0) {
            return;
        }
        let Some(kind) = wanted_building(turn) else {
            return;
        };
        let cost = kind.stats().cost;
        if !turn.affordable(&cost) {
            return;
        }
        let blocked = known_blockers(turn.view);
        let (width, height) = (turn.view.width, turn.view.height);
        let candidates = match kind.stats().deposit {
            Some(deposit) => deposit_candidates(turn, kind, deposit),
            None => self.spiral_candidates(turn, kind),
        };
        let fits = |&(x, y): &(u16, u16)| {
            let (w, h) = kind.size();
            let inside = u32::from(x) + u32::from(w) <= u32::from(width)
                && u32::from(y) + u32::from(h) <= u32::from(height);
            inside && (0..w).all(|dx| (0..h).all(|dy| !blocked.contains(&(x + dx, y + dy))))
        };
        for (x, y) in candidates
            .into_iter()
            .filter(fits)
            .take(MAX_PLACEMENT_ATTEMPTS)
        {
            let outcome = submit(Command::PlaceBuilding { building: kind, x, y });
            if outcome.success {
                turn.budget.subtract(&cost);
                return;
            }
            trace!(
                "player {} could not place {kind} at ({x}, {y}): {}",
                self.player, outcome.message
            );
        }
    }

    /// Origins on square rings around the home center, each ring entered at
    /// a random point.
    fn spiral_candidates(&mut self, turn: &Turn<'_>, kind: BuildingKind) -> Vec<(u16, u16)> {
        let center = turn.home.tile();
        let (w, h) = kind.size();
        let mut out = Vec::new();
        for r in 2..=MAX_SPIRAL_RADIUS {
            let mut ring: Vec<(i32, i32)> = Vec::new();
            for d in -r..r {
                ring.push((d, -r));
                ring.push((r, d));
                ring.push((-d, r));
                ring.push((-r, -d));
            }
            let len = u32::try_from(ring.len()).unwrap_or(u32::MAX);
            let start = usize::try_from(self.rng.next_u32(len)).unwrap_or(0);
            let ring_len = ring.len();
            ring.rotate_left(start.min(ring_len));
            out.extend(ring.into_iter().filter_map(|(dx, dy)| {
                let x = i32::from(center.x) + dx - i32::from(w / 2);
                let y = i32::from(center.y) + dy - i32::from(h / 2);
                Some((u16::try_from(x).ok()?, u16::try_from(y).ok()?))
            }));
        }
        out
    }
}

fn home_of(view: &PlayerView) -> Option<Coord> {
    let home = view
        .buildings_of(BuildingKind::CityCenter)
        .next()
        .or_else(|| view.buildings.first())?;
    let (w, h) = home.kind.size();
    Some(Coord::new(home.x + w / 2, home.y + h / 2))
}

fn ids<'a>(units: impl IntoIterator<Item = &'a OwnUnitView>) -> Vec<String> {
    units.into_iter().map(|u| u.id.clone()).collect()
}

fn advance(turn: &mut Turn<'_>, submit: &mut impl FnMut(Command) -> CommandOutcome) {
    let Some(cost) = turn.view.economy.next_age_cost else {
        return;
    };
    if turn.units(UnitKind::Citizen) < ADVANCE_THRESHOLD || !turn.affordable(&cost) {
        return;
    }
    if submit(Command::AdvanceAge).success {
        turn.budget.subtract(&cost);
    }
}

fn defend(turn: &mut Turn<'_>, submit: &mut impl FnMut(Command) -> CommandOutcome) {
    if !turn.view.assessment.under_attack {
        return;
    }
    let view = turn.view;
    let home = turn.home;
    let Some(threat) = view
        .enemy_units
        .iter()
        .filter(|u| u.kind.is_military())
        .min_by(|a, b| a.position.distance(home).total_cmp(&b.position.distance(home)))
    else {
        return;
    };
    let soldiers: Vec<&OwnUnitView> = view
        .units
        .iter()
        .filter(|u| u.kind.is_military())
        .collect();
    if soldiers.is_empty() {
        return;
    }
    let tile = threat.position.tile();
    let outcome = submit(Command::SendUnits {
        unit_ids: ids(soldiers.iter().copied()),
        x: tile.x,
        y: tile.y,
        task: "attack".to_string(),
    });
    if outcome.success {
        turn.busy.extend(soldiers.iter().map(|u| u.id.as_str()));
    }
}

fn assign_workers(turn: &mut Turn<'_>, submit: &mut impl FnMut(Command) -> CommandOutcome) {
    let view = turn.view;
    let sites: Vec<&OwnBuildingView> = view
        .buildings
        .iter()
        .filter(|b| b.progress < 100.0)
        .collect();
    let scarcest = view.assessment.scarcest;
    let mut slots: Vec<(&OwnBuildingView, u32)> = view
        .buildings
        .iter()
        .filter(|b| b.progress >= 100.0 && b.kind.stats().produces.is_some())
        .map(|b| (b, b.capacity.saturating_sub(b.workers)))
        .filter(|(_, free)| *free > 0)
        .collect();

    let idle: Vec<&OwnUnitView> = turn.idle().filter(|u| u.kind.is_worker()).collect();
    for (n, unit) in idle.into_iter().enumerate() {
        let naval = unit.kind == UnitKind::FishingBoat;
        let site = (!naval && !sites.is_empty()).then(|| sites[n % sites.len()]);
        let (target, task) = if let Some(site) = site {
            (site, "build")
        } else {
            let Some(slot) = slots
                .iter_mut()
                .filter(|(b, free)| *free > 0 && b.kind.is_dock() == naval)
                .max_by_key(|(b, free)| (b.kind.stats().produces == Some(scarcest), *free))
            else {
                continue;
            };
            slot.1 -= 1;
            (slot.0, "gather")
        };
        let outcome = submit(Command::SendUnits {
            unit_ids: vec![unit.id.clone()],
            x: target.x,
            y: target.y,
            task: task.to_string(),
        });
        if outcome.success {
            turn.busy.insert(unit.id.as_str());
        }
    }
}

fn wanted_building(turn: &Turn<'_>) -> Option<BuildingKind> {
    let view = turn.view;
    let citizens = turn.units(UnitKind::Citizen);
    let sees = |deposit: Deposit| view.resource_sites.iter().any(|s| s.deposit == deposit);
    let age = view.economy.age;
    let wants = [
        (BuildingKind::House, turn.headroom <= HOUSING_MARGIN),
        (BuildingKind::Farm, turn.count(BuildingKind::Farm) < 1),
        (
            BuildingKind::WoodcuttersCamp,
            turn.count(BuildingKind::WoodcuttersCamp) < 1 && sees(Deposit::Forest),
        ),
        (BuildingKind::Barracks, turn.count(BuildingKind::Barracks) < 1),
        (BuildingKind::Farm, turn.count(BuildingKind::Farm) < 2 && citizens >= 6),
        (
            BuildingKind::Mine,
            turn.count(BuildingKind::Mine) < 1 && sees(Deposit::Metal),
        ),
        (BuildingKind::Market, turn.count(BuildingKind::Market) < 1),
        (
            BuildingKind::Dock,
            turn.count(BuildingKind::Dock) < 1 && sees(Deposit::Water),
        ),
        (BuildingKind::Library, turn.count(BuildingKind::Library) < 1),
        (
            BuildingKind::WoodcuttersCamp,
            turn.count(BuildingKind::WoodcuttersCamp) < 2 && sees(Deposit::Forest),
        ),
    ];
    wants
        .into_iter()
        .find(|(kind, wanted)| *wanted && kind.stats().min_age <= age)
        .map(|(kind, _)| kind)
}

/// Tiles the view proves are unbuildable.
fn known_blockers(view: &PlayerView) -> HashSet<(u16, u16)> {
    let mut blocked: HashSet<(u16, u16)> = view.resource_sites.iter().map(|s| (s.x, s.y)).collect();
    let footprints = view
        .buildings
        .iter()
        .map(|b| (b.kind, b.x, b.y))
        .chain(view.enemy_buildings.iter().map(|b| (b.kind, b.x, b.y)));
    for (kind, x, y) in footprints {
        let (w, h) = kind.size();
        for dy in 0..h {
            for dx in 0..w {
                blocked.insert((x + dx, y + dy));
            }
        }
    }
    blocked
}

/// Origins whose footprint touches a visible site of `deposit`, nearest
/// sites first.
fn deposit_candidates(turn: &Turn<'_>, kind: BuildingKind, deposit: Deposit) -> Vec<(u16, u16)> {
    let home = turn.home;
    let mut sites: Vec<(u16, u16)> = turn
        .view
        .resource_sites
        .iter()
        .filter(|s| s.deposit == deposit)
        .map(|s| (s.x, s.y))
        .collect();
    sites.sort_by(|a, b| {
        let da = Coord::new(a.0, a.1).center().distance(home);
        let db = Coord::new(b.0, b.1).center().distance(home);
        da.total_cmp(&db)
    });
    let (w, h) = kind.size();
    let (w, h) = (i32::from(w), i32::from(h));
    let mut out = Vec::new();
    for (sx, sy) in sites {
        let (sx, sy) = (i32::from(sx), i32::from(sy));
        for oy in sy - h..=sy + 1 {
            for ox in sx - w..=sx + 1 {
                let covers = (ox..ox + w).contains(&sx) && (oy..oy + h).contains(&sy);
                if covers {
                    continue;
                }
                if let (Ok(x), Ok(y)) = (u16::try_from(ox), u16::try_from(oy))
                    && !out.contains(&(x, y))
                {
                    out.push((x, y));
                }
            }
        }
    }
    out
}

fn train(turn: &mut Turn<'_>, submit: &mut impl FnMut(Command) -> CommandOutcome) {
    let view = turn.view;
    let age = view.economy.age;
    for building in view.buildings.iter().filter(|b| b.progress >= 100.0) {
        let mut queued = building.queue.len();
        while queued < QUEUE_TARGET && turn.headroom > 0 {
            let Some(unit) = pick_unit(turn, building.kind) else {
                break;
            };
            let stats = unit.stats();
            if stats.min_age > age || !turn.affordable(&stats.cost) {
                break;
            }
            let outcome = submit(Command::QueueUnit {
                unit,
                x: building.x,
                y: building.y,
            });
            if !outcome.success {
                break;
            }
            turn.budget.subtract(&stats.cost);
            turn.headroom -= 1;
            queued += 1;
        }
    }
}

fn pick_unit(turn: &Turn<'_>, building: BuildingKind) -> Option<UnitKind> {
    let citizens = turn.units(UnitKind::Citizen);
    match building {
        BuildingKind::CityCenter => (citizens < TARGET_CITIZENS).then_some(UnitKind::Citizen),
        BuildingKind::Barracks if citizens >= MILITARY_THRESHOLD => {
            if UnitKind::Musketeer.stats().min_age <= turn.view.economy.age {
                Some(UnitKind::Musketeer)
            } else if turn.units(UnitKind::Infantry) <= turn.units(UnitKind::Archer) {
                Some(UnitKind::Infantry)
            } else {
                Some(UnitKind::Archer)
            }
        }
        BuildingKind::Dock => {
            (turn.units(UnitKind::FishingBoat) < TARGET_BOATS).then_some(UnitKind::FishingBoat)
        }
        _ => None,
    }
}

fn attack(turn: &mut Turn<'_>, submit: &mut impl FnMut(Command) -> CommandOutcome) {
    let soldiers: Vec<&OwnUnitView> = turn.idle().filter(|u| u.kind.is_military()).collect();
    if soldiers.len() < ATTACK_GROUP {
        return;
    }
    let view = turn.view;
    let home = turn.home;
    let nearest_building = view
        .enemy_buildings
        .iter()
        .map(|b| (b.x, b.y))
        .min_by(|a, b| {
            let da = Coord::new(a.0, a.1).center().distance(home);
            let db = Coord::new(b.0, b.1).center().distance(home);
            da.total_cmp(&db)
        });
    let nearest_unit = || {
        view.enemy_units
            .iter()
            .min_by(|a, b| a.position.distance(home).total_cmp(&b.position.distance(home)))
            .map(|u| {
                let tile = u.position.tile();
                (tile.x, tile.y)
            })
    };
    let mirror = || {
        let tile = home.tile();
        (
            view.width.saturating_sub(1).saturating_sub(tile.x),
            view.height.saturating_sub(1).saturating_sub(tile.y),
        )
    };
    let (x, y) = nearest_building.or_else(nearest_unit).unwrap_or_else(mirror);
    let outcome = submit(Command::SendUnits {
        unit_ids: ids(soldiers.iter().copied()),
        x,
        y,
        task: "attack".to_string(),
    });
    if outcome.success {
        turn.busy.extend(soldiers.iter().map(|u| u.id.as_str()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{GameState, UnitTask};
    use crate::skirmish::{DEFAULT_LAYOUT, parse_layout};

    fn run_turn(state: &mut GameState, opponent: &mut ScriptedOpponent) -> Vec<Command> {
        let player = opponent.player();
        let view = PlayerView::capture(state, player).unwrap();
        let mut submitted = Vec::new();
        opponent.take_turn(&view, |command| {
            submitted.push(command.clone());
            state.execute(player, command)
        });
        submitted
    }

    #[test]
    fn test_first_turn_trains_citizens() {
        let mut state = parse_layout(DEFAULT_LAYOUT, 3).unwrap();
        let mut opponent = ScriptedOpponent::new(1, 3);
        let submitted = run_turn(&mut state, &mut opponent);
        assert!(submitted.contains(&Command::QueueUnit {
            unit: UnitKind::Citizen,
            x: 4,
            y: 4
        }));
        assert!(state.queued_units(1) > 0);
    }

    #[test]
    fn test_first_turn_places_a_building() {
        let mut state = parse_layout(DEFAULT_LAYOUT, 3).unwrap();
        let mut opponent = ScriptedOpponent::new(1, 3);
        let before = state.map.building_count();
        run_turn(&mut state, &mut opponent);
        assert_eq!(state.map.building_count(), before + 1);
    }

    #[test]
    fn test_idle_citizens_sent_to_construction() {
        let mut state = parse_layout(DEFAULT_LAYOUT, 3).unwrap();
        let mut opponent = ScriptedOpponent::new(1, 3);
        run_turn(&mut state, &mut opponent);
        run_turn(&mut state, &mut opponent);
        assert!(state.units_of(1).all(|u| u.task == UnitTask::Build));
    }

    #[test]
    fn test_defeated_player_does_nothing() {
        let mut state = parse_layout(DEFAULT_LAYOUT, 3).unwrap();
        let ids = state.map.building_ids();
        for id in ids {
            if state.map.building(id).is_some_and(|b| b.owner == 1) {
                state.map.demolish(id);
            }
        }
        let mut opponent = ScriptedOpponent::new(1, 3);
        assert!(run_turn(&mut state, &mut opponent).is_empty());
    }

    #[test]
    fn test_deposit_candidates_touch_the_site() {
        let state = parse_layout(DEFAULT_LAYOUT, 3).unwrap();
        let view = PlayerView::capture(&state, 1).unwrap();
        let turn = Turn {
            view: &view,
            home: home_of(&view).unwrap().center(),
            budget: view.economy.resources,
            headroom: 5,
            busy: HashSet::new(),
        };
        let candidates = deposit_candidates(&turn, BuildingKind::Mine, Deposit::Metal);
        assert!(!candidates.is_empty());
        for (x, y) in candidates {
            assert!(state.map.touches(Coord::new(x, y), BuildingKind::Mine, Deposit::Metal));
        }
    }
}
