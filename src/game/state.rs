//! Game state and the per-tick pipeline.

use log::{debug, info};

use crate::game::behavior::{World, roll_idle_threshold};
use crate::game::construction::advance_construction;
use crate::game::economy::apply_economy;
use crate::game::territory::refresh_territory;
use crate::game::victory::check_victory;
use crate::game::{
    Age, BuildingId, GameOutcome, Map, Player, PlayerId, Position, Rng, Unit, UnitId, UnitKind,
    WorkerCensus,
};

/// Seed used by [`GameState::new`].
pub const DEFAULT_SEED: u64 = 0x15_0517;

/// What happened during one tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// Tick number after the step.
    pub tick: u64,
    /// Units trained this tick, with their owners.
    pub spawned: Vec<(UnitId, PlayerId)>,
    /// Units that died this tick, with their owners.
    pub killed: Vec<(UnitId, PlayerId)>,
    /// Buildings destroyed this tick, with their former owners.
    pub demolished: Vec<(BuildingId, PlayerId)>,
    /// Players defeated this tick.
    pub defeated: Vec<PlayerId>,
    /// Set on the tick the game ends.
    pub outcome: Option<GameOutcome>,
}

/// Complete game state.
///
/// Owned by one caller and mutated in place, either by [`GameState::step`]
/// or by the command API between steps.
#[derive(Debug, Clone)]
pub struct GameState {
    /// The game map.
    pub map: Map,
    /// All players, defeated ones included.
    pub players: Vec<Player>,
    /// All units in creation order. Dead units are removed at the end of each tick.
    pub units: Vec<Unit>,
    /// Deterministic random source for jitter.
    pub rng: Rng,
    /// Whether the game has ended.
    pub game_over: bool,
    /// The winner, once decided.
    pub winner: Option<PlayerId>,
    /// How the game ended, once it has.
    pub outcome: Option<GameOutcome>,
    tick: u64,
    next_unit_id: u32,
    started_with: usize,
}

impl GameState {
    /// Create a game with the default seed.
    #[must_use]
    pub fn new(map: Map, players: Vec<Player>) -> Self {
        Self::with_seed(map, players, DEFAULT_SEED)
    }

    /// Create a game whose jitter is drawn from `seed`.
    #[must_use]
    pub fn with_seed(mut map: Map, mut players: Vec<Player>, seed: u64) -> Self {
        refresh_territory(&mut map);
        for player in &mut players {
            player.population_cap = crate::game::population_cap(&map, player);
        }
        let started_with = players.len();
        Self {
            map,
            players,
            units: Vec::new(),
            rng: Rng::new(seed),
            game_over: false,
            winner: None,
            outcome: None,
            tick: 0,
            next_unit_id: 1,
            started_with,
        }
    }

    /// Ticks simulated so far.
    #[must_use]
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Number of players the game started with.
    #[must_use]
    pub const fn started_with(&self) -> usize {
        self.started_with
    }

    /// Look up a player.
    #[must_use]
    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    /// Look up a player mutably.
    #[must_use]
    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == id)
    }

    /// Look up a unit.
    #[must_use]
    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.iter().find(|u| u.id == id)
    }

    /// Players that have not been defeated.
    pub fn active_players(&self) -> impl Iterator<Item = &Player> {
        self.players.iter().filter(|p| p.is_active())
    }

    /// Live units owned by `player`.
    pub fn units_of(&self, player: PlayerId) -> impl Iterator<Item = &Unit> {
        self.units
            .iter()
            .filter(move |u| u.owner == player && u.is_alive())
    }

    /// Create an idle unit for `owner` at `position` and count it in the
    /// owner's population. Military stats follow the owner's current age.
    pub fn spawn_unit(&mut self, kind: UnitKind, owner: PlayerId, position: Position) -> UnitId {
        let id = UnitId(self.next_unit_id);
        self.next_unit_id += 1;
        let age = self.player(owner).map_or(Age::Classical, |p| p.age);
        let threshold = roll_idle_threshold(&mut self.rng);
        let position = position.clamp_to(self.map.width(), self.map.height());
        self.units
            .push(Unit::new(id, kind, owner, position, age, threshold));
        if let Some(player) = self.player_mut(owner) {
            player.population += 1;
        }
        id
    }

    /// Advance the world by one tick.
    ///
    /// Does nothing once the game is over.
    pub fn step(&mut self) -> TickReport {
        if self.game_over {
            return TickReport {
                tick: self.tick,
                ..TickReport::default()
            };
        }
        self.tick += 1;
        let now = self.tick;
        let mut report = TickReport {
            tick: now,
            ..TickReport::default()
        };

        refresh_territory(&mut self.map);
        let mut census = WorkerCensus::take(&self.units);
        apply_economy(&self.map, &mut self.players, &census);

        for spawn in advance_construction(&mut self.map, &census) {
            let id = self.spawn_unit(spawn.kind, spawn.owner, spawn.position);
            debug!(
                "player {} trained {} {id} at {}",
                spawn.owner, spawn.kind, spawn.building
            );
            report.spawned.push((id, spawn.owner));
        }

        let demolished =
            World::new(&mut self.map, &mut self.units, &mut census, &mut self.rng, now).run();
        report.demolished = demolished.iter().map(|d| (d.id, d.owner)).collect();
        self.remove_dead(&mut report);
        if !demolished.is_empty() {
            refresh_territory(&mut self.map);
        }

        let was_active: Vec<PlayerId> = self.active_players().map(|p| p.id).collect();
        let outcome = check_victory(&self.map, &mut self.players, self.started_with);
        report.defeated = was_active
            .into_iter()
            .filter(|id| self.player(*id).is_some_and(|p| p.defeated))
            .collect();
        if let Some(outcome) = outcome {
            self.game_over = true;
            self.winner = outcome.winner();
            self.outcome = Some(outcome);
            info!("game over at tick {now}: {outcome:?}");
            report.outcome = Some(outcome);
        }
        report
    }

    fn remove_dead(&mut self, report: &mut TickReport) {
        let (dead, alive): (Vec<Unit>, Vec<Unit>) =
            std::mem::take(&mut self.units).into_iter().partition(|u| !u.is_alive());
        self.units = alive;
        for unit in dead {
            if let Some(player) = self.player_mut(unit.owner) {
                player.population = player.population.saturating_sub(1);
            }
            report.killed.push((unit.id, unit.owner));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{BuildingKind, Coord, Resources, UnitTask};

    fn two_player_game() -> GameState {
        let map = Map::new(30, 30).unwrap();
        let players = vec![Player::human(1, "Alice"), Player::scripted(2, "Bot")];
        let mut state = GameState::new(map, players);
        for p in &mut state.players {
            p.resources = Resources::splat(1000.0);
        }
        state.place_building(1, BuildingKind::CityCenter, 2, 2).unwrap();
        state.place_building(2, BuildingKind::CityCenter, 24, 24).unwrap();
        state
    }

    #[test]
    fn test_step_advances_tick() {
        let mut state = two_player_game();
        let report = state.step();
        assert_eq!(report.tick, 1);
        assert_eq!(state.tick(), 1);
        assert!(!state.game_over);
    }

    #[test]
    fn test_spawn_counts_population() {
        let mut state = two_player_game();
        let id = state.spawn_unit(UnitKind::Citizen, 1, Position::new(8.5, 8.5));
        assert_eq!(state.player(1).unwrap().population, 1);
        assert_eq!(state.unit(id).unwrap().task, UnitTask::Idle);
        assert_eq!(state.units_of(1).count(), 1);
    }

    #[test]
    fn test_dead_units_removed_and_population_drops() {
        let mut state = two_player_game();
        let id = state.spawn_unit(UnitKind::Citizen, 1, Position::new(8.5, 8.5));
        state.units[0].health = 0.0;
        let report = state.step();
        assert_eq!(report.killed, vec![(id, 1)]);
        assert!(state.units.is_empty());
        assert_eq!(state.player(1).unwrap().population, 0);
    }

    #[test]
    fn test_losing_last_building_ends_game() {
        let mut state = two_player_game();
        let origin = Coord::new(24, 24);
        let id = state.map.building_at(origin).unwrap().1.id;
        state.map.demolish(id);
        let report = state.step();
        assert_eq!(report.defeated, vec![2]);
        assert_eq!(report.outcome, Some(GameOutcome::Victory(1)));
        assert!(state.game_over);
        assert_eq!(state.winner, Some(1));
        assert!(state.player(1).unwrap().victorious);
    }

    #[test]
    fn test_step_after_game_over_is_a_no_op() {
        let mut state = two_player_game();
        let id = state.map.building_at(Coord::new(24, 24)).unwrap().1.id;
        state.map.demolish(id);
        state.step();
        let tick = state.tick();
        let resources = state.players[0].resources;
        let report = state.step();
        assert_eq!(report.tick, tick);
        assert_eq!(state.tick(), tick);
        assert_eq!(state.players[0].resources, resources);
    }

    #[test]
    fn test_training_spawns_unit() {
        let mut state = two_player_game();
        let id = state.map.building_at(Coord::new(2, 2)).unwrap().1.id;
        state.map.building_mut(id).unwrap().progress = 100.0;
        state.queue_unit(1, UnitKind::Citizen, 3, 3).unwrap();
        let build_time = UnitKind::Citizen.stats().build_time;
        let mut spawned = Vec::new();
        for _ in 0..build_time {
            spawned.extend(state.step().spawned);
        }
        assert_eq!(spawned.len(), 1);
        assert_eq!(state.player(1).unwrap().population, 1);
    }
}
