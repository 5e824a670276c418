//! Output formatting utilities for CLI.

// Averages over game counts; counts stay far below 2^52
#![allow(clippy::cast_precision_loss, clippy::format_push_string)]

use isosim::PlayerId;
use isosim::skirmish::SkirmishResult;
use serde::Serialize;
use std::collections::BTreeMap;

/// Format a skirmish result as human-readable text.
pub(super) fn format_text(result: &SkirmishResult) -> String {
    let mut output = String::new();

    output.push_str(&format!("Skirmish Result (seed: {})\n", result.seed));
    match result.winner {
        Some(winner) => {
            let name = result
                .players
                .iter()
                .find(|p| p.id == winner)
                .map_or("Unknown", |p| p.name.as_str());
            output.push_str(&format!("  Winner: Player {winner} ({name})\n"));
        }
        None if result.finished => output.push_str("  Winner: Draw\n"),
        None => output.push_str("  Winner: none (tick limit reached)\n"),
    }
    output.push_str(&format!("  Ticks: {}\n\n", result.ticks));

    for p in &result.players {
        output.push_str(&format!(
            "  Player {} ({}): {} age, {} units, {} buildings",
            p.id, p.name, p.age, p.population, p.buildings
        ));
        output.push_str(&format!(
            " | trained {}, lost {} units, lost {} buildings | commands {} ok / {} rejected",
            p.units_trained, p.units_lost, p.buildings_lost, p.commands_accepted, p.commands_rejected
        ));
        if let Some(tick) = p.defeated_at {
            output.push_str(&format!(" [defeated tick {tick}]"));
        }
        output.push('\n');
    }

    output
}

/// Running totals for one player across a batch.
#[derive(Debug, Default, Clone)]
struct PlayerTotals {
    name: String,
    wins: u64,
    defeats: u64,
    units_trained: u64,
    units_lost: u64,
    buildings_lost: u64,
    age_sum: u64,
}

impl PlayerTotals {
    fn merge(&mut self, other: &Self) {
        if self.name.is_empty() {
            self.name.clone_from(&other.name);
        }
        self.wins += other.wins;
        self.defeats += other.defeats;
        self.units_trained += other.units_trained;
        self.units_lost += other.units_lost;
        self.buildings_lost += other.buildings_lost;
        self.age_sum += other.age_sum;
    }
}

/// Batch statistics for aggregated results.
#[derive(Debug, Default, Clone)]
pub(super) struct BatchStats {
    /// Total games played.
    pub(super) games_played: u64,
    /// Games that ended before the tick limit.
    pub(super) finished: u64,
    /// Finished games without a winner.
    pub(super) draws: u64,
    /// Total ticks across all games.
    total_ticks: u64,
    /// Totals keyed by player id.
    players: BTreeMap<PlayerId, PlayerTotals>,
}

impl BatchStats {
    /// Add a game result to the stats.
    pub(super) fn add_result(&mut self, result: &SkirmishResult) {
        self.games_played += 1;
        self.total_ticks += result.ticks;
        if result.finished {
            self.finished += 1;
            if result.winner.is_none() {
                self.draws += 1;
            }
        }
        for p in &result.players {
            let totals = self.players.entry(p.id).or_default();
            if totals.name.is_empty() {
                totals.name.clone_from(&p.name);
            }
            totals.wins += u64::from(p.victorious);
            totals.defeats += u64::from(p.defeated);
            totals.units_trained += u64::from(p.units_trained);
            totals.units_lost += u64::from(p.units_lost);
            totals.buildings_lost += u64::from(p.buildings_lost);
            totals.age_sum += u64::from(p.age.index());
        }
    }

    /// Merge another stats object into this one.
    pub(super) fn merge(&mut self, other: &Self) {
        self.games_played += other.games_played;
        self.finished += other.finished;
        self.draws += other.draws;
        self.total_ticks += other.total_ticks;
        for (id, totals) in &other.players {
            self.players.entry(*id).or_default().merge(totals);
        }
    }

    fn per_game(&self, total: u64) -> f64 {
        if self.games_played == 0 {
            return 0.0;
        }
        total as f64 / self.games_played as f64
    }

    /// Get average game length.
    pub(super) fn avg_ticks(&self) -> f64 {
        self.per_game(self.total_ticks)
    }

    fn rows(&self) -> Vec<JsonBatchPlayer> {
        self.players
            .iter()
            .map(|(id, t)| JsonBatchPlayer {
                player: *id,
                name: t.name.clone(),
                wins: t.wins,
                win_rate: self.per_game(t.wins),
                defeats: t.defeats,
                avg_units_trained: self.per_game(t.units_trained),
                avg_units_lost: self.per_game(t.units_lost),
                avg_buildings_lost: self.per_game(t.buildings_lost),
                avg_age: self.per_game(t.age_sum),
            })
            .collect()
    }
}

/// JSON-serializable batch result.
#[derive(Debug, Serialize)]
pub(super) struct JsonBatchResult {
    /// Total games played.
    games_played: u64,
    /// Games that ended before the tick limit.
    finished: u64,
    /// Number of draws.
    draws: u64,
    /// Average game length in ticks.
    avg_ticks: f64,
    /// Per-player statistics.
    players: Vec<JsonBatchPlayer>,
}

/// JSON-serializable per-player batch stats.
#[derive(Debug, Serialize)]
pub(super) struct JsonBatchPlayer {
    /// Player id.
    player: PlayerId,
    /// Display name.
    name: String,
    /// Number of wins.
    wins: u64,
    /// Win rate (0.0-1.0).
    win_rate: f64,
    /// Number of defeats.
    defeats: u64,
    /// Average units trained per game.
    avg_units_trained: f64,
    /// Average units lost per game.
    avg_units_lost: f64,
    /// Average buildings lost per game.
    avg_buildings_lost: f64,
    /// Average final age index (0 = classical).
    avg_age: f64,
}

impl JsonBatchResult {
    /// Create from stats.
    pub(super) fn from_stats(stats: &BatchStats) -> Self {
        Self {
            games_played: stats.games_played,
            finished: stats.finished,
            draws: stats.draws,
            avg_ticks: stats.avg_ticks(),
            players: stats.rows(),
        }
    }
}

/// Format batch stats as human-readable text.
pub(super) fn format_batch_text(stats: &BatchStats) -> String {
    let mut output = String::new();

    output.push_str(&format!("Batch Results ({} games)\n", stats.games_played));
    output.push_str("========================================\n\n");

    output.push_str("Win Rates:\n");
    for row in stats.rows() {
        output.push_str(&format!(
            "  Player {} ({}): {:.1}% ({} wins, {} defeats)\n",
            row.player,
            row.name,
            row.win_rate * 100.0,
            row.wins,
            row.defeats
        ));
    }
    let unfinished = stats.games_played - stats.finished;
    output.push_str(&format!(
        "  Draws: {} ({:.1}%), tick limit: {} ({:.1}%)\n\n",
        stats.draws,
        stats.per_game(stats.draws) * 100.0,
        unfinished,
        stats.per_game(unfinished) * 100.0
    ));

    output.push_str("Averages per Game:\n");
    for row in stats.rows() {
        output.push_str(&format!(
            "  Player {} ({}): trained {:.1}, lost {:.1} units, lost {:.1} buildings, age {:.2}\n",
            row.player,
            row.name,
            row.avg_units_trained,
            row.avg_units_lost,
            row.avg_buildings_lost,
            row.avg_age
        ));
    }

    output.push_str(&format!("\nAverage Game Length: {:.0} ticks\n", stats.avg_ticks()));

    output
}

/// Format batch stats as CSV.
pub(super) fn format_batch_csv(stats: &BatchStats) -> String {
    let mut output = String::new();

    output.push_str("player,name,wins,win_rate,defeats,avg_units_trained,avg_units_lost,avg_buildings_lost,avg_age\n");

    for row in stats.rows() {
        output.push_str(&format!(
            "{},{},{},{:.4},{},{:.2},{:.2},{:.2},{:.2}\n",
            row.player,
            row.name,
            row.wins,
            row.win_rate,
            row.defeats,
            row.avg_units_trained,
            row.avg_units_lost,
            row.avg_buildings_lost,
            row.avg_age
        ));
    }

    output
}
