#![no_main]

//! Command stream fuzzer.
//!
//! Feeds arbitrary commands from both players into the default skirmish map,
//! interleaved with ticks, and checks the world invariants after every tick.
//! Malformed ids and unknown tasks are part of the input space.

use arbitrary::Arbitrary;
use isosim::game::check_invariants;
use isosim::skirmish::{DEFAULT_LAYOUT, parse_layout};
use isosim::{BuildingKind, Command, Resources, UnitKind};
use libfuzzer_sys::fuzz_target;

const TASKS: [&str; 6] = ["move", "attack", "gather", "build", "patrol", "garrison"];

/// A fuzzer-generated order.
#[derive(Arbitrary, Debug, Clone)]
enum FuzzCommand {
    /// Place a building.
    Place { kind: u8, x: u8, y: u8 },
    /// Queue a unit.
    Queue { kind: u8, x: u8, y: u8 },
    /// Send units, with ids given as raw strings.
    Send {
        ids: Vec<String>,
        x: u8,
        y: u8,
        task: u8,
        raw_task: Option<String>,
    },
    /// Advance the age.
    Advance,
}

impl FuzzCommand {
    fn into_command(self) -> Command {
        match self {
            FuzzCommand::Place { kind, x, y } => Command::PlaceBuilding {
                building: BuildingKind::ALL[usize::from(kind) % BuildingKind::ALL.len()],
                x: u16::from(x),
                y: u16::from(y),
            },
            FuzzCommand::Queue { kind, x, y } => Command::QueueUnit {
                unit: UnitKind::ALL[usize::from(kind) % UnitKind::ALL.len()],
                x: u16::from(x),
                y: u16::from(y),
            },
            FuzzCommand::Send {
                ids,
                x,
                y,
                task,
                raw_task,
            } => Command::SendUnits {
                unit_ids: ids.into_iter().take(16).collect(),
                x: u16::from(x),
                y: u16::from(y),
                task: raw_task
                    .unwrap_or_else(|| TASKS[usize::from(task) % TASKS.len()].to_string()),
            },
            FuzzCommand::Advance => Command::AdvanceAge,
        }
    }
}

/// Structured input for the command fuzzer.
#[derive(Arbitrary, Debug)]
struct CommandInput {
    /// Layout seed.
    seed: u64,
    /// Start both players with plenty of everything.
    rich: bool,
    /// Commands as (player, order, ticks to run afterwards).
    commands: Vec<(bool, FuzzCommand, u8)>,
}

fuzz_target!(|input: CommandInput| {
    let Ok(mut state) = parse_layout(DEFAULT_LAYOUT, input.seed) else {
        return;
    };
    if input.rich {
        for player in &mut state.players {
            player.resources = Resources::splat(1000.0);
        }
    }

    for (second, command, ticks) in input.commands.into_iter().take(32) {
        let player = if second { 2 } else { 1 };
        let before = state.player(player).map(|p| p.resources);
        let outcome = state.execute(player, command.into_command());
        if !outcome.success {
            assert_eq!(
                state.player(player).map(|p| p.resources),
                before,
                "rejected command charged player {player}: {}",
                outcome.message
            );
        }

        for _ in 0..ticks % 16 {
            state.step();
            let violations = check_invariants(&state);
            assert!(
                violations.is_empty(),
                "Invariants violated at tick {}: {:?}",
                state.tick(),
                violations
            );
        }
    }
});
