//! Benchmarks for the tick pipeline and full skirmishes.
//!
//! The per-tick cost is the hot path for batch runs.

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use std::hint::black_box;

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use isosim::skirmish::{DEFAULT_LAYOUT, Skirmish, SkirmishConfig, parse_layout, run_skirmish};
use isosim::{Command, Position, UnitKind};

fn bench_step_opening(c: &mut Criterion) {
    let state = parse_layout(DEFAULT_LAYOUT, 42).unwrap();

    c.bench_function("step_opening", |b| {
        b.iter_batched(
            || state.clone(),
            |mut state| {
                let report = state.step();
                black_box(report)
            },
            BatchSize::SmallInput,
        );
    });
}

fn bench_step_battle(c: &mut Criterion) {
    let mut state = parse_layout(DEFAULT_LAYOUT, 7).unwrap();
    for i in 0..40u8 {
        let x = 16.5 + f32::from(i % 8);
        let y = 10.5 + f32::from(i / 8);
        let owner = if i % 2 == 0 { 1 } else { 2 };
        let kind = if i % 3 == 0 { UnitKind::Archer } else { UnitKind::Infantry };
        state.spawn_unit(kind, owner, Position::new(x, y));
    }

    c.bench_function("step_battle_40_units", |b| {
        b.iter_batched(
            || state.clone(),
            |mut state| {
                for _ in 0..10 {
                    state.step();
                }
                black_box(state)
            },
            BatchSize::SmallInput,
        );
    });
}

fn bench_commands(c: &mut Criterion) {
    let state = parse_layout(DEFAULT_LAYOUT, 42).unwrap();
    let ids: Vec<String> = state.units_of(1).map(|u| u.id.to_string()).collect();

    c.bench_function("send_units_move", |b| {
        b.iter_batched(
            || state.clone(),
            |mut state| {
                let outcome = state.execute(
                    1,
                    Command::SendUnits {
                        unit_ids: ids.clone(),
                        x: 20,
                        y: 14,
                        task: "move".to_string(),
                    },
                );
                black_box(outcome)
            },
            BatchSize::SmallInput,
        );
    });
}

fn bench_opponent_turns(c: &mut Criterion) {
    let config = SkirmishConfig::default();

    c.bench_function("skirmish_500_ticks", |b| {
        b.iter(|| {
            let mut skirmish = Skirmish::new(config.initial_state(42).unwrap(), &config, 42);
            for _ in 0..500 {
                skirmish.advance();
            }
            black_box(skirmish.finish())
        });
    });
}

fn bench_full_skirmish(c: &mut Criterion) {
    let config = SkirmishConfig {
        max_ticks: 2000,
        ..SkirmishConfig::default()
    };

    let mut group = c.benchmark_group("skirmish");
    group.sample_size(10);
    group.bench_function("full_2000_ticks", |b| {
        b.iter(|| black_box(run_skirmish(black_box(42), &config).unwrap()));
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_step_opening,
    bench_step_battle,
    bench_commands,
    bench_opponent_turns,
    bench_full_skirmish
);
criterion_main!(benches);
