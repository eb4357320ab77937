//! Benchmarks for replaying move logs through the engine.

#![allow(missing_docs)]

use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use gaia_engine::{Engine, EngineOptions};

/// Play the first legal move repeatedly and keep the log.
fn first_move_log(players: usize, moves: usize) -> Vec<String> {
    let mut engine = Engine::new(EngineOptions::default());
    let _ = engine.apply(&format!("init {players} bench"));
    for _ in 0..moves {
        let Some(mv) = engine.legal_moves().into_iter().next() else {
            break;
        };
        if engine.apply(&mv).is_err() {
            break;
        }
    }
    engine.move_log
}

fn bench_setup(c: &mut Criterion) {
    c.bench_function("init_4p", |b| {
        b.iter(|| {
            let mut engine = Engine::new(EngineOptions::default());
            let _ = engine.apply(black_box("init 4 bench"));
            black_box(engine)
        });
    });
}

fn bench_replay(c: &mut Criterion) {
    let log = first_move_log(2, 120);

    c.bench_function("replay_2p_log", |b| {
        b.iter(|| {
            let engine = Engine::replay(EngineOptions::default(), black_box(&log));
            black_box(engine.is_ok())
        });
    });
}

fn bench_legal_moves(c: &mut Criterion) {
    let log = first_move_log(4, 60);
    let Ok(engine) = Engine::replay(EngineOptions::default(), &log) else {
        return;
    };

    c.bench_function("legal_moves_4p", |b| {
        b.iter(|| black_box(engine.legal_moves()));
    });
}

criterion_group!(benches, bench_setup, bench_replay, bench_legal_moves);
criterion_main!(benches);
