#![no_main]

//! Game walk fuzzer.
//!
//! The fuzzer picks among the offered moves, so every game it plays is
//! legal. Invariants must hold after every accepted move.

use arbitrary::Arbitrary;
use gaia_engine::invariants::assert_invariants;
use gaia_engine::{Engine, EngineOptions};
use libfuzzer_sys::fuzz_target;

/// Structured input for a game walk.
#[derive(Arbitrary, Debug)]
struct WalkInput {
    /// Player count, folded into 2..=5.
    players: u8,
    /// Setup seed.
    seed: u32,
    /// Automatic income and leech decisions.
    auto: bool,
    /// Index into the legal moves at each step.
    picks: Vec<u16>,
}

fuzz_target!(|input: WalkInput| {
    let options = EngineOptions {
        auto_income: input.auto,
        auto_charge_power: input.auto.then_some(2),
        ..EngineOptions::default()
    };
    let mut engine = Engine::new(options);
    let players = 2 + input.players % 4;
    if engine.apply(&format!("init {players} s{}", input.seed)).is_err() {
        return;
    }

    for pick in input.picks.into_iter().take(500) {
        let moves = engine.legal_moves();
        if moves.is_empty() {
            break;
        }
        let mv = &moves[usize::from(pick) % moves.len()];
        match engine.apply(mv) {
            Ok(_) => assert_invariants(&engine),
            Err(e) => assert!(e.is_rule(), "offered move {mv} refused: {e}"),
        }
    }
});
