//! Property-based tests that walk random legal games.
//!
//! Run with: cargo test --release prop_engine

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use proptest::prelude::*;

use gaia_engine::invariants::check_invariants;
use gaia_engine::{Engine, EngineOptions};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Every offered move parses, and applying it either succeeds with all
    /// invariants intact or is refused as a rule error without side effects.
    #[test]
    fn prop_random_legal_walk(
        players in 2usize..=4,
        seed in "[a-z]{4,8}",
        auto in any::<bool>(),
        picks in prop::collection::vec(any::<prop::sample::Index>(), 50..250)
    ) {
        let options = EngineOptions {
            auto_income: auto,
            auto_charge_power: auto.then_some(3),
            ..EngineOptions::default()
        };
        let mut engine = Engine::new(options);
        engine.apply(&format!("init {players} {seed}")).unwrap();

        for pick in picks {
            if engine.is_ended() {
                break;
            }
            let moves = engine.legal_moves();
            prop_assert!(!moves.is_empty(), "no legal moves in round {}", engine.round);
            let mv = pick.get(&moves);

            let before = engine.to_json().unwrap();
            match engine.apply(mv) {
                Ok(_) => {
                    let violations = check_invariants(&engine);
                    prop_assert!(violations.is_empty(), "after `{}`: {:?}", mv, violations);
                }
                Err(err) => {
                    prop_assert!(err.is_rule(), "offered move `{}` refused: {}", mv, err);
                    prop_assert_eq!(engine.to_json().unwrap(), before);
                }
            }
        }
    }

    /// Replaying the log of a random walk rebuilds the same game.
    #[test]
    fn prop_replay_is_deterministic(
        seed in "[a-z]{4,8}",
        picks in prop::collection::vec(any::<prop::sample::Index>(), 10..60)
    ) {
        let mut engine = Engine::new(EngineOptions::default());
        engine.apply(&format!("init 2 {seed}")).unwrap();
        for pick in picks {
            let moves = engine.legal_moves();
            if moves.is_empty() {
                break;
            }
            let mv = pick.get(&moves);
            let before = engine.to_json().unwrap();
            if let Err(err) = engine.apply(mv) {
                prop_assert!(err.is_rule(), "offered move `{}` refused: {}", mv, err);
                prop_assert_eq!(engine.to_json().unwrap(), before);
            }
        }

        let replayed = Engine::replay(EngineOptions::default(), &engine.move_log).unwrap();
        prop_assert_eq!(replayed.to_json().unwrap(), engine.to_json().unwrap());
    }
}
