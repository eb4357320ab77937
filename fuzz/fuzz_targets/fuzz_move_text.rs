#![no_main]

//! Move text fuzzer.
//!
//! Arbitrary text fed to the parser and to an engine in setup must never
//! panic, and anything the parser accepts must print back to text that
//! parses to the same move.

use gaia_engine::{Engine, EngineOptions, Move};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|text: &str| {
    if let Ok(mv) = Move::parse(text) {
        let printed = mv.to_string();
        assert_eq!(Move::parse(&printed).ok(), Some(mv));
    }

    let mut engine = Engine::new(EngineOptions::default());
    let _ = engine.apply("init 2 fuzz");
    let before = engine.move_log.len();
    if engine.apply(text).is_err() {
        assert_eq!(engine.move_log.len(), before);
    }
});
