// Allow unwrap in tests (test code is not production)
#![cfg_attr(test, allow(clippy::unwrap_used))]
//! Gaia: a deterministic rules engine for a territory and power-economy
//! board game on a hex map.
//!
//! The engine is driven entirely by move text. After each move it reports
//! the set of commands that are legal next, so a client or bot never has to
//! know the rules to play a legal game.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │   Engine (turn order, sub-commands) │
//! ├─────────────────────────────────────┤
//! │  Players: ledger, power, events     │
//! ├─────────────────────────────────────┤
//! │  Map, federations, content tables   │
//! └─────────────────────────────────────┘
//! ```
//!
//! ```
//! use gaia_engine::{Engine, EngineOptions};
//!
//! let mut engine = Engine::new(EngineOptions::default());
//! engine.apply("init 2 myseed").unwrap();
//! assert!(engine.legal_moves().iter().any(|m| m.starts_with("p1 faction")));
//! ```

pub mod charge;
pub mod content;
pub mod engine;
pub mod error;
pub mod event;
pub mod faction;
pub mod federation;
pub mod hex;
pub mod income;
pub mod invariants;
pub mod ledger;
pub mod map;
pub mod player;
pub mod reward;
pub mod rng;

pub use engine::{AvailableCommand, CommandData, Engine, EngineOptions, Move, Phase, Snapshot};
pub use error::{MoveError, MoveResult, ParseError, ProtocolError, RuleError};
pub use hex::Hex;
pub use player::Player;
