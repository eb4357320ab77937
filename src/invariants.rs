//! Engine invariants: sanity checks that detect bugs.
//!
//! None of these should fire after a legal move. They are run by the tests
//! and the `check` subcommand after every move.

use std::collections::BTreeSet;

use crate::content::{LAST_RESEARCH_LEVEL, ResearchField};
use crate::engine::{Engine, Phase};
use crate::faction::{Building, WildcardArea};
use crate::ledger::power::Power;
use crate::ledger::{MAX_CREDIT, MAX_KNOWLEDGE, MAX_ORE};
use crate::map::HexGrid;

/// Invariant violation error.
#[derive(Debug, Clone)]
pub struct InvariantViolation {
    /// Description of the violated invariant.
    pub message: String,
}

impl InvariantViolation {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Invariant violation: {}", self.message)
    }
}

impl std::error::Error for InvariantViolation {}

/// Check that a power operation that neither gains nor returns tokens kept
/// every token accounted for.
#[must_use]
pub fn check_power_conservation(before: &Power, after: &Power) -> Option<InvariantViolation> {
    (before.total() != after.total()).then(|| {
        InvariantViolation::new(format!(
            "power tokens went from {} to {}",
            before.total(),
            after.total()
        ))
    })
}

/// Check all engine invariants.
///
/// Returns the violations found, or an empty list if everything holds.
#[must_use]
pub fn check_invariants(engine: &Engine) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();
    check_turn_order(engine, &mut violations);
    check_players(engine, &mut violations);
    check_map(engine, &mut violations);
    violations
}

fn check_turn_order(engine: &Engine, out: &mut Vec<InvariantViolation>) {
    let seats = engine.players.len();
    let to_act: BTreeSet<u8> = engine.turn_order.iter().copied().collect();
    let passed: BTreeSet<u8> = engine.passed_players.iter().copied().collect();

    // Starting buildings are placed in snake order, so seats repeat there.
    if engine.phase != Phase::SetupBuilding && to_act.len() != engine.turn_order.len() {
        out.push(InvariantViolation::new(format!(
            "turn order {:?} repeats a seat",
            engine.turn_order
        )));
    }
    if passed.len() != engine.passed_players.len() {
        out.push(InvariantViolation::new(format!(
            "passed players {:?} repeat a seat",
            engine.passed_players
        )));
    }
    if let Some(seat) = to_act.intersection(&passed).next() {
        out.push(InvariantViolation::new(format!(
            "seat {seat} is both to act and passed"
        )));
    }
    if let Some(seat) = to_act.iter().chain(&passed).find(|&&s| usize::from(s) >= seats) {
        out.push(InvariantViolation::new(format!(
            "seat {seat} listed in a game of {seats}"
        )));
    }
    if let Some(sub) = engine.sub_commands.iter().find(|s| usize::from(s.player()) >= seats) {
        out.push(InvariantViolation::new(format!(
            "pending {sub:?} belongs to no seat"
        )));
    }

    match engine.phase {
        Phase::End => {
            if engine.current_player.is_some() || !engine.turn_order.is_empty() {
                out.push(InvariantViolation::new("ended game still has a player to move"));
            }
        }
        Phase::SetupInit => {}
        _ => {
            if engine.turn_order.is_empty() && engine.sub_commands.is_empty() {
                out.push(InvariantViolation::new(format!(
                    "round {} has nobody left to act",
                    engine.round
                )));
            }
            if engine.current_player.is_none() {
                out.push(InvariantViolation::new(format!(
                    "round {} has no current player",
                    engine.round
                )));
            }
        }
    }
}

fn check_players(engine: &Engine, out: &mut Vec<InvariantViolation>) {
    for player in &engine.players {
        let d = &player.data;
        let id = player.id;
        if d.credits > MAX_CREDIT || d.ores > MAX_ORE || d.knowledge > MAX_KNOWLEDGE {
            out.push(InvariantViolation::new(format!(
                "p{} resources over cap: {}c {}o {}k",
                id + 1,
                d.credits,
                d.ores,
                d.knowledge
            )));
        }
        if d.power.wildcard == WildcardArea::Transit {
            out.push(InvariantViolation::new(format!(
                "p{} wildcard left in transit",
                id + 1
            )));
        }
        if let Some(&field) = ResearchField::ALL
            .iter()
            .find(|f| d.research(**f) > LAST_RESEARCH_LEVEL)
        {
            out.push(InvariantViolation::new(format!(
                "p{} research {field} above level {LAST_RESEARCH_LEVEL}",
                id + 1
            )));
        }
        if let Some(board) = &player.board {
            for building in Building::ALL {
                if building == Building::GaiaFormer {
                    continue;
                }
                let count = usize::try_from(d.count(building)).unwrap_or(usize::MAX);
                if count > board.max_buildings(building) {
                    out.push(InvariantViolation::new(format!(
                        "p{} has {count} {building}, board allows {}",
                        id + 1,
                        board.max_buildings(building)
                    )));
                }
            }
        }
    }

    for &field in ResearchField::ALL {
        let top = engine
            .players
            .iter()
            .filter(|p| p.data.research(field) == LAST_RESEARCH_LEVEL)
            .count();
        if top > 1 {
            out.push(InvariantViolation::new(format!(
                "{top} players at the top of {field}"
            )));
        }
    }
}

fn check_map(engine: &Engine, out: &mut Vec<InvariantViolation>) {
    for (hex, cell) in engine.map.iter() {
        match (cell.building, cell.player) {
            (Some(_), None) | (None, Some(_)) => {
                out.push(InvariantViolation::new(format!(
                    "{hex} has a building without an owner or an owner without a building"
                )));
            }
            (Some(building), Some(owner)) => {
                let Some(player) = engine.players.get(usize::from(owner)) else {
                    out.push(InvariantViolation::new(format!("{hex} owned by missing seat {owner}")));
                    continue;
                };
                if building != Building::GaiaFormer && !player.data.occupied.contains_key(&hex) {
                    out.push(InvariantViolation::new(format!(
                        "{hex} holds a {building} that p{} does not list",
                        owner + 1
                    )));
                }
            }
            (None, None) => {}
        }
    }
    for player in &engine.players {
        for hex in player.data.occupied.keys() {
            let held = engine
                .map
                .get(*hex)
                .is_some_and(|cell| cell.player == Some(player.id));
            if !held {
                out.push(InvariantViolation::new(format!(
                    "p{} lists {hex} but the map disagrees",
                    player.id + 1
                )));
            }
        }
    }
}

/// Assert all engine invariants hold, panicking if any are violated.
///
/// Only active in debug builds. No-op in release builds.
///
/// # Panics
///
/// Panics with every violation if any invariant is broken.
#[cfg(debug_assertions)]
pub fn assert_invariants(engine: &Engine) {
    let violations = check_invariants(engine);
    if !violations.is_empty() {
        let messages: Vec<_> = violations.iter().map(|v| v.message.as_str()).collect();
        panic!("Engine invariant violations:\n  - {}", messages.join("\n  - "));
    }
}

/// No-op in release builds.
#[cfg(not(debug_assertions))]
pub fn assert_invariants(_engine: &Engine) {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineOptions;
    use crate::hex::Hex;

    fn started() -> Engine {
        let mut engine = Engine::new(EngineOptions::default());
        engine.apply("init 2 seed1").unwrap();
        engine.apply("p1 faction terrans").unwrap();
        engine.apply("p2 faction xenos").unwrap();
        engine
    }

    #[test]
    fn test_valid_game_passes() {
        assert!(check_invariants(&started()).is_empty());
        assert!(check_invariants(&Engine::new(EngineOptions::default())).is_empty());
    }

    #[test]
    fn test_duplicate_turn_order_detected() {
        let mut engine = Engine::new(EngineOptions::default());
        engine.apply("init 2 seed1").unwrap();
        engine.turn_order = vec![0, 0];
        let violations = check_invariants(&engine);
        assert!(violations.iter().any(|v| v.message.contains("repeats")));
    }

    #[test]
    fn test_over_cap_credits_detected() {
        let mut engine = started();
        engine.players[0].data.credits = MAX_CREDIT + 1;
        let violations = check_invariants(&engine);
        assert!(violations.iter().any(|v| v.message.contains("over cap")));
    }

    #[test]
    fn test_wildcard_in_transit_detected() {
        let mut engine = started();
        engine.players[1].data.power.wildcard = WildcardArea::Transit;
        let violations = check_invariants(&engine);
        assert!(violations.iter().any(|v| v.message.contains("transit")));
    }

    #[test]
    fn test_unlisted_occupation_detected() {
        let mut engine = started();
        engine.players[0]
            .data
            .occupied
            .insert(Hex::new(40, 40), crate::faction::Planet::Terra);
        let violations = check_invariants(&engine);
        assert!(violations.iter().any(|v| v.message.contains("map disagrees")));
    }

    #[test]
    fn test_power_conservation() {
        let before = Power::new(2, 4, 0);
        let mut after = before;
        after.charge(3);
        assert!(check_power_conservation(&before, &after).is_none());
        after.gain_tokens(1);
        assert!(check_power_conservation(&before, &after).is_some());
    }
}
