//! Output formatting utilities for CLI.

use std::fmt::Write;

use gaia_engine::content::ResearchField;
use gaia_engine::engine::player_tag;
use gaia_engine::{Engine, Phase};
use serde::Serialize;

/// JSON-serializable game summary.
#[derive(Debug, Serialize)]
pub(super) struct JsonSummary {
    /// Round number.
    pub(super) round: i32,
    /// Phase name.
    pub(super) phase: Phase,
    /// Seat to move, as `pN`.
    pub(super) current_player: Option<String>,
    /// Moves applied.
    pub(super) moves: usize,
    /// Per-player state.
    pub(super) players: Vec<JsonPlayer>,
    /// Concrete legal moves.
    pub(super) legal_moves: Vec<String>,
}

/// JSON-serializable player state.
#[derive(Debug, Serialize)]
pub(super) struct JsonPlayer {
    /// Seat tag.
    pub(super) player: String,
    /// Faction code, if chosen.
    pub(super) faction: Option<String>,
    /// Victory points.
    pub(super) victory_points: i32,
    /// Credits.
    pub(super) credits: u32,
    /// Ore.
    pub(super) ores: u32,
    /// Knowledge.
    pub(super) knowledge: u32,
    /// QICs.
    pub(super) qics: u32,
    /// Power bowls 1 to 3.
    pub(super) power: [u32; 3],
    /// Research levels.
    pub(super) research: [u8; 6],
}

impl JsonSummary {
    /// Summarize an engine.
    pub(super) fn from_engine(engine: &Engine) -> Self {
        Self {
            round: engine.round,
            phase: engine.phase,
            current_player: engine.current_player.map(player_tag),
            moves: engine.move_log.len(),
            players: engine
                .players
                .iter()
                .map(|p| JsonPlayer {
                    player: player_tag(p.id),
                    faction: p.faction.map(|f| f.to_string()),
                    victory_points: p.data.victory_points,
                    credits: p.data.credits,
                    ores: p.data.ores,
                    knowledge: p.data.knowledge,
                    qics: p.data.qics,
                    power: [p.data.power.area1, p.data.power.area2, p.data.power.area3],
                    research: p.data.research,
                })
                .collect(),
            legal_moves: engine.legal_moves(),
        }
    }
}

/// Format a game as human-readable text.
pub(super) fn format_text(engine: &Engine) -> String {
    let mut output = String::new();

    let _ = writeln!(
        output,
        "Round {} ({:?}), {} moves applied",
        engine.round,
        engine.phase,
        engine.move_log.len()
    );
    match engine.current_player {
        Some(seat) => {
            let _ = writeln!(output, "  To move: {}", player_tag(seat));
        }
        None if engine.is_ended() => output.push_str("  Game over\n"),
        None => output.push_str("  To move: anyone\n"),
    }
    output.push('\n');

    for p in &engine.players {
        let faction = p.faction.map_or_else(|| "-".to_string(), |f| f.to_string());
        let d = &p.data;
        let _ = writeln!(
            output,
            "  {} {faction}: {} vp, {}c {}o {}k {}q, power {}/{}/{}",
            player_tag(p.id),
            d.victory_points,
            d.credits,
            d.ores,
            d.knowledge,
            d.qics,
            d.power.area1,
            d.power.area2,
            d.power.area3
        );
        let research: Vec<String> = ResearchField::ALL
            .iter()
            .map(|&f| format!("{f} {}", d.research(f)))
            .collect();
        let _ = writeln!(output, "      research: {}", research.join(", "));
    }

    let moves = engine.legal_moves();
    if !moves.is_empty() {
        let _ = writeln!(output, "\n  Legal moves ({}):", moves.len());
        for mv in moves.iter().take(20) {
            let _ = writeln!(output, "    {mv}");
        }
        if moves.len() > 20 {
            let _ = writeln!(output, "    ... {} more", moves.len() - 20);
        }
    }

    output
}

/// Result of checking one move file.
#[derive(Debug, Default)]
pub(super) struct CheckStats {
    /// Files checked.
    pub(super) files: u64,
    /// Files that replayed cleanly.
    pub(super) passed: u64,
    /// Moves applied across all files.
    pub(super) moves: u64,
    /// One line per failing file.
    pub(super) failures: Vec<String>,
}

impl CheckStats {
    /// Merge another thread's stats.
    pub(super) fn merge(&mut self, other: Self) {
        self.files += other.files;
        self.passed += other.passed;
        self.moves += other.moves;
        self.failures.extend(other.failures);
    }
}

/// Format check results as text.
pub(super) fn format_check(stats: &CheckStats) -> String {
    let mut output = String::new();
    let _ = writeln!(
        output,
        "Checked {} files, {} moves: {} passed, {} failed",
        stats.files,
        stats.moves,
        stats.passed,
        stats.failures.len()
    );
    for failure in &stats.failures {
        let _ = writeln!(output, "  {failure}");
    }
    output
}
