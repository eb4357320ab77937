//! Error types for move validation and execution.
//!
//! Two classes of failure exist. A [`ProtocolError`] means the caller
//! submitted something that was never on offer (bad text, wrong player,
//! a verb missing from the legal set) and is always fatal. A [`RuleError`]
//! means a well-formed move picked an option that a deeper check rejected;
//! the engine state is untouched and the same player may be asked again.

use thiserror::Error;

/// Caller misuse of the move protocol.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// The move text was empty.
    #[error("empty move")]
    EmptyMove,
    /// The first token was not a `p1`..`p5` player tag.
    #[error("wrong player format in '{0}', expected p1, p2, ...")]
    BadPlayerTag(String),
    /// The verb is not part of the move vocabulary.
    #[error("unknown command '{0}'")]
    UnknownCommand(String),
    /// The operands of a known verb could not be parsed.
    #[error("malformed '{command}' move: {reason}")]
    MalformedMove {
        /// Verb being parsed.
        command: String,
        /// What was wrong with the operands.
        reason: String,
    },
    /// A player moved out of turn.
    #[error("wrong turn order in move '{}', expected p{}, found p{}", .text, .expected + 1, .found + 1)]
    WrongTurn {
        /// Full move text.
        text: String,
        /// Player whose turn it is (0-based).
        expected: u8,
        /// Player who submitted the move (0-based).
        found: u8,
    },
    /// The verb is not in the legal set for the player to move.
    #[error("move '{text}' not in available commands: {available}")]
    NotAvailable {
        /// Full move text.
        text: String,
        /// Comma-separated verbs that were on offer.
        available: String,
    },
    /// The game is over.
    #[error("game has ended")]
    GameEnded,
}

/// A valid move that fails a game rule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    /// The chosen option is not among those offered.
    #[error("{what} '{value}' is not available")]
    OptionNotAvailable {
        /// Kind of option (building, booster, tile...).
        what: &'static str,
        /// Operand as submitted.
        value: String,
    },
    /// The player cannot pay the given cost.
    #[error("cannot afford {0}")]
    CannotAfford(String),
    /// An operand named content that does not exist.
    #[error("unknown {what} '{value}'")]
    UnknownContent {
        /// Kind of content.
        what: &'static str,
        /// Name as submitted.
        value: String,
    },
    /// A reward or event string failed to parse.
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// The seat does not exist in this game.
    #[error("no player p{} in this game", .0 + 1)]
    UnknownPlayer(u8),
    /// The operation needs a faction but none is chosen yet.
    #[error("player p{} has no faction", .0 + 1)]
    NoFaction(u8),
}

/// Failure to parse the reward or event grammar.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot parse '{input}': {reason}")]
pub struct ParseError {
    /// Offending input.
    pub input: String,
    /// Explanation.
    pub reason: String,
}

impl ParseError {
    /// Create a new parse error.
    pub fn new(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            reason: reason.into(),
        }
    }
}

/// Any failure to apply a move.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoveError {
    /// Fatal protocol violation.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    /// Recoverable rule violation.
    #[error(transparent)]
    Rule(#[from] RuleError),
}

impl MoveError {
    /// Whether this is a protocol violation.
    #[must_use]
    pub const fn is_protocol(&self) -> bool {
        matches!(self, Self::Protocol(_))
    }

    /// Whether this is a rule violation that can be re-prompted.
    #[must_use]
    pub const fn is_rule(&self) -> bool {
        matches!(self, Self::Rule(_))
    }
}

impl From<ParseError> for MoveError {
    fn from(e: ParseError) -> Self {
        Self::Rule(RuleError::Parse(e))
    }
}

/// Result type for move application.
pub type MoveResult<T> = Result<T, MoveError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrong_turn_is_one_based_in_message() {
        let err = ProtocolError::WrongTurn {
            text: "p2 pass".to_string(),
            expected: 0,
            found: 1,
        };
        assert_eq!(
            err.to_string(),
            "wrong turn order in move 'p2 pass', expected p1, found p2"
        );
    }

    #[test]
    fn test_move_error_classification() {
        let protocol: MoveError = ProtocolError::EmptyMove.into();
        assert!(protocol.is_protocol());
        assert!(!protocol.is_rule());

        let rule: MoveError = ParseError::new("x", "bad").into();
        assert!(rule.is_rule());
    }
}
