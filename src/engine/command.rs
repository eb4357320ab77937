//! Move text.
//!
//! A move is `pN <verb> <operands...>`, or `init <players> <seed>` which
//! carries no player tag. Parsing only checks shape; whether the move is
//! legal is the engine's business.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::content::{AdvTechTile, BoardAction, Booster, FederationTile, ResearchField, TechTile, named_enum};
use crate::error::{ParseError, ProtocolError};
use crate::faction::{Building, Faction};
use crate::hex::{Hex, join_hexes, split_hexes};
use crate::reward::{Reward, Rewards};

/// Largest seat count.
pub const MAX_PLAYERS: usize = 5;
/// Seat count when `init` names none.
pub const DEFAULT_PLAYERS: usize = 2;
/// Seed when `init` names none.
pub const DEFAULT_SEED: &str = "defaultSeed";

named_enum!(
    /// Move verbs.
    CommandName, "command" {
        Init => "init",
        ChooseFaction => "faction",
        Build => "build",
        ChooseRoundBooster => "booster",
        Pass => "pass",
        Leech => "leech",
        DeclineLeech => "decline",
        ChooseIncome => "income",
        ChooseTechTile => "tech",
        ChooseCoverTechTile => "cover",
        UpgradeResearch => "up",
        PlaceLostPlanet => "lostplanet",
        FormFederation => "federation",
        ChooseFederationTile => "fedtile",
        Spend => "spend",
        BurnPower => "burn",
        Action => "action",
        Special => "special",
    }
);

/// A standard or advanced tech tile, as named in a `tech` move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TechChoice {
    /// A standard tile.
    Standard(TechTile),
    /// An advanced tile.
    Advanced(AdvTechTile),
}

impl fmt::Display for TechChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Standard(t) => t.fmt(f),
            Self::Advanced(t) => t.fmt(f),
        }
    }
}

impl std::str::FromStr for TechChoice {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse()
            .map(Self::Standard)
            .or_else(|_| s.parse().map(Self::Advanced))
            .map_err(|_: ParseError| ParseError::new(s, "unknown tech tile"))
    }
}

/// A parsed command with typed operands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Start a game.
    Init {
        /// Seat count.
        players: usize,
        /// Setup seed.
        seed: String,
    },
    /// Pick a faction.
    ChooseFaction(Faction),
    /// Place or upgrade a building.
    Build {
        /// What ends up on the hex.
        building: Building,
        /// Where.
        hex: Hex,
    },
    /// Pick a booster during setup.
    ChooseRoundBooster(Booster),
    /// Pass, taking a booster for next round unless this is the last one.
    Pass(Option<Booster>),
    /// Accept a leech offer.
    Leech(u32),
    /// Decline a leech offer.
    DeclineLeech,
    /// Play one conflicting income effect.
    ChooseIncome(Reward),
    /// Take a tech tile.
    ChooseTechTile(TechChoice),
    /// Cover a standard tile with a pending advanced one.
    ChooseCoverTechTile(TechTile),
    /// Move up a research track.
    UpgradeResearch(ResearchField),
    /// Place the lost planet.
    PlaceLostPlanet(Hex),
    /// Form a federation.
    FormFederation {
        /// Buildings and satellites.
        hexes: Vec<Hex>,
        /// Tile taken.
        tile: FederationTile,
    },
    /// Pick (or rescore) a federation tile.
    ChooseFederationTile(FederationTile),
    /// Free conversion.
    Spend {
        /// What is paid.
        cost: Rewards,
        /// What is gained.
        income: Rewards,
    },
    /// Burn power.
    BurnPower(u32),
    /// Take a board action.
    Action(BoardAction),
    /// Use a special action.
    Special(Rewards),
}

impl Command {
    /// The verb.
    #[must_use]
    pub const fn name(&self) -> CommandName {
        match self {
            Self::Init { .. } => CommandName::Init,
            Self::ChooseFaction(_) => CommandName::ChooseFaction,
            Self::Build { .. } => CommandName::Build,
            Self::ChooseRoundBooster(_) => CommandName::ChooseRoundBooster,
            Self::Pass(_) => CommandName::Pass,
            Self::Leech(_) => CommandName::Leech,
            Self::DeclineLeech => CommandName::DeclineLeech,
            Self::ChooseIncome(_) => CommandName::ChooseIncome,
            Self::ChooseTechTile(_) => CommandName::ChooseTechTile,
            Self::ChooseCoverTechTile(_) => CommandName::ChooseCoverTechTile,
            Self::UpgradeResearch(_) => CommandName::UpgradeResearch,
            Self::PlaceLostPlanet(_) => CommandName::PlaceLostPlanet,
            Self::FormFederation { .. } => CommandName::FormFederation,
            Self::ChooseFederationTile(_) => CommandName::ChooseFederationTile,
            Self::Spend { .. } => CommandName::Spend,
            Self::BurnPower(_) => CommandName::BurnPower,
            Self::Action(_) => CommandName::Action,
            Self::Special(_) => CommandName::Special,
        }
    }

    /// Parse the operands of `name`.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::MalformedMove`] if an operand is missing,
    /// extra or unparseable, or if `init` names an unsupported seat count.
    pub fn parse(name: CommandName, args: &[&str]) -> Result<Self, ProtocolError> {
        let malformed = |reason: String| ProtocolError::MalformedMove {
            command: name.code().to_string(),
            reason,
        };
        let bad = |e: ParseError| malformed(e.to_string());
        let arity = |n: usize| {
            if args.len() == n {
                Ok(())
            } else {
                Err(malformed(format!("expected {n} operands, got {}", args.len())))
            }
        };
        let count = |s: &str| s.parse::<u32>().map_err(|_| malformed(format!("invalid number: {s}")));

        Ok(match name {
            CommandName::Init => {
                if args.len() > 2 {
                    return Err(malformed("expected at most 2 operands".to_string()));
                }
                let players = match args.first() {
                    Some(n) => n
                        .parse::<usize>()
                        .map_err(|_| malformed(format!("invalid player count: {n}")))?,
                    None => DEFAULT_PLAYERS,
                };
                if !(2..=MAX_PLAYERS).contains(&players) {
                    return Err(malformed(format!(
                        "player count must be 2 to {MAX_PLAYERS}, got {players}"
                    )));
                }
                Self::Init {
                    players,
                    seed: args.get(1).copied().unwrap_or(DEFAULT_SEED).to_string(),
                }
            }
            CommandName::ChooseFaction => {
                arity(1)?;
                Self::ChooseFaction(args[0].parse().map_err(bad)?)
            }
            CommandName::Build => {
                arity(2)?;
                Self::Build {
                    building: args[0].parse().map_err(bad)?,
                    hex: args[1].parse().map_err(bad)?,
                }
            }
            CommandName::ChooseRoundBooster => {
                arity(1)?;
                Self::ChooseRoundBooster(args[0].parse().map_err(bad)?)
            }
            CommandName::Pass => match args {
                [] => Self::Pass(None),
                [booster] => Self::Pass(Some(booster.parse().map_err(bad)?)),
                _ => return Err(malformed("expected at most 1 operand".to_string())),
            },
            CommandName::Leech => {
                arity(1)?;
                Self::Leech(count(args[0].trim_end_matches("pw"))?)
            }
            CommandName::DeclineLeech => {
                arity(0)?;
                Self::DeclineLeech
            }
            CommandName::ChooseIncome => {
                arity(1)?;
                Self::ChooseIncome(args[0].parse().map_err(bad)?)
            }
            CommandName::ChooseTechTile => {
                arity(1)?;
                Self::ChooseTechTile(args[0].parse().map_err(bad)?)
            }
            CommandName::ChooseCoverTechTile => {
                arity(1)?;
                Self::ChooseCoverTechTile(args[0].parse().map_err(bad)?)
            }
            CommandName::UpgradeResearch => {
                arity(1)?;
                Self::UpgradeResearch(args[0].parse().map_err(bad)?)
            }
            CommandName::PlaceLostPlanet => {
                arity(1)?;
                Self::PlaceLostPlanet(args[0].parse().map_err(bad)?)
            }
            CommandName::FormFederation => {
                arity(2)?;
                Self::FormFederation {
                    hexes: split_hexes(args[0]).map_err(bad)?,
                    tile: args[1].parse().map_err(bad)?,
                }
            }
            CommandName::ChooseFederationTile => {
                arity(1)?;
                Self::ChooseFederationTile(args[0].parse().map_err(bad)?)
            }
            CommandName::Spend => match args {
                [cost, "for", income] => Self::Spend {
                    cost: cost.parse().map_err(bad)?,
                    income: income.parse().map_err(bad)?,
                },
                _ => return Err(malformed("expected `<cost> for <income>`".to_string())),
            },
            CommandName::BurnPower => {
                arity(1)?;
                Self::BurnPower(count(args[0])?)
            }
            CommandName::Action => {
                arity(1)?;
                Self::Action(args[0].parse().map_err(bad)?)
            }
            CommandName::Special => {
                arity(1)?;
                Self::Special(args[0].parse().map_err(bad)?)
            }
        })
    }

    /// Operands in move syntax, without the verb.
    #[must_use]
    pub fn operands(&self) -> String {
        match self {
            Self::Init { players, seed } => format!("{players} {seed}"),
            Self::ChooseFaction(f) => f.to_string(),
            Self::Build { building, hex } => format!("{building} {hex}"),
            Self::ChooseRoundBooster(b) | Self::Pass(Some(b)) => b.to_string(),
            Self::Pass(None) | Self::DeclineLeech => String::new(),
            Self::Leech(n) | Self::BurnPower(n) => n.to_string(),
            Self::ChooseIncome(r) => r.to_string(),
            Self::ChooseTechTile(t) => t.to_string(),
            Self::ChooseCoverTechTile(t) => t.to_string(),
            Self::UpgradeResearch(f) => f.to_string(),
            Self::PlaceLostPlanet(h) => h.to_string(),
            Self::FormFederation { hexes, tile } => format!("{} {tile}", join_hexes(hexes)),
            Self::ChooseFederationTile(t) => t.to_string(),
            Self::Spend { cost, income } => format!("{cost} for {income}"),
            Self::Action(a) => a.to_string(),
            Self::Special(r) => r.to_string(),
        }
    }
}

/// A parsed move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Move {
    /// Acting seat, `None` for `init`.
    pub player: Option<u8>,
    /// What the seat does.
    pub command: Command,
}

impl Move {
    /// Parse move text.
    ///
    /// # Errors
    ///
    /// Returns a [`ProtocolError`] for empty text, a bad player tag, an
    /// unknown verb or malformed operands.
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        let Some((&first, rest)) = tokens.split_first() else {
            return Err(ProtocolError::EmptyMove);
        };

        if first == CommandName::Init.code() {
            return Ok(Self {
                player: None,
                command: Command::parse(CommandName::Init, rest)?,
            });
        }

        let player = parse_player_tag(first)?;
        let Some((&verb, args)) = rest.split_first() else {
            return Err(ProtocolError::UnknownCommand(String::new()));
        };
        let name: CommandName = verb
            .parse()
            .map_err(|_| ProtocolError::UnknownCommand(verb.to_string()))?;
        if name == CommandName::Init {
            return Err(ProtocolError::UnknownCommand(verb.to_string()));
        }
        Ok(Self {
            player: Some(player),
            command: Command::parse(name, args)?,
        })
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(p) = self.player {
            write!(f, "{} ", player_tag(p))?;
        }
        f.write_str(self.command.name().code())?;
        let operands = self.command.operands();
        if !operands.is_empty() {
            write!(f, " {operands}")?;
        }
        Ok(())
    }
}

/// `p1` for seat 0.
#[must_use]
pub fn player_tag(player: u8) -> String {
    format!("p{}", u32::from(player) + 1)
}

/// Parse `p1`..`p5` into a 0-based seat.
///
/// # Errors
///
/// Returns [`ProtocolError::BadPlayerTag`] for anything else.
pub fn parse_player_tag(tag: &str) -> Result<u8, ProtocolError> {
    let bad = || ProtocolError::BadPlayerTag(tag.to_string());
    let digits = tag.strip_prefix('p').ok_or_else(bad)?;
    if digits.len() != 1 {
        return Err(bad());
    }
    let n: u8 = digits.parse().map_err(|_| bad())?;
    if (1..=5).contains(&n) {
        Ok(n - 1)
    } else {
        Err(bad())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_tags() {
        assert_eq!(parse_player_tag("p1").unwrap(), 0);
        assert_eq!(parse_player_tag("p5").unwrap(), 4);
        assert!(parse_player_tag("p0").is_err());
        assert!(parse_player_tag("p6").is_err());
        assert!(parse_player_tag("p12").is_err());
        assert!(parse_player_tag("x1").is_err());
        assert_eq!(player_tag(2), "p3");
    }

    #[test]
    fn test_parse_moves() {
        let m = Move::parse("init 3 seed42").unwrap();
        assert_eq!(m.player, None);
        assert_eq!(
            m.command,
            Command::Init {
                players: 3,
                seed: "seed42".to_string()
            }
        );

        let m = Move::parse("p2 build m -1,2").unwrap();
        assert_eq!(m.player, Some(1));
        assert_eq!(
            m.command,
            Command::Build {
                building: Building::Mine,
                hex: Hex::new(-1, 2)
            }
        );

        let m = Move::parse("p1 spend 4pw for q").unwrap();
        assert_eq!(m.command.name(), CommandName::Spend);

        assert_eq!(
            Move::parse("p1 tech adv3").unwrap().command,
            Command::ChooseTechTile(TechChoice::Advanced(AdvTechTile::Adv3))
        );
        assert_eq!(Move::parse("p1 pass").unwrap().command, Command::Pass(None));
        assert_eq!(
            Move::parse("init").unwrap().command,
            Command::Init {
                players: DEFAULT_PLAYERS,
                seed: DEFAULT_SEED.to_string()
            }
        );
        assert_eq!(Move::parse("p1 leech 2pw").unwrap().command, Command::Leech(2));
    }

    #[test]
    fn test_protocol_errors() {
        assert_eq!(Move::parse("   "), Err(ProtocolError::EmptyMove));
        assert!(matches!(Move::parse("q1 pass"), Err(ProtocolError::BadPlayerTag(_))));
        assert!(matches!(Move::parse("p1 fly"), Err(ProtocolError::UnknownCommand(_))));
        assert!(matches!(Move::parse("p1 init 2 s"), Err(ProtocolError::UnknownCommand(_))));
        for text in ["init 1 s", "init 6 s", "init 0"] {
            assert!(
                matches!(Move::parse(text), Err(ProtocolError::MalformedMove { ref command, .. }) if command == "init"),
                "{text}"
            );
        }
        assert!(matches!(
            Move::parse("p1 build m"),
            Err(ProtocolError::MalformedMove { .. })
        ));
        assert!(matches!(
            Move::parse("p1 spend 4pw q"),
            Err(ProtocolError::MalformedMove { .. })
        ));
    }

    #[test]
    fn test_display_matches_input() {
        for text in [
            "init 2 seed",
            "p1 faction terrans",
            "p2 federation 0,0;1,0 fed2",
            "p1 pass booster3",
            "p1 spend 4pw for q",
            "p3 decline",
        ] {
            assert_eq!(Move::parse(text).unwrap().to_string(), text);
        }
    }
}
