//! Typed game events.
//!
//! Content tables describe effects with a small grammar:
//!
//! - `+x` income, paid every income phase
//! - `=>x` activatable once per round (special action)
//! - `cond >> x` trigger, paid whenever `cond` happens
//! - `cond | x` pass bonus, paid once per matching item when passing
//! - `cond > x` one-shot bonus, paid once per matching item
//! - `x` one-shot bonus
//!
//! where `x` is a reward list (see [`crate::reward`]).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::content::{AdvTechTile, Booster, ResearchField, TechTile};
use crate::error::ParseError;
use crate::faction::{Building, Planet};
use crate::reward::{Reward, Rewards};

/// When an event pays out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    /// Immediately, once.
    Once,
    /// Every income phase.
    Income,
    /// Whenever the condition happens.
    Trigger,
    /// On demand, once per round.
    Activate,
    /// When the player passes.
    Pass,
}

/// What an event reacts to, or what it counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Condition {
    /// Unconditional.
    #[default]
    None,
    /// Mines.
    Mine,
    /// Trading stations.
    TradingStation,
    /// Research labs.
    ResearchLab,
    /// Planetary institute and academies.
    BigBuilding,
    /// Mines on gaia planets.
    Gaia,
    /// Federations.
    Federation,
    /// Distinct planet types.
    PlanetType,
    /// Research advances.
    AdvanceResearch,
}

impl Condition {
    /// Grammar code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::None => "",
            Self::Mine => "m",
            Self::TradingStation => "ts",
            Self::ResearchLab => "lab",
            Self::BigBuilding => "PA",
            Self::Gaia => "g",
            Self::Federation => "fed",
            Self::PlanetType => "pt",
            Self::AdvanceResearch => "a",
        }
    }

    /// Whether building `building` on `planet` fires this trigger.
    #[must_use]
    pub fn matches_building(self, building: Building, planet: Planet) -> bool {
        match self {
            Self::Mine => building == Building::Mine,
            Self::TradingStation => building == Building::TradingStation,
            Self::ResearchLab => building == Building::ResearchLab,
            Self::BigBuilding => building.is_big(),
            Self::Gaia => building == Building::Mine && planet == Planet::Gaia,
            Self::None | Self::Federation | Self::PlanetType | Self::AdvanceResearch => false,
        }
    }
}

impl FromStr for Condition {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim() {
            "" | "~" => Self::None,
            "m" => Self::Mine,
            "ts" => Self::TradingStation,
            "lab" => Self::ResearchLab,
            "PA" => Self::BigBuilding,
            "g" => Self::Gaia,
            "fed" => Self::Federation,
            "pt" => Self::PlanetType,
            "a" => Self::AdvanceResearch,
            other => return Err(ParseError::new(other, "unknown condition")),
        })
    }
}

/// Where an event came from, so it can be removed again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EventSource {
    /// The faction board itself.
    #[default]
    Board,
    /// A building on the faction board.
    Building(Building),
    /// A round booster.
    Booster(Booster),
    /// A standard tech tile.
    TechTile(TechTile),
    /// An advanced tech tile.
    AdvTechTile(AdvTechTile),
    /// A research track level.
    Research(ResearchField),
}

/// A parsed event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// When it pays.
    pub operator: Operator,
    /// Trigger or multiplier.
    pub condition: Condition,
    /// What it pays.
    pub rewards: Rewards,
    /// Source text.
    pub spec: String,
    /// Origin.
    pub source: EventSource,
    /// For activatable events, whether it was used this round.
    pub activated: bool,
}

impl Event {
    /// Parse one event spec.
    ///
    /// Income specs are split into one event per reward, so that token gains
    /// and power charges from the same source can be ordered independently.
    ///
    /// # Errors
    ///
    /// Returns an error on an unknown condition or malformed reward list.
    pub fn parse(spec: &str, source: EventSource) -> Result<Vec<Self>, ParseError> {
        let spec = spec.trim();
        let (operator, condition, rewards) = if let Some(rest) = spec.strip_prefix("=>") {
            (Operator::Activate, Condition::None, rest)
        } else if let Some(rest) = spec.strip_prefix('+') {
            (Operator::Income, Condition::None, rest)
        } else if let Some((cond, rest)) = spec.split_once(">>") {
            (Operator::Trigger, cond.parse()?, rest)
        } else if let Some((cond, rest)) = spec.split_once('|') {
            (Operator::Pass, cond.parse()?, rest)
        } else if let Some((cond, rest)) = spec.split_once('>') {
            (Operator::Once, cond.parse()?, rest)
        } else {
            (Operator::Once, Condition::None, spec)
        };
        let rewards: Rewards = rewards.parse()?;

        if operator == Operator::Income {
            return Ok(rewards
                .iter()
                .filter(|r| !r.is_empty())
                .map(|r| Self::income(*r, source))
                .collect());
        }

        Ok(vec![Self {
            operator,
            condition,
            rewards,
            spec: spec.to_string(),
            source,
            activated: false,
        }])
    }

    /// Parse a list of specs from one source.
    ///
    /// # Errors
    ///
    /// Returns the first parse error.
    pub fn parse_all<S: AsRef<str>>(
        specs: &[S],
        source: EventSource,
    ) -> Result<Vec<Self>, ParseError> {
        let mut events = Vec::new();
        for spec in specs {
            events.extend(Self::parse(spec.as_ref(), source)?);
        }
        Ok(events)
    }

    /// A single-reward income event.
    #[must_use]
    pub fn income(reward: Reward, source: EventSource) -> Self {
        Self {
            operator: Operator::Income,
            condition: Condition::None,
            rewards: Rewards::from(reward),
            spec: format!("+{reward}"),
            source,
            activated: false,
        }
    }

    /// The reward list an activatable event offers, in grammar form.
    #[must_use]
    pub fn action_text(&self) -> String {
        self.rewards.to_string()
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reward::Resource;

    #[test]
    fn test_income_split_per_reward() {
        let events = Event::parse("+4pw,t", EventSource::Board).unwrap();
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.operator == Operator::Income));
        assert_eq!(events[0].spec, "+4pw");
        assert_eq!(events[1].rewards.count_of(Resource::GainToken), 1);
    }

    #[test]
    fn test_operators() {
        let parse = |s| Event::parse(s, EventSource::Board).unwrap().remove(0);
        assert_eq!(parse("=>q").operator, Operator::Activate);
        assert_eq!(parse("3k,4o").operator, Operator::Once);

        let trigger = parse("m >> 3vp");
        assert_eq!(trigger.operator, Operator::Trigger);
        assert_eq!(trigger.condition, Condition::Mine);

        let pass = parse("lab | 3vp");
        assert_eq!(pass.operator, Operator::Pass);
        assert_eq!(pass.condition, Condition::ResearchLab);

        let once = parse("g > 2vp");
        assert_eq!(once.operator, Operator::Once);
        assert_eq!(once.condition, Condition::Gaia);
        assert_eq!(once.rewards.count_of(Resource::VictoryPoint), 2);
    }

    #[test]
    fn test_empty_income() {
        assert!(Event::parse("~", EventSource::Board).unwrap()[0].rewards.is_empty());
        assert!(Event::parse("+~", EventSource::Board).unwrap().is_empty());
    }

    #[test]
    fn test_trigger_matching() {
        assert!(Condition::Gaia.matches_building(Building::Mine, Planet::Gaia));
        assert!(!Condition::Gaia.matches_building(Building::Mine, Planet::Desert));
        assert!(Condition::BigBuilding.matches_building(Building::Academy2, Planet::Ice));
        assert!(!Condition::Mine.matches_building(Building::TradingStation, Planet::Ice));
    }

    #[test]
    fn test_unknown_condition() {
        assert!(Event::parse("zz >> vp", EventSource::Board).is_err());
    }
}
