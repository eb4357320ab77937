//! Typed resources and the cost/reward grammar.
//!
//! A reward list is written as comma-separated items, each an optional signed
//! count followed by a resource code: `2c,o`, `4pw`, `up-terra`. The empty
//! list is written `~`.
//!
//! | code | resource |
//! |---|---|
//! | `c` `o` `k` `q` `vp` | credits, ore, knowledge, qic, victory points |
//! | `t` | power tokens (gained into bowl 1, paid into the gaia area) |
//! | `tg` | tokens in the gaia area |
//! | `pw` | power (gained as a charge, paid from bowl 3) |
//! | `r` / `range` | permanent / temporary navigation range |
//! | `d` / `step` | terraforming discount / temporary terraforming steps |
//! | `gf` | gaia-formers |
//! | `up-<field>` | one step on a research track |

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::content::ResearchField;
use crate::error::ParseError;

/// Empty reward list.
pub const EMPTY: &str = "~";

/// A kind of resource a reward or cost refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Resource {
    /// Credits (`c`).
    Credit,
    /// Ore (`o`).
    Ore,
    /// Knowledge (`k`).
    Knowledge,
    /// Quantum intelligence cubes (`q`).
    Qic,
    /// Victory points (`vp`).
    VictoryPoint,
    /// Power tokens (`t`).
    GainToken,
    /// Power tokens in the gaia area (`tg`).
    GainTokenGaiaArea,
    /// Power charge or spend (`pw`).
    ChargePower,
    /// Permanent range (`r`).
    Range,
    /// Range for the current action (`range`).
    TemporaryRange,
    /// Terraforming discount (`d`).
    TerraformCostDiscount,
    /// Terraforming steps for the current action (`step`).
    TemporaryStep,
    /// Gaia-formers (`gf`).
    GaiaFormer,
    /// Research advance (`up-<field>`).
    UpgradeResearch(ResearchField),
}

impl Resource {
    /// Grammar code.
    #[must_use]
    pub fn code(self) -> String {
        let code = match self {
            Self::Credit => "c",
            Self::Ore => "o",
            Self::Knowledge => "k",
            Self::Qic => "q",
            Self::VictoryPoint => "vp",
            Self::GainToken => "t",
            Self::GainTokenGaiaArea => "tg",
            Self::ChargePower => "pw",
            Self::Range => "r",
            Self::TemporaryRange => "range",
            Self::TerraformCostDiscount => "d",
            Self::TemporaryStep => "step",
            Self::GaiaFormer => "gf",
            Self::UpgradeResearch(field) => return format!("up-{}", field.code()),
        };
        code.to_string()
    }
}

impl FromStr for Resource {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "c" => Self::Credit,
            "o" => Self::Ore,
            "k" => Self::Knowledge,
            "q" => Self::Qic,
            "vp" => Self::VictoryPoint,
            "t" => Self::GainToken,
            "tg" => Self::GainTokenGaiaArea,
            "pw" => Self::ChargePower,
            "r" => Self::Range,
            "range" => Self::TemporaryRange,
            "d" => Self::TerraformCostDiscount,
            "step" => Self::TemporaryStep,
            "gf" => Self::GaiaFormer,
            other => {
                let field = other
                    .strip_prefix("up-")
                    .ok_or_else(|| ParseError::new(s, "unknown resource"))?;
                Self::UpgradeResearch(field.parse()?)
            }
        })
    }
}

/// A signed amount of one resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Reward {
    /// Amount.
    pub count: i32,
    /// Resource kind.
    pub resource: Resource,
}

impl Reward {
    /// Create a new reward.
    #[must_use]
    pub const fn new(count: i32, resource: Resource) -> Self {
        Self { count, resource }
    }

    /// Whether this reward has no effect.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }
}

impl fmt::Display for Reward {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.count == 1 {
            write!(f, "{}", self.resource.code())
        } else {
            write!(f, "{}{}", self.count, self.resource.code())
        }
    }
}

impl FromStr for Reward {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let split = s
            .char_indices()
            .find(|&(i, c)| !(c.is_ascii_digit() || (i == 0 && c == '-')))
            .map_or(s.len(), |(i, _)| i);
        let (digits, code) = s.split_at(split);
        if code.is_empty() {
            return Err(ParseError::new(s, "missing resource code"));
        }
        let count = if digits.is_empty() {
            1
        } else {
            digits
                .parse()
                .map_err(|_| ParseError::new(s, "invalid count"))?
        };
        Ok(Self::new(count, code.parse()?))
    }
}

impl From<Reward> for String {
    fn from(reward: Reward) -> Self {
        reward.to_string()
    }
}

impl TryFrom<String> for Reward {
    type Error = ParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// An ordered list of rewards (or costs).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Rewards(pub Vec<Reward>);

impl Rewards {
    /// The empty list.
    #[must_use]
    pub const fn none() -> Self {
        Self(Vec::new())
    }

    /// A single reward.
    #[must_use]
    pub fn one(count: i32, resource: Resource) -> Self {
        Self(vec![Reward::new(count, resource)])
    }

    /// Whether the list has no effect.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.iter().all(Reward::is_empty)
    }

    /// Iterate over the items.
    pub fn iter(&self) -> impl Iterator<Item = &Reward> {
        self.0.iter()
    }

    /// Sum counts per resource, dropping zero totals. First-seen order is kept.
    #[must_use]
    pub fn merged(&self) -> Self {
        let mut out: Vec<Reward> = Vec::new();
        for reward in &self.0 {
            match out.iter_mut().find(|r| r.resource == reward.resource) {
                Some(existing) => existing.count += reward.count,
                None => out.push(*reward),
            }
        }
        out.retain(|r| !r.is_empty());
        Self(out)
    }

    /// Concatenate two lists and merge.
    #[must_use]
    pub fn plus(&self, other: &Self) -> Self {
        let mut all = self.0.clone();
        all.extend(other.0.iter().copied());
        Self(all).merged()
    }

    /// Total count for a resource.
    #[must_use]
    pub fn count_of(&self, resource: Resource) -> i32 {
        self.0
            .iter()
            .filter(|r| r.resource == resource)
            .map(|r| r.count)
            .sum()
    }

    /// Multiply every count.
    #[must_use]
    pub fn times(&self, factor: i32) -> Self {
        Self(
            self.0
                .iter()
                .map(|r| Reward::new(r.count * factor, r.resource))
                .collect(),
        )
    }

    /// Whether two lists are the same once merged, ignoring order.
    #[must_use]
    pub fn same_as(&self, other: &Self) -> bool {
        let mut a = self.merged().0;
        let mut b = other.merged().0;
        a.sort_by_key(|r| r.resource);
        b.sort_by_key(|r| r.resource);
        a == b
    }
}

impl fmt::Display for Rewards {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let items: Vec<String> = self
            .0
            .iter()
            .filter(|r| !r.is_empty())
            .map(ToString::to_string)
            .collect();
        if items.is_empty() {
            f.write_str(EMPTY)
        } else {
            f.write_str(&items.join(","))
        }
    }
}

impl FromStr for Rewards {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s == EMPTY {
            return Ok(Self::none());
        }
        s.split(',')
            .map(str::parse)
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }
}

impl From<Rewards> for String {
    fn from(rewards: Rewards) -> Self {
        rewards.to_string()
    }
}

impl TryFrom<String> for Rewards {
    type Error = ParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Reward> for Rewards {
    fn from(reward: Reward) -> Self {
        Self(vec![reward])
    }
}
