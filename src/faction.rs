//! Factions, planets, buildings and faction boards.
//!
//! The per-faction numbers live behind the [`FactionData`] trait; the engine
//! only consumes the [`FactionBoard`] it returns.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParseError;
use crate::event::{Event, EventSource};
use crate::reward::Rewards;

/// Planet types. The first seven form the terraforming wheel, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Planet {
    /// `r`
    Terra,
    /// `d`
    Desert,
    /// `s`
    Swamp,
    /// `o`
    Oxide,
    /// `t`
    Titanium,
    /// `i`
    Ice,
    /// `v`
    Volcanic,
    /// `g`
    Gaia,
    /// `m`, needs a gaia-former before it can hold a mine.
    Transdim,
    /// `e`, empty space.
    Empty,
    /// `l`, placed by the navigation track.
    Lost,
}

const WHEEL: [Planet; 7] = [
    Planet::Terra,
    Planet::Desert,
    Planet::Swamp,
    Planet::Oxide,
    Planet::Titanium,
    Planet::Ice,
    Planet::Volcanic,
];

impl Planet {
    /// Single-letter code.
    #[must_use]
    pub const fn code(self) -> char {
        match self {
            Self::Terra => 'r',
            Self::Desert => 'd',
            Self::Swamp => 's',
            Self::Oxide => 'o',
            Self::Titanium => 't',
            Self::Ice => 'i',
            Self::Volcanic => 'v',
            Self::Gaia => 'g',
            Self::Transdim => 'm',
            Self::Empty => 'e',
            Self::Lost => 'l',
        }
    }

    /// Parse a single-letter code.
    #[must_use]
    pub fn from_code(c: char) -> Option<Self> {
        [
            Self::Terra,
            Self::Desert,
            Self::Swamp,
            Self::Oxide,
            Self::Titanium,
            Self::Ice,
            Self::Volcanic,
            Self::Gaia,
            Self::Transdim,
            Self::Empty,
            Self::Lost,
        ]
        .into_iter()
        .find(|p| p.code() == c)
    }

    /// Whether this planet sits on the terraforming wheel.
    #[must_use]
    pub fn is_habitable(self) -> bool {
        WHEEL.contains(&self)
    }

    fn wheel_pos(self) -> Option<usize> {
        WHEEL.iter().position(|&p| p == self)
    }
}

/// Terraforming steps between two wheel planets (0..=3). Off-wheel planets
/// need none.
#[must_use]
pub fn terraforming_steps(from: Planet, to: Planet) -> u32 {
    match (from.wheel_pos(), to.wheel_pos()) {
        (Some(a), Some(b)) => {
            let d = a.abs_diff(b);
            #[allow(clippy::cast_possible_truncation)]
            let steps = d.min(WHEEL.len() - d) as u32;
            steps
        }
        _ => 0,
    }
}

/// Building types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Building {
    /// `m`
    Mine,
    /// `ts`
    TradingStation,
    /// `lab`
    ResearchLab,
    /// `PI`
    PlanetaryInstitute,
    /// `ac1`
    Academy1,
    /// `ac2`
    Academy2,
    /// `gf`
    GaiaFormer,
}

impl Building {
    /// All buildings.
    pub const ALL: [Self; 7] = [
        Self::Mine,
        Self::TradingStation,
        Self::ResearchLab,
        Self::PlanetaryInstitute,
        Self::Academy1,
        Self::Academy2,
        Self::GaiaFormer,
    ];

    /// Move code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Mine => "m",
            Self::TradingStation => "ts",
            Self::ResearchLab => "lab",
            Self::PlanetaryInstitute => "PI",
            Self::Academy1 => "ac1",
            Self::Academy2 => "ac2",
            Self::GaiaFormer => "gf",
        }
    }

    /// Planetary institute or academy.
    #[must_use]
    pub const fn is_big(self) -> bool {
        matches!(
            self,
            Self::PlanetaryInstitute | Self::Academy1 | Self::Academy2
        )
    }

    /// Federation value before faction bonuses.
    #[must_use]
    pub const fn base_value(self) -> u32 {
        match self {
            Self::Mine => 1,
            Self::TradingStation | Self::ResearchLab => 2,
            Self::PlanetaryInstitute | Self::Academy1 | Self::Academy2 => 3,
            Self::GaiaFormer => 0,
        }
    }

    /// What this building can be upgraded into.
    #[must_use]
    pub const fn upgrades(self) -> &'static [Self] {
        match self {
            Self::Mine => &[Self::TradingStation],
            Self::TradingStation => &[Self::ResearchLab, Self::PlanetaryInstitute],
            Self::ResearchLab => &[Self::Academy1, Self::Academy2],
            Self::GaiaFormer => &[Self::Mine],
            Self::PlanetaryInstitute | Self::Academy1 | Self::Academy2 => &[],
        }
    }
}

impl fmt::Display for Building {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Building {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|b| b.code() == s)
            .ok_or_else(|| ParseError::new(s, "unknown building"))
    }
}

/// Playable factions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[allow(missing_docs)]
pub enum Faction {
    Terrans,
    Lantids,
    Xenos,
    Gleens,
    Taklons,
    Ambas,
    HadschHallas,
    Ivits,
    Geodens,
    BalTaks,
    Firaks,
    Bescods,
    Itars,
    Nevlas,
}

impl Faction {
    /// All factions, paired by home planet.
    pub const ALL: [Self; 14] = [
        Self::Terrans,
        Self::Lantids,
        Self::Xenos,
        Self::Gleens,
        Self::Taklons,
        Self::Ambas,
        Self::HadschHallas,
        Self::Ivits,
        Self::Geodens,
        Self::BalTaks,
        Self::Firaks,
        Self::Bescods,
        Self::Itars,
        Self::Nevlas,
    ];

    /// Move code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Terrans => "terrans",
            Self::Lantids => "lantids",
            Self::Xenos => "xenos",
            Self::Gleens => "gleens",
            Self::Taklons => "taklons",
            Self::Ambas => "ambas",
            Self::HadschHallas => "hadsch-hallas",
            Self::Ivits => "ivits",
            Self::Geodens => "geodens",
            Self::BalTaks => "baltaks",
            Self::Firaks => "firaks",
            Self::Bescods => "bescods",
            Self::Itars => "itars",
            Self::Nevlas => "nevlas",
        }
    }

    /// Home planet.
    #[must_use]
    pub const fn planet(self) -> Planet {
        match self {
            Self::Terrans | Self::Lantids => Planet::Terra,
            Self::Xenos | Self::Gleens => Planet::Desert,
            Self::Taklons | Self::Ambas => Planet::Swamp,
            Self::HadschHallas | Self::Ivits => Planet::Oxide,
            Self::Geodens | Self::BalTaks => Planet::Volcanic,
            Self::Firaks | Self::Bescods => Planet::Titanium,
            Self::Itars | Self::Nevlas => Planet::Ice,
        }
    }

    /// The other faction sharing this faction's home planet.
    #[must_use]
    pub fn opposite(self) -> Self {
        let i = Self::ALL.iter().position(|&f| f == self).unwrap_or(0);
        Self::ALL[i ^ 1]
    }
}

impl fmt::Display for Faction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Faction {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|f| f.code() == s)
            .ok_or_else(|| ParseError::new(s, "unknown faction"))
    }
}

/// Where the wildcard power token sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum WildcardArea {
    /// Not in the game.
    #[default]
    Out,
    /// Bowl 1.
    Area1,
    /// Bowl 2.
    Area2,
    /// Bowl 3.
    Area3,
    /// Discarded, on its way to the gaia area.
    Transit,
    /// Gaia area.
    Gaia,
}

/// Cost and income schedule of one building type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildingSpec {
    /// Regular cost.
    pub cost: Rewards,
    /// Cost when no opponent is nearby (trading stations only).
    pub isolated_cost: Option<Rewards>,
    /// Income events loaded for the n-th copy. Its length caps the count.
    pub income: Vec<Vec<Event>>,
}

/// Starting power layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerSetup {
    /// Tokens in bowl 1.
    pub bowl1: u32,
    /// Tokens in bowl 2.
    pub bowl2: u32,
    /// Starting wildcard position.
    pub wildcard: WildcardArea,
}

/// A faction's board: building costs, income schedules and starting state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactionBoard {
    /// Per-building specs, indexed in [`Building::ALL`] order.
    pub buildings: Vec<BuildingSpec>,
    /// Starting events (once rewards and base income).
    pub income: Vec<Event>,
    /// Starting power.
    pub power: PowerSetup,
    /// Gaia-area tokens return to bowl 2 instead of bowl 1.
    pub gaia_to_bowl2: bool,
    /// Setup places the planetary institute instead of mines.
    pub starts_with_pi: bool,
}

impl FactionBoard {
    /// Spec for a building.
    #[must_use]
    pub fn building(&self, building: Building) -> &BuildingSpec {
        let i = Building::ALL
            .iter()
            .position(|&b| b == building)
            .unwrap_or(0);
        &self.buildings[i]
    }

    /// How many copies of a building the board holds. Gaia-formers are
    /// limited by the player's gaia-former count instead.
    #[must_use]
    pub fn max_buildings(&self, building: Building) -> usize {
        self.building(building).income.len()
    }

    /// Building cost.
    #[must_use]
    pub fn cost(&self, building: Building, isolated: bool) -> &Rewards {
        let spec = self.building(building);
        match (&spec.isolated_cost, isolated) {
            (Some(cost), true) => cost,
            _ => &spec.cost,
        }
    }
}

/// Raw board text, overridable per faction.
#[derive(Debug, Clone, Copy)]
struct RawBoard {
    mine: &'static [&'static str],
    trading_station: &'static [&'static str],
    lab: &'static [&'static str],
    pi: &'static [&'static str],
    ac1: &'static [&'static str],
    ac2: &'static [&'static str],
    income: &'static [&'static str],
}

const DEFAULT_BOARD: RawBoard = RawBoard {
    mine: &["+o", "+o", "~", "+o", "+o", "+o", "+o", "+o"],
    trading_station: &["+3c", "+4c", "+4c", "+5c"],
    lab: &["+k", "+k", "+k"],
    pi: &["+4pw,t"],
    ac1: &["+2k"],
    ac2: &["=>q"],
    income: &["3k,4o,15c,q", "+o,k"],
};

const BESCODS_BOARD: RawBoard = RawBoard {
    trading_station: &["+k", "+k", "+k", "+k"],
    lab: &["+3c", "+4c", "+5c"],
    pi: &["+4pw,2t"],
    income: &["k,4o,15c,q", "+o"],
    ..DEFAULT_BOARD
};

/// Gaia-former token cost before the discount.
pub const GAIA_FORMER_TOKENS: i32 = 6;

/// Read-only faction table consumed by the engine.
pub trait FactionData: fmt::Debug + Send + Sync {
    /// Build the board for a faction.
    ///
    /// # Errors
    ///
    /// Returns an error if the table text does not parse.
    fn board(&self, faction: Faction) -> Result<FactionBoard, ParseError>;
}

/// The standard faction boards.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardBoards;

impl FactionData for StandardBoards {
    fn board(&self, faction: Faction) -> Result<FactionBoard, ParseError> {
        let raw = match faction {
            Faction::Bescods => BESCODS_BOARD,
            _ => DEFAULT_BOARD,
        };

        let spec = |building: Building,
                    cost: &str,
                    isolated: Option<&str>,
                    income: &[&str]|
         -> Result<BuildingSpec, ParseError> {
            let source = EventSource::Building(building);
            Ok(BuildingSpec {
                cost: cost.parse()?,
                isolated_cost: isolated.map(str::parse).transpose()?,
                income: income
                    .iter()
                    .map(|s| Event::parse(s, source))
                    .collect::<Result<_, _>>()?,
            })
        };

        let buildings = vec![
            spec(Building::Mine, "2c,o", None, raw.mine)?,
            spec(Building::TradingStation, "3c,2o", Some("6c,2o"), raw.trading_station)?,
            spec(Building::ResearchLab, "5c,3o", None, raw.lab)?,
            spec(Building::PlanetaryInstitute, "6c,4o", None, raw.pi)?,
            spec(Building::Academy1, "6c,6o", None, raw.ac1)?,
            spec(Building::Academy2, "6c,6o", None, raw.ac2)?,
            BuildingSpec {
                cost: Rewards::none(),
                isolated_cost: None,
                income: Vec::new(),
            },
        ];

        Ok(FactionBoard {
            buildings,
            income: Event::parse_all(raw.income, EventSource::Board)?,
            power: PowerSetup {
                bowl1: 4,
                bowl2: 4,
                wildcard: if faction == Faction::Taklons {
                    WildcardArea::Area1
                } else {
                    WildcardArea::Out
                },
            },
            gaia_to_bowl2: faction == Faction::Terrans,
            starts_with_pi: faction == Faction::Ivits,
        })
    }
}
