//! Read-only content tables: research tracks, boosters, tech tiles,
//! federation tiles and the board and free actions.

/// Declares a content enum with a move code per variant, `ALL`, `code()`,
/// `Display` and `FromStr`.
macro_rules! named_enum {
    ($(#[$meta:meta])* $name:ident, $what:literal { $($variant:ident => $code:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
            ::serde::Serialize, ::serde::Deserialize,
        )]
        #[allow(missing_docs)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// Every variant, in table order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Move code.
            #[must_use]
            pub const fn code(self) -> &'static str {
                match self {
                    $(Self::$variant => $code),+
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.code())
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = $crate::error::ParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.code() == s)
                    .ok_or_else(|| $crate::error::ParseError::new(s, concat!("unknown ", $what)))
            }
        }
    };
}

pub(crate) use named_enum;

named_enum!(
    /// Research tracks.
    ResearchField, "research field" {
        Terraforming => "terra",
        Navigation => "nav",
        Intelligence => "int",
        GaiaProject => "gaia",
        Economy => "eco",
        Science => "sci",
    }
);

named_enum!(
    /// Round boosters.
    Booster, "booster" {
        Booster1 => "booster1",
        Booster2 => "booster2",
        Booster3 => "booster3",
        Booster4 => "booster4",
        Booster5 => "booster5",
        Booster6 => "booster6",
        Booster7 => "booster7",
        Booster8 => "booster8",
        Booster9 => "booster9",
        Booster10 => "booster10",
    }
);

named_enum!(
    /// Standard tech tiles.
    TechTile, "tech tile" {
        Tech1 => "tech1",
        Tech2 => "tech2",
        Tech3 => "tech3",
        Tech4 => "tech4",
        Tech5 => "tech5",
        Tech6 => "tech6",
        Tech7 => "tech7",
        Tech8 => "tech8",
        Tech9 => "tech9",
    }
);

named_enum!(
    /// Advanced tech tiles.
    AdvTechTile, "advanced tech tile" {
        Adv1 => "adv1",
        Adv2 => "adv2",
        Adv3 => "adv3",
        Adv4 => "adv4",
        Adv5 => "adv5",
        Adv6 => "adv6",
        Adv7 => "adv7",
        Adv8 => "adv8",
        Adv9 => "adv9",
        Adv10 => "adv10",
        Adv11 => "adv11",
        Adv12 => "adv12",
        Adv13 => "adv13",
        Adv14 => "adv14",
        Adv15 => "adv15",
    }
);

named_enum!(
    /// Standard tech tile positions: one above each track, three free.
    TechTilePos, "tech tile position" {
        Terraforming => "terra",
        Navigation => "nav",
        Intelligence => "int",
        GaiaProject => "gaia",
        Economy => "eco",
        Science => "sci",
        Free1 => "free1",
        Free2 => "free2",
        Free3 => "free3",
    }
);

named_enum!(
    /// Federation tiles.
    FederationTile, "federation tile" {
        Fed1 => "fed1",
        Fed2 => "fed2",
        Fed3 => "fed3",
        Fed4 => "fed4",
        Fed5 => "fed5",
        Fed6 => "fed6",
    }
);

named_enum!(
    /// Shared board actions, each usable once per round.
    BoardAction, "board action" {
        Power1 => "power1",
        Power2 => "power2",
        Power3 => "power3",
        Power4 => "power4",
        Power5 => "power5",
        Power6 => "power6",
        Power7 => "power7",
        Qic1 => "qic1",
        Qic2 => "qic2",
        Qic3 => "qic3",
    }
);

/// Highest research level.
pub const LAST_RESEARCH_LEVEL: u8 = 5;

impl ResearchField {
    /// Event specs gained on reaching `level`.
    #[must_use]
    pub fn track(self, level: u8) -> &'static [&'static str] {
        const TERRA: [&[&str]; 6] = [&[], &["2o"], &["d"], &["d", "3pw"], &["2o"], &[]];
        const NAV: [&[&str]; 6] = [&[], &["q"], &["r"], &["q", "3pw"], &["r"], &["r"]];
        const INT: [&[&str]; 6] = [&[], &["q"], &["q"], &["2q", "3pw"], &["2q"], &["4q"]];
        const GAIA: [&[&str]; 6] = [
            &[],
            &["gf"],
            &["3t"],
            &["gf", "3pw"],
            &["gf"],
            &["4vp", "g > vp"],
        ];
        const ECO: [&[&str]; 6] = [
            &[],
            &["+2c,pw"],
            &["+2c,o,2pw"],
            &["+3c,o,3pw", "3pw"],
            &["+4c,2o,4pw"],
            &["6c,3o,6pw"],
        ];
        const SCI: [&[&str]; 6] = [&[], &["+k"], &["+2k"], &["+3k", "3pw"], &["+4k"], &["9k"]];

        let table = match self {
            Self::Terraforming => &TERRA,
            Self::Navigation => &NAV,
            Self::Intelligence => &INT,
            Self::GaiaProject => &GAIA,
            Self::Economy => &ECO,
            Self::Science => &SCI,
        };
        table.get(usize::from(level)).copied().unwrap_or(&[])
    }

    /// Index into per-field arrays.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Whether moving to `level` needs a green federation.
    #[must_use]
    pub const fn key_needed(level: u8) -> bool {
        level == LAST_RESEARCH_LEVEL
    }
}

impl TechTilePos {
    /// The track a tile at this position advances, if it is not a free slot.
    #[must_use]
    pub const fn field(self) -> Option<ResearchField> {
        match self {
            Self::Terraforming => Some(ResearchField::Terraforming),
            Self::Navigation => Some(ResearchField::Navigation),
            Self::Intelligence => Some(ResearchField::Intelligence),
            Self::GaiaProject => Some(ResearchField::GaiaProject),
            Self::Economy => Some(ResearchField::Economy),
            Self::Science => Some(ResearchField::Science),
            Self::Free1 | Self::Free2 | Self::Free3 => None,
        }
    }
}

impl Booster {
    /// Event specs.
    #[must_use]
    pub const fn events(self) -> &'static [&'static str] {
        match self {
            Self::Booster1 => &["+k", "+o"],
            Self::Booster2 => &["+2t", "+o"],
            Self::Booster3 => &["+q", "+2c"],
            Self::Booster4 => &["=>step", "+2c"],
            Self::Booster5 => &["=>3range", "+2pw"],
            Self::Booster6 => &["m | vp", "+o"],
            Self::Booster7 => &["ts | 2vp", "+o"],
            Self::Booster8 => &["lab | 3vp", "+k"],
            Self::Booster9 => &["PA | 4vp", "+4pw"],
            Self::Booster10 => &["g | vp", "+4c"],
        }
    }
}

impl TechTile {
    /// Event specs.
    ///
    /// `tech9` has no event: it raises the federation value of the planetary
    /// institute and academies to 4.
    #[must_use]
    pub const fn events(self) -> &'static [&'static str] {
        match self {
            Self::Tech1 => &["q,o"],
            Self::Tech2 => &["+k,c"],
            Self::Tech3 => &["7vp"],
            Self::Tech4 => &["+o,pw"],
            Self::Tech5 => &["g >> 3vp"],
            Self::Tech6 => &["+4c"],
            Self::Tech7 => &["=>4pw"],
            Self::Tech8 => &["pt > k"],
            Self::Tech9 => &[],
        }
    }
}

impl AdvTechTile {
    /// Event specs.
    #[must_use]
    pub const fn events(self) -> &'static [&'static str] {
        match self {
            Self::Adv1 => &["=>q,5c"],
            Self::Adv2 => &["=>3o"],
            Self::Adv3 => &["=>3k"],
            Self::Adv4 => &["m >> 3vp"],
            Self::Adv5 => &["ts >> 3vp"],
            Self::Adv6 => &["a >> 2vp"],
            Self::Adv7 => &["fed >> 5vp"],
            Self::Adv8 => &["fed | 3vp"],
            Self::Adv9 => &["lab | 3vp"],
            Self::Adv10 => &["pt | vp"],
            Self::Adv11 => &["m > 2vp"],
            Self::Adv12 => &["ts > 4vp"],
            Self::Adv13 => &["g > 2vp"],
            Self::Adv14 => &["fed > 5vp"],
            Self::Adv15 => &["lab > 3vp"],
        }
    }
}

impl FederationTile {
    /// Reward granted when the tile is taken or rescored.
    #[must_use]
    pub const fn rewards(self) -> &'static str {
        match self {
            Self::Fed1 => "12vp",
            Self::Fed2 => "8vp,q",
            Self::Fed3 => "8vp,2t",
            Self::Fed4 => "7vp,6c",
            Self::Fed5 => "7vp,2o",
            Self::Fed6 => "6vp,2k",
        }
    }

    /// Whether the tile comes green side up. Only the 12 point tile lacks
    /// a green side.
    #[must_use]
    pub const fn is_green(self) -> bool {
        !matches!(self, Self::Fed1)
    }
}

/// What a board action gives besides resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionEffect {
    /// A reward list.
    Rewards(&'static str),
    /// A tech tile choice.
    TechTile,
    /// Rescore one of the player's federation tiles.
    RescoreFederation,
}

impl BoardAction {
    /// Cost in the reward grammar.
    #[must_use]
    pub const fn cost(self) -> &'static str {
        match self {
            Self::Power1 => "7pw",
            Self::Power2 => "5pw",
            Self::Power3 | Self::Power4 | Self::Power5 => "4pw",
            Self::Power6 | Self::Power7 => "3pw",
            Self::Qic1 => "4q",
            Self::Qic2 => "3q",
            Self::Qic3 => "2q",
        }
    }

    /// Effect.
    #[must_use]
    pub const fn effect(self) -> ActionEffect {
        match self {
            Self::Power1 => ActionEffect::Rewards("3k"),
            Self::Power2 => ActionEffect::Rewards("2step"),
            Self::Power3 => ActionEffect::Rewards("2o"),
            Self::Power4 => ActionEffect::Rewards("7c"),
            Self::Power5 => ActionEffect::Rewards("2k"),
            Self::Power6 => ActionEffect::Rewards("step"),
            Self::Power7 => ActionEffect::Rewards("2t"),
            Self::Qic1 => ActionEffect::TechTile,
            Self::Qic2 => ActionEffect::RescoreFederation,
            Self::Qic3 => ActionEffect::Rewards("3vp"),
        }
    }

    /// Display form of the effect.
    #[must_use]
    pub const fn income(self) -> &'static str {
        match self.effect() {
            ActionEffect::Rewards(r) => r,
            ActionEffect::TechTile => "tech",
            ActionEffect::RescoreFederation => "fedtile",
        }
    }
}

/// Free conversions, as `(cost, income)`.
pub const FREE_ACTIONS: [(&str, &str); 8] = [
    ("4pw", "q"),
    ("3pw", "o"),
    ("4pw", "k"),
    ("pw", "c"),
    ("q", "o"),
    ("k", "c"),
    ("o", "c"),
    ("o", "t"),
];
