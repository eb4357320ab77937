//! Per-player resource ledger.
//!
//! Pure data plus transfer operations. The ledger knows nothing about rounds
//! or commands; [`crate::player::Player`] layers game rules on top of it.

pub mod power;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::content::{AdvTechTile, Booster, FederationTile, ResearchField, TechTile, TechTilePos};
use crate::faction::{Building, Planet};
use crate::hex::Hex;
use crate::reward::{Resource, Reward, Rewards};

pub use power::{Power, WILDCARD_VALUE};

/// Credit cap.
pub const MAX_CREDIT: u32 = 30;
/// Ore cap.
pub const MAX_ORE: u32 = 15;
/// Knowledge cap.
pub const MAX_KNOWLEDGE: u32 = 15;

/// A standard tech tile owned by a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnedTechTile {
    /// Tile.
    pub tile: TechTile,
    /// Board position it was taken from.
    pub pos: TechTilePos,
    /// False once covered by an advanced tile.
    pub enabled: bool,
}

/// A federation tile owned by a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnedFederation {
    /// Tile.
    pub tile: FederationTile,
    /// Green side up (not yet used to unlock a level 5 or advanced tile).
    pub green: bool,
}

/// Everything a player owns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLedger {
    /// Victory points. May go negative.
    pub victory_points: i32,
    /// Credits, capped at [`MAX_CREDIT`].
    pub credits: u32,
    /// Ore, capped at [`MAX_ORE`].
    pub ores: u32,
    /// Knowledge, capped at [`MAX_KNOWLEDGE`].
    pub knowledge: u32,
    /// Quantum intelligence cubes.
    pub qics: u32,
    /// Power tokens.
    pub power: Power,
    /// Level per research track, indexed by [`ResearchField::index`].
    pub research: [u8; 6],
    /// Navigation range.
    pub range: u32,
    /// Range for the current action.
    pub temporary_range: u32,
    /// Terraforming discount in ore per step.
    pub terraform_cost_discount: u32,
    /// Free terraforming steps for the current action.
    pub temporary_step: u32,
    /// Gaia-formers unlocked.
    pub gaiaformers: u32,
    /// Built count per building, indexed in [`Building::ALL`] order.
    pub buildings: [u32; 7],
    /// Hexes with one of the player's buildings (gaia-formers excluded),
    /// with the planet type built on.
    pub occupied: BTreeMap<Hex, Planet>,
    /// Current round booster.
    pub round_booster: Option<Booster>,
    /// Standard tech tiles.
    pub tech_tiles: Vec<OwnedTechTile>,
    /// Advanced tech tiles.
    pub adv_tech_tiles: Vec<AdvTechTile>,
    /// Federation tiles.
    pub federations: Vec<OwnedFederation>,
}

impl Default for ResourceLedger {
    fn default() -> Self {
        Self {
            victory_points: 10,
            credits: 0,
            ores: 0,
            knowledge: 0,
            qics: 0,
            power: Power::default(),
            research: [0; 6],
            range: 1,
            temporary_range: 0,
            terraform_cost_discount: 0,
            temporary_step: 0,
            gaiaformers: 0,
            buildings: [0; 7],
            occupied: BTreeMap::new(),
            round_booster: None,
            tech_tiles: Vec::new(),
            adv_tech_tiles: Vec::new(),
            federations: Vec::new(),
        }
    }
}

fn building_index(building: Building) -> usize {
    Building::ALL
        .iter()
        .position(|&b| b == building)
        .unwrap_or(0)
}

fn shift(value: u32, delta: i32) -> u32 {
    value.saturating_add_signed(delta)
}

fn shift_capped(value: u32, delta: i32, cap: u32) -> u32 {
    shift(value, delta).min(cap)
}

fn unsigned(count: i32) -> u32 {
    count.unsigned_abs()
}

impl ResourceLedger {
    /// Research level on a track.
    #[must_use]
    pub const fn research(&self, field: ResearchField) -> u8 {
        self.research[field.index()]
    }

    /// Number of a building type on the board.
    #[must_use]
    pub fn count(&self, building: Building) -> u32 {
        self.buildings[building_index(building)]
    }

    /// Adjust the count of a building type.
    pub fn add_building(&mut self, building: Building, delta: i32) {
        let i = building_index(building);
        self.buildings[i] = shift(self.buildings[i], delta);
    }

    /// Whether the planetary institute is built.
    #[must_use]
    pub fn has_planetary_institute(&self) -> bool {
        self.count(Building::PlanetaryInstitute) > 0
    }

    /// Gaia-formers not currently on the map.
    #[must_use]
    pub fn free_gaiaformers(&self) -> u32 {
        self.gaiaformers
            .saturating_sub(self.count(Building::GaiaFormer))
    }

    /// Green federation tiles.
    #[must_use]
    pub fn green_federations(&self) -> usize {
        self.federations.iter().filter(|f| f.green).count()
    }

    /// Flip one green federation tile.
    pub fn use_green_federation(&mut self) {
        if let Some(fed) = self.federations.iter_mut().find(|f| f.green) {
            fed.green = false;
        }
    }

    /// Whether the player holds an enabled standard tile.
    #[must_use]
    pub fn has_tech(&self, tile: TechTile) -> bool {
        self.tech_tiles.iter().any(|t| t.tile == tile && t.enabled)
    }

    /// Apply one reward, or pay it when `pay` is set.
    pub fn gain_reward(&mut self, reward: Reward, pay: bool) {
        if reward.is_empty() {
            return;
        }
        let count = if pay { -reward.count } else { reward.count };
        let amount = unsigned(count);

        match reward.resource {
            Resource::Credit => self.credits = shift_capped(self.credits, count, MAX_CREDIT),
            Resource::Ore => self.ores = shift_capped(self.ores, count, MAX_ORE),
            Resource::Knowledge => {
                self.knowledge = shift_capped(self.knowledge, count, MAX_KNOWLEDGE);
            }
            Resource::Qic => self.qics = shift(self.qics, count),
            Resource::VictoryPoint => self.victory_points += count,
            Resource::GainToken => {
                if count > 0 {
                    self.power.gain_tokens(amount);
                } else {
                    self.power.discard(amount);
                }
            }
            Resource::GainTokenGaiaArea => {
                if count > 0 {
                    self.power.gain_gaia_tokens(amount);
                } else {
                    self.power.remove_gaia_tokens(amount);
                }
            }
            Resource::ChargePower => {
                if count > 0 {
                    self.power.charge(amount);
                } else {
                    self.power.spend(amount);
                }
            }
            Resource::Range => self.range = shift(self.range, count),
            Resource::TemporaryRange => self.temporary_range = shift(self.temporary_range, count),
            Resource::TerraformCostDiscount => {
                self.terraform_cost_discount = shift(self.terraform_cost_discount, count);
            }
            Resource::TemporaryStep => self.temporary_step = shift(self.temporary_step, count),
            Resource::GaiaFormer => self.gaiaformers = shift(self.gaiaformers, count),
            Resource::UpgradeResearch(field) => {
                let level = &mut self.research[field.index()];
                #[allow(clippy::cast_possible_truncation)]
                let delta = count.clamp(-5, 5) as i8;
                *level = level.saturating_add_signed(delta);
            }
        }
    }

    /// Apply a reward list.
    pub fn gain_rewards(&mut self, rewards: &Rewards) {
        for reward in rewards.iter() {
            self.gain_reward(*reward, false);
        }
    }

    /// Pay a cost list. Assumes [`ResourceLedger::can_pay`] holds.
    pub fn pay_costs(&mut self, costs: &Rewards) {
        for reward in costs.iter() {
            self.gain_reward(*reward, true);
        }
        self.power.settle_transit();
    }

    /// Whether the player has at least `reward` of a resource.
    #[must_use]
    pub fn has_resource(&self, reward: Reward) -> bool {
        if reward.count <= 0 {
            return true;
        }
        let needed = unsigned(reward.count);
        match reward.resource {
            Resource::Credit => self.credits >= needed,
            Resource::Ore => self.ores >= needed,
            Resource::Knowledge => self.knowledge >= needed,
            Resource::Qic => self.qics >= needed,
            Resource::VictoryPoint => self.victory_points >= reward.count,
            Resource::GainToken => self.power.discardable() >= needed,
            Resource::GainTokenGaiaArea => self.power.gaia >= needed,
            Resource::ChargePower => self.power.spendable() >= needed,
            Resource::GaiaFormer => self.free_gaiaformers() >= needed,
            Resource::TemporaryStep => self.temporary_step >= needed,
            Resource::TemporaryRange => self.temporary_range >= needed,
            Resource::Range
            | Resource::TerraformCostDiscount
            | Resource::UpgradeResearch(_) => false,
        }
    }

    /// Whether a whole cost list is affordable.
    #[must_use]
    pub fn can_pay(&self, costs: &Rewards) -> bool {
        costs.merged().iter().all(|r| self.has_resource(*r))
    }
}
