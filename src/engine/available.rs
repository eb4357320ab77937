//! Legal command generation.
//!
//! After every move the engine lists what may come next as
//! [`AvailableCommand`]s: a verb, the seat allowed to use it and the typed
//! options it accepts. Handlers look their operands up in the same lists,
//! so anything not offered here cannot be played.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::command::{Command, CommandName, DEFAULT_SEED, MAX_PLAYERS, Move, TechChoice};
use super::{Engine, LAST_ROUND, Phase, SubCommand};
use crate::charge::ChargeOffer;
use crate::content::{
    ActionEffect, BoardAction, Booster, FREE_ACTIONS, FederationTile, LAST_RESEARCH_LEVEL, ResearchField, TechTile,
    TechTilePos,
};
use crate::faction::{Building, Faction, Planet};
use crate::federation::FederationCandidate;
use crate::hex::Hex;
use crate::player::BuildContext;
use crate::reward::{Resource, Reward, Rewards};

/// A place a building can go, with its price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildingOption {
    /// What ends up on the hex.
    pub building: Building,
    /// Where.
    pub hex: Hex,
    /// Full cost, including qics for range.
    pub cost: Rewards,
    /// Building replaced, when upgrading.
    pub upgrade: Option<Building>,
    /// Terraforming steps involved.
    pub steps: u32,
}

/// A tech tile on offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechTileOption {
    /// The tile.
    pub tile: TechChoice,
    /// Where it sits.
    pub pos: TechTilePos,
}

/// A research step on offer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackOption {
    /// Track.
    pub field: ResearchField,
    /// Level reached.
    pub to: u8,
    /// Price, `~` when free.
    pub cost: Rewards,
}

/// A free conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreeActionOption {
    /// Paid.
    pub cost: Rewards,
    /// Gained.
    pub income: Rewards,
}

/// A board action on offer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardActionOption {
    /// Which action.
    pub action: BoardAction,
    /// Price.
    pub cost: Rewards,
    /// What it gives.
    pub income: String,
}

/// Options attached to a command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "options", rename_all = "snake_case")]
pub enum CommandData {
    /// Free-form operands.
    None,
    /// Factions still open.
    Factions(Vec<Faction>),
    /// Build sites.
    Buildings(Vec<BuildingOption>),
    /// Boosters in the supply; empty when passing in the last round.
    Boosters(Vec<Booster>),
    /// A leech offer.
    Leech {
        /// Power charged on acceptance.
        power: u32,
        /// The offer and its price.
        offers: Vec<ChargeOffer>,
    },
    /// Conflicting income effects.
    Income(Vec<Reward>),
    /// Tech tiles.
    TechTiles(Vec<TechTileOption>),
    /// Standard tiles that can be covered.
    CoverTiles(Vec<TechTile>),
    /// Research steps.
    Tracks(Vec<TrackOption>),
    /// Hexes for the lost planet.
    Spaces(Vec<Hex>),
    /// Formable federations and the tiles they can take.
    Federations {
        /// Tiles left in the supply.
        tiles: Vec<FederationTile>,
        /// Candidate shapes.
        federations: Vec<FederationCandidate>,
    },
    /// Owned federation tiles to rescore.
    FederationTiles(Vec<FederationTile>),
    /// Conversions.
    FreeActions(Vec<FreeActionOption>),
    /// Most burns possible.
    Burn(u32),
    /// Board actions.
    BoardActions(Vec<BoardActionOption>),
    /// Special action rewards.
    SpecialActions(Vec<Rewards>),
}

/// A verb a seat may use next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailableCommand {
    /// Verb.
    pub name: CommandName,
    /// Seat, `None` for `init`.
    pub player: Option<u8>,
    /// Options.
    pub data: CommandData,
}

impl AvailableCommand {
    const fn new(name: CommandName, player: u8, data: CommandData) -> Self {
        Self {
            name,
            player: Some(player),
            data,
        }
    }

    /// Every concrete move text this command allows.
    #[must_use]
    pub fn moves(&self) -> Vec<String> {
        let commands: Vec<Command> = match (self.name, &self.data) {
            (CommandName::Init, _) => (2..=MAX_PLAYERS)
                .map(|players| Command::Init {
                    players,
                    seed: DEFAULT_SEED.to_string(),
                })
                .collect(),
            (_, CommandData::Factions(f)) => f.iter().map(|&f| Command::ChooseFaction(f)).collect(),
            (_, CommandData::Buildings(b)) => b
                .iter()
                .map(|o| Command::Build {
                    building: o.building,
                    hex: o.hex,
                })
                .collect(),
            (CommandName::Pass, CommandData::Boosters(b)) if b.is_empty() => vec![Command::Pass(None)],
            (CommandName::Pass, CommandData::Boosters(b)) => b.iter().map(|&b| Command::Pass(Some(b))).collect(),
            (_, CommandData::Boosters(b)) => b.iter().map(|&b| Command::ChooseRoundBooster(b)).collect(),
            (CommandName::DeclineLeech, _) => vec![Command::DeclineLeech],
            (_, CommandData::Leech { power, .. }) => vec![Command::Leech(*power)],
            (_, CommandData::Income(r)) => {
                let mut seen = Vec::new();
                for reward in r {
                    if !seen.contains(reward) {
                        seen.push(*reward);
                    }
                }
                seen.into_iter().map(Command::ChooseIncome).collect()
            }
            (_, CommandData::TechTiles(t)) => t.iter().map(|o| Command::ChooseTechTile(o.tile)).collect(),
            (_, CommandData::CoverTiles(t)) => t.iter().map(|&t| Command::ChooseCoverTechTile(t)).collect(),
            (_, CommandData::Tracks(t)) => t.iter().map(|o| Command::UpgradeResearch(o.field)).collect(),
            (_, CommandData::Spaces(s)) => s.iter().map(|&h| Command::PlaceLostPlanet(h)).collect(),
            (_, CommandData::Federations { tiles, federations }) => federations
                .iter()
                .flat_map(|f| {
                    tiles.iter().map(|&tile| Command::FormFederation {
                        hexes: f.hexes.clone(),
                        tile,
                    })
                })
                .collect(),
            (_, CommandData::FederationTiles(t)) => t.iter().map(|&t| Command::ChooseFederationTile(t)).collect(),
            (_, CommandData::FreeActions(a)) => a
                .iter()
                .map(|o| Command::Spend {
                    cost: o.cost.clone(),
                    income: o.income.clone(),
                })
                .collect(),
            (_, CommandData::Burn(max)) => (1..=*max).map(Command::BurnPower).collect(),
            (_, CommandData::BoardActions(a)) => a.iter().map(|o| Command::Action(o.action)).collect(),
            (_, CommandData::SpecialActions(s)) => s.iter().cloned().map(Command::Special).collect(),
            (_, CommandData::None) => Vec::new(),
        };
        commands
            .into_iter()
            .map(|command| {
                Move {
                    player: self.player,
                    command,
                }
                .to_string()
            })
            .collect()
    }
}

/// The single way to take a leech of `power`.
pub(super) fn leech_offer(power: u32) -> ChargeOffer {
    let power = i32::try_from(power).unwrap_or(i32::MAX);
    ChargeOffer {
        offer: Rewards::one(power, Resource::ChargePower),
        cost: Rewards::one((power - 1).max(0), Resource::VictoryPoint),
    }
}

fn knowledge_cost() -> Rewards {
    Rewards::one(4, Resource::Knowledge)
}

impl Engine {
    pub(super) fn generate_commands(&self) -> Vec<AvailableCommand> {
        match self.phase {
            Phase::End => return Vec::new(),
            Phase::SetupInit => {
                return vec![AvailableCommand {
                    name: CommandName::Init,
                    player: None,
                    data: CommandData::None,
                }];
            }
            _ => {}
        }
        if let Some(&sub) = self.sub_commands.front() {
            return self.sub_command_options(sub);
        }
        let Some(player) = self.current_player else {
            return Vec::new();
        };

        match self.phase {
            Phase::SetupFaction => vec![AvailableCommand::new(
                CommandName::ChooseFaction,
                player,
                CommandData::Factions(self.possible_factions()),
            )],
            Phase::SetupBuilding => vec![AvailableCommand::new(
                CommandName::Build,
                player,
                CommandData::Buildings(self.possible_setup_buildings(player)),
            )],
            Phase::SetupBooster => vec![AvailableCommand::new(
                CommandName::ChooseRoundBooster,
                player,
                CommandData::Boosters(self.available_boosters()),
            )],
            _ => self.main_actions(player),
        }
    }

    fn sub_command_options(&self, sub: SubCommand) -> Vec<AvailableCommand> {
        let player = sub.player();
        let Some(p) = self.players.get(usize::from(player)) else {
            return Vec::new();
        };
        let single = |name, data| vec![AvailableCommand::new(name, player, data)];
        match sub {
            SubCommand::ChooseIncome { .. } => single(
                CommandName::ChooseIncome,
                CommandData::Income(p.income_selection(&p.pending_income).descriptions),
            ),
            SubCommand::ChooseTechTile { .. } => single(
                CommandName::ChooseTechTile,
                CommandData::TechTiles(self.possible_tech_tiles(player)),
            ),
            SubCommand::CoverTechTile { .. } => single(
                CommandName::ChooseCoverTechTile,
                CommandData::CoverTiles(
                    p.data
                        .tech_tiles
                        .iter()
                        .filter(|t| t.enabled)
                        .map(|t| t.tile)
                        .collect(),
                ),
            ),
            SubCommand::UpgradeResearch { field, .. } => single(
                CommandName::UpgradeResearch,
                CommandData::Tracks(self.possible_research(player, &Rewards::none(), field)),
            ),
            SubCommand::PlaceLostPlanet { .. } => single(
                CommandName::PlaceLostPlanet,
                CommandData::Spaces(self.possible_lost_planet(player)),
            ),
            SubCommand::RescoreFederation { .. } => {
                let tiles: BTreeSet<FederationTile> = p.data.federations.iter().map(|f| f.tile).collect();
                single(
                    CommandName::ChooseFederationTile,
                    CommandData::FederationTiles(tiles.into_iter().collect()),
                )
            }
            SubCommand::BuildMine { .. } => single(
                CommandName::Build,
                CommandData::Buildings(self.possible_buildings(player, true)),
            ),
            SubCommand::Leech { power, .. } => {
                let data = CommandData::Leech {
                    power,
                    offers: vec![leech_offer(power)],
                };
                vec![
                    AvailableCommand::new(CommandName::Leech, player, data.clone()),
                    AvailableCommand::new(CommandName::DeclineLeech, player, data),
                ]
            }
        }
    }

    fn main_actions(&self, player: u8) -> Vec<AvailableCommand> {
        let Some(p) = self.players.get(usize::from(player)) else {
            return Vec::new();
        };
        let mut out = Vec::new();

        let boosters = if self.round == LAST_ROUND {
            Vec::new()
        } else {
            self.available_boosters()
        };
        out.push(AvailableCommand::new(
            CommandName::Pass,
            player,
            CommandData::Boosters(boosters),
        ));

        let buildings = self.possible_buildings(player, false);
        if !buildings.is_empty() {
            out.push(AvailableCommand::new(
                CommandName::Build,
                player,
                CommandData::Buildings(buildings),
            ));
        }

        let tracks = self.possible_research(player, &knowledge_cost(), None);
        if !tracks.is_empty() {
            out.push(AvailableCommand::new(
                CommandName::UpgradeResearch,
                player,
                CommandData::Tracks(tracks),
            ));
        }

        let tiles: Vec<FederationTile> = self
            .federations
            .iter()
            .filter(|&(_, &count)| count > 0)
            .map(|(&tile, _)| tile)
            .collect();
        if !tiles.is_empty() {
            let federations = p.available_federations(&self.map);
            if !federations.is_empty() {
                out.push(AvailableCommand::new(
                    CommandName::FormFederation,
                    player,
                    CommandData::Federations { tiles, federations },
                ));
            }
        }

        let actions = self.possible_board_actions(player);
        if !actions.is_empty() {
            out.push(AvailableCommand::new(
                CommandName::Action,
                player,
                CommandData::BoardActions(actions),
            ));
        }

        let specials = self.possible_special_actions(player);
        if !specials.is_empty() {
            out.push(AvailableCommand::new(
                CommandName::Special,
                player,
                CommandData::SpecialActions(specials),
            ));
        }

        let free = self.possible_free_actions(player);
        if !free.is_empty() {
            out.push(AvailableCommand::new(
                CommandName::Spend,
                player,
                CommandData::FreeActions(free),
            ));
        }

        let burnable = p.data.power.burnable();
        if burnable > 0 {
            out.push(AvailableCommand::new(
                CommandName::BurnPower,
                player,
                CommandData::Burn(burnable),
            ));
        }
        out
    }

    /// Factions not taken, skipping those whose home planet is already taken.
    pub(super) fn possible_factions(&self) -> Vec<Faction> {
        let taken: Vec<Faction> = self.players.iter().filter_map(|p| p.faction).collect();
        Faction::ALL
            .iter()
            .copied()
            .filter(|f| !taken.iter().any(|t| t.planet() == f.planet()))
            .collect()
    }

    pub(super) fn available_boosters(&self) -> Vec<Booster> {
        self.round_boosters
            .iter()
            .filter(|&(_, &free)| free)
            .map(|(&b, _)| b)
            .collect()
    }

    /// Free starting placements on empty home planets.
    pub(super) fn possible_setup_buildings(&self, player: u8) -> Vec<BuildingOption> {
        let Some(p) = self.players.get(usize::from(player)) else {
            return Vec::new();
        };
        let (Some(home), Some(board)) = (p.planet(), p.board.as_ref()) else {
            return Vec::new();
        };
        let building = if board.starts_with_pi {
            Building::PlanetaryInstitute
        } else {
            Building::Mine
        };
        self.map
            .iter()
            .filter(|(_, cell)| cell.planet == home && !cell.is_occupied())
            .map(|(hex, _)| BuildingOption {
                building,
                hex,
                cost: Rewards::none(),
                upgrade: None,
                steps: 0,
            })
            .collect()
    }

    /// Upgrades of the player's buildings and new mines or gaia-formers in
    /// range. With `new_only`, upgrades are left out.
    pub(super) fn possible_buildings(&self, player: u8, new_only: bool) -> Vec<BuildingOption> {
        let Some(p) = self.players.get(usize::from(player)) else {
            return Vec::new();
        };
        let d = &p.data;
        let range = d.range + d.temporary_range;
        let no_extra = Rewards::none();
        let mut out = Vec::new();

        for (hex, cell) in self.map.iter() {
            if let Some(current) = cell.building_of(player) {
                if new_only || matches!(cell.planet, Planet::Transdim | Planet::Lost) {
                    continue;
                }
                let isolated = current == Building::Mine && p.is_isolated_at(&self.map, hex);
                for &upgrade in current.upgrades() {
                    let ctx = BuildContext {
                        planet: cell.planet,
                        upgrading: Some(current),
                        isolated,
                        extra: &no_extra,
                    };
                    if let Some(option) = p.can_build(upgrade, &ctx) {
                        out.push(BuildingOption {
                            building: upgrade,
                            hex,
                            cost: option.cost,
                            upgrade: Some(current),
                            steps: option.steps,
                        });
                    }
                }
                continue;
            }

            let building = match cell.planet {
                _ if cell.is_occupied() => continue,
                Planet::Transdim => Building::GaiaFormer,
                Planet::Gaia => Building::Mine,
                planet if planet.is_habitable() => Building::Mine,
                _ => continue,
            };
            let Some(distance) = self.map.min_distance(hex, d.occupied.keys()) else {
                continue;
            };
            let qics = distance.saturating_sub(range).div_ceil(2);
            let extra = Rewards::one(i32::try_from(qics).unwrap_or(i32::MAX), Resource::Qic);
            let ctx = BuildContext {
                planet: cell.planet,
                upgrading: None,
                isolated: false,
                extra: &extra,
            };
            if let Some(option) = p.can_build(building, &ctx) {
                out.push(BuildingOption {
                    building,
                    hex,
                    cost: option.cost,
                    upgrade: None,
                    steps: option.steps,
                });
            }
        }
        out
    }

    /// Research steps the player can pay `cost` for, on `field` or any
    /// track.
    pub(super) fn possible_research(
        &self,
        player: u8,
        cost: &Rewards,
        field: Option<ResearchField>,
    ) -> Vec<TrackOption> {
        let Some(p) = self.players.get(usize::from(player)) else {
            return Vec::new();
        };
        if !p.data.can_pay(cost) {
            return Vec::new();
        }
        ResearchField::ALL
            .iter()
            .copied()
            .filter(|&f| field.is_none_or(|only| only == f))
            .filter_map(|f| {
                let level = p.data.research(f);
                if level >= LAST_RESEARCH_LEVEL {
                    return None;
                }
                let to = level + 1;
                if ResearchField::key_needed(to) {
                    if p.data.green_federations() == 0 {
                        return None;
                    }
                    if self
                        .players
                        .iter()
                        .any(|other| other.data.research(f) == LAST_RESEARCH_LEVEL)
                    {
                        return None;
                    }
                }
                Some(TrackOption {
                    field: f,
                    to,
                    cost: cost.clone(),
                })
            })
            .collect()
    }

    /// Standard tiles the player lacks, and advanced tiles the player
    /// qualifies for.
    pub(super) fn possible_tech_tiles(&self, player: u8) -> Vec<TechTileOption> {
        let Some(p) = self.players.get(usize::from(player)) else {
            return Vec::new();
        };
        let d = &p.data;
        let mut out: Vec<TechTileOption> = self
            .tech_tiles
            .iter()
            .filter(|(_, stack)| stack.count > 0 && !d.tech_tiles.iter().any(|t| t.tile == stack.tile))
            .map(|(&pos, stack)| TechTileOption {
                tile: TechChoice::Standard(stack.tile),
                pos,
            })
            .collect();

        let can_cover = d.tech_tiles.iter().any(|t| t.enabled);
        if d.green_federations() > 0 && can_cover {
            for (&field, stack) in &self.adv_tech_tiles {
                if stack.count > 0 && d.research(field) >= 4 {
                    out.push(TechTileOption {
                        tile: TechChoice::Advanced(stack.tile),
                        pos: field_position(field),
                    });
                }
            }
        }
        out
    }

    /// Empty space within range of the player's planets.
    pub(super) fn possible_lost_planet(&self, player: u8) -> Vec<Hex> {
        let Some(p) = self.players.get(usize::from(player)) else {
            return Vec::new();
        };
        let range = p.data.range + p.data.temporary_range;
        self.map
            .iter()
            .filter(|(_, cell)| {
                cell.planet == Planet::Empty && !cell.is_occupied() && cell.federations.is_empty()
            })
            .filter(|&(hex, _)| {
                self.map
                    .min_distance(hex, p.data.occupied.keys())
                    .is_some_and(|d| d <= range)
            })
            .map(|(hex, _)| hex)
            .collect()
    }

    pub(super) fn possible_free_actions(&self, player: u8) -> Vec<FreeActionOption> {
        let Some(p) = self.players.get(usize::from(player)) else {
            return Vec::new();
        };
        FREE_ACTIONS
            .iter()
            .filter_map(|&(cost, income)| {
                let option = FreeActionOption {
                    cost: cost.parse().ok()?,
                    income: income.parse().ok()?,
                };
                p.data.can_pay(&option.cost).then_some(option)
            })
            .collect()
    }

    /// Unused board actions the player can pay for and use.
    pub(super) fn possible_board_actions(&self, player: u8) -> Vec<BoardActionOption> {
        let Some(p) = self.players.get(usize::from(player)) else {
            return Vec::new();
        };
        self.board_actions
            .iter()
            .filter(|&(_, &free)| free)
            .filter_map(|(&action, _)| {
                let cost: Rewards = action.cost().parse().ok()?;
                if !p.data.can_pay(&cost) {
                    return None;
                }
                let usable = match action.effect() {
                    ActionEffect::Rewards(_) => true,
                    ActionEffect::TechTile => !self.possible_tech_tiles(player).is_empty(),
                    ActionEffect::RescoreFederation => !p.data.federations.is_empty(),
                };
                usable.then(|| BoardActionOption {
                    action,
                    cost,
                    income: action.income().to_string(),
                })
            })
            .collect()
    }

    /// Rewards of the player's special actions not used this round.
    pub(super) fn possible_special_actions(&self, player: u8) -> Vec<Rewards> {
        let Some(p) = self.players.get(usize::from(player)) else {
            return Vec::new();
        };
        let mut out: Vec<Rewards> = Vec::new();
        for event in p.events.activate.iter().filter(|e| !e.activated) {
            if !out.iter().any(|r| r.same_as(&event.rewards)) {
                out.push(event.rewards.clone());
            }
        }
        out
    }
}

/// The standard tile position above a track.
pub(super) const fn field_position(field: ResearchField) -> TechTilePos {
    match field {
        ResearchField::Terraforming => TechTilePos::Terraforming,
        ResearchField::Navigation => TechTilePos::Navigation,
        ResearchField::Intelligence => TechTilePos::Intelligence,
        ResearchField::GaiaProject => TechTilePos::GaiaProject,
        ResearchField::Economy => TechTilePos::Economy,
        ResearchField::Science => TechTilePos::Science,
    }
}
