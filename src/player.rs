//! Players.
//!
//! A [`Player`] owns one [`ResourceLedger`] and an event table. Everything
//! that reads or writes both (loading content, building, passing, research,
//! income) lives here; the engine only decides *when* these happen.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::content::{
    AdvTechTile, Booster, FederationTile, LAST_RESEARCH_LEVEL, ResearchField, TechTile, TechTilePos,
};
use crate::error::ParseError;
use crate::event::{Condition, Event, EventSource, Operator};
use crate::faction::{Building, Faction, FactionBoard, GAIA_FORMER_TOKENS, Planet, terraforming_steps};
use crate::federation::{FederationCandidate, find_federations};
use crate::hex::Hex;
use crate::income::IncomeSelection;
use crate::ledger::{OwnedFederation, OwnedTechTile, Power, ResourceLedger};
use crate::map::{HexGrid, SpaceMap};
use crate::reward::{Resource, Rewards};

/// Ore per terraforming step before discounts.
pub const TERRAFORMING_COST: u32 = 3;

/// Per-player automation preferences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlayerSettings {
    /// Order conflicting income automatically.
    pub auto_income: bool,
    /// Leech threshold for automatic decisions; `None` always asks.
    pub auto_charge_power: Option<u32>,
}

/// A player's events, by operator. One-shot events are applied on load and
/// never stored.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EventTable {
    /// Paid every income phase.
    pub income: Vec<Event>,
    /// Paid when their condition happens.
    pub trigger: Vec<Event>,
    /// Special actions.
    pub activate: Vec<Event>,
    /// Paid when passing.
    pub pass: Vec<Event>,
}

impl EventTable {
    fn remove_source(&mut self, source: EventSource) {
        for list in [
            &mut self.income,
            &mut self.trigger,
            &mut self.activate,
            &mut self.pass,
        ] {
            list.retain(|e| e.source != source);
        }
    }
}

/// Price of a build and the terraforming it involves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOption {
    /// Total cost, including any extra range cost passed in.
    pub cost: Rewards,
    /// Terraforming steps.
    pub steps: u32,
}

/// Circumstances of a build that the board alone does not know.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildContext<'a> {
    /// Planet of the target hex.
    pub planet: Planet,
    /// Building being replaced, if upgrading.
    pub upgrading: Option<Building>,
    /// No opponent building nearby.
    pub isolated: bool,
    /// Extra cost, such as qics for range.
    pub extra: &'a Rewards,
}

/// A seat at the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Seat index (0-based).
    pub id: u8,
    /// Chosen faction.
    pub faction: Option<Faction>,
    /// Faction board, loaded with the faction.
    pub board: Option<FactionBoard>,
    /// Resources.
    pub data: ResourceLedger,
    /// Loaded events.
    pub events: EventTable,
    /// Automation preferences.
    pub settings: PlayerSettings,
    /// Income effects still waiting for an ordering choice.
    pub pending_income: Vec<Event>,
}

impl Player {
    /// A player without a faction.
    #[must_use]
    pub fn new(id: u8, settings: PlayerSettings) -> Self {
        Self {
            id,
            faction: None,
            board: None,
            data: ResourceLedger::default(),
            events: EventTable::default(),
            settings,
            pending_income: Vec::new(),
        }
    }

    /// Home planet, once the faction is chosen.
    #[must_use]
    pub fn planet(&self) -> Option<Planet> {
        self.faction.map(Faction::planet)
    }

    /// Bind a faction and apply its starting state.
    ///
    /// # Errors
    ///
    /// Returns an error if research track content fails to parse.
    pub fn load_faction(&mut self, faction: Faction, board: FactionBoard) -> Result<(), ParseError> {
        self.faction = Some(faction);
        self.data.power = Power::new(board.power.bowl1, board.power.bowl2, 0)
            .with_wildcard(board.power.wildcard);
        let starting = board.income.clone();
        self.board = Some(board);
        self.load_events(starting)
    }

    /// Store events by operator, applying one-shot ones right away.
    ///
    /// # Errors
    ///
    /// Returns an error if a research advance inside an event fails to load.
    pub fn load_events(&mut self, events: Vec<Event>) -> Result<(), ParseError> {
        for event in events {
            match event.operator {
                Operator::Once => {
                    let times = self.condition_count(event.condition);
                    self.gain_rewards(&event.rewards.times(times))?;
                }
                Operator::Income => self.events.income.push(event),
                Operator::Trigger => self.events.trigger.push(event),
                Operator::Activate => self.events.activate.push(event),
                Operator::Pass => self.events.pass.push(event),
            }
        }
        Ok(())
    }

    /// Drop every stored event from `source`.
    pub fn remove_events_from(&mut self, source: EventSource) {
        self.events.remove_source(source);
    }

    /// How many times a conditional reward applies.
    #[must_use]
    pub fn condition_count(&self, condition: Condition) -> i32 {
        let d = &self.data;
        let count = match condition {
            Condition::None => 1,
            Condition::Mine => d.count(Building::Mine),
            Condition::TradingStation => d.count(Building::TradingStation),
            Condition::ResearchLab => d.count(Building::ResearchLab),
            Condition::BigBuilding => {
                d.count(Building::PlanetaryInstitute)
                    + d.count(Building::Academy1)
                    + d.count(Building::Academy2)
            }
            Condition::Gaia => {
                let gaia = d.occupied.values().filter(|&&p| p == Planet::Gaia).count();
                u32::try_from(gaia).unwrap_or(u32::MAX)
            }
            Condition::Federation => u32::try_from(d.federations.len()).unwrap_or(u32::MAX),
            Condition::PlanetType => {
                let types: BTreeSet<Planet> = d.occupied.values().copied().collect();
                u32::try_from(types.len()).unwrap_or(u32::MAX)
            }
            Condition::AdvanceResearch => d.research.iter().map(|&l| u32::from(l)).sum(),
        };
        i32::try_from(count).unwrap_or(i32::MAX)
    }

    /// Gain rewards. Research upgrades go through the track so that their
    /// rewards and triggers apply.
    ///
    /// # Errors
    ///
    /// Returns an error if track content fails to parse.
    pub fn gain_rewards(&mut self, rewards: &Rewards) -> Result<(), ParseError> {
        for reward in rewards.iter() {
            match reward.resource {
                Resource::UpgradeResearch(field) if reward.count > 0 => {
                    for _ in 0..reward.count {
                        self.advance_research(field)?;
                    }
                }
                _ => self.data.gain_reward(*reward, false),
            }
        }
        Ok(())
    }

    /// Pay a cost list.
    pub fn pay_costs(&mut self, costs: &Rewards) {
        self.data.pay_costs(costs);
    }

    /// Move one step up a research track. The new level's rewards replace
    /// the previous level's income.
    ///
    /// # Errors
    ///
    /// Returns an error if track content fails to parse.
    pub fn advance_research(&mut self, field: ResearchField) -> Result<(), ParseError> {
        let level = self.data.research(field);
        if level >= LAST_RESEARCH_LEVEL {
            return Ok(());
        }
        let level = level + 1;
        self.data.research[field.index()] = level;

        let source = EventSource::Research(field);
        self.remove_events_from(source);
        self.load_events(Event::parse_all(field.track(level), source)?)?;
        self.fire_trigger(Condition::AdvanceResearch)
    }

    /// Pay trigger events for `condition`.
    ///
    /// # Errors
    ///
    /// Returns an error if a triggered research advance fails to load.
    pub fn fire_trigger(&mut self, condition: Condition) -> Result<(), ParseError> {
        let rewards: Vec<Rewards> = self
            .events
            .trigger
            .iter()
            .filter(|e| e.condition == condition)
            .map(|e| e.rewards.clone())
            .collect();
        for r in &rewards {
            self.gain_rewards(r)?;
        }
        Ok(())
    }

    /// Cost of putting `building` down, or `None` if the board has no copy
    /// left or the player cannot pay.
    #[must_use]
    pub fn can_build(&self, building: Building, ctx: &BuildContext<'_>) -> Option<BuildOption> {
        let board = self.board.as_ref()?;
        let home = self.planet()?;
        let d = &self.data;

        if building == Building::GaiaFormer {
            if d.free_gaiaformers() == 0 {
                return None;
            }
        } else if usize::try_from(d.count(building)).ok()? >= board.max_buildings(building) {
            return None;
        }

        let mut cost = board.cost(building, ctx.isolated).clone();
        let mut steps = 0;
        match building {
            Building::GaiaFormer => {
                let discount = if d.gaiaformers > 1 {
                    i32::try_from(d.gaiaformers).unwrap_or(0)
                } else {
                    0
                };
                let tokens = (GAIA_FORMER_TOKENS - discount).max(0);
                cost = cost.plus(&Rewards::one(tokens, Resource::GainToken));
            }
            Building::Mine if ctx.upgrading.is_none() => {
                if ctx.planet == Planet::Gaia {
                    cost = cost.plus(&Rewards::one(1, Resource::Qic));
                } else {
                    steps = terraforming_steps(home, ctx.planet);
                    let paid = steps.saturating_sub(d.temporary_step);
                    let per_step = TERRAFORMING_COST.saturating_sub(d.terraform_cost_discount);
                    let ore = i32::try_from(per_step * paid).unwrap_or(i32::MAX);
                    cost = cost.plus(&Rewards::one(ore, Resource::Ore));
                }
            }
            _ => {}
        }

        let cost = cost.plus(ctx.extra).merged();
        d.can_pay(&cost).then_some(BuildOption { cost, steps })
    }

    /// Put a building down and pay for it.
    ///
    /// # Errors
    ///
    /// Returns an error if triggered content fails to parse.
    pub fn build(
        &mut self,
        hex: Hex,
        building: Building,
        planet: Planet,
        upgrading: Option<Building>,
        cost: &Rewards,
    ) -> Result<(), ParseError> {
        self.pay_costs(cost);

        let new_type = !self.data.occupied.values().any(|&p| p == planet);
        if building != Building::GaiaFormer {
            self.data.occupied.insert(hex, planet);
        }
        self.data.add_building(building, 1);
        self.refresh_building_income(building);
        if let Some(old) = upgrading {
            self.data.add_building(old, -1);
            self.refresh_building_income(old);
        }
        self.data.temporary_step = 0;
        self.data.temporary_range = 0;

        for condition in [
            Condition::Mine,
            Condition::TradingStation,
            Condition::ResearchLab,
            Condition::BigBuilding,
            Condition::Gaia,
        ] {
            if condition.matches_building(building, planet) {
                self.fire_trigger(condition)?;
            }
        }
        if building == Building::Mine && new_type {
            self.fire_trigger(Condition::PlanetType)?;
        }
        Ok(())
    }

    /// Claim the lost planet at `hex`. It counts as a mine for triggers
    /// and federations but never comes off the board.
    ///
    /// # Errors
    ///
    /// Returns an error if triggered content fails to parse.
    pub fn place_lost_planet(&mut self, hex: Hex) -> Result<(), ParseError> {
        self.data.occupied.insert(hex, Planet::Lost);
        self.fire_trigger(Condition::Mine)?;
        self.fire_trigger(Condition::PlanetType)
    }

    /// Reload the income of one building type to match its count.
    fn refresh_building_income(&mut self, building: Building) {
        let source = EventSource::Building(building);
        self.remove_events_from(source);
        let Some(board) = &self.board else {
            return;
        };
        let count = usize::try_from(self.data.count(building)).unwrap_or(usize::MAX);
        let events: Vec<Event> = board
            .building(building)
            .income
            .iter()
            .take(count)
            .flatten()
            .filter(|e| e.operator != Operator::Once)
            .cloned()
            .collect();
        for event in events {
            match event.operator {
                Operator::Income => self.events.income.push(event),
                Operator::Trigger => self.events.trigger.push(event),
                Operator::Activate => self.events.activate.push(event),
                Operator::Pass => self.events.pass.push(event),
                Operator::Once => {}
            }
        }
    }

    /// Take a round booster.
    ///
    /// # Errors
    ///
    /// Returns an error if the booster content fails to parse.
    pub fn take_booster(&mut self, booster: Booster) -> Result<(), ParseError> {
        self.data.round_booster = Some(booster);
        self.load_events(Event::parse_all(booster.events(), EventSource::Booster(booster))?)
    }

    /// Pay pass bonuses and hand back the current booster.
    ///
    /// # Errors
    ///
    /// Returns an error if a pass bonus fails to apply.
    pub fn pass(&mut self) -> Result<Option<Booster>, ParseError> {
        let bonuses: Vec<(Condition, Rewards)> = self
            .events
            .pass
            .iter()
            .map(|e| (e.condition, e.rewards.clone()))
            .collect();
        for (condition, rewards) in bonuses {
            let times = self.condition_count(condition);
            self.gain_rewards(&rewards.times(times))?;
        }

        let old = self.data.round_booster.take();
        if let Some(booster) = old {
            self.remove_events_from(EventSource::Booster(booster));
        }
        Ok(old)
    }

    /// Take a standard tech tile.
    ///
    /// # Errors
    ///
    /// Returns an error if the tile content fails to parse.
    pub fn gain_tech_tile(&mut self, tile: TechTile, pos: TechTilePos) -> Result<(), ParseError> {
        self.data.tech_tiles.push(OwnedTechTile {
            tile,
            pos,
            enabled: true,
        });
        self.load_events(Event::parse_all(tile.events(), EventSource::TechTile(tile))?)
    }

    /// Take an advanced tile, covering a standard one and flipping a green
    /// federation.
    ///
    /// # Errors
    ///
    /// Returns an error if the tile content fails to parse.
    pub fn gain_adv_tech_tile(&mut self, tile: AdvTechTile, cover: TechTile) -> Result<(), ParseError> {
        if let Some(owned) = self
            .data
            .tech_tiles
            .iter_mut()
            .find(|t| t.tile == cover && t.enabled)
        {
            owned.enabled = false;
        }
        self.remove_events_from(EventSource::TechTile(cover));
        self.data.use_green_federation();
        self.data.adv_tech_tiles.push(tile);
        self.load_events(Event::parse_all(tile.events(), EventSource::AdvTechTile(tile))?)
    }

    /// Take a federation tile and its reward.
    ///
    /// # Errors
    ///
    /// Returns an error if the tile content fails to parse.
    pub fn gain_federation_tile(&mut self, tile: FederationTile) -> Result<(), ParseError> {
        self.data.federations.push(OwnedFederation {
            tile,
            green: tile.is_green(),
        });
        self.gain_rewards(&tile.rewards().parse()?)?;
        self.fire_trigger(Condition::Federation)
    }

    /// Income events for this round.
    #[must_use]
    pub fn income_events(&self) -> Vec<Event> {
        self.events.income.clone()
    }

    /// Classify income events against the current ledger.
    #[must_use]
    pub fn income_selection(&self, events: &[Event]) -> IncomeSelection {
        IncomeSelection::create(&self.data, &self.settings, events)
    }

    /// Apply events in order.
    ///
    /// # Errors
    ///
    /// Returns an error if a research advance fails to load.
    pub fn apply_events(&mut self, events: &[Event]) -> Result<(), ParseError> {
        for event in events {
            self.gain_rewards(&event.rewards)?;
        }
        Ok(())
    }

    /// Start-of-round cleanup.
    pub fn begin_round(&mut self) {
        for event in &mut self.events.activate {
            event.activated = false;
        }
        self.data.temporary_range = 0;
        self.data.temporary_step = 0;
    }

    /// Gaia phase: tokens come back from the gaia area.
    pub fn gaia_phase(&mut self) {
        let to_bowl2 = self.board.as_ref().is_some_and(|b| b.gaia_to_bowl2);
        self.data.power.return_from_gaia(to_bowl2);
    }

    /// Federation and leech value of a building on a planet.
    #[must_use]
    pub fn building_value(&self, building: Building, planet: Planet) -> u32 {
        let base = building.base_value();
        if base == 0 {
            return 0;
        }
        let mut value = base;
        if self.faction == Some(Faction::Bescods)
            && self.data.has_planetary_institute()
            && planet == Planet::Titanium
        {
            value += 1;
        }
        if building.is_big() && self.data.has_tech(TechTile::Tech9) {
            value += 1;
        }
        value
    }

    /// Largest leech this player can take from an offer of `amount`.
    #[must_use]
    pub fn max_leech(&self, amount: u32) -> u32 {
        let affordable = u32::try_from(self.data.victory_points + 1).unwrap_or(0);
        amount.min(self.data.power.chargeable(amount)).min(affordable)
    }

    /// Buildings with their federation values, by hex.
    #[must_use]
    pub fn valued_buildings(&self, map: &SpaceMap) -> BTreeMap<Hex, u32> {
        map.iter()
            .filter_map(|(hex, data)| {
                let building = data.building_of(self.id)?;
                Some((hex, self.building_value(building, data.planet)))
            })
            .collect()
    }

    /// Federations formable right now.
    #[must_use]
    pub fn available_federations(&self, map: &SpaceMap) -> Vec<FederationCandidate> {
        let excluded = map.excluded_for_federation(self.id);
        let buildings: Vec<(Hex, u32)> = self.valued_buildings(map).into_iter().collect();
        find_federations(map, &buildings, &excluded, self.data.power.discardable())
    }

    /// Whether an opponent's building lies within leech distance of `hex`.
    #[must_use]
    pub fn is_isolated_at(&self, map: &SpaceMap, hex: Hex) -> bool {
        !map.iter().any(|(other, data)| {
            data.player.is_some_and(|p| p != self.id)
                && data.building.is_some()
                && map.distance(hex, other) < 3
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::faction::{FactionData, StandardBoards};
    use crate::ledger::MAX_KNOWLEDGE;

    fn player(faction: Faction) -> Player {
        let mut p = Player::new(0, PlayerSettings::default());
        p.load_faction(faction, StandardBoards.board(faction).unwrap())
            .unwrap();
        p
    }

    fn rewards(s: &str) -> Rewards {
        s.parse().unwrap()
    }

    fn mine_ctx(planet: Planet, extra: &Rewards) -> BuildContext<'_> {
        BuildContext {
            planet,
            upgrading: None,
            isolated: false,
            extra,
        }
    }

    #[test]
    fn test_starting_state() {
        let p = player(Faction::Terrans);
        assert_eq!(p.data.credits, 15);
        assert_eq!(p.data.ores, 4);
        assert_eq!(p.data.knowledge, 3);
        assert_eq!(p.data.qics, 1);
        assert_eq!(p.data.power, Power::new(4, 4, 0));
        assert_eq!(p.events.income.len(), 2);
    }

    #[test]
    fn test_mine_costs() {
        let p = player(Faction::Terrans);
        let none = Rewards::none();

        let home = p.can_build(Building::Mine, &mine_ctx(Planet::Terra, &none)).unwrap();
        assert_eq!(home.cost.to_string(), "2c,o");
        assert_eq!(home.steps, 0);

        let far = p.can_build(Building::Mine, &mine_ctx(Planet::Desert, &none)).unwrap();
        assert_eq!(far.cost.to_string(), "2c,4o");
        assert_eq!(far.steps, 1);

        assert!(p.can_build(Building::Mine, &mine_ctx(Planet::Oxide, &none)).is_none());

        let gaia = p.can_build(Building::Mine, &mine_ctx(Planet::Gaia, &none)).unwrap();
        assert_eq!(gaia.cost.count_of(Resource::Qic), 1);
    }

    #[test]
    fn test_temporary_step_and_discount() {
        let mut p = player(Faction::Terrans);
        p.data.temporary_step = 1;
        p.data.terraform_cost_discount = 1;
        let none = Rewards::none();
        let opt = p.can_build(Building::Mine, &mine_ctx(Planet::Swamp, &none)).unwrap();
        assert_eq!(opt.steps, 2);
        assert_eq!(opt.cost.count_of(Resource::Ore), 3);
    }

    #[test]
    fn test_build_loads_income_and_triggers() {
        let mut p = player(Faction::Terrans);
        p.gain_tech_tile(TechTile::Tech5, TechTilePos::GaiaProject)
            .unwrap();
        let cost = rewards("2c,o,q");
        p.build(Hex::new(0, 0), Building::Mine, Planet::Gaia, None, &cost)
            .unwrap();
        assert_eq!(p.data.count(Building::Mine), 1);
        assert_eq!(p.data.victory_points, 13);
        assert!(p.events.income.iter().any(|e| e.source == EventSource::Building(Building::Mine)));

        p.build(
            Hex::new(0, 0),
            Building::TradingStation,
            Planet::Gaia,
            Some(Building::Mine),
            &rewards("3c,2o"),
        )
        .unwrap();
        assert_eq!(p.data.count(Building::Mine), 0);
        assert!(!p.events.income.iter().any(|e| e.source == EventSource::Building(Building::Mine)));
        assert!(p.events.income.iter().any(|e| e.spec == "+3c"));
    }

    #[test]
    fn test_research_replaces_income() {
        let mut p = player(Faction::Terrans);
        p.advance_research(ResearchField::Economy).unwrap();
        let eco = |p: &Player| {
            p.events
                .income
                .iter()
                .filter(|e| e.source == EventSource::Research(ResearchField::Economy))
                .count()
        };
        assert_eq!(eco(&p), 2);
        p.advance_research(ResearchField::Economy).unwrap();
        assert_eq!(eco(&p), 3);
        assert_eq!(p.data.research(ResearchField::Economy), 2);
    }

    #[test]
    fn test_research_triggers_and_cap() {
        let mut p = player(Faction::Terrans);
        p.gain_adv_tech_tile(AdvTechTile::Adv6, TechTile::Tech1).unwrap();
        let vp = p.data.victory_points;
        p.gain_rewards(&rewards("up-sci")).unwrap();
        assert_eq!(p.data.victory_points, vp + 2);

        // The last science step pays 9k, more than room is left for.
        p.data.knowledge = 10;
        for _ in 0..8 {
            p.advance_research(ResearchField::Science).unwrap();
        }
        assert_eq!(p.data.research(ResearchField::Science), LAST_RESEARCH_LEVEL);
        assert_eq!(p.data.victory_points, vp + 10);
        assert_eq!(p.data.knowledge, MAX_KNOWLEDGE);
    }

    #[test]
    fn test_pass_pays_bonus_and_returns_booster() {
        let mut p = player(Faction::Terrans);
        p.take_booster(Booster::Booster6).unwrap();
        p.build(Hex::new(0, 0), Building::Mine, Planet::Terra, None, &Rewards::none())
            .unwrap();
        p.build(Hex::new(1, 0), Building::Mine, Planet::Terra, None, &Rewards::none())
            .unwrap();
        let vp = p.data.victory_points;
        assert_eq!(p.pass().unwrap(), Some(Booster::Booster6));
        assert_eq!(p.data.victory_points, vp + 2);
        assert!(p.events.pass.is_empty());
        assert!(p.data.round_booster.is_none());
    }

    #[test]
    fn test_building_values() {
        let mut p = player(Faction::Bescods);
        assert_eq!(p.building_value(Building::Mine, Planet::Titanium), 1);
        assert_eq!(p.building_value(Building::GaiaFormer, Planet::Transdim), 0);
        p.data.add_building(Building::PlanetaryInstitute, 1);
        assert_eq!(p.building_value(Building::Mine, Planet::Titanium), 2);
        assert_eq!(p.building_value(Building::Mine, Planet::Ice), 1);
        p.gain_tech_tile(TechTile::Tech9, TechTilePos::Free1).unwrap();
        assert_eq!(p.building_value(Building::Academy1, Planet::Ice), 4);
    }

    #[test]
    fn test_max_leech() {
        let mut p = player(Faction::Terrans);
        assert_eq!(p.max_leech(3), 3);
        p.data.victory_points = 1;
        assert_eq!(p.max_leech(3), 2);
        p.data.power = Power::new(0, 0, 8);
        assert_eq!(p.max_leech(3), 0);
    }

    #[test]
    fn test_gaiaformer_cost() {
        let mut p = player(Faction::Terrans);
        let none = Rewards::none();
        assert!(p.can_build(Building::GaiaFormer, &mine_ctx(Planet::Transdim, &none)).is_none());
        p.data.gaiaformers = 1;
        let opt = p
            .can_build(Building::GaiaFormer, &mine_ctx(Planet::Transdim, &none))
            .unwrap();
        assert_eq!(opt.cost.to_string(), "6t");
    }
}
