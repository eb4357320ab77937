//! Move handlers.
//!
//! Each handler finds its operand among the options the engine would offer
//! right now and fails with a [`RuleError`] before touching anything if it
//! is not there.

use std::fmt::Display;

use tracing::{debug, info};

use super::available::{CommandData, field_position};
use super::command::{Command, CommandName, TechChoice, player_tag};
use super::{Engine, LAST_ROUND, Phase, SubCommand};
use crate::content::{ActionEffect, BoardAction, Booster, FederationTile, LAST_RESEARCH_LEVEL, ResearchField, TechTile};
use crate::error::RuleError;
use crate::faction::{Building, Faction, Planet};
use crate::hex::{Hex, join_hexes};
use crate::map::HexGrid;
use crate::reward::{Resource, Reward, Rewards};

fn not_available(what: &'static str, value: impl Display) -> RuleError {
    RuleError::OptionNotAvailable {
        what,
        value: value.to_string(),
    }
}

impl Engine {
    pub(super) fn execute(
        &mut self,
        player: u8,
        command: Command,
        answered: Option<SubCommand>,
    ) -> Result<(), RuleError> {
        match command {
            Command::Init { .. } => Ok(()),
            Command::ChooseFaction(faction) => self.choose_faction(player, faction),
            Command::Build { building, hex } => self.build(player, building, hex, answered),
            Command::ChooseRoundBooster(booster) => self.choose_booster(player, booster),
            Command::Pass(booster) => self.pass(player, booster),
            Command::Leech(power) => self.leech(player, power, answered),
            Command::DeclineLeech => {
                debug!(player = %player_tag(player), "leech declined");
                Ok(())
            }
            Command::ChooseIncome(reward) => self.choose_income(player, reward),
            Command::ChooseTechTile(choice) => self.choose_tech_tile(player, choice),
            Command::ChooseCoverTechTile(tile) => self.cover_tech_tile(player, tile, answered),
            Command::UpgradeResearch(field) => self.upgrade_research(player, field, answered),
            Command::PlaceLostPlanet(hex) => self.place_lost_planet(player, hex),
            Command::FormFederation { hexes, tile } => self.form_federation(player, hexes, tile),
            Command::ChooseFederationTile(tile) => self.rescore_federation(player, tile),
            Command::Spend { cost, income } => self.spend(player, &cost, &income),
            Command::BurnPower(amount) => self.burn(player, amount),
            Command::Action(action) => self.board_action(player, action),
            Command::Special(rewards) => self.special_action(player, &rewards),
        }
    }

    fn choose_faction(&mut self, player: u8, faction: Faction) -> Result<(), RuleError> {
        if !self.possible_factions().contains(&faction) {
            return Err(not_available("faction", faction));
        }
        let board = self.factions.board(faction)?;
        self.player_mut(player)?.load_faction(faction, board)?;
        info!(player = %player_tag(player), %faction, "faction chosen");
        Ok(())
    }

    fn choose_booster(&mut self, player: u8, booster: Booster) -> Result<(), RuleError> {
        if !self.round_boosters.get(&booster).copied().unwrap_or(false) {
            return Err(not_available("booster", booster));
        }
        self.round_boosters.insert(booster, false);
        self.player_mut(player)?.take_booster(booster)?;
        Ok(())
    }

    fn build(
        &mut self,
        player: u8,
        building: Building,
        hex: Hex,
        answered: Option<SubCommand>,
    ) -> Result<(), RuleError> {
        let options = if self.phase == Phase::SetupBuilding {
            self.possible_setup_buildings(player)
        } else {
            let new_only = matches!(answered, Some(SubCommand::BuildMine { .. }));
            self.possible_buildings(player, new_only)
        };
        let option = options
            .into_iter()
            .find(|o| o.building == building && o.hex == hex)
            .ok_or_else(|| not_available("building", format!("{building} {hex}")))?;

        let planet = self.map.get(hex).map_or(Planet::Empty, |cell| cell.planet);
        self.player_mut(player)?
            .build(hex, building, planet, option.upgrade, &option.cost)?;
        if let Some(cell) = self.map.get_mut(hex) {
            cell.building = Some(building);
            cell.player = Some(player);
        }
        debug!(player = %player_tag(player), %building, %hex, cost = %option.cost, "built");

        if building != Building::GaiaFormer && self.round > 0 {
            self.leeching_phase(player, hex)?;
        }
        if matches!(
            building,
            Building::ResearchLab | Building::Academy1 | Building::Academy2
        ) {
            self.tech_tile_phase(player);
        }
        Ok(())
    }

    /// Offer power to every other seat with a building near `hex`, in seat
    /// order after the builder.
    fn leeching_phase(&mut self, player: u8, hex: Hex) -> Result<(), RuleError> {
        let seats = u8::try_from(self.players.len()).unwrap_or(u8::MAX);
        for offset in 1..seats {
            let other = (player + offset) % seats;
            let p = self.player(other)?;
            let amount = p
                .data
                .occupied
                .iter()
                .filter(|&(&loc, _)| self.map.distance(loc, hex) < 3)
                .filter_map(|(&loc, &planet)| {
                    let building = self.map.get(loc)?.building_of(other)?;
                    Some(p.building_value(building, planet))
                })
                .max()
                .unwrap_or(0);
            let power = p.max_leech(amount);
            if power > 0 {
                debug!(player = %player_tag(other), power, "leech offered");
                self.sub_commands.push_back(SubCommand::Leech {
                    player: other,
                    power,
                });
            }
        }
        Ok(())
    }

    fn tech_tile_phase(&mut self, player: u8) {
        if !self.possible_tech_tiles(player).is_empty() {
            self.sub_commands
                .push_front(SubCommand::ChooseTechTile { player });
        }
    }

    fn pass(&mut self, player: u8, booster: Option<Booster>) -> Result<(), RuleError> {
        match booster {
            Some(b) if self.round == LAST_ROUND => return Err(not_available("booster", b)),
            Some(b) if !self.round_boosters.get(&b).copied().unwrap_or(false) => {
                return Err(not_available("booster", b));
            }
            None if self.round != LAST_ROUND => return Err(not_available("booster", "none")),
            _ => {}
        }

        let old = self.player_mut(player)?.pass()?;
        if let Some(b) = booster {
            self.round_boosters.insert(b, false);
            self.player_mut(player)?.take_booster(b)?;
        }
        if let Some(b) = old {
            self.round_boosters.insert(b, true);
        }
        info!(player = %player_tag(player), round = self.round, "passed");
        Ok(())
    }

    fn leech(&mut self, player: u8, power: u32, answered: Option<SubCommand>) -> Result<(), RuleError> {
        let Some(SubCommand::Leech { power: offered, .. }) = answered else {
            return Err(not_available("leech", power));
        };
        if power != offered {
            return Err(not_available("leech", power));
        }
        let p = self.player_mut(player)?;
        let charged = p.data.power.charge(power);
        let cost = i32::try_from(charged.saturating_sub(1)).unwrap_or(i32::MAX);
        p.data.victory_points -= cost;
        debug!(player = %player_tag(player), charged, cost, "leech taken");
        Ok(())
    }

    fn choose_income(&mut self, player: u8, reward: Reward) -> Result<(), RuleError> {
        let p = self.player_mut(player)?;
        let index = p
            .pending_income
            .iter()
            .position(|e| e.rewards.iter().any(|r| *r == reward))
            .ok_or_else(|| not_available("income", reward))?;
        let event = p.pending_income.remove(index);
        p.apply_events(std::slice::from_ref(&event))?;

        let selection = p.income_selection(&p.pending_income);
        let needs_more = selection.needs_manual_selection;
        if !needs_more {
            let events = selection.autoplay_events(&p.data);
            p.apply_events(&events)?;
            p.pending_income.clear();
        }

        if needs_more {
            self.sub_commands
                .push_front(SubCommand::ChooseIncome { player });
        } else if !self
            .sub_commands
            .iter()
            .any(|s| matches!(s, SubCommand::ChooseIncome { .. }))
        {
            self.gaia_phase();
        }
        Ok(())
    }

    fn choose_tech_tile(&mut self, player: u8, choice: TechChoice) -> Result<(), RuleError> {
        let option = self
            .possible_tech_tiles(player)
            .into_iter()
            .find(|o| o.tile == choice)
            .ok_or_else(|| not_available("tech tile", choice))?;

        match choice {
            TechChoice::Standard(tile) => {
                if let Some(stack) = self.tech_tiles.get_mut(&option.pos) {
                    stack.count = stack.count.saturating_sub(1);
                }
                self.player_mut(player)?.gain_tech_tile(tile, option.pos)?;
                self.push_research_step(player, option.pos.field());
            }
            TechChoice::Advanced(tile) => {
                let slot = ResearchField::ALL
                    .iter()
                    .copied()
                    .find(|&f| field_position(f) == option.pos);
                if let Some(stack) = slot.and_then(|f| self.adv_tech_tiles.get_mut(&f)) {
                    stack.count = stack.count.saturating_sub(1);
                }
                self.push_research_step(player, None);
                self.sub_commands
                    .push_front(SubCommand::CoverTechTile { player, tile });
            }
        }
        debug!(player = %player_tag(player), tile = %choice, "tech tile taken");
        Ok(())
    }

    fn push_research_step(&mut self, player: u8, field: Option<ResearchField>) {
        if !self
            .possible_research(player, &Rewards::none(), field)
            .is_empty()
        {
            self.sub_commands
                .push_front(SubCommand::UpgradeResearch { player, field });
        }
    }

    fn cover_tech_tile(
        &mut self,
        player: u8,
        tile: TechTile,
        answered: Option<SubCommand>,
    ) -> Result<(), RuleError> {
        let Some(SubCommand::CoverTechTile { tile: advanced, .. }) = answered else {
            return Err(not_available("cover", tile));
        };
        let p = self.player_mut(player)?;
        if !p.data.has_tech(tile) {
            return Err(not_available("cover", tile));
        }
        p.gain_adv_tech_tile(advanced, tile)?;
        Ok(())
    }

    fn upgrade_research(
        &mut self,
        player: u8,
        field: ResearchField,
        answered: Option<SubCommand>,
    ) -> Result<(), RuleError> {
        let (cost, only) = match answered {
            Some(SubCommand::UpgradeResearch { field: only, .. }) => (Rewards::none(), only),
            _ => (Rewards::one(4, Resource::Knowledge), None),
        };
        let option = self
            .possible_research(player, &cost, only)
            .into_iter()
            .find(|o| o.field == field)
            .ok_or_else(|| not_available("research field", field))?;

        let p = self.player_mut(player)?;
        p.pay_costs(&option.cost);
        if ResearchField::key_needed(option.to) {
            p.data.use_green_federation();
        }
        p.advance_research(field)?;
        debug!(player = %player_tag(player), %field, level = option.to, "research advanced");

        if option.to == LAST_RESEARCH_LEVEL {
            match field {
                ResearchField::Terraforming => {
                    if let Some(tile) = self.terraforming_federation.take() {
                        self.player_mut(player)?.gain_federation_tile(tile)?;
                    }
                }
                ResearchField::Navigation => {
                    if !self.possible_lost_planet(player).is_empty() {
                        self.sub_commands
                            .push_front(SubCommand::PlaceLostPlanet { player });
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn place_lost_planet(&mut self, player: u8, hex: Hex) -> Result<(), RuleError> {
        if !self.possible_lost_planet(player).contains(&hex) {
            return Err(not_available("space", hex));
        }
        if let Some(cell) = self.map.get_mut(hex) {
            cell.planet = Planet::Lost;
            cell.building = Some(Building::Mine);
            cell.player = Some(player);
        }
        self.player_mut(player)?.place_lost_planet(hex)?;
        self.leeching_phase(player, hex)
    }

    fn form_federation(
        &mut self,
        player: u8,
        mut hexes: Vec<Hex>,
        tile: FederationTile,
    ) -> Result<(), RuleError> {
        if self.federations.get(&tile).copied().unwrap_or(0) == 0 {
            return Err(not_available("federation tile", tile));
        }
        hexes.sort_unstable();
        hexes.dedup();
        // The search already ran for the legal set this move was checked
        // against.
        let candidate = self
            .available_commands
            .iter()
            .filter(|c| c.name == CommandName::FormFederation && c.player == Some(player))
            .find_map(|c| match &c.data {
                CommandData::Federations { federations, .. } => federations.iter().find(|f| f.hexes == hexes).cloned(),
                _ => None,
            })
            .ok_or_else(|| not_available("federation", join_hexes(&hexes)))?;

        for &hex in &candidate.hexes {
            if let Some(cell) = self.map.get_mut(hex) {
                cell.federations.push(player);
            }
        }
        if let Some(count) = self.federations.get_mut(&tile) {
            *count -= 1;
        }
        let p = self.player_mut(player)?;
        p.data.power.remove(candidate.satellites);
        p.gain_federation_tile(tile)?;
        info!(
            player = %player_tag(player),
            %tile,
            planets = candidate.planets,
            satellites = candidate.satellites,
            "federation formed"
        );
        Ok(())
    }

    fn rescore_federation(&mut self, player: u8, tile: FederationTile) -> Result<(), RuleError> {
        let p = self.player_mut(player)?;
        if !p.data.federations.iter().any(|f| f.tile == tile) {
            return Err(not_available("federation tile", tile));
        }
        p.gain_rewards(&tile.rewards().parse()?)?;
        Ok(())
    }

    fn spend(&mut self, player: u8, cost: &Rewards, income: &Rewards) -> Result<(), RuleError> {
        let offered = self
            .possible_free_actions(player)
            .iter()
            .any(|o| o.cost.same_as(cost) && o.income.same_as(income));
        if !offered {
            return Err(not_available("free action", format!("{cost} for {income}")));
        }
        let p = self.player_mut(player)?;
        p.pay_costs(cost);
        p.gain_rewards(income)?;
        Ok(())
    }

    fn burn(&mut self, player: u8, amount: u32) -> Result<(), RuleError> {
        let p = self.player_mut(player)?;
        if amount == 0 || amount > p.data.power.burnable() {
            return Err(not_available("burn", amount));
        }
        p.data.power.burn(amount);
        Ok(())
    }

    fn board_action(&mut self, player: u8, action: BoardAction) -> Result<(), RuleError> {
        let option = self
            .possible_board_actions(player)
            .into_iter()
            .find(|o| o.action == action)
            .ok_or_else(|| not_available("board action", action))?;

        self.board_actions.insert(action, false);
        self.player_mut(player)?.pay_costs(&option.cost);
        match action.effect() {
            ActionEffect::Rewards(text) => {
                let rewards: Rewards = text.parse()?;
                self.player_mut(player)?.gain_rewards(&rewards)?;
                self.after_temporary_gain(player, &rewards);
            }
            ActionEffect::TechTile => self.tech_tile_phase(player),
            ActionEffect::RescoreFederation => {
                self.sub_commands
                    .push_front(SubCommand::RescoreFederation { player });
            }
        }
        debug!(player = %player_tag(player), %action, "board action");
        Ok(())
    }

    fn special_action(&mut self, player: u8, rewards: &Rewards) -> Result<(), RuleError> {
        let p = self.player_mut(player)?;
        let event = p
            .events
            .activate
            .iter_mut()
            .find(|e| !e.activated && e.rewards.same_as(rewards))
            .ok_or_else(|| not_available("special action", rewards))?;
        event.activated = true;
        let gained = event.rewards.clone();
        p.gain_rewards(&gained)?;
        self.after_temporary_gain(player, &gained);
        Ok(())
    }

    /// Temporary steps or range must be used on a mine right away.
    fn after_temporary_gain(&mut self, player: u8, rewards: &Rewards) {
        let temporary = rewards.count_of(Resource::TemporaryStep) > 0
            || rewards.count_of(Resource::TemporaryRange) > 0;
        if temporary && !self.possible_buildings(player, true).is_empty() {
            self.sub_commands
                .push_front(SubCommand::BuildMine { player });
        }
    }
}
