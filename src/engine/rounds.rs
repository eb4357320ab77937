//! Game setup and the round cycle.

use tracing::info;

use super::{
    Engine, LAST_ROUND, Phase, ROUND_INIT, ROUND_SETUP_BOOSTER, ROUND_SETUP_BUILDING, ROUND_SETUP_FACTION,
    SubCommand, TileStack,
};
use crate::content::{AdvTechTile, BoardAction, Booster, FederationTile, ResearchField, TechTile, TechTilePos};
use crate::error::RuleError;
use crate::faction::{Building, Faction, Planet};
use crate::map::SpaceMap;
use crate::player::Player;
use crate::rng::Rng;

/// Copies of each standard tech tile.
const TECH_TILE_COPIES: u32 = 4;
/// Copies of each federation tile in the supply.
const FEDERATION_COPIES: u32 = 3;
/// Boosters in play beyond one per seat.
const EXTRA_BOOSTERS: usize = 3;

impl Engine {
    /// Seat the players and draw the seeded setup.
    pub(super) fn init(&mut self, players: usize, seed: &str) -> Result<(), RuleError> {
        let mut rng = Rng::from_seed_str(seed);

        self.map = match &self.options.layout {
            Some(layout) => SpaceMap::from_layout(layout),
            None => SpaceMap::generate(players, &mut rng),
        };

        self.round_boosters = rng
            .shuffled(Booster::ALL)
            .into_iter()
            .take(players + EXTRA_BOOSTERS)
            .map(|b| (b, true))
            .collect();

        self.tech_tiles = TechTilePos::ALL
            .iter()
            .copied()
            .zip(rng.shuffled(TechTile::ALL))
            .map(|(pos, tile)| {
                (
                    pos,
                    TileStack {
                        tile,
                        count: TECH_TILE_COPIES,
                    },
                )
            })
            .collect();

        self.adv_tech_tiles = ResearchField::ALL
            .iter()
            .copied()
            .zip(rng.shuffled(AdvTechTile::ALL))
            .map(|(field, tile)| (field, TileStack { tile, count: 1 }))
            .collect();

        let terraforming = rng.shuffled(FederationTile::ALL).first().copied();
        self.terraforming_federation = terraforming;
        self.federations = FederationTile::ALL
            .iter()
            .map(|&tile| {
                let copies = if Some(tile) == terraforming {
                    FEDERATION_COPIES - 1
                } else {
                    FEDERATION_COPIES
                };
                (tile, copies)
            })
            .collect();

        self.board_actions = BoardAction::ALL.iter().map(|&a| (a, true)).collect();

        let settings = self.options.player_settings();
        self.players = (0..players)
            .filter_map(|i| u8::try_from(i).ok())
            .map(|id| Player::new(id, settings))
            .collect();

        info!(players, seed, hexes = self.map.len(), "game set up");
        self.round = ROUND_INIT;
        self.end_round()
    }

    /// Start the next round, or end the game after the last one.
    pub(super) fn end_round(&mut self) -> Result<(), RuleError> {
        if self.round >= LAST_ROUND {
            self.phase = Phase::End;
            self.turn_order.clear();
            self.current_player = None;
            let scores: Vec<i32> = self.players.iter().map(|p| p.data.victory_points).collect();
            info!(?scores, "game over");
            return Ok(());
        }
        self.begin_round()
    }

    fn begin_round(&mut self) -> Result<(), RuleError> {
        self.round += 1;
        self.current_pos = 0;
        let seats: Vec<u8> = self.players.iter().map(|p| p.id).collect();

        self.turn_order = match self.round {
            ROUND_SETUP_FACTION => seats,
            ROUND_SETUP_BUILDING => self.building_order(),
            ROUND_SETUP_BOOSTER => seats.into_iter().rev().collect(),
            1 => {
                self.passed_players.clear();
                seats
            }
            _ => std::mem::take(&mut self.passed_players),
        };
        self.phase = match self.round {
            ROUND_SETUP_FACTION => Phase::SetupFaction,
            ROUND_SETUP_BUILDING => Phase::SetupBuilding,
            ROUND_SETUP_BOOSTER => Phase::SetupBooster,
            _ => Phase::Move,
        };
        self.current_player = self.turn_order.first().copied();
        info!(round = self.round, phase = ?self.phase, order = ?self.turn_order, "round begins");

        if self.round >= 1 {
            for player in &mut self.players {
                player.begin_round();
            }
            for free in self.board_actions.values_mut() {
                *free = true;
            }
            self.income_phase()?;
        }
        Ok(())
    }

    /// Snake order over the regular factions, then the faction that places
    /// a third mine, then the one that starts with its planetary institute.
    fn building_order(&self) -> Vec<u8> {
        let of = |faction: Faction| {
            self.players
                .iter()
                .find(|p| p.faction == Some(faction))
                .map(|p| p.id)
        };
        let regular: Vec<u8> = self
            .players
            .iter()
            .filter(|p| !p.board.as_ref().is_some_and(|b| b.starts_with_pi))
            .map(|p| p.id)
            .collect();

        let mut order = regular.clone();
        order.extend(regular.iter().rev());
        order.extend(of(Faction::Xenos));
        order.extend(
            self.players
                .iter()
                .filter(|p| p.board.as_ref().is_some_and(|b| b.starts_with_pi))
                .map(|p| p.id),
        );
        order
    }

    /// Pay every seat's income in turn order. Seats whose income needs an
    /// ordering choice get a sub-command; the rest is paid right away.
    fn income_phase(&mut self) -> Result<(), RuleError> {
        self.phase = Phase::Income;
        for seat in self.turn_order.clone() {
            let player = self.player_mut(seat)?;
            let events = player.income_events();
            let selection = player.income_selection(&events);
            if selection.needs_manual_selection {
                player.apply_events(selection.others())?;
                player.pending_income = selection.conflicting();
                self.sub_commands
                    .push_back(SubCommand::ChooseIncome { player: seat });
            } else {
                let events = selection.autoplay_events(&player.data);
                player.apply_events(&events)?;
            }
        }

        match self.sub_commands.front() {
            Some(sub) => self.current_player = Some(sub.player()),
            None => self.gaia_phase(),
        }
        Ok(())
    }

    /// Finished gaia-formers turn their planets gaia, and gaia-area tokens
    /// come back.
    pub(super) fn gaia_phase(&mut self) {
        self.phase = Phase::Gaia;
        for (_, cell) in self.map.iter_mut() {
            if cell.planet == Planet::Transdim && cell.building == Some(Building::GaiaFormer) {
                cell.planet = Planet::Gaia;
            }
        }
        for &seat in &self.turn_order {
            if let Some(player) = self.players.get_mut(usize::from(seat)) {
                player.gaia_phase();
            }
        }
        self.phase = Phase::Move;
        self.current_player = self.turn_order.get(self.current_pos).copied();
        info!(round = self.round, "main actions");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineOptions;
    use crate::error::{MoveError, ProtocolError};

    #[test]
    fn test_init_rejects_player_count() {
        let mut engine = Engine::new(EngineOptions::default());
        let err = engine.apply("init 6 s").unwrap_err();
        assert!(err.is_protocol());
        assert!(matches!(err, MoveError::Protocol(ProtocolError::MalformedMove { .. })));
        assert_eq!(engine.round, ROUND_INIT);
        assert!(engine.players.is_empty());
    }

    #[test]
    fn test_init_draws_supply() {
        let mut engine = Engine::new(EngineOptions::default());
        engine.apply("init 4 supply").unwrap();
        assert_eq!(engine.round, ROUND_SETUP_FACTION);
        assert_eq!(engine.round_boosters.len(), 7);
        assert!(engine.round_boosters.values().all(|&free| free));
        assert_eq!(engine.tech_tiles.len(), TechTilePos::ALL.len());
        assert!(engine.tech_tiles.values().all(|s| s.count == TECH_TILE_COPIES));
        assert_eq!(engine.adv_tech_tiles.len(), ResearchField::ALL.len());

        let reserved = engine.terraforming_federation.unwrap();
        assert_eq!(engine.federations[&reserved], FEDERATION_COPIES - 1);
        let total: u32 = engine.federations.values().sum();
        let copies = u32::try_from(FederationTile::ALL.len()).unwrap() * FEDERATION_COPIES - 1;
        assert_eq!(total, copies);
    }

    #[test]
    fn test_building_order_snakes_then_xenos() {
        let mut engine = Engine::new(EngineOptions::default());
        engine.apply("init 3 order").unwrap();
        engine.apply("p1 faction xenos").unwrap();
        engine.apply("p2 faction terrans").unwrap();
        engine.apply("p3 faction ivits").unwrap();
        assert_eq!(engine.phase, Phase::SetupBuilding);
        assert_eq!(engine.turn_order, vec![0, 1, 1, 0, 0, 2]);
        assert_eq!(engine.current_player, Some(0));
    }

    #[test]
    fn test_last_round_ends_game() {
        let mut engine = Engine::new(EngineOptions::default());
        engine.apply("init 2 end").unwrap();
        engine.round = LAST_ROUND;
        engine.end_round().unwrap();
        assert!(engine.is_ended());
        assert_eq!(engine.current_player, None);
        assert!(engine.turn_order.is_empty());
    }
}
