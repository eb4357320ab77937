//! The rules engine.
//!
//! An [`Engine`] holds the whole game. The caller feeds it move text with
//! [`Engine::apply`] and reads back the commands that are legal next. Every
//! move is checked against that legal set before it runs, and a move that
//! fails a rule check leaves the engine exactly as it was.
//!
//! Flow within a round follows a queue of pending sub-commands: follow-ups
//! such as tech tile picks or leech offers interrupt the normal turn order
//! and are answered first, by whichever player they belong to.

mod available;
mod command;
mod handlers;
mod rounds;
mod snapshot;

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::charge::{ChargeDecision, ChargeRequest, decide};
use crate::content::{AdvTechTile, BoardAction, Booster, FederationTile, ResearchField, TechTile, TechTilePos};
use crate::error::{MoveResult, ProtocolError, RuleError};
use crate::faction::{FactionData, StandardBoards};
use crate::map::{MapLayout, SpaceMap};
use crate::player::{Player, PlayerSettings};

pub use available::{
    AvailableCommand, BoardActionOption, BuildingOption, CommandData, FreeActionOption, TechTileOption,
    TrackOption,
};
pub use snapshot::{SNAPSHOT_VERSION, Snapshot};
pub use command::{
    Command, CommandName, DEFAULT_PLAYERS, DEFAULT_SEED, MAX_PLAYERS, Move, TechChoice, parse_player_tag, player_tag,
};

/// Round number before `init`.
pub const ROUND_INIT: i32 = -3;
/// Factions are picked.
pub const ROUND_SETUP_FACTION: i32 = -2;
/// Starting buildings are placed.
pub const ROUND_SETUP_BUILDING: i32 = -1;
/// Starting boosters are picked.
pub const ROUND_SETUP_BOOSTER: i32 = 0;
/// Final round.
pub const LAST_ROUND: i32 = 6;

/// Where the game stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// Waiting for `init`.
    SetupInit,
    /// Picking factions.
    SetupFaction,
    /// Placing starting buildings.
    SetupBuilding,
    /// Picking starting boosters.
    SetupBooster,
    /// Players are ordering their income.
    Income,
    /// Gaia-formers finish and gaia tokens return.
    Gaia,
    /// Main actions.
    Move,
    /// Game over.
    End,
}

/// Engine settings.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    /// Order conflicting income automatically.
    pub auto_income: bool,
    /// Leech threshold for automatic decisions; `None` always asks.
    pub auto_charge_power: Option<u32>,
    /// Explicit map instead of a generated one.
    pub layout: Option<MapLayout>,
}

impl EngineOptions {
    /// Settings handed to each player.
    #[must_use]
    pub const fn player_settings(&self) -> PlayerSettings {
        PlayerSettings {
            auto_income: self.auto_income,
            auto_charge_power: self.auto_charge_power,
        }
    }
}

/// A pending follow-up that must be answered before play continues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SubCommand {
    /// Order conflicting income.
    ChooseIncome {
        /// Seat.
        player: u8,
    },
    /// Take a tech tile.
    ChooseTechTile {
        /// Seat.
        player: u8,
    },
    /// Cover a standard tile with `tile`.
    CoverTechTile {
        /// Seat.
        player: u8,
        /// Advanced tile being taken.
        tile: AdvTechTile,
    },
    /// A free research step, on `field` or any track.
    UpgradeResearch {
        /// Seat.
        player: u8,
        /// Required track.
        field: Option<ResearchField>,
    },
    /// Place the lost planet.
    PlaceLostPlanet {
        /// Seat.
        player: u8,
    },
    /// Rescore one owned federation tile.
    RescoreFederation {
        /// Seat.
        player: u8,
    },
    /// Build a mine or gaia-former with the steps or range just gained.
    BuildMine {
        /// Seat.
        player: u8,
    },
    /// Charge power from a neighbour's build.
    Leech {
        /// Seat.
        player: u8,
        /// Power on offer.
        power: u32,
    },
}

impl SubCommand {
    /// The seat that answers.
    #[must_use]
    pub const fn player(&self) -> u8 {
        match *self {
            Self::ChooseIncome { player }
            | Self::ChooseTechTile { player }
            | Self::CoverTechTile { player, .. }
            | Self::UpgradeResearch { player, .. }
            | Self::PlaceLostPlanet { player }
            | Self::RescoreFederation { player }
            | Self::BuildMine { player }
            | Self::Leech { player, .. } => player,
        }
    }

    /// Whether a move with verb `name` answers this.
    #[must_use]
    pub fn answered_by(&self, name: CommandName) -> bool {
        match self {
            Self::ChooseIncome { .. } => name == CommandName::ChooseIncome,
            Self::ChooseTechTile { .. } => name == CommandName::ChooseTechTile,
            Self::CoverTechTile { .. } => name == CommandName::ChooseCoverTechTile,
            Self::UpgradeResearch { .. } => name == CommandName::UpgradeResearch,
            Self::PlaceLostPlanet { .. } => name == CommandName::PlaceLostPlanet,
            Self::RescoreFederation { .. } => name == CommandName::ChooseFederationTile,
            Self::BuildMine { .. } => name == CommandName::Build,
            Self::Leech { .. } => matches!(name, CommandName::Leech | CommandName::DeclineLeech),
        }
    }
}

/// Tiles left on one supply position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileStack<T> {
    /// Which tile sits here.
    pub tile: T,
    /// Copies left.
    pub count: u32,
}

fn standard_boards() -> Arc<dyn FactionData> {
    Arc::new(StandardBoards)
}

/// The game.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Engine {
    /// Settings.
    pub options: EngineOptions,
    /// The board.
    pub map: SpaceMap,
    /// Seats, by index.
    pub players: Vec<Player>,
    /// Round number; see [`ROUND_INIT`] and friends.
    pub round: i32,
    /// Phase within the round.
    pub phase: Phase,
    /// Seats still to act this round, in order.
    pub turn_order: Vec<u8>,
    /// Seats that passed this round, in passing order.
    pub passed_players: Vec<u8>,
    /// Seat to move.
    pub current_player: Option<u8>,
    /// Index of the acting seat in `turn_order`.
    pub current_pos: usize,
    /// Follow-ups, answered front first.
    pub sub_commands: VecDeque<SubCommand>,
    /// Boosters in play, `true` when still in the supply.
    pub round_boosters: BTreeMap<Booster, bool>,
    /// Standard tech tile supply.
    pub tech_tiles: BTreeMap<TechTilePos, TileStack<TechTile>>,
    /// Advanced tech tile supply, one slot per track.
    pub adv_tech_tiles: BTreeMap<ResearchField, TileStack<AdvTechTile>>,
    /// Federation tile supply.
    pub federations: BTreeMap<FederationTile, u32>,
    /// Tile waiting at the top of the terraforming track.
    pub terraforming_federation: Option<FederationTile>,
    /// Board actions, `true` when still available this round.
    pub board_actions: BTreeMap<BoardAction, bool>,
    /// Every move applied so far.
    pub move_log: Vec<String>,
    available_commands: Vec<AvailableCommand>,
    #[serde(skip, default = "standard_boards")]
    factions: Arc<dyn FactionData>,
}

impl Engine {
    /// A game waiting for `init`, using the standard faction boards.
    #[must_use]
    pub fn new(options: EngineOptions) -> Self {
        Self::with_factions(options, standard_boards())
    }

    /// A game waiting for `init`, reading faction boards from `factions`.
    #[must_use]
    pub fn with_factions(options: EngineOptions, factions: Arc<dyn FactionData>) -> Self {
        let mut engine = Self {
            options,
            map: SpaceMap::default(),
            players: Vec::new(),
            round: ROUND_INIT,
            phase: Phase::SetupInit,
            turn_order: Vec::new(),
            passed_players: Vec::new(),
            current_player: None,
            current_pos: 0,
            sub_commands: VecDeque::new(),
            round_boosters: BTreeMap::new(),
            tech_tiles: BTreeMap::new(),
            adv_tech_tiles: BTreeMap::new(),
            federations: BTreeMap::new(),
            terraforming_federation: None,
            board_actions: BTreeMap::new(),
            move_log: Vec::new(),
            available_commands: Vec::new(),
            factions,
        };
        engine.available_commands = engine.generate_commands();
        engine
    }

    /// Apply one move and return the commands legal afterwards.
    ///
    /// # Errors
    ///
    /// Returns a protocol error if the move is malformed, out of turn or not
    /// on offer, and a rule error if a deeper check fails. Either way the
    /// engine is left unchanged.
    pub fn apply(&mut self, text: &str) -> MoveResult<&[AvailableCommand]> {
        let mv = Move::parse(text)?;
        self.check_legal(text, &mv)?;

        let backup = self.clone();
        if let Err(err) = self
            .run(mv.player, mv.command)
            .and_then(|()| self.settle())
        {
            debug!(text, error = %err, "move rejected");
            *self = backup;
            return Err(err.into());
        }
        self.move_log.push(text.trim().to_string());
        Ok(&self.available_commands)
    }

    /// Commands legal right now.
    #[must_use]
    pub fn available_commands(&self) -> &[AvailableCommand] {
        &self.available_commands
    }

    /// Every concrete move legal right now.
    #[must_use]
    pub fn legal_moves(&self) -> Vec<String> {
        self.available_commands
            .iter()
            .flat_map(AvailableCommand::moves)
            .collect()
    }

    /// Whether the game is over.
    #[must_use]
    pub fn is_ended(&self) -> bool {
        self.phase == Phase::End
    }

    /// Replay a move log from a fresh game.
    ///
    /// # Errors
    ///
    /// Returns the first failing move's error, with its index.
    pub fn replay<S: AsRef<str>>(
        options: EngineOptions,
        moves: &[S],
    ) -> Result<Self, (usize, crate::error::MoveError)> {
        let mut engine = Self::new(options);
        for (i, text) in moves.iter().enumerate() {
            engine.apply(text.as_ref()).map_err(|e| (i, e))?;
        }
        Ok(engine)
    }

    fn check_legal(&self, text: &str, mv: &Move) -> Result<(), ProtocolError> {
        if self.phase == Phase::End {
            return Err(ProtocolError::GameEnded);
        }
        if let (Some(found), Some(expected)) = (mv.player, self.current_player)
            && found != expected
        {
            return Err(ProtocolError::WrongTurn {
                text: text.to_string(),
                expected,
                found,
            });
        }
        let name = mv.command.name();
        if self
            .available_commands
            .iter()
            .any(|c| c.name == name && c.player == mv.player)
        {
            return Ok(());
        }
        let mut offered: Vec<&str> = self.available_commands.iter().map(|c| c.name.code()).collect();
        offered.dedup();
        Err(ProtocolError::NotAvailable {
            text: text.to_string(),
            available: offered.join(", "),
        })
    }

    /// Execute a validated move and move the turn on.
    fn run(&mut self, player: Option<u8>, command: Command) -> Result<(), RuleError> {
        let name = command.name();
        if let Command::Init { players, seed } = &command {
            return self.init(*players, seed);
        }
        let Some(player) = player else {
            return Ok(());
        };

        let answered = match self.sub_commands.front() {
            Some(sub) if sub.player() == player && sub.answered_by(name) => self.sub_commands.pop_front(),
            _ => None,
        };
        debug!(player = %player_tag(player), command = %name, round = self.round, "executing");
        self.execute(player, command, answered)?;
        self.end_turn(name, answered)
    }

    /// Regenerate the legal set, answering leech offers automatically while
    /// the owner's settings allow it.
    fn settle(&mut self) -> Result<(), RuleError> {
        loop {
            self.available_commands = self.generate_commands();
            let Some((player, command)) = self.automatic_move() else {
                return Ok(());
            };
            debug!(player = %player_tag(player), command = %command.name(), "automatic move");
            self.run(Some(player), command)?;
        }
    }

    fn automatic_move(&self) -> Option<(u8, Command)> {
        let SubCommand::Leech { player, power } = *self.sub_commands.front()? else {
            return None;
        };
        let p = self.players.get(usize::from(player))?;
        let threshold = p.settings.auto_charge_power?;
        let request = ChargeRequest {
            faction: p.faction,
            offers: vec![available::leech_offer(power)],
            power,
            is_last_round: self.round == LAST_ROUND,
            player_has_passed: self.passed_players.contains(&player),
            remaining_charges_after_income: p
                .income_selection(&p.income_events())
                .remaining_charges_after_income,
            area1: p.data.power.area1,
            threshold,
        };
        match decide(&request) {
            ChargeDecision::Yes => Some((player, Command::Leech(power))),
            ChargeDecision::No => Some((player, Command::DeclineLeech)),
            ChargeDecision::Ask | ChargeDecision::Undecided => None,
        }
    }

    /// Hand the turn to whoever acts next.
    fn end_turn(&mut self, name: CommandName, answered: Option<SubCommand>) -> Result<(), RuleError> {
        if self.phase == Phase::End {
            return Ok(());
        }
        self.move_to_next_player(name, answered);
        if self.sub_commands.is_empty() && self.turn_order.is_empty() {
            self.end_round()?;
        }
        Ok(())
    }

    fn move_to_next_player(&mut self, name: CommandName, answered: Option<SubCommand>) {
        if let Some(sub) = self.sub_commands.front() {
            self.current_player = Some(sub.player());
            return;
        }
        if self.turn_order.is_empty() {
            self.current_player = None;
            return;
        }

        let leaves_order = self.round <= ROUND_SETUP_BOOSTER || name == CommandName::Pass;
        if leaves_order {
            let pos = self.current_pos.min(self.turn_order.len() - 1);
            let seat = self.turn_order.remove(pos);
            if name == CommandName::Pass {
                self.passed_players.push(seat);
            }
            if self.current_pos >= self.turn_order.len() {
                self.current_pos = 0;
            }
        } else {
            let advance = match answered {
                Some(SubCommand::ChooseIncome { .. }) => false,
                Some(_) => true,
                None => !matches!(name, CommandName::Spend | CommandName::BurnPower),
            };
            if advance {
                self.current_pos = (self.current_pos + 1) % self.turn_order.len();
            }
        }
        self.current_player = self.turn_order.get(self.current_pos).copied();
    }

    fn player(&self, seat: u8) -> Result<&Player, RuleError> {
        self.players
            .get(usize::from(seat))
            .ok_or(RuleError::UnknownPlayer(seat))
    }

    fn player_mut(&mut self, seat: u8) -> Result<&mut Player, RuleError> {
        self.players
            .get_mut(usize::from(seat))
            .ok_or(RuleError::UnknownPlayer(seat))
    }
}
