//! Integration tests for whole-game flow through the move protocol.

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use gaia_engine::content::{AdvTechTile, Booster, FederationTile, ResearchField, TechTile, TechTilePos};
use gaia_engine::engine::{DEFAULT_SEED, ROUND_SETUP_BUILDING, TileStack};
use gaia_engine::faction::Building;
use gaia_engine::invariants::{assert_invariants, check_invariants};
use gaia_engine::ledger::{OwnedFederation, OwnedTechTile, Power};
use gaia_engine::map::{HexGrid, MapLayout};
use gaia_engine::{Engine, EngineOptions, Hex, MoveError, Phase, ProtocolError, RuleError};

/// Apply the first legal move until `done` holds.
fn play_first_until(engine: &mut Engine, done: impl Fn(&Engine) -> bool) {
    for _ in 0..200 {
        if done(engine) {
            return;
        }
        let mv = engine.legal_moves().into_iter().next().unwrap();
        engine.apply(&mv).unwrap_or_else(|e| panic!("legal move `{mv}` failed: {e}"));
        assert_invariants(engine);
    }
    panic!("condition not reached in 200 moves");
}

fn in_round_one() -> Engine {
    let mut engine = Engine::new(EngineOptions::default());
    engine.apply("init 2 flow").unwrap();
    play_first_until(&mut engine, |e| e.round == 1 && e.phase == Phase::Move);
    engine
}

#[test]
fn test_fresh_engine_offers_init() {
    let engine = Engine::new(EngineOptions::default());
    assert_eq!(engine.phase, Phase::SetupInit);
    let moves = engine.legal_moves();
    assert!(moves.contains(&format!("init 2 {DEFAULT_SEED}")));
    assert!(moves.contains(&format!("init 5 {DEFAULT_SEED}")));
}

#[test]
fn test_init_defaults() {
    let mut engine = Engine::new(EngineOptions::default());
    engine.apply("init").unwrap();
    assert_eq!(engine.players.len(), 2);
    assert_eq!(engine.current_player, Some(0));
    assert_eq!(engine.phase, Phase::SetupFaction);
}

#[test]
fn test_same_seed_same_setup() {
    let mut a = Engine::new(EngineOptions::default());
    let mut b = Engine::new(EngineOptions::default());
    a.apply("init 3 same").unwrap();
    b.apply("init 3 same").unwrap();
    assert_eq!(a.map, b.map);
    assert_eq!(a.round_boosters, b.round_boosters);
    assert_eq!(a.tech_tiles, b.tech_tiles);
    assert_eq!(a.round_boosters.len(), 6);
}

#[test]
fn test_out_of_turn_is_protocol_error() {
    let mut engine = Engine::new(EngineOptions::default());
    engine.apply("init 2 s").unwrap();
    let err = engine.apply("p2 faction xenos").unwrap_err();
    assert!(matches!(
        err,
        MoveError::Protocol(ProtocolError::WrongTurn {
            expected: 0,
            found: 1,
            ..
        })
    ));
}

#[test]
fn test_verb_not_on_offer_is_protocol_error() {
    let mut engine = Engine::new(EngineOptions::default());
    engine.apply("init 2 s").unwrap();
    let err = engine.apply("p1 burn 1").unwrap_err();
    assert!(matches!(err, MoveError::Protocol(ProtocolError::NotAvailable { .. })));
    assert!(engine.apply("").unwrap_err().is_protocol());
}

#[test]
fn test_taken_home_planet_is_not_offered() {
    let mut engine = Engine::new(EngineOptions::default());
    engine.apply("init 2 s").unwrap();
    engine.apply("p1 faction terrans").unwrap();
    let moves = engine.legal_moves();
    assert!(moves.iter().all(|m| m.starts_with("p2 faction")));
    assert!(!moves.contains(&"p2 faction terrans".to_string()));
    assert!(!moves.contains(&"p2 faction lantids".to_string()));
}

#[test]
fn test_rule_error_leaves_engine_unchanged() {
    let mut engine = Engine::new(EngineOptions::default());
    engine.apply("init 2 s").unwrap();
    engine.apply("p1 faction terrans").unwrap();
    engine.apply("p2 faction xenos").unwrap();
    assert_eq!(engine.round, ROUND_SETUP_BUILDING);

    let before = engine.to_json().unwrap();
    let err = engine.apply("p1 build m 40,40").unwrap_err();
    assert!(matches!(err, MoveError::Rule(RuleError::OptionNotAvailable { .. })));
    assert_eq!(engine.to_json().unwrap(), before);
    assert_eq!(engine.move_log.len(), 3);
}

#[test]
fn test_setup_reaches_round_one() {
    let engine = in_round_one();
    assert_eq!(engine.current_player, Some(0));
    for player in &engine.players {
        assert!(player.faction.is_some());
        assert!(player.data.round_booster.is_some());
        assert!(player.data.count(gaia_engine::faction::Building::Mine) >= 2);
    }
    assert!(check_invariants(&engine).is_empty());
}

#[test]
fn test_passing_order_sets_next_round() {
    let mut engine = in_round_one();

    for seat in ["p1", "p2"] {
        let pass = engine
            .legal_moves()
            .into_iter()
            .find(|m| m.starts_with(&format!("{seat} pass")))
            .unwrap();
        engine.apply(&pass).unwrap();
    }
    assert_eq!(engine.round, 2);

    play_first_until(&mut engine, |e| e.phase == Phase::Move);
    assert_eq!(engine.turn_order, vec![0, 1]);
    assert_eq!(engine.current_player, Some(0));
    assert!(engine.passed_players.is_empty());
}

#[test]
fn test_replay_matches_incremental_play() {
    let mut engine = in_round_one();
    let log = engine.move_log.clone();
    let replayed = Engine::replay(EngineOptions::default(), &log).unwrap();
    assert_eq!(replayed.to_json().unwrap(), engine.to_json().unwrap());

    let mut bad = log.clone();
    bad.insert(1, "p2 faction xenos".to_string());
    let (index, err) = Engine::replay(EngineOptions::default(), &bad).unwrap_err();
    assert_eq!(index, 1);
    assert!(err.is_protocol());
    assert!(engine.apply("init 2 again").is_err());
}

#[test]
fn test_snapshot_file_resumes_play() {
    let engine = in_round_one();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("game.json");
    engine.save(&path).unwrap();

    let mut restored = Engine::load(&path).unwrap();
    assert_eq!(restored.legal_moves(), engine.legal_moves());
    let mv = restored.legal_moves().into_iter().next().unwrap();
    restored.apply(&mv).unwrap();
    assert_eq!(restored.move_log.len(), engine.move_log.len() + 1);
}

/// Terra at 0,0 4,0 6,0 7,0 and oxide at 2,0, open space elsewhere.
fn fixed_layout() -> MapLayout {
    MapLayout::from_rows(&["r e o e r e r r", "e e e e e e e e"])
}

/// Lantids (p1) against Ivits (p2) on the fixed map with a known supply,
/// stopped before p1 picks a starting booster. The Ivits planetary
/// institute pays `+4pw` and `+t`, so p2 orders income every round.
fn fixed_setup(options: EngineOptions) -> Engine {
    let mut engine = Engine::new(EngineOptions {
        layout: Some(fixed_layout()),
        ..options
    });
    engine.apply("init 2 fixed").unwrap();
    engine.round_boosters = [
        Booster::Booster1,
        Booster::Booster2,
        Booster::Booster3,
        Booster::Booster6,
        Booster::Booster7,
    ]
    .into_iter()
    .map(|b| (b, true))
    .collect();
    engine.tech_tiles = TechTilePos::ALL
        .iter()
        .zip(TechTile::ALL)
        .map(|(&pos, &tile)| (pos, TileStack { tile, count: 4 }))
        .collect();
    engine.adv_tech_tiles = ResearchField::ALL
        .iter()
        .zip(AdvTechTile::ALL)
        .map(|(&field, &tile)| (field, TileStack { tile, count: 1 }))
        .collect();

    for mv in [
        "p1 faction lantids",
        "p2 faction ivits",
        "p1 build m 0,0",
        "p1 build m 4,0",
        "p2 build PI 2,0",
        "p2 booster booster3",
    ] {
        engine.apply(mv).unwrap();
    }
    engine
}

/// Round one with p1 to move. `prepare` runs before p2 settles its income,
/// so the legal set p1 sees already reflects it.
fn round_one(options: EngineOptions, prepare: impl FnOnce(&mut Engine)) -> Engine {
    let mut engine = fixed_setup(options);
    engine.apply("p1 booster booster1").unwrap();
    assert_eq!(engine.phase, Phase::Income);
    prepare(&mut engine);
    engine.apply("p2 income t").unwrap();
    assert_eq!(engine.phase, Phase::Move);
    assert_eq!(engine.current_player, Some(0));
    engine
}

/// Put `building` on `hex` for `seat`, keeping the ledger in step.
fn place(engine: &mut Engine, seat: u8, hex: Hex, building: Building) {
    let cell = engine.map.get_mut(hex).unwrap();
    let planet = cell.planet;
    let old = cell.building.replace(building);
    cell.player = Some(seat);
    let data = &mut engine.players[usize::from(seat)].data;
    if let Some(old) = old {
        data.add_building(old, -1);
    }
    data.add_building(building, 1);
    data.occupied.insert(hex, planet);
}

fn power_of(engine: &Engine, seat: usize) -> (u32, u32, u32) {
    let power = &engine.players[seat].data.power;
    (power.area1, power.area2, power.area3)
}

#[test]
fn test_fixed_setup_income() {
    let engine = round_one(EngineOptions::default(), |_| {});
    let p1 = &engine.players[0].data;
    assert_eq!((p1.credits, p1.ores, p1.knowledge), (15, 8, 5));
    assert_eq!(power_of(&engine, 1), (1, 8, 0));
    assert_eq!(engine.players[1].data.victory_points, 10);
}

#[test]
fn test_leech_accept_costs_points() {
    let mut engine = round_one(EngineOptions::default(), |_| {});
    engine.apply("p1 build ts 0,0").unwrap();
    assert_eq!(engine.current_player, Some(1));
    assert_eq!(engine.legal_moves(), ["p2 leech 3", "p2 decline"]);

    let before = engine.to_json().unwrap();
    let err = engine.apply("p2 leech 2").unwrap_err();
    assert!(matches!(err, MoveError::Rule(RuleError::OptionNotAvailable { .. })));
    assert_eq!(engine.to_json().unwrap(), before);

    engine.apply("p2 leech 3").unwrap();
    assert_eq!(power_of(&engine, 1), (0, 7, 2));
    assert_eq!(engine.players[1].data.victory_points, 8);
    assert!(engine.sub_commands.is_empty());
    assert_eq!(engine.current_player, Some(1));
}

#[test]
fn test_leech_decline_keeps_everything() {
    let mut engine = round_one(EngineOptions::default(), |_| {});
    engine.apply("p1 build ts 0,0").unwrap();
    engine.apply("p2 decline").unwrap();
    assert_eq!(power_of(&engine, 1), (1, 8, 0));
    assert_eq!(engine.players[1].data.victory_points, 10);
    assert_eq!(engine.current_player, Some(1));
}

fn leech_after_upgrade(threshold: u32) -> Engine {
    let options = EngineOptions {
        auto_charge_power: Some(threshold),
        ..EngineOptions::default()
    };
    let mut engine = round_one(options, |_| {});
    engine.apply("p1 build ts 0,0").unwrap();
    engine
}

#[test]
fn test_leech_within_threshold_is_taken_automatically() {
    let engine = leech_after_upgrade(3);
    assert!(engine.sub_commands.is_empty());
    assert_eq!(power_of(&engine, 1), (0, 7, 2));
    assert_eq!(engine.players[1].data.victory_points, 8);
    assert_eq!(engine.current_player, Some(1));
    assert_eq!(engine.move_log.last().map(String::as_str), Some("p1 build ts 0,0"));

    let engine = leech_after_upgrade(2);
    assert_eq!(engine.legal_moves(), ["p2 leech 3", "p2 decline"]);
}

#[test]
fn test_passed_player_declines_wasted_leech_automatically() {
    let options = EngineOptions {
        auto_charge_power: Some(3),
        ..EngineOptions::default()
    };
    let mut engine = round_one(options, |_| {});
    engine.apply("p1 up terra").unwrap();

    // Next income fills every bowl, so a paid charge now is wasted.
    engine.players[1].data.power = Power::new(0, 2, 7);
    engine.apply("p2 pass booster6").unwrap();
    assert_eq!(engine.current_player, Some(0));

    engine.apply("p1 build ts 0,0").unwrap();
    assert!(engine.sub_commands.is_empty());
    assert_eq!(engine.players[1].data.power, Power::new(0, 2, 7));
    assert_eq!(engine.players[1].data.victory_points, 10);
    assert_eq!(engine.current_player, Some(0));
}

#[test]
fn test_income_order_is_chosen_seat_by_seat() {
    let mut engine = fixed_setup(EngineOptions::default());
    {
        let p1 = &mut engine.players[0];
        p1.advance_research(ResearchField::Economy).unwrap();
        p1.data.power.area1 -= 2;
        p1.data.power.gaia += 2;
    }
    engine.apply("p1 booster booster2").unwrap();

    assert_eq!(engine.phase, Phase::Income);
    assert_eq!(engine.current_player, Some(0));
    assert_eq!(engine.legal_moves(), ["p1 income 2t", "p1 income pw"]);
    assert!(engine.apply("p2 income t").unwrap_err().is_protocol());

    engine.apply("p1 income 2t").unwrap();
    assert_eq!(engine.phase, Phase::Income);
    assert_eq!(engine.current_player, Some(1));
    assert_eq!(power_of(&engine, 0), (3, 5, 0));
    assert_eq!(engine.players[0].data.power.gaia, 2);
    assert!(engine.players[0].pending_income.is_empty());
    assert_eq!(engine.legal_moves(), ["p2 income t", "p2 income 4pw"]);

    engine.apply("p2 income 4pw").unwrap();
    assert_eq!(engine.phase, Phase::Move);
    assert_eq!(power_of(&engine, 1), (1, 8, 0));
    assert_eq!(power_of(&engine, 0), (5, 5, 0));
    assert_eq!(engine.players[0].data.power.gaia, 0);
    assert!(engine.sub_commands.is_empty());
    assert_eq!(engine.current_player, Some(0));
}

/// p1 upgrades to a trading station, p2 declines and researches, and p1 is
/// to move again.
fn before_lab(prepare: impl FnOnce(&mut Engine)) -> Engine {
    let mut engine = round_one(EngineOptions::default(), prepare);
    for mv in ["p1 build ts 0,0", "p2 decline", "p2 up terra"] {
        engine.apply(mv).unwrap();
    }
    assert_eq!(engine.current_player, Some(0));
    engine
}

#[test]
fn test_lab_tech_tile_and_research_come_before_the_next_turn() {
    let mut engine = before_lab(|_| {});
    engine.apply("p1 build lab 0,0").unwrap();

    assert_eq!(engine.current_player, Some(0));
    let moves = engine.legal_moves();
    assert!(moves.iter().all(|m| m.starts_with("p1 tech ")));
    assert!(moves.contains(&"p1 tech tech6".to_string()));
    assert!(engine.apply("p2 decline").unwrap_err().is_protocol());

    engine.apply("p1 tech tech6").unwrap();
    assert_eq!(engine.current_player, Some(0));
    assert_eq!(engine.legal_moves(), ["p1 up sci"]);
    assert_eq!(engine.tech_tiles[&TechTilePos::Science].count, 3);

    engine.apply("p1 up sci").unwrap();
    assert_eq!(engine.players[0].data.research(ResearchField::Science), 1);
    assert_eq!(engine.current_player, Some(1));
    assert_eq!(engine.legal_moves(), ["p2 leech 3", "p2 decline"]);

    engine.apply("p2 decline").unwrap();
    assert!(engine.sub_commands.is_empty());
    assert_eq!(engine.current_player, Some(1));
    assert!(engine.players[0].data.has_tech(TechTile::Tech6));
}

#[test]
fn test_advanced_tile_covers_a_standard_one() {
    let mut engine = before_lab(|engine| {
        let data = &mut engine.players[0].data;
        data.research[ResearchField::Economy.index()] = 4;
        data.federations.push(OwnedFederation {
            tile: FederationTile::Fed2,
            green: true,
        });
        data.tech_tiles.push(OwnedTechTile {
            tile: TechTile::Tech6,
            pos: TechTilePos::Science,
            enabled: true,
        });
    });
    engine.apply("p1 build lab 0,0").unwrap();
    assert!(engine.legal_moves().contains(&"p1 tech adv5".to_string()));

    engine.apply("p1 tech adv5").unwrap();
    assert_eq!(engine.legal_moves(), ["p1 cover tech6"]);
    assert_eq!(engine.adv_tech_tiles[&ResearchField::Economy].count, 0);

    engine.apply("p1 cover tech6").unwrap();
    let data = &engine.players[0].data;
    assert_eq!(data.adv_tech_tiles, [AdvTechTile::Adv5]);
    assert!(!data.has_tech(TechTile::Tech6));
    assert_eq!(data.green_federations(), 0);

    let moves = engine.legal_moves();
    assert!(moves.contains(&"p1 up nav".to_string()));
    assert!(!moves.contains(&"p1 up eco".to_string()));

    engine.apply("p1 up nav").unwrap();
    engine.apply("p2 decline").unwrap();
    assert!(engine.sub_commands.is_empty());
    assert_eq!(engine.current_player, Some(1));
}

#[test]
fn test_federation_spends_satellites_and_marks_hexes() {
    let mut engine = round_one(EngineOptions::default(), |engine| {
        place(engine, 0, Hex::new(4, 0), Building::PlanetaryInstitute);
        place(engine, 0, Hex::new(6, 0), Building::Academy1);
        place(engine, 0, Hex::new(7, 0), Building::ResearchLab);
    });
    let federations: Vec<String> = engine
        .legal_moves()
        .into_iter()
        .filter(|m| m.starts_with("p1 federation"))
        .collect();
    assert!(!federations.is_empty());
    assert!(federations.iter().all(|m| m.starts_with("p1 federation 4,0;5,0;6,0;7,0 ")));

    let left = engine.federations[&FederationTile::Fed4];
    engine.apply("p1 federation 4,0;5,0;6,0;7,0 fed4").unwrap();

    for q in 4..=7 {
        assert_eq!(engine.map.get(Hex::new(q, 0)).unwrap().federations, [0]);
    }
    assert!(engine.map.get(Hex::new(0, 0)).unwrap().federations.is_empty());
    assert!(engine.map.get(Hex::new(3, 0)).unwrap().federations.is_empty());

    let data = &engine.players[0].data;
    assert_eq!(power_of(&engine, 0), (3, 4, 0));
    assert_eq!(data.power.removed, 1);
    assert_eq!(data.victory_points, 17);
    assert_eq!(data.credits, 21);
    assert_eq!(data.federations.len(), 1);
    assert_eq!(engine.federations[&FederationTile::Fed4], left - 1);
    assert_eq!(engine.current_player, Some(1));
}
