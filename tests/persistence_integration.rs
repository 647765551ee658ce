//! Save/load integration tests

use std::fs;

use skirmish::battle::*;
use skirmish::core::{Coord, EngineConfig, EventLog, GameError, NameRegistry};
use skirmish::persistence::{load_battle, save_battle, to_json};
use tempfile::tempdir;

/// Two factions with a dead unit, an unplaced dead unit, modified cells and
/// a battle already fought
fn mid_game(names: &mut NameRegistry) -> Battle {
    let mut log = EventLog::new();
    let mut grid = Grid::new(5, 4).unwrap();
    grid.set_modifiers(Coord::new(1, 0), Modifiers::new(2, 0, -1, 4, 0, 1))
        .unwrap();
    grid.set_modifiers(Coord::new(4, 3), Modifiers::new(0, -3, 0, 0, -5, 0))
        .unwrap();

    let mut red = Faction::new(names, "Red").unwrap();
    let mut blue = Faction::new(names, "Blues").unwrap();

    let lucia = DEFAULT_RECRUITS[0].spawn(&mut grid, names).unwrap();
    red.add_unit(&mut grid, lucia, &mut log);
    place_unit(&mut grid, lucia, 0, 0, &mut log).unwrap();

    let moria = DEFAULT_RECRUITS[1].spawn(&mut grid, names).unwrap();
    red.add_unit(&mut grid, moria, &mut log);

    blue.mirror_roster(&red, &[], &mut grid, names, &mut log)
        .unwrap();
    let enemy_one = blue.units()[0];
    let enemy_two = blue.units()[1];
    place_unit(&mut grid, enemy_one, 1, 0, &mut log).unwrap();
    place_unit(&mut grid, enemy_two, 4, 3, &mut log).unwrap();

    // Moria never made it onto the field
    reduce_hp(&mut grid, moria, 100, &mut log);

    let mut battle = Battle::new(grid, vec![red, blue], EngineConfig::default(), log).unwrap();
    battle.begin();
    battle.pick_cell(0, 0).unwrap();
    battle.pick_cell(1, 0).unwrap();
    battle.commit_attack().unwrap();
    battle.end_faction_turn();
    battle.advance_turn().unwrap();
    battle
}

fn assert_same_state(a: &Battle, b: &Battle) {
    assert_eq!(a.turn(), b.turn());
    assert_eq!(a.active_index(), b.active_index());
    assert_eq!(a.grid().width(), b.grid().width());
    assert_eq!(a.grid().height(), b.grid().height());
    for (x, y) in a.grid().cells().zip(b.grid().cells()) {
        assert_eq!(x.coord(), y.coord());
        assert_eq!(x.modifiers, y.modifiers);
    }

    assert_eq!(a.factions().len(), b.factions().len());
    for (fa, fb) in a.factions().iter().zip(b.factions()) {
        assert_eq!(fa.name(), fb.name());
        assert_eq!(fa.len(), fb.len());
        for (&ua, &ub) in fa.units().iter().zip(fb.units()) {
            assert_eq!(a.grid().unit(ua), b.grid().unit(ub));
        }
    }
    assert!(b.grid().links_consistent());
}

#[test]
fn test_save_load_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("save.json");

    let mut names = NameRegistry::new();
    let mut battle = mid_game(&mut names);
    save_battle(&mut battle, &path).unwrap();
    assert!(battle
        .log()
        .last()
        .unwrap()
        .description
        .starts_with("Successfully saved game to"));

    let mut fresh = NameRegistry::new();
    let loaded = load_battle(&path, &mut fresh, EngineConfig::default()).unwrap();
    assert_same_state(&battle, &loaded);

    // Log restarts with the clear marker then the load notice
    let events: Vec<_> = loaded.log().iter().map(|e| e.description.as_str()).collect();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0], "Event log cleared.");
    assert!(events[1].starts_with("Loaded previous game from"));

    // Writing the loaded battle again produces the same document
    assert_eq!(to_json(&battle).unwrap(), to_json(&loaded).unwrap());
}

#[test]
fn test_save_overwrites_without_leftovers() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("save.json");
    fs::write(&path, "stale").unwrap();

    let mut names = NameRegistry::new();
    let mut battle = mid_game(&mut names);
    save_battle(&mut battle, &path).unwrap();

    let written = fs::read_to_string(&path).unwrap();
    assert!(written.starts_with("{\n    \"battle\""));
    let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
    assert_eq!(entries.len(), 1);
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempdir().unwrap();
    let mut names = NameRegistry::new();
    let err = load_battle(&dir.path().join("nope.json"), &mut names, EngineConfig::default())
        .unwrap_err();
    assert!(matches!(err, GameError::IoError(_)));
}

#[test]
fn test_malformed_file_keeps_session_names() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("save.json");

    let mut scratch = NameRegistry::new();
    let mut battle = mid_game(&mut scratch);
    save_battle(&mut battle, &path).unwrap();

    // Break the second faction after the first has been parsed
    let text = fs::read_to_string(&path).unwrap();
    let mut value: serde_json::Value = serde_json::from_str(&text).unwrap();
    value["battle"]["competitors"][1]["warriors"][0]["movement"] = 0.into();
    fs::write(&path, value.to_string()).unwrap();

    let mut names = NameRegistry::new();
    names.claim_faction("Session").unwrap();
    let err = load_battle(&path, &mut names, EngineConfig::default()).unwrap_err();

    assert!(matches!(err, GameError::MalformedSave(_)));
    assert!(names.faction_taken("Session"));
    assert!(!names.faction_taken("Red"));
    assert!(!names.unit_taken("Lucia"));
    assert_eq!(names.depth(), 0);
}
