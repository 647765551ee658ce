//! JSON save files
//!
//! Layout:
//! ```text
//! { "battle": {
//!     "stage": { "length", "width", "positions": [modifiers, row-major] },
//!     "competitors": [ { "name", "warriors": [unit] } ],
//!     "turn", "subturn" } }
//! ```
//! Unplaced units are written with `x = y = -1`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;

use crate::battle::faction::Faction;
use crate::battle::grid::{Grid, Modifiers};
use crate::battle::state::Battle;
use crate::battle::unit::{place_unit, Stats, Unit};
use crate::core::config::EngineConfig;
use crate::core::error::{GameError, Result};
use crate::core::events::EventLog;
use crate::core::names::NameRegistry;

/// Coordinate written for units that are not on the grid
const UNPLACED: i32 = -1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct SaveFile {
    battle: BattleRecord,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct BattleRecord {
    stage: StageRecord,
    competitors: Vec<FactionRecord>,
    turn: u32,
    subturn: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct StageRecord {
    /// Number of rows
    length: u32,
    width: u32,
    positions: Vec<Modifiers>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct FactionRecord {
    name: String,
    warriors: Vec<UnitRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct UnitRecord {
    name: String,
    hp: i32,
    strength: i32,
    speed: i32,
    defense: i32,
    luck: i32,
    movement: i32,
    range: i32,
    image: String,
    #[serde(rename = "alive?")]
    alive: bool,
    #[serde(rename = "can move?")]
    can_move: bool,
    #[serde(rename = "can attack?")]
    can_attack: bool,
    x: i32,
    y: i32,
}

impl UnitRecord {
    fn capture(unit: &Unit) -> Self {
        let base = unit.base();
        let (x, y) = match unit.cell() {
            Some(c) => (c.x as i32, c.y as i32),
            None => (UNPLACED, UNPLACED),
        };
        Self {
            name: unit.name().to_string(),
            hp: unit.hp(),
            strength: base.strength,
            speed: base.speed,
            defense: base.defense,
            luck: base.luck,
            movement: base.movement,
            range: base.range,
            image: unit.image().to_string(),
            alive: unit.is_alive(),
            can_move: unit.can_move(),
            can_attack: unit.can_attack(),
            x,
            y,
        }
    }

    fn stats(&self) -> Stats {
        Stats::new(
            self.strength,
            self.speed,
            self.defense,
            self.luck,
            self.movement,
            self.range,
        )
    }
}

fn capture<R: Rng>(battle: &Battle<R>) -> SaveFile {
    let grid = battle.grid();
    let positions = grid.cells().map(|cell| cell.modifiers).collect();
    let competitors = battle
        .factions()
        .iter()
        .map(|faction| FactionRecord {
            name: faction.name().to_string(),
            warriors: faction
                .units()
                .iter()
                .map(|&id| UnitRecord::capture(grid.unit(id)))
                .collect(),
        })
        .collect();

    SaveFile {
        battle: BattleRecord {
            stage: StageRecord {
                length: grid.height(),
                width: grid.width(),
                positions,
            },
            competitors,
            turn: battle.turn(),
            subturn: battle.active_index(),
        },
    }
}

/// Serialize a battle, pretty-printed with four-space indentation
pub fn to_json<R: Rng>(battle: &Battle<R>) -> Result<String> {
    let mut buf = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    capture(battle).serialize(&mut serializer)?;
    let json = String::from_utf8(buf)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    Ok(json)
}

fn malformed(err: GameError) -> GameError {
    match err {
        GameError::MalformedSave(_) => err,
        other => GameError::MalformedSave(other.to_string()),
    }
}

/// Rebuild a battle from `json`.
///
/// Names are claimed in a fresh registry generation. Any failure rolls the
/// registry back and is reported as a single `MalformedSave`; on success the
/// new generation replaces the old one.
pub fn from_json(json: &str, names: &mut NameRegistry, config: EngineConfig) -> Result<Battle> {
    names.checkpoint();
    match restore(json, names, config) {
        Ok(battle) => {
            names.commit();
            Ok(battle)
        }
        Err(err) => {
            names.rollback();
            tracing::warn!(error = %err, "rejected save data");
            Err(malformed(err))
        }
    }
}

fn restore(json: &str, names: &mut NameRegistry, config: EngineConfig) -> Result<Battle> {
    let SaveFile { battle: record } = serde_json::from_str(json)?;
    let stage = record.stage;

    let expected = stage.length as usize * stage.width as usize;
    if stage.positions.len() != expected {
        return Err(GameError::MalformedSave(format!(
            "stage is {}x{} but has {} positions",
            stage.width,
            stage.length,
            stage.positions.len()
        )));
    }
    if record.subturn >= record.competitors.len() {
        return Err(GameError::MalformedSave(format!(
            "subturn {} with {} competitors",
            record.subturn,
            record.competitors.len()
        )));
    }
    if record.turn == 0 {
        return Err(GameError::MalformedSave("turn must start at 1".to_string()));
    }

    let mut grid = Grid::new(stage.width, stage.length)?;
    let coords: Vec<_> = grid.cells().map(|cell| cell.coord()).collect();
    for (coord, modifiers) in coords.into_iter().zip(stage.positions) {
        grid.set_modifiers(coord, modifiers)?;
    }

    let mut log = EventLog::new();
    let mut factions = Vec::with_capacity(record.competitors.len());
    for competitor in &record.competitors {
        let mut faction = Faction::new(names, &competitor.name)?;
        for warrior in &competitor.warriors {
            // Dead units are saved with 0 hp, which `Unit::new` refuses
            let unit = Unit::new(names, &warrior.name, warrior.hp.max(1), warrior.stats(), &warrior.image)?;
            let id = grid.spawn(unit);
            faction.add_unit(&mut grid, id, &mut log);

            if (warrior.x, warrior.y) != (UNPLACED, UNPLACED) {
                place_unit(&mut grid, id, warrior.x, warrior.y, &mut log)?;
            }
            let unit = grid.unit_mut(id);
            unit.set_hp(warrior.hp);
            unit.set_alive(warrior.alive);
            unit.set_can_move(warrior.can_move);
            unit.set_can_attack(warrior.can_attack);
        }
        factions.push(faction);
    }

    let mut battle = Battle::new(grid, factions, config, log)?;
    battle.set_turn(record.turn);
    battle.set_active_index(record.subturn)?;
    Ok(battle)
}

fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "save".to_string());
    path.with_file_name(format!(".{}.tmp", name))
}

/// Write the battle to `path`, replacing any existing file atomically
pub fn save_battle<R: Rng>(battle: &mut Battle<R>, path: &Path) -> Result<()> {
    let json = to_json(battle)?;
    let tmp = temp_path(path);
    fs::write(&tmp, json)?;
    if let Err(err) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(err.into());
    }

    tracing::info!(path = %path.display(), "game saved");
    battle
        .log_mut()
        .push(format!("Successfully saved game to {}", path.display()));
    Ok(())
}

/// Load a battle from `path`. The event log starts fresh.
pub fn load_battle(path: &Path, names: &mut NameRegistry, config: EngineConfig) -> Result<Battle> {
    let json = fs::read_to_string(path)?;
    let mut battle = from_json(&json, names, config)?;

    tracing::info!(path = %path.display(), "game loaded");
    let log = battle.log_mut();
    log.clear();
    log.push(format!("Loaded previous game from {}", path.display()));
    Ok(battle)
}
