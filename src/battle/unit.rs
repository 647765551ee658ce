//! Units: base stats, turn flags, placement and movement
//!
//! A unit's link to the grid is owned by the grid (see `grid.rs`); the
//! functions here validate a request and then ask the grid to relink.

use serde::{Deserialize, Serialize};

use crate::battle::grid::Grid;
use crate::core::error::{GameError, Result};
use crate::core::events::EventLog;
use crate::core::names::NameRegistry;
use crate::core::types::{Coord, StatKind, UnitId};

/// Faction tag carried by units that have not joined a faction yet
pub const NO_FACTION: &str = "None";

/// The six modifiable stats. Used both for a unit's base line and for cell
/// modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Stats {
    pub strength: i32,
    pub speed: i32,
    pub defense: i32,
    pub luck: i32,
    pub movement: i32,
    pub range: i32,
}

impl Stats {
    pub const fn new(strength: i32, speed: i32, defense: i32, luck: i32, movement: i32, range: i32) -> Self {
        Self {
            strength,
            speed,
            defense,
            luck,
            movement,
            range,
        }
    }

    pub fn get(&self, kind: StatKind) -> i32 {
        match kind {
            StatKind::Strength => self.strength,
            StatKind::Speed => self.speed,
            StatKind::Defense => self.defense,
            StatKind::Luck => self.luck,
            StatKind::Movement => self.movement,
            StatKind::Range => self.range,
        }
    }

    /// Check the base-stat preconditions
    fn validate(&self) -> std::result::Result<(), String> {
        if self.strength <= 0 {
            return Err(format!("strength must be positive, got {}", self.strength));
        }
        if self.movement <= 0 {
            return Err(format!("movement must be positive, got {}", self.movement));
        }
        if self.range <= 0 {
            return Err(format!("range must be positive, got {}", self.range));
        }
        for (label, value) in [
            ("speed", self.speed),
            ("defense", self.defense),
            ("luck", self.luck),
        ] {
            if value < 0 {
                return Err(format!("{} cannot be negative, got {}", label, value));
            }
        }
        Ok(())
    }
}

/// A single combatant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    name: String,
    hp: i32,
    base: Stats,
    alive: bool,
    can_move: bool,
    can_attack: bool,
    faction: String,
    pub(crate) cell: Option<Coord>,
    image: String,
}

impl Unit {
    /// Create a unit, reserving its name in the registry
    pub fn new(
        names: &mut NameRegistry,
        name: &str,
        hp: i32,
        base: Stats,
        image: &str,
    ) -> Result<Self> {
        if hp <= 0 {
            return Err(GameError::InvalidStats(format!(
                "hp must be positive, got {}",
                hp
            )));
        }
        base.validate().map_err(GameError::InvalidStats)?;
        names.claim_unit(name)?;

        Ok(Self {
            name: name.to_string(),
            hp,
            base,
            alive: true,
            can_move: false,
            can_attack: false,
            faction: NO_FACTION.to_string(),
            cell: None,
            image: image.to_string(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn hp(&self) -> i32 {
        self.hp
    }

    pub fn base(&self) -> &Stats {
        &self.base
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn can_move(&self) -> bool {
        self.can_move
    }

    pub fn can_attack(&self) -> bool {
        self.can_attack
    }

    pub fn faction(&self) -> &str {
        &self.faction
    }

    pub fn cell(&self) -> Option<Coord> {
        self.cell
    }

    pub fn is_placed(&self) -> bool {
        self.cell.is_some()
    }

    pub fn image(&self) -> &str {
        &self.image
    }

    pub fn set_can_move(&mut self, can_move: bool) {
        self.can_move = can_move;
    }

    pub fn set_can_attack(&mut self, can_attack: bool) {
        self.can_attack = can_attack;
    }

    pub fn set_alive(&mut self, alive: bool) {
        self.alive = alive;
    }

    pub(crate) fn set_faction(&mut self, faction: &str) {
        self.faction = faction.to_string();
    }

    /// Overwrite hp directly (save restore). Clamped at zero.
    pub(crate) fn set_hp(&mut self, hp: i32) {
        self.hp = hp.max(0);
    }

    /// Clear both action flags
    pub fn exhaust(&mut self) {
        self.can_move = false;
        self.can_attack = false;
    }

    /// Apply damage; returns true if this hit killed the unit
    pub(crate) fn take_damage(&mut self, amount: i32) -> bool {
        debug_assert!(amount > 0, "damage must be positive");
        self.hp = self.hp.saturating_sub(amount).max(0);
        if self.hp > 0 {
            return false;
        }
        let died = self.alive;
        self.alive = false;
        self.exhaust();
        died
    }
}

fn no_position(grid: &Grid, id: UnitId) -> GameError {
    GameError::NoPosition(grid.unit(id).name().to_string())
}

/// Place an unplaced unit at `(x, y)`. Does not touch the action flags.
pub fn place_unit(grid: &mut Grid, id: UnitId, x: i32, y: i32, log: &mut EventLog) -> Result<()> {
    if !grid.is_valid(x, y) {
        return Err(GameError::OutOfBounds { x, y });
    }
    let coord = Coord::new(x as u32, y as u32);
    if !grid.occupy(coord, id) {
        return Err(GameError::Occupied(coord));
    }
    log.push(format!("{} was placed at {}", grid.unit(id).name(), coord));
    Ok(())
}

/// Move a unit by `(dx, dy)`. On success `can_move` is cleared. A failed move
/// leaves every link untouched.
pub fn move_unit(grid: &mut Grid, id: UnitId, dx: i32, dy: i32, log: &mut EventLog) -> Result<()> {
    let from = grid.unit(id).cell().ok_or_else(|| no_position(grid, id))?;
    if !grid.unit(id).can_move() {
        return Err(GameError::Immobile(grid.unit(id).name().to_string()));
    }
    let steps = u64::from(dx.unsigned_abs()) + u64::from(dy.unsigned_abs());
    if steps > grid.real_stat(id, StatKind::Movement) as u64 {
        return Err(GameError::TooFar);
    }
    let target = from
        .offset(dx, dy)
        .and_then(|to| grid.cell(to))
        .ok_or(GameError::OutOfBounds {
            x: (from.x as i32).saturating_add(dx),
            y: (from.y as i32).saturating_add(dy),
        })?;
    if !target.is_empty() {
        return Err(GameError::Occupied(target.coord()));
    }

    let to = target.coord();
    grid.set_occupant(to, id);
    grid.unit_mut(id).set_can_move(false);
    tracing::debug!(unit = grid.unit(id).name(), %from, %to, "unit moved");
    log.push(format!("{} moved to {}", grid.unit(id).name(), to));
    Ok(())
}
