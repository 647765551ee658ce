//! The stock recruit roster and army sizing rules

use crate::battle::grid::Grid;
use crate::battle::unit::{Stats, Unit};
use crate::core::config::EngineConfig;
use crate::core::error::{GameError, Result};
use crate::core::names::NameRegistry;
use crate::core::types::UnitId;

/// Image paths handed through to the presentation layer untouched
pub mod images {
    pub const SWORD: &str = "./data/Sword.png";
    pub const SHIELD: &str = "./data/Shield.png";
    pub const BOW: &str = "./data/Bow.png";
    pub const AXE: &str = "./data/Axe.png";
    pub const DAGGER: &str = "./data/Dagger.png";
}

/// Template for a stock unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Recruit {
    pub name: &'static str,
    pub hp: i32,
    pub stats: Stats,
    pub image: &'static str,
}

#[allow(clippy::too_many_arguments)]
const fn recruit(
    name: &'static str,
    hp: i32,
    strength: i32,
    speed: i32,
    defense: i32,
    luck: i32,
    movement: i32,
    range: i32,
    image: &'static str,
) -> Recruit {
    Recruit {
        name,
        hp,
        stats: Stats::new(strength, speed, defense, luck, movement, range),
        image,
    }
}

/// Stock roster, in the order recruits are offered
pub const DEFAULT_RECRUITS: [Recruit; 11] = [
    recruit("Lucia", 8, 12, 10, 1, 3, 6, 1, images::AXE),
    recruit("Moria", 12, 9, 5, 3, 2, 5, 2, images::SWORD),
    recruit("Kayla", 20, 7, 4, 2, 8, 7, 2, images::DAGGER),
    recruit("Johny", 1, 100, 5, 0, 20, 30, 1, images::AXE),
    recruit("Isiah", 16, 2, 1, 7, 25, 10, 3, images::SHIELD),
    recruit("Mitsi", 20, 7, 2, 5, 9, 5, 1, images::SWORD),
    recruit("Judie", 4, 6, 7, 8, 13, 3, 7, images::SHIELD),
    recruit("Agara", 6, 10, 2, 4, 11, 7, 3, images::BOW),
    recruit("Bulky", 20, 18, 0, 4, 1, 3, 1, images::AXE),
    recruit("Benji", 30, 5, 0, 0, 18, 15, 5, images::BOW),
    recruit("Frazz", 20, 8, 7, 3, 16, 6, 1, images::DAGGER),
];

impl Recruit {
    /// Build the unit and add it to the grid's arena, unplaced
    pub fn spawn(&self, grid: &mut Grid, names: &mut NameRegistry) -> Result<UnitId> {
        let unit = Unit::new(names, self.name, self.hp, self.stats, self.image)?;
        Ok(grid.spawn(unit))
    }
}

/// Spawn the given recruits in order
pub fn spawn_recruits(recruits: &[Recruit], grid: &mut Grid, names: &mut NameRegistry) -> Result<Vec<UnitId>> {
    recruits.iter().map(|r| r.spawn(grid, names)).collect()
}

/// Reject a grid too small for two armies of `army_size`
pub fn check_stage_size(width: u32, height: u32, army_size: usize, config: &EngineConfig) -> Result<()> {
    let area = width as usize * height as usize;
    if width == 0 || height == 0 || area < config.min_grid_area(army_size) {
        return Err(GameError::InvalidDimensions { width, height });
    }
    Ok(())
}
