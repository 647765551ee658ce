//! Engine configuration with documented constants
//!
//! All tunable combat and placement numbers live here. The defaults reproduce
//! the classic ruleset; a TOML file can override any subset of them.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::core::error::Result;

/// Configuration for the combat and placement rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    // === INITIATIVE ===
    /// Flat speed bonus granted to the unit that starts a battle
    ///
    /// Ties go to the initiator, so with a bonus of 5 a defender needs at
    /// least 6 more real speed to strike first.
    pub speed_bonus: i32,

    // === CRITICAL HITS ===
    /// Denominator padding for the critical roll
    ///
    /// Critical chance is `luck / (luck + luck_buffer)`. At 30, a unit with
    /// 10 luck crits a quarter of the time.
    pub luck_buffer: i32,

    /// Upper bound on the critical bonus
    ///
    /// The bonus is `floor(1 / (1 - u))` which has an unbounded tail.
    /// `None` keeps the raw tail (saturating at `i32::MAX`).
    pub max_critical_bonus: Option<i32>,

    // === PLACEMENT ===
    /// Column stride of the striped auto-placement scan
    pub placement_stripe: u32,

    /// Minimum number of cells per unit of the larger army when sizing a grid
    pub min_cells_per_unit: u32,

    // === RANDOMNESS ===
    /// Seed for the battle RNG
    pub seed: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            speed_bonus: 5,
            luck_buffer: 30,
            max_critical_bonus: Some(20),
            placement_stripe: 3,
            min_cells_per_unit: 3,
            seed: 0,
        }
    }
}

impl EngineConfig {
    /// Parse a config from TOML. Missing keys fall back to defaults.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Load a config file from disk
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config = Self::from_toml_str(&contents)?;
        tracing::debug!("Loaded engine config from {:?}", path);
        Ok(config)
    }

    /// Smallest grid area that fits an army of `army_size` units
    pub fn min_grid_area(&self, army_size: usize) -> usize {
        army_size * self.min_cells_per_unit as usize
    }
}
