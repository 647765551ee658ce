//! Battle system - turn-based tactics on a rectangular grid
//!
//! Factions take turns. On its turn a faction's units may each move once and
//! attack once; a battle ends when only one faction has living units.
//!
//! Layout:
//! - grid / unit: the arena and the link between units and cells
//! - targeting / combat: range scans, movement toward enemies, strike math
//! - faction: rosters, turn flags, placement
//! - state / ai / highlight: the battle state machine and its drivers

pub mod ai;
pub mod combat;
pub mod faction;
pub mod grid;
pub mod highlight;
pub mod recruits;
pub mod state;
pub mod targeting;
pub mod unit;

// Re-exports for convenient access
pub use ai::AiStep;
pub use combat::{attack, battle, critical_bonus, reduce_hp, AttackOutcome, BattleReport, Strike};
pub use faction::Faction;
pub use grid::{Cell, Grid, Modifiers};
pub use highlight::Highlight;
pub use recruits::{check_stage_size, spawn_recruits, Recruit, DEFAULT_RECRUITS};
pub use state::{Battle, PickResult, Selection};
pub use targeting::{diamond, find_move, valid_opponents};
pub use unit::{move_unit, place_unit, Stats, Unit, NO_FACTION};
