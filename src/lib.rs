//! Skirmish - turn-based grid tactics engine
//!
//! Factions of stat-driven units take turns moving and attacking on a
//! rectangular grid until one side is left standing.

pub mod battle;
pub mod core;
pub mod persistence;
