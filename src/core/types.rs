//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of a unit in the grid's unit arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(pub u32);

impl UnitId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

/// Grid coordinate. Cells are addressed by their coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Coord {
    pub x: u32,
    pub y: u32,
}

impl Coord {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Manhattan distance
    pub fn distance(&self, other: &Self) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// Apply a signed offset. None if the result would be negative.
    pub fn offset(&self, dx: i32, dy: i32) -> Option<Coord> {
        let x = i64::from(self.x) + i64::from(dx);
        let y = i64::from(self.y) + i64::from(dy);
        if x < 0 || y < 0 || x > i64::from(u32::MAX) || y > i64::from(u32::MAX) {
            return None;
        }
        Some(Coord::new(x as u32, y as u32))
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

/// The six stats a cell can modify
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatKind {
    Strength,
    Speed,
    Defense,
    Luck,
    Movement,
    Range,
}

impl StatKind {
    pub const ALL: [StatKind; 6] = [
        StatKind::Strength,
        StatKind::Speed,
        StatKind::Defense,
        StatKind::Luck,
        StatKind::Movement,
        StatKind::Range,
    ];

    /// Lowest value the real stat can take after modifiers
    pub fn floor(self) -> i32 {
        match self {
            StatKind::Movement | StatKind::Range => 1,
            _ => 0,
        }
    }
}
