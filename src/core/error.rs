use thiserror::Error;

use crate::core::types::Coord;

#[derive(Error, Debug)]
pub enum GameError {
    #[error("Position ({x}, {y}) is not on the grid")]
    OutOfBounds { x: i32, y: i32 },

    #[error("Cell {0} is already occupied")]
    Occupied(Coord),

    #[error("Target is too far away")]
    TooFar,

    #[error("Unit {0} cannot act right now")]
    Immobile(String),

    #[error("Name already in use: {0}")]
    DuplicateName(String),

    #[error("Invalid stats: {0}")]
    InvalidStats(String),

    #[error("Grid dimensions must be positive, got {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("Not all of the units in {0} can be placed on the grid")]
    NoPositionAvailable(String),

    #[error("Malformed save data: {0}")]
    MalformedSave(String),

    #[error("Last pick was not a {0}")]
    SelectionMismatch(&'static str),

    // Fatal: these indicate a caller bug rather than a user mistake.
    #[error("Unit {0} has no position on the grid")]
    NoPosition(String),

    #[error("Turn advanced after the battle was decided")]
    BattleDecided,

    #[error("Invalid battle: {0}")]
    InvalidBattle(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    ConfigError(#[from] toml::de::Error),
}

impl GameError {
    /// Programmer errors that normal game flow is not expected to recover from
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            GameError::NoPosition(_) | GameError::BattleDecided | GameError::InvalidBattle(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, GameError>;
