pub mod config;
pub mod error;
pub mod events;
pub mod names;
pub mod types;

pub use config::EngineConfig;
pub use error::{GameError, Result};
pub use events::{EventLog, GameEvent};
pub use names::NameRegistry;
pub use types::{Coord, StatKind, UnitId};
