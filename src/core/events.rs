//! Game event trail
//!
//! The presentation layer shows these as a running log. Each event is also
//! mirrored to `tracing` at debug level.

use serde::{Deserialize, Serialize};

/// One entry in the event trail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameEvent {
    pub turn: u32,
    pub description: String,
}

/// Event sink owned by whoever composes the game
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    pub events: Vec<GameEvent>,
    turn: u32,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Turn number stamped onto subsequent events
    pub fn set_turn(&mut self, turn: u32) {
        self.turn = turn;
    }

    pub fn push(&mut self, description: impl Into<String>) {
        let description = description.into();
        tracing::debug!(turn = self.turn, "{}", description);
        self.events.push(GameEvent {
            turn: self.turn,
            description,
        });
    }

    /// Clear the trail, leaving a single marker event behind
    pub fn clear(&mut self) {
        self.events.clear();
        self.push("Event log cleared.");
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn last(&self) -> Option<&GameEvent> {
        self.events.last()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GameEvent> {
        self.events.iter()
    }
}

/// "Army's" / "Archers'" style possessive used in event text
pub fn possessive(name: &str) -> String {
    if name.ends_with('s') {
        format!("{}'", name)
    } else {
        format!("{}'s", name)
    }
}
