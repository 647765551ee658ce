//! Session-wide name registry for units and factions
//!
//! Names must be unique within their namespace. Reloading a save re-validates
//! names against a fresh generation; a failed load rolls back to the previous
//! one so the session's namespace is never polluted by half-parsed data.

use ahash::AHashSet;

use crate::core::error::{GameError, Result};

#[derive(Debug, Clone, Default)]
struct Generation {
    units: AHashSet<String>,
    factions: AHashSet<String>,
}

/// Registry of names in use, with checkpoint/rollback generations
#[derive(Debug, Clone, Default)]
pub struct NameRegistry {
    current: Generation,
    previous: Vec<Generation>,
}

impl NameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve a unit name
    pub fn claim_unit(&mut self, name: &str) -> Result<()> {
        if !self.current.units.insert(name.to_string()) {
            return Err(GameError::DuplicateName(name.to_string()));
        }
        Ok(())
    }

    /// Reserve a faction name
    pub fn claim_faction(&mut self, name: &str) -> Result<()> {
        if !self.current.factions.insert(name.to_string()) {
            return Err(GameError::DuplicateName(name.to_string()));
        }
        Ok(())
    }

    pub fn unit_taken(&self, name: &str) -> bool {
        self.current.units.contains(name)
    }

    pub fn faction_taken(&self, name: &str) -> bool {
        self.current.factions.contains(name)
    }

    /// Put the current generation aside and start an empty one
    pub fn checkpoint(&mut self) {
        let old = std::mem::take(&mut self.current);
        self.previous.push(old);
    }

    /// Discard the current generation and restore the last checkpoint.
    /// No-op without an open checkpoint.
    pub fn rollback(&mut self) {
        if let Some(old) = self.previous.pop() {
            self.current = old;
        }
    }

    /// Keep the current generation and forget the last checkpoint
    pub fn commit(&mut self) {
        self.previous.pop();
    }

    pub fn depth(&self) -> usize {
        self.previous.len()
    }
}
