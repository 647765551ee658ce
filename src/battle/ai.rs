//! Single-step AI driver
//!
//! The caller polls `step_ai` (e.g. on an animation timer) and gets back one
//! action per call. The work list is the active faction's attackable units,
//! snapshotted on the first call of a turn.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::battle::combat::battle;
use crate::battle::state::{AiCursor, Battle};
use crate::battle::targeting::{find_move, valid_opponents};
use crate::core::error::Result;

/// What one AI step did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AiStep {
    /// A unit attacked; the cursor moved on
    Battle,
    /// A unit moved; it is re-evaluated on the next call
    Move,
    /// Nothing left to do this turn
    Finish,
}

impl<R: Rng> Battle<R> {
    /// Perform the next AI action for the active faction
    pub fn step_ai(&mut self) -> Result<AiStep> {
        let active = self.active;
        let grid = &self.grid;
        let cursor = self.ai.get_or_insert_with(|| AiCursor {
            next: 0,
            work: self.factions[active].attackable_units(grid),
        });

        while let Some(&id) = cursor.work.get(cursor.next) {
            let unit = self.grid.unit(id);
            if !unit.is_alive() || !unit.is_placed() {
                cursor.next += 1;
                continue;
            }
            let can_attack = unit.can_attack();
            let origin = unit.cell();

            self.selection.active_unit = Some(id);
            self.selection.active_cell = origin;

            let opponents = valid_opponents(&self.grid, id)?;
            if let (true, Some(&target)) = (can_attack, opponents.first()) {
                self.selection.secondary_cell = self.grid.unit(target).cell();
                battle(
                    &mut self.grid,
                    id,
                    target,
                    &self.config,
                    &mut self.rng,
                    &mut self.log,
                )?;
                self.selection.active_unit = None;
                cursor.next += 1;
                return Ok(AiStep::Battle);
            }

            if find_move(&mut self.grid, id, &mut self.log)? {
                self.selection.secondary_cell = self.grid.unit(id).cell();
                tracing::trace!(unit = self.grid.unit(id).name(), "ai moved");
                return Ok(AiStep::Move);
            }
            cursor.next += 1;
        }

        self.selection.active_unit = None;
        Ok(AiStep::Finish)
    }

    /// Run AI steps until the active faction has nothing left to do.
    /// Returns the number of actions taken.
    pub fn run_ai_turn(&mut self) -> Result<usize> {
        let mut actions = 0;
        while self.step_ai()? != AiStep::Finish {
            actions += 1;
            if self.is_game_over() {
                break;
            }
        }
        Ok(actions)
    }
}
