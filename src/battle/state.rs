//! Battle state: turn order and the cell-selection state machine
//!
//! The presentation layer drives a battle by picking cells and committing the
//! resulting move or attack. Everything here is request/response; rendering
//! and timers live outside the crate.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::battle::combat::{battle, BattleReport};
use crate::battle::faction::Faction;
use crate::battle::grid::Grid;
use crate::battle::targeting::valid_opponents;
use crate::battle::unit::move_unit;
use crate::core::config::EngineConfig;
use crate::core::error::{GameError, Result};
use crate::core::events::EventLog;
use crate::core::types::{Coord, UnitId};

/// Outcome of picking a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PickResult {
    Deselect,
    Select,
    Move,
    Battle,
}

/// Current selection, as seen by the presentation layer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub active_unit: Option<UnitId>,
    pub active_cell: Option<Coord>,
    /// Extra cell to highlight: the defender's cell after an attack, or the
    /// destination after an AI move
    pub secondary_cell: Option<Coord>,
    pub last_pick: Option<PickResult>,
}

/// Work list for the single-step AI
#[derive(Debug, Clone, Default)]
pub(crate) struct AiCursor {
    pub(crate) next: usize,
    pub(crate) work: Vec<UnitId>,
}

/// A battle between two or more factions on one grid
#[derive(Debug, Clone)]
pub struct Battle<R = ChaCha8Rng> {
    pub(crate) grid: Grid,
    pub(crate) factions: Vec<Faction>,
    pub(crate) turn: u32,
    pub(crate) active: usize,
    pub(crate) selection: Selection,
    pub(crate) ai: Option<AiCursor>,
    pub(crate) config: EngineConfig,
    pub(crate) rng: R,
    pub(crate) log: EventLog,
}

impl Battle<ChaCha8Rng> {
    /// Start a battle with an RNG seeded from `config.seed`
    pub fn new(grid: Grid, factions: Vec<Faction>, config: EngineConfig, log: EventLog) -> Result<Self> {
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        Self::with_rng(grid, factions, config, log, rng)
    }
}

impl<R: Rng> Battle<R> {
    /// Start a battle with a caller-supplied RNG.
    ///
    /// Every faction must have all its living units placed on `grid`, and
    /// more than one faction must still be alive. No faction's turn is begun;
    /// call [`Battle::begin`] for a fresh battle.
    pub fn with_rng(
        grid: Grid,
        factions: Vec<Faction>,
        config: EngineConfig,
        mut log: EventLog,
        rng: R,
    ) -> Result<Self> {
        if let Some(bad) = factions.iter().find(|f| !f.has_valid_positions(&grid)) {
            return Err(GameError::InvalidBattle(format!(
                "{} is not fully placed on the grid",
                bad.name()
            )));
        }
        let alive = factions.iter().filter(|f| f.is_alive(&grid)).count();
        if alive <= 1 {
            return Err(GameError::InvalidBattle(format!(
                "{} living factions, need at least 2",
                alive
            )));
        }

        log.set_turn(1);
        Ok(Self {
            grid,
            factions,
            turn: 1,
            active: 0,
            selection: Selection::default(),
            ai: None,
            config,
            rng,
            log,
        })
    }

    /// Begin the active faction's turn
    pub fn begin(&mut self) {
        tracing::info!(turn = self.turn, faction = self.factions[self.active].name(), "battle started");
        self.factions[self.active].begin_turn(&mut self.grid, &mut self.log);
    }

    // === ACCESSORS ===

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn factions(&self) -> &[Faction] {
        &self.factions
    }

    pub fn active_faction(&self) -> &Faction {
        &self.factions[self.active]
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn turn(&self) -> u32 {
        self.turn
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn active_unit(&self) -> Option<UnitId> {
        self.selection.active_unit
    }

    pub fn log(&self) -> &EventLog {
        &self.log
    }

    pub fn log_mut(&mut self) -> &mut EventLog {
        &mut self.log
    }

    pub fn set_turn(&mut self, turn: u32) {
        self.turn = turn;
        self.log.set_turn(turn);
    }

    /// Select which faction is active. Out of range indices are rejected.
    pub fn set_active_index(&mut self, index: usize) -> Result<()> {
        if index >= self.factions.len() {
            return Err(GameError::InvalidBattle(format!(
                "faction index {} out of {}",
                index,
                self.factions.len()
            )));
        }
        self.active = index;
        Ok(())
    }

    /// Forfeit a faction by index. The turn does not advance.
    pub fn forfeit(&mut self, index: usize) {
        if let Some(faction) = self.factions.get(index) {
            faction.forfeit(&mut self.grid, &mut self.log);
        }
    }

    /// Active unit, if it belongs to the faction whose turn it is
    fn active_unit_on_turn(&self) -> Option<UnitId> {
        let id = self.selection.active_unit?;
        self.active_faction().contains(id).then_some(id)
    }

    // === SELECTION ===

    /// Pick the cell at `(x, y)` and update the selection
    pub fn pick_cell(&mut self, x: i32, y: i32) -> Result<PickResult> {
        let coord = self.grid.cell_at(x, y)?.coord();
        let occupant = self.grid.occupant(coord);
        self.selection.active_cell = Some(coord);

        let result = match self.active_unit_on_turn() {
            None => {
                if self.selection.active_unit == occupant {
                    self.selection.active_unit = None;
                    PickResult::Deselect
                } else {
                    self.selection.active_unit = occupant;
                    PickResult::Select
                }
            }
            Some(active) => match occupant {
                None => PickResult::Move,
                Some(other) if other == active => {
                    self.selection.active_unit = None;
                    PickResult::Deselect
                }
                Some(other) if self.grid.unit(other).faction() == self.active_faction().name() => {
                    self.selection.active_unit = Some(other);
                    PickResult::Select
                }
                Some(_) => PickResult::Battle,
            },
        };

        tracing::trace!(%coord, ?result, "cell picked");
        self.selection.last_pick = Some(result);
        Ok(result)
    }

    /// Select a unit directly
    pub fn pick_unit(&mut self, id: UnitId) {
        self.selection.active_unit = Some(id);
        self.selection.active_cell = self.grid.unit(id).cell();
        self.selection.last_pick = Some(PickResult::Select);
    }

    pub fn deselect(&mut self) {
        self.selection = Selection::default();
    }

    /// Move the active unit to the picked cell
    pub fn commit_move(&mut self) -> Result<()> {
        if self.selection.last_pick != Some(PickResult::Move) {
            return Err(GameError::SelectionMismatch("move"));
        }
        let (Some(id), Some(to)) = (self.selection.active_unit, self.selection.active_cell) else {
            return Err(GameError::SelectionMismatch("move"));
        };
        let from = self
            .grid
            .unit(id)
            .cell()
            .ok_or_else(|| GameError::NoPosition(self.grid.unit(id).name().to_string()))?;

        let dx = to.x as i32 - from.x as i32;
        let dy = to.y as i32 - from.y as i32;
        move_unit(&mut self.grid, id, dx, dy, &mut self.log)
    }

    /// Attack the unit on the picked cell with the active unit
    pub fn commit_attack(&mut self) -> Result<BattleReport> {
        if self.selection.last_pick != Some(PickResult::Battle) {
            return Err(GameError::SelectionMismatch("battle"));
        }
        let (Some(id), Some(at)) = (self.selection.active_unit, self.selection.active_cell) else {
            return Err(GameError::SelectionMismatch("battle"));
        };

        if !self.grid.unit(id).can_attack() {
            return Err(GameError::Immobile(self.grid.unit(id).name().to_string()));
        }
        let opponents = valid_opponents(&self.grid, id)?;
        let target = match self.grid.occupant(at) {
            Some(target) if opponents.contains(&target) => target,
            _ => return Err(GameError::TooFar),
        };

        self.selection.secondary_cell = Some(at);
        let report = battle(
            &mut self.grid,
            id,
            target,
            &self.config,
            &mut self.rng,
            &mut self.log,
        )?;
        self.selection.active_unit = None;
        Ok(report)
    }

    // === TURNS ===

    /// Spend the active unit's actions and clear the selection
    pub fn end_unit_turn(&mut self) {
        if let Some(id) = self.selection.active_unit {
            self.grid.unit_mut(id).exhaust();
        }
        self.deselect();
    }

    /// End the active faction's turn. Returns false once the battle is decided.
    pub fn end_faction_turn(&mut self) -> bool {
        if self.is_game_over() {
            return false;
        }
        self.factions[self.active].end_turn(&mut self.grid, &mut self.log);
        true
    }

    fn alive_factions(&self) -> usize {
        self.factions.iter().filter(|f| f.is_alive(&self.grid)).count()
    }

    /// Hand the turn to the next living faction. Wrapping past the last
    /// faction starts a new round.
    pub fn advance_turn(&mut self) -> Result<()> {
        if self.alive_factions() <= 1 {
            return Err(GameError::BattleDecided);
        }
        self.deselect();
        self.ai = None;

        let mut index = self.active;
        loop {
            index += 1;
            if index == self.factions.len() {
                index = 0;
                self.turn += 1;
            }
            if self.factions[index].is_alive(&self.grid) {
                break;
            }
        }

        self.active = index;
        self.log.set_turn(self.turn);
        tracing::debug!(turn = self.turn, faction = self.factions[index].name(), "turn advanced");
        self.factions[index].begin_turn(&mut self.grid, &mut self.log);
        Ok(())
    }

    pub fn is_game_over(&self) -> bool {
        self.alive_factions() == 1
    }

    pub fn is_faction_turn_over(&self) -> bool {
        self.active_faction().attackable_units(&self.grid).is_empty()
    }

    /// True if the selected unit is on the active faction and can still attack
    pub fn is_unit_actionable(&self) -> bool {
        self.active_unit_on_turn()
            .is_some_and(|id| self.grid.unit(id).can_attack())
    }

    /// The last faction standing, once the battle is decided
    pub fn winner(&self) -> Option<&Faction> {
        if !self.is_game_over() {
            return None;
        }
        self.factions.iter().find(|f| f.is_alive(&self.grid))
    }
}
