//! Range highlighting for the presentation layer
//!
//! Each cell is classified by its Manhattan distance from the selected unit.
//! How the classes are drawn is up to the caller.

use serde::{Deserialize, Serialize};

use crate::battle::state::Battle;
use crate::core::types::{Coord, StatKind};

/// Highlight class for one cell. `friendly` is true when the selected unit
/// belongs to the faction whose turn it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Highlight {
    Own { friendly: bool },
    Near { friendly: bool },
    Far { friendly: bool },
    Neutral,
}

impl<R> Battle<R> {
    /// Near and far distance thresholds for the selected unit.
    ///
    /// A unit that can still move (or an enemy unit being inspected) shows
    /// movement and movement + range. Otherwise only its attack range is
    /// shown, or nothing if it has already attacked.
    pub fn highlight_thresholds(&self) -> Option<(u32, u32)> {
        let id = self.selection.active_unit?;
        let unit = self.grid.unit(id);
        let movement = self.grid.real_stat(id, StatKind::Movement) as u32;
        let range = self.grid.real_stat(id, StatKind::Range) as u32;

        let on_turn = unit.faction() == self.factions[self.active].name();
        if !on_turn || unit.can_move() {
            Some((movement, movement.saturating_add(range)))
        } else {
            let close = if unit.can_attack() { range } else { 0 };
            Some((close, close))
        }
    }

    /// Classify every cell, in row-major order
    pub fn highlights(&self) -> Vec<(Coord, Highlight)> {
        let center = self
            .selection
            .active_unit
            .and_then(|id| self.grid.unit(id).cell().map(|cell| (id, cell)));
        let (Some((id, center)), Some((near, far))) = (center, self.highlight_thresholds()) else {
            return self
                .grid
                .cells()
                .map(|cell| (cell.coord(), Highlight::Neutral))
                .collect();
        };

        let friendly = self.grid.unit(id).faction() == self.factions[self.active].name();
        self.grid
            .cells()
            .map(|cell| {
                let coord = cell.coord();
                let class = match center.distance(&coord) {
                    0 => Highlight::Own { friendly },
                    d if d <= near => Highlight::Near { friendly },
                    d if d <= far => Highlight::Far { friendly },
                    _ => Highlight::Neutral,
                };
                (coord, class)
            })
            .collect()
    }
}
