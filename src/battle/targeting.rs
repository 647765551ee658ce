//! Range queries and greedy repositioning
//!
//! All scans walk a Manhattan diamond with offsets in decreasing `x`, then
//! decreasing `y` order. The order matters: it decides which opponent the AI
//! hits first and which free cell it steps into.

use crate::battle::grid::Grid;
use crate::battle::unit::move_unit;
use crate::core::error::{GameError, Result};
use crate::core::events::EventLog;
use crate::core::types::{Coord, StatKind, UnitId};

/// Offsets `(dx, dy)` with `|dx| + |dy| <= radius`, `dx` from `radius` down
/// to `-radius`, `dy` likewise inside each column
pub fn diamond(radius: i32) -> impl Iterator<Item = (i32, i32)> {
    (-radius..=radius).rev().flat_map(move |dx| {
        (-radius..=radius)
            .rev()
            .filter(move |dy| dx.unsigned_abs() + dy.unsigned_abs() <= radius.unsigned_abs())
            .map(move |dy| (dx, dy))
    })
}

/// Clamp a scan radius to the farthest distance inside the grid
fn scan_radius(grid: &Grid, radius: i32) -> i32 {
    let span = i32::try_from(grid.width().saturating_add(grid.height())).unwrap_or(i32::MAX);
    radius.min(span)
}

fn position_of(grid: &Grid, id: UnitId) -> Result<Coord> {
    grid.unit(id)
        .cell()
        .ok_or_else(|| GameError::NoPosition(grid.unit(id).name().to_string()))
}

/// Living occupant of the cell at `origin + (dx, dy)` if it belongs to
/// another faction. Forfeited units keep their cells but are skipped.
fn enemy_at(grid: &Grid, id: UnitId, origin: Coord, dx: i32, dy: i32) -> Option<UnitId> {
    let other = grid.occupant(origin.offset(dx, dy)?)?;
    let unit = grid.unit(other);
    (unit.is_alive() && unit.faction() != grid.unit(id).faction()).then_some(other)
}

/// Every unit of another faction within this unit's real range
pub fn valid_opponents(grid: &Grid, id: UnitId) -> Result<Vec<UnitId>> {
    let origin = position_of(grid, id)?;
    let range = scan_radius(grid, grid.real_stat(id, StatKind::Range));

    Ok(diamond(range)
        .filter_map(|(dx, dy)| enemy_at(grid, id, origin, dx, dy))
        .collect())
}

/// Step toward the first enemy within `movement + range`, ending on a cell
/// from which that enemy is in range. Returns false if nothing was found or
/// the unit may not move this turn.
pub fn find_move(grid: &mut Grid, id: UnitId, log: &mut EventLog) -> Result<bool> {
    let origin = position_of(grid, id)?;
    if !grid.unit(id).can_move() {
        return Ok(false);
    }

    let reach = scan_radius(
        grid,
        grid.real_stat(id, StatKind::Movement)
            .saturating_add(grid.real_stat(id, StatKind::Range)),
    );
    let enemies: Vec<UnitId> = diamond(reach)
        .filter_map(|(dx, dy)| enemy_at(grid, id, origin, dx, dy))
        .collect();

    for enemy in enemies {
        if approach(grid, id, enemy, log)? {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Try each cell in range of `enemy` until a move succeeds
fn approach(grid: &mut Grid, id: UnitId, enemy: UnitId, log: &mut EventLog) -> Result<bool> {
    let origin = position_of(grid, id)?;
    let Some(target) = grid.unit(enemy).cell() else {
        return Ok(false);
    };
    let range = scan_radius(grid, grid.real_stat(id, StatKind::Range));

    for (dx, dy) in diamond(range) {
        let Some(dest) = target.offset(dx, dy) else {
            continue;
        };
        let mx = dest.x as i32 - origin.x as i32;
        let my = dest.y as i32 - origin.y as i32;
        match move_unit(grid, id, mx, my, log) {
            Ok(()) => return Ok(true),
            Err(e) if e.is_fatal() => return Err(e),
            Err(_) => continue,
        }
    }
    Ok(false)
}
