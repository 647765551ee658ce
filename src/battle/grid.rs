//! Rectangular battle grid: cells, per-cell stat modifiers, and the unit arena
//!
//! Units and cells refer to each other by id. A cell stores the id of its
//! occupant and the occupant stores the cell's coordinate; every link and
//! unlink goes through this module so both sides always agree.

use serde::{Deserialize, Serialize};

use crate::battle::unit::{Stats, Unit};
use crate::core::error::{GameError, Result};
use crate::core::types::{Coord, StatKind, UnitId};

/// Per-cell stat modifiers, same shape as a unit's base stats
pub type Modifiers = Stats;

/// One grid location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    coord: Coord,
    occupant: Option<UnitId>,
    pub modifiers: Modifiers,
}

impl Cell {
    pub fn new(coord: Coord) -> Self {
        Self {
            coord,
            occupant: None,
            modifiers: Modifiers::default(),
        }
    }

    pub fn coord(&self) -> Coord {
        self.coord
    }

    pub fn occupant(&self) -> Option<UnitId> {
        self.occupant
    }

    pub fn is_empty(&self) -> bool {
        self.occupant.is_none()
    }
}

/// The battle grid. Owns every cell and every unit that can stand on one.
#[derive(Debug, Clone)]
pub struct Grid {
    width: u32,
    height: u32,
    /// Cells in row-major order
    cells: Vec<Cell>,
    units: Vec<Unit>,
}

impl Grid {
    /// Create an empty grid. `height` is the number of rows.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(GameError::InvalidDimensions { width, height });
        }

        let mut cells = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                cells.push(Cell::new(Coord::new(x, y)));
            }
        }
        tracing::debug!("Created a {} by {} grid", height, width);

        Ok(Self {
            width,
            height,
            cells,
            units: Vec::new(),
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn area(&self) -> usize {
        self.cells.len()
    }

    fn index(&self, coord: Coord) -> Option<usize> {
        if coord.x < self.width && coord.y < self.height {
            Some(coord.y as usize * self.width as usize + coord.x as usize)
        } else {
            None
        }
    }

    /// Bounds check without an error
    pub fn is_valid(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as u32) < self.width && (y as u32) < self.height
    }

    /// Cell at signed coordinates
    pub fn cell_at(&self, x: i32, y: i32) -> Result<&Cell> {
        if !self.is_valid(x, y) {
            return Err(GameError::OutOfBounds { x, y });
        }
        Ok(&self.cells[y as usize * self.width as usize + x as usize])
    }

    pub fn cell(&self, coord: Coord) -> Option<&Cell> {
        self.index(coord).map(|i| &self.cells[i])
    }

    fn cell_mut(&mut self, coord: Coord) -> Option<&mut Cell> {
        self.index(coord).map(move |i| &mut self.cells[i])
    }

    pub fn occupant(&self, coord: Coord) -> Option<UnitId> {
        self.cell(coord).and_then(|c| c.occupant)
    }

    pub fn modifiers(&self, coord: Coord) -> Option<&Modifiers> {
        self.cell(coord).map(|c| &c.modifiers)
    }

    pub fn set_modifiers(&mut self, coord: Coord, modifiers: Modifiers) -> Result<()> {
        let cell = self.cell_mut(coord).ok_or(GameError::OutOfBounds {
            x: coord.x as i32,
            y: coord.y as i32,
        })?;
        cell.modifiers = modifiers;
        Ok(())
    }

    /// Row-major iteration: `y` outer, `x` inner
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    pub fn distance(&self, a: Coord, b: Coord) -> u32 {
        a.distance(&b)
    }

    // === UNIT ARENA ===

    /// Move a unit into the arena. The unit starts unplaced.
    pub fn spawn(&mut self, mut unit: Unit) -> UnitId {
        let id = UnitId::new(self.units.len() as u32);
        unit.cell = None;
        self.units.push(unit);
        id
    }

    /// Ids are only minted by `spawn`, so indexing cannot miss.
    pub fn unit(&self, id: UnitId) -> &Unit {
        &self.units[id.index()]
    }

    pub fn get_unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(id.index())
    }

    pub(crate) fn unit_mut(&mut self, id: UnitId) -> &mut Unit {
        &mut self.units[id.index()]
    }

    pub fn units(&self) -> impl Iterator<Item = (UnitId, &Unit)> {
        self.units
            .iter()
            .enumerate()
            .map(|(i, u)| (UnitId::new(i as u32), u))
    }

    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    /// First unit in the arena with this name, alive or not
    pub fn find_unit(&self, name: &str) -> Option<UnitId> {
        self.units().find(|(_, u)| u.name() == name).map(|(id, _)| id)
    }

    // === LINKS ===

    /// Link `unit` into an empty cell. Returns false if the cell is taken
    /// or off the grid.
    pub fn occupy(&mut self, coord: Coord, unit: UnitId) -> bool {
        match self.cell(coord) {
            Some(cell) if cell.is_empty() => {
                self.set_occupant(coord, unit);
                true
            }
            _ => false,
        }
    }

    /// Clear the cell and the occupant's back-reference
    pub fn vacate(&mut self, coord: Coord) {
        let Some(cell) = self.cell_mut(coord) else {
            return;
        };
        if let Some(old) = cell.occupant.take() {
            self.units[old.index()].cell = None;
        }
    }

    /// Unconditional relink used for moves. A different occupant is unlinked
    /// first, and the unit's previous cell is vacated.
    pub fn set_occupant(&mut self, coord: Coord, unit: UnitId) {
        if self.index(coord).is_none() || self.occupant(coord) == Some(unit) {
            return;
        }
        self.vacate(coord);
        if let Some(previous) = self.units[unit.index()].cell {
            self.vacate(previous);
        }
        if let Some(cell) = self.cell_mut(coord) {
            cell.occupant = Some(unit);
        }
        self.units[unit.index()].cell = Some(coord);
    }

    /// Remove a unit from whatever cell it holds
    pub fn unlink(&mut self, unit: UnitId) {
        if let Some(coord) = self.units[unit.index()].cell {
            self.vacate(coord);
        }
    }

    // === REAL STATS ===

    /// Base stat plus the current cell's modifier, floored. Unplaced units
    /// use the base value.
    pub fn real_stat(&self, id: UnitId, kind: StatKind) -> i32 {
        let unit = self.unit(id);
        let modifier = unit
            .cell
            .and_then(|c| self.modifiers(c))
            .map(|m| m.get(kind))
            .unwrap_or(0);
        unit.base().get(kind).saturating_add(modifier).max(kind.floor())
    }

    /// Real speed, with `bonus` added when evaluated as the battle initiator
    pub fn real_speed(&self, id: UnitId, attacking: bool, bonus: i32) -> i32 {
        let unit = self.unit(id);
        let modifier = unit
            .cell
            .and_then(|c| self.modifiers(c))
            .map(|m| m.speed)
            .unwrap_or(0);
        let bonus = if attacking { bonus } else { 0 };
        unit.base()
            .speed
            .saturating_add(modifier)
            .saturating_add(bonus)
            .max(StatKind::Speed.floor())
    }

    /// True when every occupied cell and placed unit point at each other
    pub fn links_consistent(&self) -> bool {
        let cells_ok = self.cells.iter().all(|cell| match cell.occupant {
            Some(id) => self
                .get_unit(id)
                .is_some_and(|u| u.cell == Some(cell.coord)),
            None => true,
        });
        let units_ok = self.units().all(|(id, unit)| match unit.cell {
            Some(coord) => self.occupant(coord) == Some(id),
            None => true,
        });
        cells_ok && units_ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::names::NameRegistry;

    fn spawn(grid: &mut Grid, names: &mut NameRegistry, name: &str) -> UnitId {
        let unit = Unit::new(names, name, 10, Stats::new(5, 3, 2, 1, 3, 1), "").unwrap();
        grid.spawn(unit)
    }

    #[test]
    fn test_grid_creation() {
        let grid = Grid::new(4, 3).unwrap();
        assert_eq!(grid.width(), 4);
        assert_eq!(grid.height(), 3);
        assert_eq!(grid.area(), 12);
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        assert!(matches!(
            Grid::new(0, 3),
            Err(GameError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn test_cell_at_bounds() {
        let grid = Grid::new(4, 3).unwrap();
        assert_eq!(grid.cell_at(3, 2).unwrap().coord(), Coord::new(3, 2));
        assert!(matches!(
            grid.cell_at(4, 0),
            Err(GameError::OutOfBounds { x: 4, y: 0 })
        ));
        assert!(grid.cell_at(-1, 0).is_err());
        assert!(grid.is_valid(0, 0));
        assert!(!grid.is_valid(0, 3));
    }

    #[test]
    fn test_row_major_iteration() {
        let grid = Grid::new(3, 2).unwrap();
        let coords: Vec<_> = grid.cells().map(|c| (c.coord().x, c.coord().y)).collect();
        assert_eq!(coords, vec![(0, 0), (1, 0), (2, 0), (0, 1), (1, 1), (2, 1)]);
        // Restartable
        assert_eq!(grid.cells().count(), 6);
    }

    #[test]
    fn test_occupy_and_vacate() {
        let mut names = NameRegistry::new();
        let mut grid = Grid::new(3, 3).unwrap();
        let a = spawn(&mut grid, &mut names, "A");
        let b = spawn(&mut grid, &mut names, "B");

        assert!(grid.occupy(Coord::new(1, 1), a));
        assert!(!grid.occupy(Coord::new(1, 1), b));
        assert_eq!(grid.unit(a).cell(), Some(Coord::new(1, 1)));
        assert_eq!(grid.unit(b).cell(), None);

        grid.vacate(Coord::new(1, 1));
        assert_eq!(grid.occupant(Coord::new(1, 1)), None);
        assert_eq!(grid.unit(a).cell(), None);
        assert!(grid.links_consistent());
    }

    #[test]
    fn test_set_occupant_displaces() {
        let mut names = NameRegistry::new();
        let mut grid = Grid::new(3, 3).unwrap();
        let a = spawn(&mut grid, &mut names, "A");
        let b = spawn(&mut grid, &mut names, "B");
        grid.occupy(Coord::new(0, 0), a);
        grid.occupy(Coord::new(2, 2), b);

        grid.set_occupant(Coord::new(2, 2), a);
        assert_eq!(grid.occupant(Coord::new(2, 2)), Some(a));
        assert_eq!(grid.occupant(Coord::new(0, 0)), None);
        assert_eq!(grid.unit(b).cell(), None);
        assert!(grid.links_consistent());
    }

    #[test]
    fn test_real_stat_floors() {
        let mut names = NameRegistry::new();
        let mut grid = Grid::new(2, 2).unwrap();
        let a = spawn(&mut grid, &mut names, "A");
        let c = Coord::new(0, 0);
        grid.set_modifiers(c, Modifiers::new(-10, -10, 4, -10, -10, -10))
            .unwrap();

        // Unplaced: base values
        assert_eq!(grid.real_stat(a, StatKind::Strength), 5);

        grid.occupy(c, a);
        assert_eq!(grid.real_stat(a, StatKind::Strength), 0);
        assert_eq!(grid.real_stat(a, StatKind::Defense), 6);
        assert_eq!(grid.real_stat(a, StatKind::Movement), 1);
        assert_eq!(grid.real_stat(a, StatKind::Range), 1);
        assert_eq!(grid.real_speed(a, true, 5), 0);
    }

    #[test]
    fn test_real_stats_saturate() {
        let mut names = NameRegistry::new();
        let mut grid = Grid::new(2, 2).unwrap();
        let unit = Unit::new(&mut names, "Titan", 10, Stats::new(i32::MAX, i32::MAX, 1, 0, 1, 1), "").unwrap();
        let a = grid.spawn(unit);
        grid.set_modifiers(Coord::new(0, 0), Modifiers::new(1, 1, 0, 0, 0, 0))
            .unwrap();
        grid.occupy(Coord::new(0, 0), a);

        assert_eq!(grid.real_stat(a, StatKind::Strength), i32::MAX);
        assert_eq!(grid.real_stat(a, StatKind::Speed), i32::MAX);
        assert_eq!(grid.real_speed(a, true, 5), i32::MAX);
    }

    #[test]
    fn test_real_speed_bonus_only_when_attacking() {
        let mut names = NameRegistry::new();
        let mut grid = Grid::new(2, 2).unwrap();
        let a = spawn(&mut grid, &mut names, "A");
        grid.occupy(Coord::new(1, 0), a);
        assert_eq!(grid.real_speed(a, true, 5), 8);
        assert_eq!(grid.real_speed(a, false, 5), 3);
    }
}
