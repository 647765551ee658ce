//! Factions: named rosters that take turns as one side of a battle

use serde::{Deserialize, Serialize};

use crate::battle::grid::Grid;
use crate::battle::unit::{place_unit, Stats, Unit};
use crate::core::config::EngineConfig;
use crate::core::error::{GameError, Result};
use crate::core::events::{possessive, EventLog};
use crate::core::names::NameRegistry;
use crate::core::types::UnitId;

/// A named side. Holds unit ids into the grid's arena, in roster order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Faction {
    name: String,
    units: Vec<UnitId>,
}

impl Faction {
    pub fn new(names: &mut NameRegistry, name: &str) -> Result<Self> {
        names.claim_faction(name)?;
        Ok(Self {
            name: name.to_string(),
            units: Vec::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Roster in insertion order, dead units included
    pub fn units(&self) -> &[UnitId] {
        &self.units
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn contains(&self, id: UnitId) -> bool {
        self.units.contains(&id)
    }

    /// Enlist a unit: retags it with this faction and appends it
    pub fn add_unit(&mut self, grid: &mut Grid, id: UnitId, log: &mut EventLog) {
        grid.unit_mut(id).set_faction(&self.name);
        self.units.push(id);
        log.push(format!("{} was added to {}", grid.unit(id).name(), self.name));
    }

    /// First living unit with this name. Dead units can't be addressed.
    pub fn find_by_name(&self, grid: &Grid, name: &str) -> Option<UnitId> {
        self.units
            .iter()
            .copied()
            .find(|&id| grid.unit(id).name() == name && grid.unit(id).is_alive())
    }

    pub fn movable_units(&self, grid: &Grid) -> Vec<UnitId> {
        self.units
            .iter()
            .copied()
            .filter(|&id| grid.unit(id).can_move())
            .collect()
    }

    pub fn attackable_units(&self, grid: &Grid) -> Vec<UnitId> {
        self.units
            .iter()
            .copied()
            .filter(|&id| grid.unit(id).can_attack())
            .collect()
    }

    pub fn is_alive(&self, grid: &Grid) -> bool {
        self.units.iter().any(|&id| grid.unit(id).is_alive())
    }

    /// Ready every living unit
    pub fn begin_turn(&self, grid: &mut Grid, log: &mut EventLog) {
        for &id in &self.units {
            let unit = grid.unit_mut(id);
            if unit.is_alive() {
                unit.set_can_move(true);
                unit.set_can_attack(true);
            }
        }
        tracing::info!(faction = %self.name, "turn started");
        log.push(format!("It is {} turn", possessive(&self.name)));
    }

    pub fn end_turn(&self, grid: &mut Grid, log: &mut EventLog) {
        for &id in &self.units {
            grid.unit_mut(id).exhaust();
        }
        log.push(format!("{} ended their turn.", self.name));
    }

    /// Concede. Units are marked dead but keep their cells and flags.
    pub fn forfeit(&self, grid: &mut Grid, log: &mut EventLog) {
        for &id in &self.units {
            grid.unit_mut(id).set_alive(false);
        }
        tracing::info!(faction = %self.name, "faction forfeit");
        log.push(format!("{} has forfeit the game", self.name));
    }

    /// Fill an empty roster up to the opponent's size. Units from
    /// `available` are taken first, in order; the rest are generated as
    /// "Enemy N" from the opponent's roster with slightly shifted stats.
    pub fn mirror_roster(
        &mut self,
        opponent: &Faction,
        available: &[UnitId],
        grid: &mut Grid,
        names: &mut NameRegistry,
        log: &mut EventLog,
    ) -> Result<()> {
        if !self.units.is_empty() {
            return Err(GameError::InvalidBattle(format!(
                "{} already has units and cannot mirror {}",
                self.name, opponent.name
            )));
        }
        let target = opponent.len();

        for &id in available.iter().take(target) {
            self.add_unit(grid, id, log);
        }

        let mut source = 0;
        let mut number = 1;
        while self.units.len() < target {
            let name = format!("Enemy {}", number);
            number += 1;

            let template = grid.unit(opponent.units[source]);
            let base = template.base();
            let stats = Stats::new(
                base.strength.saturating_add(1),
                base.speed.saturating_sub(1).max(0),
                base.defense.saturating_sub(1).max(0),
                base.luck.saturating_sub(1).max(0),
                base.movement.saturating_sub(1).max(1),
                base.range.saturating_sub(1).max(1),
            );
            let hp = template.hp().saturating_add(2);
            let image = template.image().to_string();

            match Unit::new(names, &name, hp, stats, &image) {
                Ok(unit) => {
                    let id = grid.spawn(unit);
                    self.add_unit(grid, id, log);
                    source += 1;
                }
                Err(GameError::DuplicateName(_)) => continue,
                Err(e) => return Err(e),
            }
        }
        tracing::debug!(faction = %self.name, size = target, "roster mirrored");
        Ok(())
    }

    /// Place every unplaced living unit with a striped scan.
    ///
    /// Pass `offset` visits row `y` at columns `(offset + y) % stripe`,
    /// stepping by `stripe`, so the passes together cover every cell once.
    /// Units already on the grid stay where they are.
    pub fn auto_place(&self, grid: &mut Grid, config: &EngineConfig, log: &mut EventLog) -> Result<()> {
        let pending: Vec<UnitId> = self
            .units
            .iter()
            .copied()
            .filter(|&id| grid.unit(id).is_alive() && !grid.unit(id).is_placed())
            .collect();
        if pending.is_empty() {
            return Ok(());
        }

        let stripe = config.placement_stripe.max(1);
        let mut next = 0;
        for offset in 0..stripe {
            for y in 0..grid.height() {
                let mut x = (offset + y) % stripe;
                while x < grid.width() {
                    if place_unit(grid, pending[next], x as i32, y as i32, log).is_ok() {
                        next += 1;
                        if next == pending.len() {
                            tracing::debug!(faction = %self.name, placed = next, "auto-placed");
                            return Ok(());
                        }
                    }
                    x += stripe;
                }
            }
        }

        tracing::warn!(faction = %self.name, placed = next, wanted = pending.len(), "grid is full");
        Err(GameError::NoPositionAvailable(self.name.clone()))
    }

    /// True when the roster is non-empty and every living unit sits on a
    /// cell that points back at it
    pub fn has_valid_positions(&self, grid: &Grid) -> bool {
        if self.units.is_empty() {
            return false;
        }
        self.units.iter().all(|&id| {
            let unit = grid.unit(id);
            if !unit.is_alive() {
                return true;
            }
            match unit.cell() {
                Some(coord) => grid.occupant(coord) == Some(id),
                None => false,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Coord;

    struct Fixture {
        grid: Grid,
        names: NameRegistry,
        log: EventLog,
    }

    impl Fixture {
        fn new(width: u32, height: u32) -> Self {
            Self {
                grid: Grid::new(width, height).unwrap(),
                names: NameRegistry::new(),
                log: EventLog::new(),
            }
        }

        fn faction(&mut self, name: &str) -> Faction {
            Faction::new(&mut self.names, name).unwrap()
        }

        fn recruit(&mut self, faction: &mut Faction, name: &str, stats: Stats) -> UnitId {
            let unit = Unit::new(&mut self.names, name, 10, stats, "./data/Sword.png").unwrap();
            let id = self.grid.spawn(unit);
            faction.add_unit(&mut self.grid, id, &mut self.log);
            id
        }
    }

    fn plain() -> Stats {
        Stats::new(5, 3, 2, 1, 3, 1)
    }

    #[test]
    fn test_duplicate_faction_name() {
        let mut f = Fixture::new(3, 3);
        f.faction("Red");
        assert!(matches!(
            Faction::new(&mut f.names, "Red"),
            Err(GameError::DuplicateName(_))
        ));
        // Unit and faction namespaces are separate
        assert!(Unit::new(&mut f.names, "Red", 5, plain(), "").is_ok());
    }

    #[test]
    fn test_add_unit_retags_and_logs() {
        let mut f = Fixture::new(3, 3);
        let mut red = f.faction("Red");
        let id = f.recruit(&mut red, "Lucia", plain());
        assert_eq!(f.grid.unit(id).faction(), "Red");
        assert_eq!(red.units(), &[id]);
        assert_eq!(f.log.last().unwrap().description, "Lucia was added to Red");
    }

    #[test]
    fn test_find_by_name_skips_dead() {
        let mut f = Fixture::new(3, 3);
        let mut red = f.faction("Red");
        let id = f.recruit(&mut red, "Lucia", plain());
        assert_eq!(red.find_by_name(&f.grid, "Lucia"), Some(id));
        assert_eq!(red.find_by_name(&f.grid, "Nobody"), None);
        f.grid.unit_mut(id).set_alive(false);
        assert_eq!(red.find_by_name(&f.grid, "Lucia"), None);
    }

    #[test]
    fn test_turn_flags() {
        let mut f = Fixture::new(3, 3);
        let mut red = f.faction("Red");
        let a = f.recruit(&mut red, "A", plain());
        let b = f.recruit(&mut red, "B", plain());
        f.grid.unit_mut(b).set_alive(false);

        red.begin_turn(&mut f.grid, &mut f.log);
        assert_eq!(red.movable_units(&f.grid), vec![a]);
        assert_eq!(red.attackable_units(&f.grid), vec![a]);
        assert_eq!(f.log.last().unwrap().description, "It is Red's turn");

        red.end_turn(&mut f.grid, &mut f.log);
        assert!(red.movable_units(&f.grid).is_empty());
        assert!(red.attackable_units(&f.grid).is_empty());
        assert_eq!(f.log.last().unwrap().description, "Red ended their turn.");
    }

    #[test]
    fn test_possessive_for_plural_names() {
        let mut f = Fixture::new(3, 3);
        let mut knights = f.faction("Knights");
        f.recruit(&mut knights, "A", plain());
        knights.begin_turn(&mut f.grid, &mut f.log);
        assert_eq!(f.log.last().unwrap().description, "It is Knights' turn");
    }

    #[test]
    fn test_forfeit_kills_without_unlinking() {
        let mut f = Fixture::new(3, 3);
        let mut red = f.faction("Red");
        let a = f.recruit(&mut red, "A", plain());
        place_unit(&mut f.grid, a, 1, 1, &mut f.log).unwrap();
        assert!(red.is_alive(&f.grid));

        red.forfeit(&mut f.grid, &mut f.log);
        assert!(!red.is_alive(&f.grid));
        assert_eq!(f.grid.unit(a).cell(), Some(Coord::new(1, 1)));
        assert_eq!(f.log.last().unwrap().description, "Red has forfeit the game");
    }

    #[test]
    fn test_mirror_takes_available_first() {
        let mut f = Fixture::new(5, 5);
        let mut player = f.faction("Player");
        for name in ["A", "B", "C"] {
            f.recruit(&mut player, name, plain());
        }
        let spare = f
            .grid
            .spawn(Unit::new(&mut f.names, "Spare", 7, plain(), "").unwrap());

        let mut enemy = f.faction("Enemy");
        enemy
            .mirror_roster(&player, &[spare], &mut f.grid, &mut f.names, &mut f.log)
            .unwrap();

        assert_eq!(enemy.len(), 3);
        assert_eq!(enemy.units()[0], spare);
        assert_eq!(f.grid.unit(spare).faction(), "Enemy");

        let first = f.grid.unit(enemy.units()[1]);
        assert_eq!(first.name(), "Enemy 1");
        assert_eq!(first.hp(), 12);
        assert_eq!(first.base(), &Stats::new(6, 2, 1, 0, 2, 1));
        assert_eq!(first.image(), "./data/Sword.png");
        assert_eq!(f.grid.unit(enemy.units()[2]).name(), "Enemy 2");
    }

    #[test]
    fn test_mirror_skips_taken_names() {
        let mut f = Fixture::new(5, 5);
        let mut player = f.faction("Player");
        let first = f.recruit(&mut player, "Enemy 1", Stats::new(3, 0, 0, 0, 1, 1));
        f.recruit(&mut player, "B", plain());

        let mut enemy = f.faction("Enemy");
        enemy
            .mirror_roster(&player, &[], &mut f.grid, &mut f.names, &mut f.log)
            .unwrap();

        let made: Vec<_> = enemy.units().iter().map(|&id| f.grid.unit(id).clone()).collect();
        assert_eq!(made[0].name(), "Enemy 2");
        assert_eq!(made[1].name(), "Enemy 3");
        // Skipping a name does not skip a template; floors hold
        assert_eq!(made[0].base(), &Stats::new(4, 0, 0, 0, 1, 1));
        assert_eq!(made[0].hp(), f.grid.unit(first).hp() + 2);
    }

    #[test]
    fn test_mirror_requires_empty_roster() {
        let mut f = Fixture::new(5, 5);
        let mut player = f.faction("Player");
        f.recruit(&mut player, "A", plain());
        let mut enemy = f.faction("Enemy");
        f.recruit(&mut enemy, "B", plain());
        let err = enemy
            .mirror_roster(&player, &[], &mut f.grid, &mut f.names, &mut f.log)
            .unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_auto_place_striped() {
        let mut f = Fixture::new(6, 3);
        let mut red = f.faction("Red");
        let ids: Vec<_> = (0..4)
            .map(|i| f.recruit(&mut red, &format!("U{}", i), plain()))
            .collect();

        red.auto_place(&mut f.grid, &EngineConfig::default(), &mut f.log)
            .unwrap();
        let cells: Vec<_> = ids.iter().map(|&id| f.grid.unit(id).cell().unwrap()).collect();
        assert_eq!(
            cells,
            vec![
                Coord::new(0, 0),
                Coord::new(3, 0),
                Coord::new(1, 1),
                Coord::new(4, 1),
            ]
        );
        assert!(red.has_valid_positions(&f.grid));
        assert!(f.grid.links_consistent());
    }

    #[test]
    fn test_auto_place_keeps_placed_units() {
        let mut f = Fixture::new(6, 3);
        let mut red = f.faction("Red");
        let a = f.recruit(&mut red, "A", plain());
        let b = f.recruit(&mut red, "B", plain());
        place_unit(&mut f.grid, a, 5, 2, &mut f.log).unwrap();

        red.auto_place(&mut f.grid, &EngineConfig::default(), &mut f.log)
            .unwrap();
        assert_eq!(f.grid.unit(a).cell(), Some(Coord::new(5, 2)));
        assert_eq!(f.grid.unit(b).cell(), Some(Coord::new(0, 0)));
    }

    #[test]
    fn test_auto_place_exhaustion_on_full_grid() {
        let mut f = Fixture::new(2, 2);
        let mut blue = f.faction("Blue");
        let blockers: Vec<_> = (0..3)
            .map(|i| f.recruit(&mut blue, &format!("B{}", i), plain()))
            .collect();
        let mut red = f.faction("Red");
        let placed = f.recruit(&mut red, "R0", plain());
        f.recruit(&mut red, "R1", plain());
        f.recruit(&mut red, "R2", plain());

        place_unit(&mut f.grid, placed, 0, 0, &mut f.log).unwrap();
        for (id, (x, y)) in blockers.iter().zip([(1, 0), (0, 1), (1, 1)]) {
            place_unit(&mut f.grid, *id, x, y, &mut f.log).unwrap();
        }

        let err = red
            .auto_place(&mut f.grid, &EngineConfig::default(), &mut f.log)
            .unwrap_err();
        assert!(matches!(err, GameError::NoPositionAvailable(_)));
        assert_eq!(f.grid.unit(placed).cell(), Some(Coord::new(0, 0)));
        assert_eq!(f.grid.occupant(Coord::new(0, 0)), Some(placed));
        assert!(f.grid.links_consistent());
        assert!(!red.has_valid_positions(&f.grid));
    }

    #[test]
    fn test_has_valid_positions() {
        let mut f = Fixture::new(3, 3);
        let mut red = f.faction("Red");
        assert!(!red.has_valid_positions(&f.grid));

        let a = f.recruit(&mut red, "A", plain());
        let b = f.recruit(&mut red, "B", plain());
        place_unit(&mut f.grid, a, 0, 0, &mut f.log).unwrap();
        assert!(!red.has_valid_positions(&f.grid));

        // Dead units don't need a cell
        f.grid.unit_mut(b).set_alive(false);
        assert!(red.has_valid_positions(&f.grid));
    }
}
