//! Combat resolution: single strikes, critical hits, and initiative-ordered
//! battles with conditional counterattacks
//!
//! Randomness enters only through the critical roll, and the RNG is always
//! passed in by the caller.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::battle::grid::Grid;
use crate::core::config::EngineConfig;
use crate::core::error::{GameError, Result};
use crate::core::events::{possessive, EventLog};
use crate::core::types::{StatKind, UnitId};

/// Result of one strike
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttackOutcome {
    /// Damage landed. `critical` is the bonus included in `damage`.
    Hit { damage: i32, critical: i32 },
    /// Defense soaked the whole strike
    Ineffective,
}

impl AttackOutcome {
    pub fn is_hit(&self) -> bool {
        matches!(self, AttackOutcome::Hit { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Strike {
    pub attacker: UnitId,
    pub defender: UnitId,
    pub outcome: AttackOutcome,
}

/// Everything that happened in one call to `battle`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleReport {
    pub initiator: UnitId,
    pub opponent: UnitId,
    /// True if the initiator won initiative
    pub initiator_first: bool,
    pub strikes: Vec<Strike>,
    pub initiator_died: bool,
    pub opponent_died: bool,
}

/// Roll the critical bonus for a unit with `luck` real luck
///
/// Chance is `luck / (luck + luck_buffer)`; on success the bonus is
/// `floor(1 / (1 - u))` for a fresh uniform `u`, capped by config.
pub fn critical_bonus<R: Rng + ?Sized>(luck: i32, config: &EngineConfig, rng: &mut R) -> i32 {
    if luck <= 0 {
        return 0;
    }
    let denominator = luck.saturating_add(config.luck_buffer.max(0));
    if rng.gen_range(0..denominator) >= luck {
        return 0;
    }

    let u: f64 = rng.gen();
    let raw = (1.0 / (1.0 - u)).floor();
    let bonus = if raw >= i32::MAX as f64 {
        i32::MAX
    } else {
        raw as i32
    };
    match config.max_critical_bonus {
        Some(cap) => bonus.min(cap),
        None => bonus,
    }
}

/// Lower a unit's hp. At zero the unit dies, loses both action flags and is
/// unlinked from its cell. Returns true if this call killed it.
pub fn reduce_hp(grid: &mut Grid, id: UnitId, amount: i32, log: &mut EventLog) -> bool {
    debug_assert!(amount > 0, "reduce_hp needs a positive amount");
    if amount <= 0 {
        return false;
    }

    let died = grid.unit_mut(id).take_damage(amount);
    if grid.unit(id).hp() == 0 {
        grid.unlink(id);
    }
    if died {
        tracing::info!(unit = grid.unit(id).name(), "unit perished");
        log.push(format!("{} has perished!", grid.unit(id).name()));
    }
    died
}

/// One strike from `attacker` at `defender`
pub fn attack<R: Rng + ?Sized>(
    grid: &mut Grid,
    attacker: UnitId,
    defender: UnitId,
    config: &EngineConfig,
    rng: &mut R,
    log: &mut EventLog,
) -> AttackOutcome {
    let luck = grid.real_stat(attacker, StatKind::Luck);
    let critical = critical_bonus(luck, config, rng);
    let damage = grid
        .real_stat(attacker, StatKind::Strength)
        .saturating_add(critical)
        .saturating_sub(grid.real_stat(defender, StatKind::Defense));

    if damage > 0 {
        log.push(format!(
            "{} dealt {} damage to {}",
            grid.unit(attacker).name(),
            damage,
            grid.unit(defender).name()
        ));
        reduce_hp(grid, defender, damage, log);
        AttackOutcome::Hit { damage, critical }
    } else {
        log.push(format!(
            "{} attack was ineffective!",
            possessive(grid.unit(attacker).name())
        ));
        AttackOutcome::Ineffective
    }
}

fn in_range_of(grid: &Grid, target: UnitId, striker: UnitId) -> bool {
    match (grid.unit(target).cell(), grid.unit(striker).cell()) {
        (Some(a), Some(b)) => a.distance(&b) <= grid.real_stat(striker, StatKind::Range) as u32,
        _ => false,
    }
}

/// Resolve a battle started by `initiator` against `opponent`
///
/// If the initiator's attacking speed is at least the opponent's speed, the
/// initiator strikes first and the opponent answers only if it survived and
/// can reach. Otherwise the opponent strikes first if it can reach, and the
/// initiator answers if still alive. The initiator is exhausted afterwards;
/// the opponent's flags are left alone.
pub fn battle<R: Rng + ?Sized>(
    grid: &mut Grid,
    initiator: UnitId,
    opponent: UnitId,
    config: &EngineConfig,
    rng: &mut R,
    log: &mut EventLog,
) -> Result<BattleReport> {
    for id in [initiator, opponent] {
        if !grid.unit(id).is_placed() {
            return Err(GameError::NoPosition(grid.unit(id).name().to_string()));
        }
    }

    let me = grid.unit(initiator).name().to_string();
    let them = grid.unit(opponent).name().to_string();
    log.push(format!("{} is battling {}", me, them));

    let initiator_first = grid.real_speed(initiator, true, config.speed_bonus)
        >= grid.real_speed(opponent, false, config.speed_bonus);
    let mut strikes = Vec::with_capacity(2);

    if initiator_first {
        log.push(format!("{} is attacking {} first!", me, them));
        let outcome = attack(grid, initiator, opponent, config, rng, log);
        strikes.push(Strike { attacker: initiator, defender: opponent, outcome });

        if grid.unit(opponent).is_alive() {
            if in_range_of(grid, initiator, opponent) {
                log.push(format!("{} is counterattacking {}", them, me));
                let outcome = attack(grid, opponent, initiator, config, rng, log);
                strikes.push(Strike { attacker: opponent, defender: initiator, outcome });
            } else {
                log.push(format!("{} is too far away for them to counterattack", them));
            }
        }
    } else {
        if in_range_of(grid, initiator, opponent) {
            log.push(format!("{} is faster than {} and is attacking first!", them, me));
            let outcome = attack(grid, opponent, initiator, config, rng, log);
            strikes.push(Strike { attacker: opponent, defender: initiator, outcome });
        }
        if grid.unit(initiator).is_alive() {
            log.push(format!("{} is counterattacking {}", me, them));
            let outcome = attack(grid, initiator, opponent, config, rng, log);
            strikes.push(Strike { attacker: initiator, defender: opponent, outcome });
        }
    }

    grid.unit_mut(initiator).exhaust();

    let report = BattleReport {
        initiator,
        opponent,
        initiator_first,
        strikes,
        initiator_died: !grid.unit(initiator).is_alive(),
        opponent_died: !grid.unit(opponent).is_alive(),
    };
    tracing::debug!(
        initiator = %me,
        opponent = %them,
        strikes = report.strikes.len(),
        hits = report.strikes.iter().filter(|s| s.outcome.is_hit()).count(),
        "battle resolved"
    );
    Ok(report)
}
