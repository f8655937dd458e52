//! Level curve.
//!
//! Pilots start at level 1. Advancing from level `n-1` to `n` costs
//! `round(150 * 1.1^(n-1))` XP, so:
//! - Level 2: 165 XP total
//! - Level 5: ~880 XP total
//! - Level 10: ~2,600 XP total
//!
//! The cost grows geometrically and every sum saturates at `u64::MAX`, so
//! level search terminates for any non-negative XP total.

use crate::error::{OdysseyError, Result};
use serde::{Deserialize, Serialize};

/// XP cost of the first level-up
const BASE_LEVEL_COST: f64 = 150.0;
const GROWTH_FACTOR: f64 = 1.1;

/// Rank titles by level band (inclusive). The last band is open-ended.
pub const TITLE_BANDS: &[(u32, u32, &str)] = &[
    (1, 4, "Cadet"),
    (5, 9, "Pilot"),
    (10, 19, "Navigator"),
    (20, 34, "Commander"),
    (35, 49, "Captain"),
    (50, u32::MAX, "Admiral"),
];

/// XP needed to advance from `level - 1` to `level`.
pub fn xp_for_level(level: u32) -> u64 {
    if level <= 1 {
        return 0;
    }
    let cost = (BASE_LEVEL_COST * GROWTH_FACTOR.powf(f64::from(level - 1))).round();
    // `as` saturates for values beyond u64::MAX (and for infinity)
    cost as u64
}

/// Total XP needed to reach `level` from zero.
pub fn cumulative_xp(level: u32) -> u64 {
    let mut total = 0u64;
    for l in 2..=level {
        total = total.saturating_add(xp_for_level(l));
        if total == u64::MAX {
            break;
        }
    }
    total
}

/// Level reached with `total_xp`. Negative XP is rejected.
pub fn level_from_xp(total_xp: i64) -> Result<Level> {
    Ok(Level::from_total(checked_xp(total_xp)?))
}

/// Progress through the current level as a whole percentage (0-100).
pub fn progress_percent(total_xp: i64) -> Result<u8> {
    Ok(progress_within_level(checked_xp(total_xp)?))
}

/// XP still missing before the next level-up.
pub fn xp_to_next_level(total_xp: i64) -> Result<u64> {
    Ok(remaining_in_level(checked_xp(total_xp)?))
}

fn checked_xp(total_xp: i64) -> Result<u64> {
    u64::try_from(total_xp).map_err(|_| OdysseyError::InvalidXpInput(total_xp))
}

pub(crate) fn remaining_in_level(xp: u64) -> u64 {
    let level = Level::from_total(xp);
    cumulative_xp(level.value().saturating_add(1)).saturating_sub(xp)
}

pub(crate) fn progress_within_level(xp: u64) -> u8 {
    let level = Level::from_total(xp).value();
    let floor = cumulative_xp(level);
    let ceiling = cumulative_xp(level.saturating_add(1));
    let span = ceiling.saturating_sub(floor);
    if span == 0 {
        return 100;
    }
    let pct = (100.0 * xp.saturating_sub(floor) as f64 / span as f64).round();
    pct.clamp(0.0, 100.0) as u8
}

/// A pilot's level (1 and up), always derived from total XP
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Level(u32);

impl Level {
    pub const MIN: Level = Level(1);

    /// Largest level whose cumulative cost fits in `xp`
    pub fn from_total(xp: u64) -> Self {
        let mut level = 1u32;
        let mut next = xp_for_level(2);
        while next <= xp {
            level += 1;
            if next == u64::MAX {
                break;
            }
            next = next.saturating_add(xp_for_level(level + 1));
        }
        Self(level)
    }

    pub fn value(&self) -> u32 {
        self.0
    }

    pub fn title(&self) -> &'static str {
        TITLE_BANDS
            .iter()
            .find(|&&(min, max, _)| self.0 >= min && self.0 <= max)
            .map(|&(_, _, title)| title)
            .unwrap_or("Cadet")
    }

    /// XP required to reach this level from zero
    pub fn xp_required(&self) -> u64 {
        cumulative_xp(self.0)
    }
}

impl Default for Level {
    fn default() -> Self {
        Level::MIN
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
