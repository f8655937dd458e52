//! Mission scoring.
//!
//! A mission attempt starts from a base score of 100, gains a speed bonus of
//! up to 20 points (or loses 20 for running over a time limit), loses 5 per
//! error, and is clamped to 0-100. Failed attempts always score 0.

use crate::error::{OdysseyError, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_SCORE: u32 = 100;
pub const MAX_SCORE: u8 = 100;

const SPEED_BONUS_MAX: f64 = 20.0;
const OVERTIME_PENALTY: i64 = 20;
const ERROR_PENALTY: i64 = 5;

/// Inputs to a single score computation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreInput {
    pub base_score: u32,
    /// 0 means unlimited
    pub time_limit_secs: u32,
    pub time_taken_secs: f64,
    pub error_count: u32,
    pub completed: bool,
}

impl ScoreInput {
    pub fn new(time_limit_secs: u32, time_taken_secs: f64, error_count: u32, completed: bool) -> Self {
        Self {
            base_score: DEFAULT_BASE_SCORE,
            time_limit_secs,
            time_taken_secs,
            error_count,
            completed,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.time_taken_secs.is_finite() || self.time_taken_secs < 0.0 {
            return Err(OdysseyError::InvalidAttempt(format!(
                "time taken must be a non-negative number of seconds, got {}",
                self.time_taken_secs
            )));
        }
        if self.base_score > u32::from(MAX_SCORE) {
            return Err(OdysseyError::InvalidAttempt(format!(
                "base score must be at most {}, got {}",
                MAX_SCORE, self.base_score
            )));
        }
        Ok(())
    }
}

/// Score an attempt (0-100)
pub fn score(input: &ScoreInput) -> u8 {
    if !input.completed {
        return 0;
    }

    let mut raw = i64::from(input.base_score);

    if input.time_limit_secs > 0 {
        let ratio = input.time_taken_secs / f64::from(input.time_limit_secs);
        if ratio > 1.0 {
            raw -= OVERTIME_PENALTY;
        } else {
            raw += ((1.0 - ratio) * SPEED_BONUS_MAX).floor() as i64;
        }
    }

    raw = raw.saturating_sub(i64::from(input.error_count).saturating_mul(ERROR_PENALTY));
    raw.clamp(0, i64::from(MAX_SCORE)) as u8
}

/// XP granted for a score against a mission's base reward
pub fn xp_earned(score: u8, xp_reward: u64) -> u64 {
    (f64::from(score) / 100.0 * xp_reward as f64).round() as u64
}
