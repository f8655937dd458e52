//! Per-user progress document.
//!
//! Fields are private: XP, level and the unlock sets carry invariants that
//! only the progression engine may advance. The document is plain data
//! otherwise and serializes to the JSON layout the repositories persist.

use crate::error::{OdysseyError, Result};
use crate::levels::Level;
use crate::skill::SkillTrack;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Default starter planet when none is configured
pub const DEFAULT_STARTER_PLANET: &str = "earth";

const MAX_USER_ID_LEN: usize = 128;

/// Values a freshly created progress document starts from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressDefaults {
    pub starter_planet: String,
    pub primary_path: SkillTrack,
}

impl Default for ProgressDefaults {
    fn default() -> Self {
        Self {
            starter_planet: DEFAULT_STARTER_PLANET.to_string(),
            primary_path: SkillTrack::default(),
        }
    }
}

/// XP per skill track plus the running total
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct XpLedger {
    total: u64,
    #[serde(default)]
    by_track: BTreeMap<SkillTrack, u64>,
}

impl XpLedger {
    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn track(&self, track: SkillTrack) -> u64 {
        self.by_track.get(&track).copied().unwrap_or(0)
    }

    /// XP for every track, zero-filled
    pub fn tracks(&self) -> impl Iterator<Item = (SkillTrack, u64)> + '_ {
        SkillTrack::ALL.into_iter().map(|t| (t, self.track(t)))
    }

    /// Credit XP to a track and the total together.
    ///
    /// The total is capped at `i64::MAX` so it stays a valid level-curve input.
    pub(crate) fn credit(&mut self, track: SkillTrack, amount: u64) -> Result<()> {
        let total = self
            .total
            .checked_add(amount)
            .filter(|t| i64::try_from(*t).is_ok())
            .ok_or_else(|| {
                OdysseyError::InvalidAttempt(format!(
                    "crediting {} XP to a total of {} exceeds the XP ceiling",
                    amount, self.total
                ))
            })?;
        let track_xp = self.track(track) + amount;
        self.total = total;
        self.by_track.insert(track, track_xp);
        Ok(())
    }

    fn is_consistent(&self) -> bool {
        let sum = self
            .by_track
            .values()
            .try_fold(0u64, |acc, v| acc.checked_add(*v));
        sum == Some(self.total)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProgress {
    user_id: String,
    xp: XpLedger,
    level: Level,
    completed_missions: BTreeSet<String>,
    /// Score recorded when each mission was completed
    #[serde(default)]
    mission_scores: BTreeMap<String, u8>,
    unlocked_planets: BTreeSet<String>,
    unlocked_achievements: BTreeSet<String>,
    primary_path: SkillTrack,
    /// Optimistic concurrency token, owned by the repository
    #[serde(default)]
    version: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserProgress {
    /// Fresh progress with all-zero XP and the starter planet unlocked
    pub fn new(user_id: &str, defaults: &ProgressDefaults) -> Result<Self> {
        validate_user_id(user_id)?;
        let now = Utc::now();
        let mut unlocked_planets = BTreeSet::new();
        unlocked_planets.insert(defaults.starter_planet.clone());
        Ok(Self {
            user_id: user_id.to_string(),
            xp: XpLedger::default(),
            level: Level::MIN,
            completed_missions: BTreeSet::new(),
            mission_scores: BTreeMap::new(),
            unlocked_planets,
            unlocked_achievements: BTreeSet::new(),
            primary_path: defaults.primary_path,
            version: 0,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn xp(&self) -> &XpLedger {
        &self.xp
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn completed_missions(&self) -> &BTreeSet<String> {
        &self.completed_missions
    }

    pub fn has_completed(&self, mission_id: &str) -> bool {
        self.completed_missions.contains(mission_id)
    }

    pub fn mission_score(&self, mission_id: &str) -> Option<u8> {
        self.mission_scores.get(mission_id).copied()
    }

    pub fn mission_scores(&self) -> &BTreeMap<String, u8> {
        &self.mission_scores
    }

    pub fn unlocked_planets(&self) -> &BTreeSet<String> {
        &self.unlocked_planets
    }

    pub fn unlocked_achievements(&self) -> &BTreeSet<String> {
        &self.unlocked_achievements
    }

    pub fn primary_path(&self) -> SkillTrack {
        self.primary_path
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Record a completed mission and credit its XP.
    ///
    /// Returns the level before the credit. Fails without touching the
    /// document if the mission is already recorded or XP would overflow.
    pub(crate) fn record_completion(
        &mut self,
        mission_id: &str,
        track: SkillTrack,
        xp: u64,
        score: u8,
    ) -> Result<Level> {
        if self.completed_missions.contains(mission_id) {
            return Err(OdysseyError::AlreadyCompleted {
                user_id: self.user_id.clone(),
                mission_id: mission_id.to_string(),
            });
        }
        let previous = self.level;
        self.xp.credit(track, xp)?;
        self.level = Level::from_total(self.xp.total());
        self.completed_missions.insert(mission_id.to_string());
        self.mission_scores.insert(mission_id.to_string(), score);
        self.touch();
        Ok(previous)
    }

    /// Returns true if the planet was newly unlocked
    pub(crate) fn unlock_planet(&mut self, planet_id: &str) -> bool {
        let added = self.unlocked_planets.insert(planet_id.to_string());
        if added {
            self.touch();
        }
        added
    }

    /// Returns true if the achievement was newly unlocked
    pub(crate) fn unlock_achievement(&mut self, achievement_id: &str) -> bool {
        let added = self.unlocked_achievements.insert(achievement_id.to_string());
        if added {
            self.touch();
        }
        added
    }

    pub(crate) fn set_primary_path(&mut self, path: SkillTrack) {
        if self.primary_path != path {
            self.primary_path = path;
            self.touch();
        }
    }

    pub(crate) fn set_version(&mut self, version: u64) {
        self.version = version;
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Verify invariants of a document read from storage
    pub fn check_invariants(&self) -> Result<()> {
        let corrupt = |reason: String| OdysseyError::CorruptProgress {
            user_id: self.user_id.clone(),
            reason,
        };

        validate_user_id(&self.user_id).map_err(|e| corrupt(e.to_string()))?;

        if !self.xp.is_consistent() {
            return Err(corrupt(format!(
                "xp total {} does not match the sum of its tracks",
                self.xp.total()
            )));
        }

        let expected = Level::from_total(self.xp.total());
        if self.level != expected {
            return Err(corrupt(format!(
                "level {} does not match xp total {} (expected level {})",
                self.level,
                self.xp.total(),
                expected
            )));
        }

        if let Some(stray) = self
            .mission_scores
            .keys()
            .find(|id| !self.completed_missions.contains(*id))
        {
            return Err(corrupt(format!(
                "score recorded for uncompleted mission '{}'",
                stray
            )));
        }

        if let Some((id, score)) = self.mission_scores.iter().find(|(_, s)| **s > 100) {
            return Err(corrupt(format!("score {} for '{}' exceeds 100", score, id)));
        }

        Ok(())
    }
}

/// User ids double as storage keys, so they are kept to a safe alphabet.
pub fn validate_user_id(user_id: &str) -> Result<()> {
    let well_formed = !user_id.is_empty()
        && user_id.len() <= MAX_USER_ID_LEN
        && !user_id.starts_with('.')
        && user_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '@'));

    if well_formed {
        Ok(())
    } else {
        Err(OdysseyError::InvalidUserId(user_id.to_string()))
    }
}
