//! Unlock evaluation for planets, achievements and missions.
//!
//! Every check is a pure predicate over one immutable [`UserProgress`]
//! snapshot. A reconcile pass reads the same snapshot for every definition, so
//! the outcome never depends on the order definitions are visited in.

use crate::catalog::{
    AchievementCriteria, AchievementDefinition, ContentCatalog, MissionDefinition,
    PlanetDefinition, UnlockRequirement,
};
use crate::progress::UserProgress;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// How far a user is towards one criterion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CriterionProgress {
    Countable { current: u64, target: u64 },
    Binary(bool),
}

impl CriterionProgress {
    pub fn is_met(&self) -> bool {
        match *self {
            CriterionProgress::Countable { current, target } => current >= target,
            CriterionProgress::Binary(met) => met,
        }
    }

    /// 0-100; binary criteria are exactly 0 or 100
    pub fn percent(&self) -> u8 {
        match *self {
            CriterionProgress::Countable { target: 0, .. } => 100,
            CriterionProgress::Countable { current, target } => {
                let pct = (100.0 * current as f64 / target as f64).round();
                pct.min(100.0) as u8
            }
            CriterionProgress::Binary(true) => 100,
            CriterionProgress::Binary(false) => 0,
        }
    }
}

/// Ids that became eligible but are not yet recorded on the snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reconciliation {
    pub planets: Vec<String>,
    pub achievements: Vec<String>,
}

impl Reconciliation {
    pub fn is_empty(&self) -> bool {
        self.planets.is_empty() && self.achievements.is_empty()
    }
}

pub struct UnlockEvaluator<'a, C: ContentCatalog + ?Sized> {
    catalog: &'a C,
}

impl<'a, C: ContentCatalog + ?Sized> UnlockEvaluator<'a, C> {
    pub fn new(catalog: &'a C) -> Self {
        Self { catalog }
    }

    pub fn is_planet_unlocked(&self, planet: &PlanetDefinition, progress: &UserProgress) -> bool {
        match &planet.unlock {
            UnlockRequirement::None => true,
            UnlockRequirement::MissionCountOnPlanet { planet_id, count } => {
                self.completed_on_planet(planet_id, progress) >= u64::from(*count)
            }
            UnlockRequirement::PlanetFullyCompleted { planet_id } => {
                self.planet_fully_completed(planet_id, progress)
            }
            UnlockRequirement::DistinctPlanetsVisited { count } => {
                self.visited_planets(progress).len() as u64 >= u64::from(*count)
            }
            UnlockRequirement::MinLevel { level } => progress.level().value() >= *level,
        }
    }

    pub fn is_achievement_unlocked(
        &self,
        achievement: &AchievementDefinition,
        progress: &UserProgress,
    ) -> bool {
        self.criterion_progress(&achievement.criteria, progress).is_met()
    }

    pub fn achievement_progress_percent(
        &self,
        achievement: &AchievementDefinition,
        progress: &UserProgress,
    ) -> u8 {
        self.criterion_progress(&achievement.criteria, progress).percent()
    }

    pub fn criterion_progress(
        &self,
        criteria: &AchievementCriteria,
        progress: &UserProgress,
    ) -> CriterionProgress {
        match criteria {
            AchievementCriteria::TotalMissionCount { count } => CriterionProgress::Countable {
                current: progress.completed_missions().len() as u64,
                target: u64::from(*count),
            },
            AchievementCriteria::MissionsOnPlanet { planet_id, count } => {
                CriterionProgress::Countable {
                    current: self.completed_on_planet(planet_id, progress),
                    target: u64::from(*count),
                }
            }
            AchievementCriteria::PlanetCompleted { planet_id } => {
                CriterionProgress::Binary(self.planet_fully_completed(planet_id, progress))
            }
            AchievementCriteria::TagCompletion { tag, count } => CriterionProgress::Countable {
                current: self
                    .completed_definitions(progress)
                    .filter(|m| m.has_tag(tag))
                    .count() as u64,
                target: u64::from(*count),
            },
            AchievementCriteria::MinScore { score, count } => CriterionProgress::Countable {
                current: progress
                    .mission_scores()
                    .values()
                    .filter(|s| **s >= *score)
                    .count() as u64,
                target: u64::from(*count),
            },
            AchievementCriteria::TotalXp { amount } => CriterionProgress::Countable {
                current: progress.xp().total(),
                target: *amount,
            },
            AchievementCriteria::CategoryXp { category, amount } => CriterionProgress::Countable {
                current: progress.xp().track(*category),
                target: *amount,
            },
            AchievementCriteria::MinLevel { level } => CriterionProgress::Countable {
                current: u64::from(progress.level().value()),
                target: u64::from(*level),
            },
        }
    }

    /// Ids of every mission prerequisite the user has not completed yet
    pub fn missing_prerequisites(
        &self,
        mission: &MissionDefinition,
        progress: &UserProgress,
    ) -> Vec<String> {
        mission
            .prerequisites
            .iter()
            .filter(|id| !progress.has_completed(id))
            .cloned()
            .collect()
    }

    /// A mission is playable once its planet is open and its prerequisites are done
    pub fn is_mission_available(&self, mission: &MissionDefinition, progress: &UserProgress) -> bool {
        let planet_open = progress.unlocked_planets().contains(&mission.planet_id)
            || self
                .catalog
                .planet(&mission.planet_id)
                .is_some_and(|p| self.is_planet_unlocked(p, progress));
        planet_open && self.missing_prerequisites(mission, progress).is_empty()
    }

    /// Share of a planet's missions already completed (0-100).
    ///
    /// A planet with no missions reports 0, matching [`Self::planet_fully_completed`].
    pub fn planet_progress_percent(&self, planet_id: &str, progress: &UserProgress) -> u8 {
        let total = self.catalog.missions_on_planet(planet_id).len() as u64;
        if total == 0 {
            return 0;
        }
        CriterionProgress::Countable {
            current: self.completed_on_planet(planet_id, progress),
            target: total,
        }
        .percent()
    }

    /// Everything eligible on this snapshot but not yet recorded on it
    pub fn reconcile(&self, progress: &UserProgress) -> Reconciliation {
        let planets = self
            .catalog
            .planets()
            .iter()
            .filter(|p| !progress.unlocked_planets().contains(&p.id))
            .filter(|p| self.is_planet_unlocked(p, progress))
            .map(|p| p.id.clone())
            .collect();

        let achievements = self
            .catalog
            .achievements()
            .iter()
            .filter(|a| !progress.unlocked_achievements().contains(&a.id))
            .filter(|a| self.is_achievement_unlocked(a, progress))
            .map(|a| a.id.clone())
            .collect();

        Reconciliation {
            planets,
            achievements,
        }
    }

    /// Planets with at least one completed mission
    pub fn visited_planets(&self, progress: &UserProgress) -> BTreeSet<&'a str> {
        let catalog = self.catalog;
        progress
            .completed_missions()
            .iter()
            .filter_map(|id| catalog.mission(id))
            .map(|m| m.planet_id.as_str())
            .collect()
    }

    fn completed_definitions<'p>(
        &self,
        progress: &'p UserProgress,
    ) -> impl Iterator<Item = &'a MissionDefinition> + 'p
    where
        'a: 'p,
    {
        let catalog = self.catalog;
        progress
            .completed_missions()
            .iter()
            .filter_map(move |id| catalog.mission(id))
    }

    fn completed_on_planet(&self, planet_id: &str, progress: &UserProgress) -> u64 {
        self.completed_definitions(progress)
            .filter(|m| m.planet_id == planet_id)
            .count() as u64
    }

    /// Every mission on the planet completed. A planet with no missions never is.
    fn planet_fully_completed(&self, planet_id: &str, progress: &UserProgress) -> bool {
        let missions = self.catalog.missions_on_planet(planet_id);
        !missions.is_empty() && missions.iter().all(|m| progress.has_completed(&m.id))
    }
}
