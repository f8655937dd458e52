//! Progression engine.
//!
//! A mission completion moves through
//! `Requested -> Validated -> Scored -> Applied -> Reconciled -> Result`.
//! Validation happens before anything is touched; scoring, application and
//! reconciliation run on a private copy of the snapshot, and the repository
//! is written exactly once at the end. A failure at any step leaves the stored
//! document as it was.

use crate::catalog::ContentCatalog;
use crate::error::{OdysseyError, Result};
use crate::leaderboard::{self, LeaderboardEntry};
use crate::levels::{self, Level};
use crate::progress::{validate_user_id, UserProgress};
use crate::repository::ProgressRepository;
use crate::scoring::{self, ScoreInput};
use crate::skill::SkillTrack;
use crate::unlocks::UnlockEvaluator;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

/// Engine behaviour switches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Reject completions whose prerequisite missions are not done yet
    #[serde(default)]
    pub enforce_prerequisites: bool,
}

/// One mission-completion request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionAttempt {
    pub user_id: String,
    pub mission_id: String,
    pub time_taken_secs: f64,
    pub error_count: u32,
    /// False for an attempted-but-failed run
    pub completed: bool,
}

impl MissionAttempt {
    pub fn completed(user_id: &str, mission_id: &str, time_taken_secs: f64, error_count: u32) -> Self {
        Self {
            user_id: user_id.to_string(),
            mission_id: mission_id.to_string(),
            time_taken_secs,
            error_count,
            completed: true,
        }
    }

    pub fn failed(user_id: &str, mission_id: &str, time_taken_secs: f64, error_count: u32) -> Self {
        Self {
            completed: false,
            ..Self::completed(user_id, mission_id, time_taken_secs, error_count)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionResult {
    pub mission_id: String,
    pub score: u8,
    pub xp_earned: u64,
    pub total_xp: u64,
    pub previous_level: Level,
    pub new_level: Level,
    pub leveled_up: bool,
    pub newly_unlocked_planets: Vec<String>,
    pub newly_unlocked_achievements: Vec<String>,
}

/// Outcome of running an attempt against a snapshot, before persistence
#[derive(Debug, Clone)]
pub struct AppliedAttempt {
    pub progress: UserProgress,
    pub result: CompletionResult,
    /// Whether `progress` differs from the input snapshot
    pub changed: bool,
}

/// Read-only unlock check
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlockReport {
    /// Recorded or currently eligible
    pub planets: Vec<String>,
    pub achievements: Vec<String>,
    /// Eligible but not recorded yet
    pub pending_planets: Vec<String>,
    pub pending_achievements: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AchievementStatus {
    pub id: String,
    pub name: String,
    pub unlocked: bool,
    pub progress_percent: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanetStatus {
    pub id: String,
    pub name: String,
    pub unlocked: bool,
    pub progress_percent: u8,
}

/// Dashboard view of one user's progress
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressSummary {
    pub user_id: String,
    pub level: Level,
    pub title: String,
    pub total_xp: u64,
    pub progress_percent: u8,
    pub xp_to_next_level: u64,
    pub xp_by_track: BTreeMap<SkillTrack, u64>,
    pub primary_path: SkillTrack,
    pub completed_missions: usize,
    pub planets: Vec<PlanetStatus>,
    pub achievements: Vec<AchievementStatus>,
}

/// Run one attempt against a snapshot without touching storage.
///
/// The input snapshot is never modified; the updated copy is returned.
pub fn apply_attempt<C: ContentCatalog + ?Sized>(
    catalog: &C,
    settings: &EngineSettings,
    progress: &UserProgress,
    attempt: &MissionAttempt,
) -> Result<AppliedAttempt> {
    // Validated
    if progress.has_completed(&attempt.mission_id) {
        return Err(OdysseyError::AlreadyCompleted {
            user_id: progress.user_id().to_string(),
            mission_id: attempt.mission_id.clone(),
        });
    }
    let mission = catalog
        .mission(&attempt.mission_id)
        .ok_or_else(|| OdysseyError::MissionNotFound(attempt.mission_id.clone()))?;

    let evaluator = UnlockEvaluator::new(catalog);
    if settings.enforce_prerequisites {
        let missing = evaluator.missing_prerequisites(mission, progress);
        if !missing.is_empty() {
            return Err(OdysseyError::PrerequisitesNotMet {
                mission_id: mission.id.clone(),
                missing,
            });
        }
    }

    let input = ScoreInput::new(
        mission.time_limit,
        attempt.time_taken_secs,
        attempt.error_count,
        attempt.completed,
    );
    input.validate()?;

    // Scored
    let score = scoring::score(&input);
    let xp_earned = scoring::xp_earned(score, mission.xp_reward);
    debug!(
        "Scored {} for {}: score={} xp={} (limit={}s taken={}s errors={})",
        mission.id,
        progress.user_id(),
        score,
        xp_earned,
        mission.time_limit,
        attempt.time_taken_secs,
        attempt.error_count
    );

    // Applied
    let mut next = progress.clone();
    let previous_level = next.level();
    if attempt.completed {
        next.record_completion(&mission.id, mission.tech_type, xp_earned, score)?;
    }
    let new_level = next.level();

    // Reconciled: every check reads the same post-update snapshot
    let reconciliation = evaluator.reconcile(&next);
    for planet_id in &reconciliation.planets {
        next.unlock_planet(planet_id);
    }
    for achievement_id in &reconciliation.achievements {
        next.unlock_achievement(achievement_id);
    }

    let changed = attempt.completed || !reconciliation.is_empty();
    let result = CompletionResult {
        mission_id: mission.id.clone(),
        score,
        xp_earned,
        total_xp: next.xp().total(),
        previous_level,
        new_level,
        leveled_up: new_level > previous_level,
        newly_unlocked_planets: reconciliation.planets,
        newly_unlocked_achievements: reconciliation.achievements,
    };

    Ok(AppliedAttempt {
        progress: next,
        result,
        changed,
    })
}

pub struct ProgressionEngine<C, R> {
    catalog: C,
    repository: R,
    settings: EngineSettings,
}

impl<C: ContentCatalog, R: ProgressRepository> ProgressionEngine<C, R> {
    pub fn new(catalog: C, repository: R) -> Self {
        Self::with_settings(catalog, repository, EngineSettings::default())
    }

    pub fn with_settings(catalog: C, repository: R, settings: EngineSettings) -> Self {
        Self {
            catalog,
            repository,
            settings,
        }
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Score a mission attempt and commit its effects atomically
    pub fn complete_mission(&self, attempt: &MissionAttempt) -> Result<CompletionResult> {
        validate_user_id(&attempt.user_id)?;
        ScoreInput::new(0, attempt.time_taken_secs, attempt.error_count, attempt.completed)
            .validate()?;

        let progress = self.repository.load(&attempt.user_id)?;
        let applied = apply_attempt(&self.catalog, &self.settings, &progress, attempt)?;

        if applied.changed {
            self.repository.save(&applied.progress)?;
        }

        let result = applied.result;
        if attempt.completed {
            info!(
                "[MISSION] {} completed {} score={} +{} XP (total {})",
                attempt.user_id, result.mission_id, result.score, result.xp_earned, result.total_xp
            );
        } else {
            info!(
                "[MISSION] {} failed {} (no XP)",
                attempt.user_id, result.mission_id
            );
        }
        if result.leveled_up {
            info!(
                "[LEVEL] {} reached level {} ({})",
                attempt.user_id,
                result.new_level,
                result.new_level.title()
            );
        }
        for planet in &result.newly_unlocked_planets {
            info!("[UNLOCK] {} unlocked planet {}", attempt.user_id, planet);
        }
        for achievement in &result.newly_unlocked_achievements {
            info!("[UNLOCK] {} earned achievement {}", attempt.user_id, achievement);
        }

        Ok(result)
    }

    /// Re-check unlocks without writing anything
    pub fn evaluate_unlocks(&self, user_id: &str) -> Result<UnlockReport> {
        validate_user_id(user_id)?;
        let progress = self.repository.load(user_id)?;
        let pending = UnlockEvaluator::new(&self.catalog).reconcile(&progress);

        let planets: BTreeSet<String> = progress
            .unlocked_planets()
            .iter()
            .chain(pending.planets.iter())
            .cloned()
            .collect();
        let achievements: BTreeSet<String> = progress
            .unlocked_achievements()
            .iter()
            .chain(pending.achievements.iter())
            .cloned()
            .collect();

        debug!(
            "Unlock check for {}: {} pending planets, {} pending achievements",
            user_id,
            pending.planets.len(),
            pending.achievements.len()
        );

        Ok(UnlockReport {
            planets: planets.into_iter().collect(),
            achievements: achievements.into_iter().collect(),
            pending_planets: pending.planets,
            pending_achievements: pending.achievements,
        })
    }

    /// Change the user's primary skill path. No unlock side effects.
    pub fn set_primary_path(&self, user_id: &str, path: &str) -> Result<SkillTrack> {
        validate_user_id(user_id)?;
        let track = SkillTrack::parse(path)?;

        let mut progress = self.repository.load(user_id)?;
        if progress.primary_path() != track {
            progress.set_primary_path(track);
            self.repository.save(&progress)?;
            info!("[PATH] {} switched primary path to {}", user_id, track);
        }
        Ok(track)
    }

    pub fn status(&self, user_id: &str) -> Result<ProgressSummary> {
        validate_user_id(user_id)?;
        let progress = self.repository.load(user_id)?;
        let evaluator = UnlockEvaluator::new(&self.catalog);
        let total = progress.xp().total();

        let planets = self
            .catalog
            .planets()
            .iter()
            .map(|p| PlanetStatus {
                id: p.id.clone(),
                name: p.name.clone(),
                unlocked: progress.unlocked_planets().contains(&p.id),
                progress_percent: evaluator.planet_progress_percent(&p.id, &progress),
            })
            .collect();

        let achievements = self
            .catalog
            .achievements()
            .iter()
            .map(|a| AchievementStatus {
                id: a.id.clone(),
                name: a.name.clone(),
                unlocked: progress.unlocked_achievements().contains(&a.id),
                progress_percent: evaluator.achievement_progress_percent(a, &progress),
            })
            .collect();

        let level = progress.level();
        Ok(ProgressSummary {
            user_id: progress.user_id().to_string(),
            level,
            title: level.title().to_string(),
            total_xp: total,
            progress_percent: levels::progress_within_level(total),
            xp_to_next_level: levels::remaining_in_level(total),
            xp_by_track: progress.xp().tracks().collect(),
            primary_path: progress.primary_path(),
            completed_missions: progress.completed_missions().len(),
            planets,
            achievements,
        })
    }

    /// Top users by total XP, or by one track's XP
    pub fn leaderboard(&self, track: Option<SkillTrack>, limit: usize) -> Result<Vec<LeaderboardEntry>> {
        let snapshots = self.repository.snapshots()?;
        Ok(leaderboard::rank(&snapshots, track, limit))
    }
}
