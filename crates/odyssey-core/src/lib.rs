//! Tech Odyssey progression engine.
//!
//! Computes XP, levels, mission scores and unlocks for the Tech Odyssey
//! learning platform, and commits mission completions as one atomic update
//! against a progress repository.
//!
//! - `levels`: XP curve and rank titles
//! - `scoring`: mission attempt scores and XP rewards
//! - `unlocks`: planet, achievement and mission eligibility
//! - `engine`: the mission-completion transaction and read-side queries

pub mod catalog;
pub mod engine;
pub mod error;
pub mod leaderboard;
pub mod levels;
pub mod progress;
pub mod repository;
pub mod scoring;
pub mod skill;
pub mod unlocks;

pub use catalog::{
    AchievementCriteria, AchievementDefinition, Catalog, ContentCatalog, Difficulty,
    MissionDefinition, PlanetDefinition, UnlockRequirement,
};
pub use engine::{
    apply_attempt, AchievementStatus, AppliedAttempt, CompletionResult, EngineSettings,
    MissionAttempt, PlanetStatus, ProgressSummary, ProgressionEngine, UnlockReport,
};
pub use error::{ErrorClass, OdysseyError, Result};
pub use leaderboard::LeaderboardEntry;
pub use levels::{cumulative_xp, level_from_xp, progress_percent, xp_for_level, xp_to_next_level, Level};
pub use progress::{ProgressDefaults, UserProgress, XpLedger, DEFAULT_STARTER_PLANET};
pub use repository::{InMemoryRepository, JsonFileRepository, ProgressRepository};
pub use scoring::{score, xp_earned, ScoreInput};
pub use skill::SkillTrack;
pub use unlocks::{CriterionProgress, Reconciliation, UnlockEvaluator};
