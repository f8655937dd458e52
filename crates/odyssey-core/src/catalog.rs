//! Content catalog: missions, planets and achievements.
//!
//! Definitions are immutable reference data supplied by the content team.
//! The engine only ever reads them through [`ContentCatalog`], so tests can
//! hand it small fake catalogs.

use crate::error::{OdysseyError, Result};
use crate::skill::SkillTrack;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionDefinition {
    pub id: String,
    #[serde(default)]
    pub title: String,
    pub planet_id: String,
    pub tech_type: SkillTrack,
    #[serde(default)]
    pub difficulty: Difficulty,
    /// Base reward before scoring
    pub xp_reward: u64,
    /// Seconds; 0 means unlimited
    #[serde(default)]
    pub time_limit: u32,
    /// Mission ids that must be completed first
    #[serde(default)]
    pub prerequisites: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl MissionDefinition {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// What it takes to open a planet
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UnlockRequirement {
    /// Open from the start
    #[default]
    None,
    MissionCountOnPlanet { planet_id: String, count: u32 },
    PlanetFullyCompleted { planet_id: String },
    DistinctPlanetsVisited { count: u32 },
    MinLevel { level: u32 },
}

impl UnlockRequirement {
    fn referenced_planet(&self) -> Option<&str> {
        match self {
            UnlockRequirement::MissionCountOnPlanet { planet_id, .. }
            | UnlockRequirement::PlanetFullyCompleted { planet_id } => Some(planet_id),
            UnlockRequirement::None
            | UnlockRequirement::DistinctPlanetsVisited { .. }
            | UnlockRequirement::MinLevel { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanetDefinition {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Position on the star map
    #[serde(default)]
    pub order: u32,
    #[serde(default)]
    pub unlock: UnlockRequirement,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AchievementCriteria {
    TotalMissionCount { count: u32 },
    MissionsOnPlanet { planet_id: String, count: u32 },
    PlanetCompleted { planet_id: String },
    TagCompletion { tag: String, count: u32 },
    /// `count` completed missions scored at least `score`
    MinScore { score: u8, count: u32 },
    TotalXp { amount: u64 },
    CategoryXp { category: SkillTrack, amount: u64 },
    MinLevel { level: u32 },
}

impl AchievementCriteria {
    fn referenced_planet(&self) -> Option<&str> {
        match self {
            AchievementCriteria::MissionsOnPlanet { planet_id, .. }
            | AchievementCriteria::PlanetCompleted { planet_id } => Some(planet_id),
            AchievementCriteria::TotalMissionCount { .. }
            | AchievementCriteria::TagCompletion { .. }
            | AchievementCriteria::MinScore { .. }
            | AchievementCriteria::TotalXp { .. }
            | AchievementCriteria::CategoryXp { .. }
            | AchievementCriteria::MinLevel { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AchievementDefinition {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub criteria: AchievementCriteria,
}

/// Read-only access to content definitions.
///
/// Only the three slice accessors are required; lookups default to linear
/// scans and may be overridden with indexed versions.
pub trait ContentCatalog {
    fn missions(&self) -> &[MissionDefinition];
    fn planets(&self) -> &[PlanetDefinition];
    fn achievements(&self) -> &[AchievementDefinition];

    fn mission(&self, id: &str) -> Option<&MissionDefinition> {
        self.missions().iter().find(|m| m.id == id)
    }

    fn planet(&self, id: &str) -> Option<&PlanetDefinition> {
        self.planets().iter().find(|p| p.id == id)
    }

    fn achievement(&self, id: &str) -> Option<&AchievementDefinition> {
        self.achievements().iter().find(|a| a.id == id)
    }

    fn missions_on_planet(&self, planet_id: &str) -> Vec<&MissionDefinition> {
        self.missions()
            .iter()
            .filter(|m| m.planet_id == planet_id)
            .collect()
    }

    fn missions_with_tag(&self, tag: &str) -> Vec<&MissionDefinition> {
        self.missions().iter().filter(|m| m.has_tag(tag)).collect()
    }
}

impl<C: ContentCatalog + ?Sized> ContentCatalog for &C {
    fn missions(&self) -> &[MissionDefinition] {
        (**self).missions()
    }
    fn planets(&self) -> &[PlanetDefinition] {
        (**self).planets()
    }
    fn achievements(&self) -> &[AchievementDefinition] {
        (**self).achievements()
    }
    fn mission(&self, id: &str) -> Option<&MissionDefinition> {
        (**self).mission(id)
    }
    fn planet(&self, id: &str) -> Option<&PlanetDefinition> {
        (**self).planet(id)
    }
    fn achievement(&self, id: &str) -> Option<&AchievementDefinition> {
        (**self).achievement(id)
    }
}

impl<C: ContentCatalog + ?Sized> ContentCatalog for Arc<C> {
    fn missions(&self) -> &[MissionDefinition] {
        (**self).missions()
    }
    fn planets(&self) -> &[PlanetDefinition] {
        (**self).planets()
    }
    fn achievements(&self) -> &[AchievementDefinition] {
        (**self).achievements()
    }
    fn mission(&self, id: &str) -> Option<&MissionDefinition> {
        (**self).mission(id)
    }
    fn planet(&self, id: &str) -> Option<&PlanetDefinition> {
        (**self).planet(id)
    }
    fn achievement(&self, id: &str) -> Option<&AchievementDefinition> {
        (**self).achievement(id)
    }
}

/// On-disk layout of a catalog file
#[derive(Debug, Default, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    planets: Vec<PlanetDefinition>,
    #[serde(default)]
    missions: Vec<MissionDefinition>,
    #[serde(default)]
    achievements: Vec<AchievementDefinition>,
}

/// Immutable, validated catalog with id indexes
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    missions: Vec<MissionDefinition>,
    planets: Vec<PlanetDefinition>,
    achievements: Vec<AchievementDefinition>,
    mission_index: HashMap<String, usize>,
    planet_index: HashMap<String, usize>,
    achievement_index: HashMap<String, usize>,
}

impl Catalog {
    /// Build a catalog, rejecting duplicate ids and dangling references.
    pub fn new(
        planets: Vec<PlanetDefinition>,
        missions: Vec<MissionDefinition>,
        achievements: Vec<AchievementDefinition>,
    ) -> Result<Self> {
        let planet_index = index_by_id("planet", planets.iter().map(|p| p.id.as_str()))?;
        let mission_index = index_by_id("mission", missions.iter().map(|m| m.id.as_str()))?;
        let achievement_index =
            index_by_id("achievement", achievements.iter().map(|a| a.id.as_str()))?;

        for mission in &missions {
            if !planet_index.contains_key(&mission.planet_id) {
                return Err(OdysseyError::InvalidCatalog(format!(
                    "mission '{}' references unknown planet '{}'",
                    mission.id, mission.planet_id
                )));
            }
            if let Some(missing) = mission
                .prerequisites
                .iter()
                .find(|p| !mission_index.contains_key(p.as_str()))
            {
                return Err(OdysseyError::InvalidCatalog(format!(
                    "mission '{}' requires unknown mission '{}'",
                    mission.id, missing
                )));
            }
        }

        if let Some(cycle) = find_prerequisite_cycle(&missions, &mission_index) {
            return Err(OdysseyError::InvalidCatalog(format!(
                "prerequisite cycle: {}",
                cycle.join(" -> ")
            )));
        }

        for planet in &planets {
            if let Some(target) = planet.unlock.referenced_planet() {
                if !planet_index.contains_key(target) {
                    return Err(OdysseyError::InvalidCatalog(format!(
                        "planet '{}' unlock references unknown planet '{}'",
                        planet.id, target
                    )));
                }
            }
        }

        for achievement in &achievements {
            if let Some(target) = achievement.criteria.referenced_planet() {
                if !planet_index.contains_key(target) {
                    return Err(OdysseyError::InvalidCatalog(format!(
                        "achievement '{}' references unknown planet '{}'",
                        achievement.id, target
                    )));
                }
            }
        }

        Ok(Self {
            missions,
            planets,
            achievements,
            mission_index,
            planet_index,
            achievement_index,
        })
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let file: CatalogFile =
            toml::from_str(contents).map_err(|e| OdysseyError::InvalidCatalog(e.to_string()))?;
        Self::new(file.planets, file.missions, file.achievements)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            OdysseyError::InvalidCatalog(format!("cannot read {}: {}", path.display(), e))
        })?;
        let catalog = Self::from_toml_str(&contents)?;
        tracing::debug!(
            "Loaded catalog from {}: {} planets, {} missions, {} achievements",
            path.display(),
            catalog.planets.len(),
            catalog.missions.len(),
            catalog.achievements.len()
        );
        Ok(catalog)
    }
}

fn index_by_id<'a>(
    kind: &str,
    ids: impl Iterator<Item = &'a str>,
) -> Result<HashMap<String, usize>> {
    let mut index = HashMap::new();
    let mut seen = HashSet::new();
    for (position, id) in ids.enumerate() {
        if id.trim().is_empty() {
            return Err(OdysseyError::InvalidCatalog(format!(
                "{} at position {} has an empty id",
                kind, position
            )));
        }
        if !seen.insert(id) {
            return Err(OdysseyError::InvalidCatalog(format!(
                "duplicate {} id '{}'",
                kind, id
            )));
        }
        index.insert(id.to_string(), position);
    }
    Ok(index)
}

#[derive(Clone, Copy, PartialEq)]
enum Visit {
    Unseen,
    InProgress,
    Done,
}

/// First prerequisite cycle found, as mission ids with the start repeated at
/// the end. Iterative depth-first search; all references are already known
/// to resolve through `index`.
fn find_prerequisite_cycle(
    missions: &[MissionDefinition],
    index: &HashMap<String, usize>,
) -> Option<Vec<String>> {
    let mut state = vec![Visit::Unseen; missions.len()];

    for root in 0..missions.len() {
        if state[root] != Visit::Unseen {
            continue;
        }
        // (mission, next prerequisite to look at)
        let mut stack = vec![(root, 0usize)];
        state[root] = Visit::InProgress;

        while let Some(top) = stack.last_mut() {
            let (current, next) = *top;
            top.1 += 1;
            let Some(prereq) = missions[current].prerequisites.get(next) else {
                state[current] = Visit::Done;
                stack.pop();
                continue;
            };

            let Some(&target) = index.get(prereq.as_str()) else {
                continue;
            };
            match state[target] {
                Visit::Done => {}
                Visit::Unseen => {
                    state[target] = Visit::InProgress;
                    stack.push((target, 0));
                }
                Visit::InProgress => {
                    let start = stack.iter().position(|&(m, _)| m == target).unwrap_or(0);
                    let mut cycle: Vec<String> = stack[start..]
                        .iter()
                        .map(|&(m, _)| missions[m].id.clone())
                        .collect();
                    cycle.push(missions[target].id.clone());
                    return Some(cycle);
                }
            }
        }
    }
    None
}

impl ContentCatalog for Catalog {
    fn missions(&self) -> &[MissionDefinition] {
        &self.missions
    }

    fn planets(&self) -> &[PlanetDefinition] {
        &self.planets
    }

    fn achievements(&self) -> &[AchievementDefinition] {
        &self.achievements
    }

    fn mission(&self, id: &str) -> Option<&MissionDefinition> {
        self.mission_index.get(id).map(|&i| &self.missions[i])
    }

    fn planet(&self, id: &str) -> Option<&PlanetDefinition> {
        self.planet_index.get(id).map(|&i| &self.planets[i])
    }

    fn achievement(&self, id: &str) -> Option<&AchievementDefinition> {
        self.achievement_index.get(id).map(|&i| &self.achievements[i])
    }
}
