//! Skill tracks: the fixed set of categories missions and XP are tagged with.

use crate::error::{OdysseyError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SkillTrack {
    FullStack,
    Ai,
    Android,
    Cybersecurity,
    Devops,
    Algorithms,
}

impl SkillTrack {
    pub const ALL: [SkillTrack; 6] = [
        SkillTrack::FullStack,
        SkillTrack::Ai,
        SkillTrack::Android,
        SkillTrack::Cybersecurity,
        SkillTrack::Devops,
        SkillTrack::Algorithms,
    ];

    /// Canonical wire name (camelCase, as stored in progress documents)
    pub fn as_str(&self) -> &'static str {
        match self {
            SkillTrack::FullStack => "fullStack",
            SkillTrack::Ai => "ai",
            SkillTrack::Android => "android",
            SkillTrack::Cybersecurity => "cybersecurity",
            SkillTrack::Devops => "devops",
            SkillTrack::Algorithms => "algorithms",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            SkillTrack::FullStack => "Full Stack",
            SkillTrack::Ai => "AI",
            SkillTrack::Android => "Android",
            SkillTrack::Cybersecurity => "Cybersecurity",
            SkillTrack::Devops => "DevOps",
            SkillTrack::Algorithms => "Algorithms",
        }
    }

    /// Parse a user-supplied path name.
    ///
    /// Accepts camelCase, snake_case, kebab-case and any casing of those.
    pub fn parse(input: &str) -> Result<Self> {
        let normalized: String = input
            .trim()
            .chars()
            .filter(|c| *c != '-' && *c != '_' && *c != ' ')
            .flat_map(char::to_lowercase)
            .collect();

        match normalized.as_str() {
            "fullstack" => Ok(SkillTrack::FullStack),
            "ai" => Ok(SkillTrack::Ai),
            "android" => Ok(SkillTrack::Android),
            "cybersecurity" => Ok(SkillTrack::Cybersecurity),
            "devops" => Ok(SkillTrack::Devops),
            "algorithms" => Ok(SkillTrack::Algorithms),
            _ => Err(OdysseyError::InvalidPath(input.to_string())),
        }
    }
}

impl Default for SkillTrack {
    fn default() -> Self {
        SkillTrack::FullStack
    }
}

impl fmt::Display for SkillTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SkillTrack {
    type Err = OdysseyError;

    fn from_str(s: &str) -> Result<Self> {
        SkillTrack::parse(s)
    }
}
