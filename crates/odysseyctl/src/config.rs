//! odysseyctl configuration
//!
//! Config file: ~/.config/odyssey/config.toml or /etc/odyssey/config.toml.
//! Every section and key is optional.

use anyhow::{Context, Result};
use odyssey_core::{EngineSettings, ProgressDefaults, SkillTrack, DEFAULT_STARTER_PLANET};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV: &str = "ODYSSEY_CONFIG";

/// Environment variable overriding the log filter
pub const LOG_ENV: &str = "ODYSSEY_LOG";

const DEFAULT_LOG_LEVEL: &str = "warn";

/// Where progress documents live
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        let base = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
        Self {
            data_dir: base.join("odyssey").join("progress"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    /// TOML catalog of planets, missions and achievements
    pub catalog: PathBuf,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            catalog: PathBuf::from("content/catalog.toml"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressionConfig {
    /// Planet every new user starts on
    pub starter_planet: String,
    /// Primary skill path for new users
    pub default_path: String,
    /// Reject completions with unfinished prerequisite missions
    pub enforce_prerequisites: bool,
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            starter_planet: DEFAULT_STARTER_PLANET.to_string(),
            default_path: SkillTrack::default().as_str().to_string(),
            enforce_prerequisites: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// tracing filter directive, e.g. "info" or "odyssey_core=debug"
    pub level: Option<String>,
}

/// Main odysseyctl configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OdysseyConfig {
    pub storage: StorageConfig,
    pub content: ContentConfig,
    pub progression: ProgressionConfig,
    pub logging: LoggingConfig,
}

impl OdysseyConfig {
    /// Get default user config path: ~/.config/odyssey/config.toml
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("odyssey").join("config.toml"))
    }

    /// Get system config path: /etc/odyssey/config.toml
    pub fn system_config_path() -> PathBuf {
        PathBuf::from("/etc/odyssey/config.toml")
    }

    /// Load configuration
    ///
    /// Priority:
    /// 1. `--config <path>` (must exist)
    /// 2. `$ODYSSEY_CONFIG` (must exist)
    /// 3. User config (~/.config/odyssey/config.toml)
    /// 4. System config (/etc/odyssey/config.toml)
    /// 5. Defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let from_env = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        match Self::resolve_path(
            explicit,
            from_env.as_deref(),
            Self::user_config_path().as_deref(),
            &Self::system_config_path(),
        ) {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Pick the file to read. Explicit and env paths are returned even when
    /// missing so the read fails loudly instead of falling back to defaults.
    pub fn resolve_path(
        explicit: Option<&Path>,
        from_env: Option<&Path>,
        user: Option<&Path>,
        system: &Path,
    ) -> Option<PathBuf> {
        if let Some(path) = explicit.or(from_env) {
            return Some(path.to_path_buf());
        }
        user.filter(|p| p.exists())
            .or_else(|| Some(system).filter(|p| p.exists()))
            .map(Path::to_path_buf)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: OdysseyConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(config)
    }

    /// Starting values for users that have no stored progress
    pub fn progress_defaults(&self) -> Result<ProgressDefaults> {
        let primary_path = SkillTrack::parse(&self.progression.default_path)
            .context("Invalid [progression] default_path")?;
        Ok(ProgressDefaults {
            starter_planet: self.progression.starter_planet.clone(),
            primary_path,
        })
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            enforce_prerequisites: self.progression.enforce_prerequisites,
        }
    }

    /// Log filter: `$ODYSSEY_LOG`, then `[logging] level`, then "warn"
    pub fn log_filter(&self, from_env: Option<String>) -> String {
        from_env
            .filter(|v| !v.trim().is_empty())
            .or_else(|| self.logging.level.clone())
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string())
    }
}
