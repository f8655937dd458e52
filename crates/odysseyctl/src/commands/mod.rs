//! Subcommand implementations

pub mod complete;
pub mod curve;
pub mod leaderboard;
pub mod path;
pub mod status;
pub mod unlocks;

use crate::config::OdysseyConfig;
use anyhow::{bail, Context as _, Result};
use odyssey_core::{Catalog, ContentCatalog, JsonFileRepository, ProgressionEngine};
use tracing::debug;

pub type Engine = ProgressionEngine<Catalog, JsonFileRepository>;

/// Everything a subcommand needs: the engine and the output mode
pub struct Context {
    pub engine: Engine,
    pub json: bool,
}

impl Context {
    pub fn from_config(config: &OdysseyConfig, json: bool) -> Result<Self> {
        let catalog = Catalog::load(&config.content.catalog).with_context(|| {
            format!("Failed to load catalog {}", config.content.catalog.display())
        })?;

        let defaults = config.progress_defaults()?;
        if catalog.planet(&defaults.starter_planet).is_none() {
            bail!(
                "Starter planet '{}' is not in catalog {}",
                defaults.starter_planet,
                config.content.catalog.display()
            );
        }

        debug!(
            "Using data dir {} (prerequisites enforced: {})",
            config.storage.data_dir.display(),
            config.progression.enforce_prerequisites
        );
        let repository = JsonFileRepository::new(&config.storage.data_dir, defaults);
        let engine = ProgressionEngine::with_settings(catalog, repository, config.engine_settings());
        Ok(Self { engine, json })
    }

    pub fn planet_name<'a>(&'a self, id: &'a str) -> &'a str {
        self.engine
            .catalog()
            .planet(id)
            .map(|p| p.name.as_str())
            .filter(|name| !name.is_empty())
            .unwrap_or(id)
    }

    pub fn achievement_name<'a>(&'a self, id: &'a str) -> &'a str {
        self.engine
            .catalog()
            .achievement(id)
            .map(|a| a.name.as_str())
            .filter(|name| !name.is_empty())
            .unwrap_or(id)
    }
}
