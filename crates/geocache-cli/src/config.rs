//! CLI configuration management.
//!
//! Persistent defaults for the store location and expiry, stored at
//! `~/.config/geocache/config.json`. Command-line flags override them.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use geocache_core::StoreConfig;
use serde::{Deserialize, Serialize};

/// Application name used for config directory paths
const APP_NAME: &str = "geocache";

/// Config file name
const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    pub cache_root: Option<PathBuf>,
    pub subdirectory: Option<String>,
    pub max_context_age_days: Option<i64>,
}

/// Per-invocation overrides taken from flags or the environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub cache_root: Option<PathBuf>,
    pub subdirectory: Option<String>,
    pub max_context_age_days: Option<i64>,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Resolve the store configuration: overrides, then saved values, then
    /// library defaults.
    pub fn store_config(&self, overrides: &Overrides) -> Result<StoreConfig> {
        let root = match overrides.cache_root.as_ref().or(self.cache_root.as_ref()) {
            Some(root) => root.clone(),
            None => StoreConfig::default_cache_root()?,
        };

        let mut config = StoreConfig::new(root);
        if let Some(subdirectory) = overrides
            .subdirectory
            .as_ref()
            .or(self.subdirectory.as_ref())
        {
            config = config.with_subdirectory(subdirectory.clone());
        }
        if let Some(days) = overrides
            .max_context_age_days
            .or(self.max_context_age_days)
        {
            anyhow::ensure!(days >= 0, "Maximum context age must not be negative");
            config = config.with_max_context_age(chrono::Duration::days(days));
        }
        Ok(config)
    }
}
