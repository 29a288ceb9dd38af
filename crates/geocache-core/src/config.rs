//! Store configuration.
//!
//! Configuration is an explicit value handed to the store at construction.
//! Nothing here reads the environment; `default_cache_root` only asks the
//! platform for its cache directory.

use std::path::{Path, PathBuf};

use chrono::Duration;

use crate::error::{CacheError, Result};

/// Application name used for the default cache directory
const APP_NAME: &str = "geocache";

/// Default subdirectory holding catalogue data under the cache root
pub const DEFAULT_SUBDIRECTORY: &str = "catalogue";

/// Contexts untouched for longer than this are expired
pub const DEFAULT_MAX_CONTEXT_AGE_DAYS: i64 = 14;

const CONTEXTS_DIR: &str = "contexts";
const SNAPSHOT_FILE: &str = "last_context.json";

#[derive(Debug, Clone, PartialEq)]
pub struct StoreConfig {
    pub cache_root: PathBuf,
    pub subdirectory: String,
    pub max_context_age: Duration,
}

impl StoreConfig {
    pub fn new(cache_root: impl Into<PathBuf>) -> Self {
        Self {
            cache_root: cache_root.into(),
            subdirectory: DEFAULT_SUBDIRECTORY.to_string(),
            max_context_age: Duration::days(DEFAULT_MAX_CONTEXT_AGE_DAYS),
        }
    }

    pub fn default_cache_root() -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir().ok_or(CacheError::NoCacheDir)?;
        Ok(cache_dir.join(APP_NAME))
    }

    pub fn with_subdirectory(mut self, subdirectory: impl Into<String>) -> Self {
        self.subdirectory = subdirectory.into();
        self
    }

    pub fn with_max_context_age(mut self, max_context_age: Duration) -> Self {
        self.max_context_age = max_context_age;
        self
    }

    /// `<cache_root>/<subdirectory>`
    pub fn catalogue_dir(&self) -> PathBuf {
        self.cache_root.join(&self.subdirectory)
    }

    /// Directory holding one file per geo key.
    pub fn contexts_dir(&self) -> PathBuf {
        self.catalogue_dir().join(CONTEXTS_DIR)
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.catalogue_dir().join(SNAPSHOT_FILE)
    }

    pub fn cache_root(&self) -> &Path {
        &self.cache_root
    }
}
