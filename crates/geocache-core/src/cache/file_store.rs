//! File-backed catalogue store.
//!
//! Layout under the configured catalogue directory:
//!
//! ```text
//! contexts/<geo-key>.json   one CachedContext per key
//! last_context.json         the CachedCatalogueSnapshot
//! ```
//!
//! Writes go to a sibling `.tmp` file and are renamed into place, and each
//! key's read-modify-write cycle holds that key's lock, so readers never see
//! a partially written file.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use futures::future::join_all;
use serde::{de::DeserializeOwned, Serialize};
use tokio::fs;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{debug, info, warn};

use super::merge::SectionAccumulator;
use super::persist::{CataloguePersisting, LastContext};
use super::split::plan_writes;
use crate::config::StoreConfig;
use crate::error::{CacheError, Result};
use crate::geo::{named_levels, StorageKey};
use crate::models::{
    CachedCatalogueSnapshot, CachedContext, CachedSection, ContextSummary, LocationSummary,
};

const CONTEXT_EXTENSION: &str = "json";
const TMP_EXTENSION: &str = "tmp";

type KeyLocks = Mutex<HashMap<String, Arc<AsyncMutex<()>>>>;

/// A held per-key lock. The map entry is dropped with the last holder.
struct KeyGuard<'a> {
    locks: &'a KeyLocks,
    key: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for KeyGuard<'_> {
    fn drop(&mut self) {
        self.guard.take();
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        if locks
            .get(&self.key)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&self.key);
        }
    }
}

pub struct CatalogueFileStore {
    config: StoreConfig,
    contexts_dir: PathBuf,
    snapshot_path: PathBuf,
    key_locks: KeyLocks,
    snapshot_lock: AsyncMutex<()>,
}

impl CatalogueFileStore {
    pub fn new(config: StoreConfig) -> Result<Self> {
        let contexts_dir = config.contexts_dir();
        std::fs::create_dir_all(&contexts_dir).map_err(|e| CacheError::io(&contexts_dir, e))?;

        Ok(Self {
            snapshot_path: config.snapshot_path(),
            contexts_dir,
            config,
            key_locks: Mutex::new(HashMap::new()),
            snapshot_lock: AsyncMutex::new(()),
        })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    fn context_path(&self, key: &str) -> PathBuf {
        self.contexts_dir
            .join(format!("{}.{}", key, CONTEXT_EXTENSION))
    }

    /// Hold `key`'s lock until the returned guard drops.
    async fn lock_key(&self, key: &str) -> KeyGuard<'_> {
        let lock = {
            let mut locks = self
                .key_locks
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            locks.entry(key.to_string()).or_default().clone()
        };

        KeyGuard {
            locks: &self.key_locks,
            key: key.to_string(),
            guard: Some(lock.lock_owned().await),
        }
    }

    // ===== Contexts =====

    /// Read the context stored under `key`, refreshing its access time.
    ///
    /// A file that fails to decode is deleted and reported as absent.
    pub async fn load_context(&self, key: &StorageKey) -> Result<Option<CachedContext>> {
        let _guard = self.lock_key(&key.key).await;

        let path = self.context_path(&key.key);
        let Some(mut context) = read_json::<CachedContext>(&path, true).await? else {
            return Ok(None);
        };

        context.touch();
        if let Err(e) = write_json(&path, &key.key, &context).await {
            warn!(key = %key.key, error = %e, "Failed to refresh context access time");
        }

        Ok(Some(context))
    }

    pub async fn save_context(&self, context: &CachedContext) -> Result<()> {
        let _guard = self.lock_key(&context.geo_key).await;

        let path = self.context_path(&context.geo_key);
        write_json(&path, &context.geo_key, context).await
    }

    /// Delete the context stored under `key`. Returns whether a file was removed.
    pub async fn remove_context(&self, key: &str) -> Result<bool> {
        if !is_safe_key(key) {
            return Ok(false);
        }
        let _guard = self.lock_key(key).await;

        remove_if_exists(&self.context_path(key)).await
    }

    /// Summaries of every readable stored context, sorted by key.
    /// Undecodable files are skipped and left in place.
    pub async fn list_contexts(&self) -> Result<Vec<ContextSummary>> {
        let mut summaries = Vec::new();
        for path in self.context_files().await? {
            if let Some(context) = read_json::<CachedContext>(&path, false).await? {
                summaries.push(context.summary());
            }
        }
        summaries.sort_by(|a, b| a.geo_key.cmp(&b.geo_key));
        Ok(summaries)
    }

    /// Delete every context and the snapshot. Returns the number of contexts removed.
    pub async fn clear_all(&self) -> Result<usize> {
        let mut removed = 0;
        for path in self.context_files().await? {
            let Some(key) = key_from_path(&path) else {
                continue;
            };
            let _guard = self.lock_key(&key).await;
            if remove_if_exists(&path).await? {
                removed += 1;
            }
        }

        let _guard = self.snapshot_lock.lock().await;
        remove_if_exists(&self.snapshot_path).await?;

        info!(removed, "Cleared catalogue cache");
        Ok(removed)
    }

    async fn context_files(&self) -> Result<Vec<PathBuf>> {
        self.files_with_extension(CONTEXT_EXTENSION).await
    }

    /// Leftovers of writes interrupted before their rename.
    async fn tmp_files(&self) -> Result<Vec<PathBuf>> {
        self.files_with_extension(TMP_EXTENSION).await
    }

    async fn files_with_extension(&self, extension: &str) -> Result<Vec<PathBuf>> {
        let mut entries = match fs::read_dir(&self.contexts_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(CacheError::io(&self.contexts_dir, e)),
        };

        let mut files = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| CacheError::io(&self.contexts_dir, e))?
        {
            let path = entry.path();
            if !path.extension().is_some_and(|ext| ext == extension) {
                continue;
            }
            let is_file = entry
                .file_type()
                .await
                .map_err(|e| CacheError::io(&path, e))?
                .is_file();
            if is_file {
                files.push(path);
            }
        }
        Ok(files)
    }

    // ===== Snapshot =====

    pub async fn load_snapshot(&self) -> Result<Option<CachedCatalogueSnapshot>> {
        let _guard = self.snapshot_lock.lock().await;
        read_json(&self.snapshot_path, true).await
    }

    async fn save_snapshot(&self, snapshot: &CachedCatalogueSnapshot) -> Result<()> {
        let _guard = self.snapshot_lock.lock().await;
        write_json(&self.snapshot_path, "snapshot", snapshot).await
    }
}

#[async_trait]
impl CataloguePersisting for CatalogueFileStore {
    async fn persist(
        &self,
        sections: &[CachedSection],
        section_order: &[String],
        location: &LocationSummary,
    ) -> Result<()> {
        let plan = plan_writes(sections, location);
        if plan.is_empty() {
            debug!(sections = sections.len(), "Nothing to persist");
            return Ok(());
        }

        let mut most_specific: Option<CachedContext> = None;
        for write in plan {
            let context =
                CachedContext::new(&write.key, write.location, write.sections, section_order.to_vec());
            self.save_context(&context).await?;
            debug!(
                key = %context.geo_key,
                level = %context.level,
                sections = context.sections.len(),
                "Persisted catalogue context"
            );

            if most_specific
                .as_ref()
                .map_or(true, |current| context.level > current.level)
            {
                most_specific = Some(context);
            }
        }

        if let Some(context) = most_specific {
            let snapshot = CachedCatalogueSnapshot::new(&context, section_order.to_vec());
            self.save_snapshot(&snapshot).await?;
        }
        Ok(())
    }

    async fn restore(&self, location: &LocationSummary) -> Result<Vec<CachedSection>> {
        let keys = named_levels(location);
        let loaded = join_all(keys.iter().map(|key| self.load_context(key))).await;

        let mut accumulator = SectionAccumulator::new();
        for (key, result) in keys.iter().zip(loaded) {
            if let Some(context) = result? {
                debug!(
                    key = %key.key,
                    level = %key.level,
                    sections = context.sections.len(),
                    "Merging cached context"
                );
                accumulator.absorb(context);
            }
        }

        Ok(accumulator.into_sections())
    }

    async fn restore_last_context(&self) -> Result<Option<LastContext>> {
        let Some(snapshot) = self.load_snapshot().await? else {
            return Ok(None);
        };

        let sections = self.restore(&snapshot.location).await?;
        if sections.is_empty() {
            debug!(key = %snapshot.geo_key, "Snapshot points at nothing cached");
            return Ok(None);
        }

        Ok(Some(LastContext { sections, snapshot }))
    }

    async fn clear_expired(&self) -> Result<usize> {
        // Negative ages expire everything
        let max_age = self.config.max_context_age.to_std().unwrap_or_default();

        let mut removed = 0;
        for path in self.context_files().await? {
            let Some(key) = key_from_path(&path) else {
                continue;
            };

            let _guard = self.lock_key(&key).await;
            let Some(age) = file_age(&path).await? else {
                continue;
            };
            if age > max_age && remove_if_exists(&path).await? {
                debug!(key = %key, age_secs = age.as_secs(), "Expired catalogue context");
                removed += 1;
            }
        }

        let mut stale_tmp = 0;
        for path in self.tmp_files().await? {
            let Some(key) = key_from_tmp_path(&path) else {
                continue;
            };

            let _guard = self.lock_key(&key).await;
            let Some(age) = file_age(&path).await? else {
                continue;
            };
            if age > max_age && remove_if_exists(&path).await? {
                stale_tmp += 1;
            }
        }

        info!(removed, stale_tmp, "Cleared expired catalogue contexts");
        Ok(removed)
    }
}

/// Time since `path` was last modified, or `None` if it is gone.
async fn file_age(path: &Path) -> Result<Option<Duration>> {
    let modified = match fs::metadata(path).await.and_then(|m| m.modified()) {
        Ok(modified) => modified,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(CacheError::io(path, e)),
    };
    Ok(Some(
        SystemTime::now()
            .duration_since(modified)
            .unwrap_or_default(),
    ))
}

/// Keys become file names; reject anything that could escape the directory.
fn is_safe_key(key: &str) -> bool {
    !key.is_empty() && !key.starts_with('.') && !key.contains(['/', '\\'])
}

fn key_from_path(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(str::to_string)
}

/// `<key>.json.tmp` -> `<key>`
fn key_from_tmp_path(path: &Path) -> Option<String> {
    key_from_path(Path::new(path.file_stem()?))
}

/// Read and decode a JSON file. Missing files are `None`; undecodable files
/// are `None` too, and are deleted when `discard_corrupt` is set.
async fn read_json<T: DeserializeOwned>(path: &Path, discard_corrupt: bool) -> Result<Option<T>> {
    let bytes = match fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(CacheError::io(path, e)),
    };

    match serde_json::from_slice(&bytes) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            if discard_corrupt {
                warn!(path = %path.display(), error = %e, "Discarding corrupt cache file");
                if let Err(e) = remove_if_exists(path).await {
                    warn!(path = %path.display(), error = %e, "Failed to delete corrupt cache file");
                }
            } else {
                debug!(path = %path.display(), error = %e, "Skipping undecodable cache file");
            }
            Ok(None)
        }
    }
}

/// Encode `value` and atomically replace `path` with it.
async fn write_json<T: Serialize>(path: &Path, what: &str, value: &T) -> Result<()> {
    let contents =
        serde_json::to_vec_pretty(value).map_err(|e| CacheError::encode(what, e))?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| CacheError::io(parent, e))?;
    }

    let tmp = path.with_extension(format!("{}.{}", CONTEXT_EXTENSION, TMP_EXTENSION));
    fs::write(&tmp, contents)
        .await
        .map_err(|e| CacheError::io(&tmp, e))?;

    if let Err(e) = fs::rename(&tmp, path).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(CacheError::io(path, e));
    }
    Ok(())
}

async fn remove_if_exists(path: &Path) -> Result<bool> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(CacheError::io(path, e)),
    }
}
