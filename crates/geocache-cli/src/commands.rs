//! Subcommand implementations.

use std::path::Path;

use anyhow::{Context, Result};
use geocache_core::geo::applicable_levels;
use geocache_core::models::{CachedSection, LocationSummary};
use geocache_core::{CatalogueFileStore, CataloguePersisting, StoreConfig};
use serde::Deserialize;
use serde_json::json;

/// Input accepted by `geocache persist`.
#[derive(Debug, Deserialize)]
pub struct CatalogueFile {
    pub sections: Vec<CachedSection>,
    #[serde(default)]
    pub section_order: Vec<String>,
}

impl CatalogueFile {
    pub fn read(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse sections from {}", path.display()))
    }
}

pub fn open_store(config: StoreConfig) -> Result<CatalogueFileStore> {
    let dir = config.catalogue_dir();
    CatalogueFileStore::new(config)
        .with_context(|| format!("Failed to open catalogue store at {}", dir.display()))
}

pub fn keys(location: &LocationSummary) -> Result<()> {
    let keys = applicable_levels(location);
    if keys.is_empty() {
        anyhow::bail!("Location has no country code or coordinates");
    }
    for key in keys {
        println!("{:<12} {}", key.level, key.key);
    }
    Ok(())
}

pub async fn persist(store: &CatalogueFileStore, file: &Path, location: &LocationSummary) -> Result<()> {
    let input = CatalogueFile::read(file)?;
    store
        .persist(&input.sections, &input.section_order, location)
        .await
        .context("Failed to persist sections")?;
    println!(
        "Persisted {} sections for {}",
        input.sections.len(),
        location.display_name()
    );
    Ok(())
}

pub async fn restore(store: &CatalogueFileStore, location: &LocationSummary) -> Result<()> {
    let sections = store.restore(location).await?;
    if sections.is_empty() {
        eprintln!("Nothing cached for {}", location.display_name());
        return Ok(());
    }
    println!("{}", serde_json::to_string_pretty(&sections)?);
    Ok(())
}

pub async fn last(store: &CatalogueFileStore) -> Result<()> {
    match store.restore_last_context().await? {
        Some(last) => {
            let output = json!({
                "snapshot": last.snapshot,
                "sections": last.sections,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        None => eprintln!("No last context"),
    }
    Ok(())
}

pub async fn list(store: &CatalogueFileStore) -> Result<()> {
    let contexts = store.list_contexts().await?;
    if contexts.is_empty() {
        eprintln!("No cached contexts");
        return Ok(());
    }

    println!(
        "{:<48} {:<12} {:>8} {:>10} {:>12}",
        "KEY", "LEVEL", "SECTIONS", "CREATED", "LAST READ"
    );
    for context in contexts {
        println!(
            "{:<48} {:<12} {:>8} {:>10} {:>12}",
            context.geo_key,
            context.level.as_str(),
            context.section_types.len(),
            context.age_display(),
            context.last_access_display()
        );
    }
    Ok(())
}

pub async fn clear_expired(store: &CatalogueFileStore) -> Result<()> {
    let removed = store.clear_expired().await?;
    println!(
        "Removed {} contexts older than {} days",
        removed,
        store.config().max_context_age.num_days()
    );
    Ok(())
}

pub async fn remove(store: &CatalogueFileStore, key: &str) -> Result<()> {
    if store.remove_context(key).await? {
        println!("Removed {}", key);
    } else {
        eprintln!("No context stored under {}", key);
    }
    Ok(())
}

pub async fn clear(store: &CatalogueFileStore) -> Result<()> {
    let removed = store.clear_all().await?;
    println!("Removed {} contexts", removed);
    Ok(())
}
