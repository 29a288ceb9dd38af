//! Persisted cache records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::location::LocationSummary;
use super::section::CachedSection;
use crate::geo::{GeoLevel, StorageKey};
use crate::utils::age_display;

/// The unit of persistence: every section stored under one geo key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct CachedContext {
    pub geo_key: String,
    pub level: GeoLevel,
    pub location: LocationSummary,
    pub sections: Vec<CachedSection>,
    #[serde(default)]
    pub section_order: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub last_accessed_at: DateTime<Utc>,
}

impl CachedContext {
    /// Build a context, coalescing sections that share a type so each type
    /// appears once. Later duplicates merge over earlier ones.
    pub fn new(
        key: &StorageKey,
        location: LocationSummary,
        sections: Vec<CachedSection>,
        section_order: Vec<String>,
    ) -> Self {
        let mut unique: Vec<CachedSection> = Vec::with_capacity(sections.len());
        for section in sections {
            match unique
                .iter_mut()
                .find(|s| s.section_type == section.section_type)
            {
                Some(existing) => existing.merge_from(section),
                None => unique.push(section),
            }
        }

        let now = Utc::now();
        Self {
            geo_key: key.key.clone(),
            level: key.level,
            location,
            sections: unique,
            section_order,
            created_at: now,
            last_accessed_at: now,
        }
    }

    /// Record a read.
    pub fn touch(&mut self) {
        self.last_accessed_at = Utc::now();
    }

    pub fn summary(&self) -> ContextSummary {
        ContextSummary {
            geo_key: self.geo_key.clone(),
            level: self.level,
            section_types: self
                .sections
                .iter()
                .map(|s| s.section_type.clone())
                .collect(),
            created_at: self.created_at,
            last_accessed_at: self.last_accessed_at,
        }
    }
}

/// Pointer to the most specific context written by the latest persist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct CachedCatalogueSnapshot {
    pub geo_key: String,
    pub level: GeoLevel,
    pub location: LocationSummary,
    #[serde(default)]
    pub section_order: Vec<String>,
    pub saved_at: DateTime<Utc>,
}

impl CachedCatalogueSnapshot {
    pub fn new(context: &CachedContext, section_order: Vec<String>) -> Self {
        Self {
            geo_key: context.geo_key.clone(),
            level: context.level,
            location: context.location.clone(),
            section_order,
            saved_at: Utc::now(),
        }
    }
}

/// Listing entry for a stored context.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextSummary {
    pub geo_key: String,
    pub level: GeoLevel,
    pub section_types: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub last_accessed_at: DateTime<Utc>,
}

impl ContextSummary {
    pub fn age_display(&self) -> String {
        age_display(self.created_at)
    }

    pub fn last_access_display(&self) -> String {
        age_display(self.last_accessed_at)
    }
}
