//! Split-on-write: deciding which geo key each piece of content lands at.
//!
//! Content without any per-item geoscope is written whole at the most
//! specific named level and duplicated at country level. Otherwise every
//! keyed item is routed to the level its metadata declares, and each level
//! is keyed from backend-declared context when available.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use tracing::debug;

use crate::geo::{named_levels, GeoLevel, StorageKey};
use crate::models::{CachedSection, GeoContext, LocationMetadata, LocationSummary};

/// One context write produced by [`plan_writes`].
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedWrite {
    pub key: StorageKey,
    pub location: LocationSummary,
    pub sections: Vec<CachedSection>,
}

#[derive(Debug, Default)]
struct LevelBucket {
    sections: Vec<CachedSection>,
    context: Option<GeoContext>,
}

/// Plan the context writes for `sections` resolved under `location`,
/// ordered general to specific. Empty when there is nothing to write or
/// the location has no named level.
pub fn plan_writes(sections: &[CachedSection], location: &LocationSummary) -> Vec<PlannedWrite> {
    if sections.is_empty() {
        return Vec::new();
    }

    let device_keys = named_levels(location);
    let Some(most_specific) = device_keys.last().cloned() else {
        debug!(location = %location.display_name(), "No named level for location, skipping write");
        return Vec::new();
    };

    if !sections.iter().any(CachedSection::declares_geoscope) {
        let mut writes = Vec::with_capacity(2);
        if most_specific.level != GeoLevel::Country {
            if let Some(country) = device_keys.first() {
                writes.push(PlannedWrite {
                    key: country.clone(),
                    location: location.clone(),
                    sections: sections.to_vec(),
                });
            }
        }
        writes.push(PlannedWrite {
            key: most_specific,
            location: location.clone(),
            sections: sections.to_vec(),
        });
        return writes;
    }

    split_by_scope(sections, most_specific.level)
        .into_iter()
        .filter_map(|(level, bucket)| resolve_target(level, bucket, location, &device_keys))
        .collect()
}

/// Route each keyed item into the bucket of its declared level. Items
/// without a named geoscope, and sections that are not non-empty objects,
/// go to `default_level`.
fn split_by_scope(
    sections: &[CachedSection],
    default_level: GeoLevel,
) -> BTreeMap<GeoLevel, LevelBucket> {
    let mut buckets: BTreeMap<GeoLevel, LevelBucket> = BTreeMap::new();

    for section in sections {
        let Some(items) = section.items().filter(|items| !items.is_empty()) else {
            buckets
                .entry(default_level)
                .or_default()
                .sections
                .push(section.clone());
            continue;
        };

        let mut per_level: BTreeMap<GeoLevel, Map<String, Value>> = BTreeMap::new();
        for (name, item) in items {
            let metadata = LocationMetadata::from_item(item);
            let declared = metadata.as_ref().and_then(|m| m.geoscope);
            let level = declared.filter(GeoLevel::is_named).unwrap_or(default_level);

            // Only items declared at this level may key its bucket.
            let bucket = buckets.entry(level).or_default();
            if bucket.context.is_none() && declared == Some(level) {
                bucket.context = metadata.and_then(|m| m.context);
            }
            per_level
                .entry(level)
                .or_default()
                .insert(name.clone(), item.clone());
        }

        for (level, items) in per_level {
            buckets
                .entry(level)
                .or_default()
                .sections
                .push(section.with_content(Value::Object(items)));
        }
    }

    buckets
}

/// Key a bucket: backend context first, then the device's own key for the
/// level. Levels with neither are dropped.
fn resolve_target(
    level: GeoLevel,
    bucket: LevelBucket,
    location: &LocationSummary,
    device_keys: &[StorageKey],
) -> Option<PlannedWrite> {
    let from_backend = bucket.context.as_ref().and_then(|context| {
        let declared = location.with_geography_from(context);
        StorageKey::derive(&declared, level).map(|key| (key, declared))
    });

    let resolved = from_backend.or_else(|| {
        device_keys
            .iter()
            .find(|key| key.level == level)
            .map(|key| (key.clone(), location.clone()))
    });

    match resolved {
        Some((key, location)) => Some(PlannedWrite {
            key,
            location,
            sections: bucket.sections,
        }),
        None => {
            debug!(
                level = %level,
                sections = bucket.sections.len(),
                "No key available for level, skipping"
            );
            None
        }
    }
}
