//! Catalogue content sections.
//!
//! A section's content is an arbitrary JSON tree. When it is an object,
//! each top-level entry is a keyed item that may carry a reserved
//! annotation:
//!
//! ```json
//! { "_metadata": { "location": { "geoscope": "country",
//!                                "context": { "country_code": "US" } } } }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::location::GeoContext;
use crate::geo::GeoLevel;

/// Reserved item key holding cache annotations.
pub const METADATA_KEY: &str = "_metadata";

const LOCATION_KEY: &str = "location";
const GEOSCOPE_KEY: &str = "geoscope";
const CONTEXT_KEY: &str = "context";

/// One named content block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct CachedSection {
    pub section_type: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: Value,
}

impl CachedSection {
    pub fn new(section_type: impl Into<String>, title: impl Into<String>, content: Value) -> Self {
        Self {
            section_type: section_type.into(),
            title: title.into(),
            content,
        }
    }

    /// Keyed items, when the content is object-shaped.
    pub fn items(&self) -> Option<&Map<String, Value>> {
        self.content.as_object()
    }

    /// A section with the same type and title but different content.
    pub fn with_content(&self, content: Value) -> Self {
        Self {
            section_type: self.section_type.clone(),
            title: self.title.clone(),
            content,
        }
    }

    /// Whether any keyed item declares a recognised geoscope.
    pub fn declares_geoscope(&self) -> bool {
        self.items().is_some_and(|items| {
            items
                .values()
                .any(|item| LocationMetadata::from_item(item).and_then(|m| m.geoscope).is_some())
        })
    }

    /// Fold a more specific copy of this section into `self`.
    ///
    /// Object content merges key by key with `specific` winning conflicts.
    /// Any other shape on either side is replaced by `specific` outright.
    pub fn merge_from(&mut self, specific: CachedSection) {
        let CachedSection { title, content, .. } = specific;
        self.title = title;
        match (&mut self.content, content) {
            (Value::Object(general), Value::Object(overrides)) => {
                for (key, value) in overrides {
                    general.insert(key, value);
                }
            }
            (slot, content) => *slot = content,
        }
    }
}

/// Typed view of an item's `_metadata.location` annotation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocationMetadata {
    pub geoscope: Option<GeoLevel>,
    pub context: Option<GeoContext>,
}

impl LocationMetadata {
    /// Read the annotation from a keyed item. Returns `None` when the item
    /// has no usable geoscope or context.
    pub fn from_item(item: &Value) -> Option<Self> {
        let location = item.get(METADATA_KEY)?.get(LOCATION_KEY)?;

        let geoscope = location
            .get(GEOSCOPE_KEY)
            .and_then(Value::as_str)
            .and_then(|s| s.parse().ok());

        let context = location
            .get(CONTEXT_KEY)
            .filter(|v| v.is_object())
            .and_then(|v| serde_json::from_value::<GeoContext>(v.clone()).ok())
            .filter(|c| !c.is_empty());

        if geoscope.is_none() && context.is_none() {
            return None;
        }
        Some(Self { geoscope, context })
    }
}
