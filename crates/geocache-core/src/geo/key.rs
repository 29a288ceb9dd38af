//! Cache key derivation.
//!
//! A key is the `.`-joined chain of normalized place names down to the
//! requested level (`us.california.san_francisco`), or a bare geohash for
//! the coordinate level. Every key at a named level extends the key of the
//! level above it.

use std::fmt;

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use super::geohash;
use super::level::GeoLevel;
use crate::models::LocationSummary;

/// Separator between level components of a key.
pub const KEY_DELIMITER: &str = ".";

/// A derived cache key and the level it addresses.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageKey {
    pub level: GeoLevel,
    pub key: String,
}

impl StorageKey {
    /// Derive the key for `level`, or `None` when the location lacks a
    /// field that level requires.
    pub fn derive(location: &LocationSummary, level: GeoLevel) -> Option<Self> {
        let key = match level {
            GeoLevel::Geohash => {
                let (lat, lon) = location.coordinates()?;
                geohash::encode(lat, lon, geohash::DEFAULT_PRECISION)
            }
            named => {
                let names = [
                    location.country_code.as_deref(),
                    location.admin_area.as_deref(),
                    location.locality.as_deref(),
                    location.sub_locality.as_deref(),
                ];
                let depth = named as usize + 1;
                let mut parts = Vec::with_capacity(depth);
                for name in &names[..depth] {
                    let part = normalize((*name)?);
                    if part.is_empty() {
                        return None;
                    }
                    parts.push(part);
                }
                parts.join(KEY_DELIMITER)
            }
        };

        Some(Self { level, key })
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.level, self.key)
    }
}

/// Every level the location can key, general to specific.
pub fn applicable_levels(location: &LocationSummary) -> Vec<StorageKey> {
    GeoLevel::ALL
        .iter()
        .filter_map(|level| StorageKey::derive(location, *level))
        .collect()
}

/// Like [`applicable_levels`], restricted to name-derived levels.
pub fn named_levels(location: &LocationSummary) -> Vec<StorageKey> {
    GeoLevel::NAMED
        .iter()
        .filter_map(|level| StorageKey::derive(location, *level))
        .collect()
}

/// Normalize a place name into a key component.
///
/// Decomposes canonically, drops combining marks, lowercases, removes
/// commas and apostrophes and joins the remaining words with `_`. The key
/// delimiter, path separators and other characters that are not portable
/// in file names are word breaks. Hyphens and non-Latin letters are kept.
/// Idempotent.
pub fn normalize(name: &str) -> String {
    let folded: String = name
        .nfd()
        .flat_map(char::to_lowercase)
        .filter(|c| !is_combining_mark(*c) && !matches!(*c, ',' | '\'' | '\u{2019}'))
        .map(|c| match c {
            '.' | '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => ' ',
            other => other,
        })
        .collect();

    folded
        .split_whitespace()
        .filter(|piece| !piece.is_empty())
        .collect::<Vec<_>>()
        .join("_")
        .trim_matches('_')
        .to_string()
}
