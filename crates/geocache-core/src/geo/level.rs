//! Geographic specificity levels.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Geographic specificity, ordered from least to most specific.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "lowercase")]
pub enum GeoLevel {
    Country = 0,
    AdminArea = 1,
    Locality = 2,
    SubLocality = 3,
    Geohash = 4,
}

impl GeoLevel {
    /// Every level, general to specific.
    pub const ALL: [GeoLevel; 5] = [
        GeoLevel::Country,
        GeoLevel::AdminArea,
        GeoLevel::Locality,
        GeoLevel::SubLocality,
        GeoLevel::Geohash,
    ];

    /// Name-derived levels, general to specific.
    pub const NAMED: [GeoLevel; 4] = [
        GeoLevel::Country,
        GeoLevel::AdminArea,
        GeoLevel::Locality,
        GeoLevel::SubLocality,
    ];

    /// Stable identifier used on disk and in backend metadata.
    pub fn as_str(&self) -> &'static str {
        match self {
            GeoLevel::Country => "country",
            GeoLevel::AdminArea => "adminarea",
            GeoLevel::Locality => "locality",
            GeoLevel::SubLocality => "sublocality",
            GeoLevel::Geohash => "geohash",
        }
    }

    /// Whether the level is derived from place names rather than coordinates.
    pub fn is_named(&self) -> bool {
        !matches!(self, GeoLevel::Geohash)
    }
}

impl fmt::Display for GeoLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownGeoLevel(pub String);

impl fmt::Display for UnknownGeoLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown geo level: {}", self.0)
    }
}

impl std::error::Error for UnknownGeoLevel {}

impl FromStr for GeoLevel {
    type Err = UnknownGeoLevel;

    /// Accepts the stable identifiers plus the usual backend spellings
    /// (`admin_area`, `sub-locality`, `adminArea`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let folded: String = s
            .trim()
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .flat_map(char::to_lowercase)
            .collect();

        match folded.as_str() {
            "country" => Ok(GeoLevel::Country),
            "adminarea" => Ok(GeoLevel::AdminArea),
            "locality" => Ok(GeoLevel::Locality),
            "sublocality" => Ok(GeoLevel::SubLocality),
            "geohash" => Ok(GeoLevel::Geohash),
            _ => Err(UnknownGeoLevel(s.to_string())),
        }
    }
}
