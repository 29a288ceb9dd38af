//! Geographic identity of a resolved location.
//!
//! `LocationSummary` is produced by a geocoder outside this crate. The cache
//! only reads it to derive keys, and stores a copy alongside each context so
//! keys can be rebuilt later without geocoding again.

use serde::{Deserialize, Serialize};

/// The fields of a geocoded location that cache keys depend on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct LocationSummary {
    #[serde(default)]
    pub country_code: Option<String>,
    #[serde(default)]
    pub admin_area: Option<String>,
    #[serde(default)]
    pub locality: Option<String>,
    #[serde(default)]
    pub sub_locality: Option<String>,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

impl LocationSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_country(mut self, country_code: impl Into<String>) -> Self {
        self.country_code = Some(country_code.into());
        self
    }

    pub fn with_admin_area(mut self, admin_area: impl Into<String>) -> Self {
        self.admin_area = Some(admin_area.into());
        self
    }

    pub fn with_locality(mut self, locality: impl Into<String>) -> Self {
        self.locality = Some(locality.into());
        self
    }

    pub fn with_sub_locality(mut self, sub_locality: impl Into<String>) -> Self {
        self.sub_locality = Some(sub_locality.into());
        self
    }

    pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = Some(timezone.into());
        self
    }

    pub fn with_coordinates(mut self, latitude: f64, longitude: f64) -> Self {
        self.latitude = Some(latitude);
        self.longitude = Some(longitude);
        self
    }

    /// Latitude and longitude, if both are known.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        Some((self.latitude?, self.longitude?))
    }

    /// Replace the geographic names with those declared by the backend,
    /// keeping this location's timezone and coordinates.
    pub fn with_geography_from(&self, context: &GeoContext) -> Self {
        Self {
            country_code: context.country_code.clone(),
            admin_area: context.admin_area.clone(),
            locality: context.locality.clone(),
            sub_locality: context.sub_locality.clone(),
            timezone: self.timezone.clone(),
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }

    /// Human-readable place name, most specific first.
    pub fn display_name(&self) -> String {
        let parts: Vec<&str> = [
            self.sub_locality.as_deref(),
            self.locality.as_deref(),
            self.admin_area.as_deref(),
            self.country_code.as_deref(),
        ]
        .into_iter()
        .flatten()
        .filter(|s| !s.trim().is_empty())
        .collect();

        if parts.is_empty() {
            "unknown location".to_string()
        } else {
            parts.join(", ")
        }
    }
}

/// Canonical place identity declared by the backend in
/// `_metadata.location.context`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct GeoContext {
    #[serde(default, alias = "countryCode", alias = "country")]
    pub country_code: Option<String>,
    #[serde(default, alias = "adminArea")]
    pub admin_area: Option<String>,
    #[serde(default)]
    pub locality: Option<String>,
    #[serde(default, alias = "subLocality")]
    pub sub_locality: Option<String>,
}

impl GeoContext {
    pub fn is_empty(&self) -> bool {
        self.country_code.is_none()
            && self.admin_area.is_none()
            && self.locality.is_none()
            && self.sub_locality.is_none()
    }
}
