//! Geographic hierarchy: specificity levels, geohash cells, and the
//! cache keys derived from a resolved location.

pub mod geohash;
pub mod key;
pub mod level;

pub use key::{applicable_levels, named_levels, normalize, StorageKey, KEY_DELIMITER};
pub use level::{GeoLevel, UnknownGeoLevel};
