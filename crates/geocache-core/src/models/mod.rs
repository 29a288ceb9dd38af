//! Data models for cached catalogue content.
//!
//! This module contains the structures persisted by the cache:
//!
//! - `LocationSummary`, `GeoContext`: geographic identity of a location
//! - `CachedSection`, `LocationMetadata`: content blocks and their reserved
//!   per-item `_metadata.location` annotations
//! - `CachedContext`, `CachedCatalogueSnapshot`, `ContextSummary`: on-disk
//!   records and their listings

pub mod context;
pub mod location;
pub mod section;

pub use context::{CachedCatalogueSnapshot, CachedContext, ContextSummary};
pub use location::{GeoContext, LocationSummary};
pub use section::{CachedSection, LocationMetadata};
