//! Geo-scoped catalogue caching.
//!
//! This module provides the `CataloguePersisting` contract and its
//! file-backed implementation, `CatalogueFileStore`. Content is split by
//! declared geoscope on write (`split`) and merged from the most general
//! level to the most specific on read (`merge`). Contexts older than the
//! configured maximum age (14 days by default) are removed by
//! `clear_expired`.

pub mod file_store;
pub mod merge;
pub mod persist;
pub mod split;

pub use file_store::CatalogueFileStore;
pub use merge::SectionAccumulator;
pub use persist::{CataloguePersisting, LastContext};
pub use split::{plan_writes, PlannedWrite};
