//! Hierarchical geographic cache for catalogue content.
//!
//! Content fetched for one location is stored under keys derived from the
//! location's country, admin area, locality and sub-locality, so that a
//! later lookup nearby can reuse whatever levels it shares.
//!
//! # Modules
//!
//! - [`geo`] - Geo levels, geohash encoding and cache key derivation
//! - [`models`] - Sections, contexts, snapshots and location summaries
//! - [`cache`] - Persistence contract, file-backed store, split and merge
//! - [`config`] - Store configuration
//! - [`error`] - Error types and result alias
//!
//! # Example
//!
//! ```
//! use geocache_core::geo::{applicable_levels, normalize};
//! use geocache_core::models::LocationSummary;
//!
//! let location = LocationSummary::new()
//!     .with_country("BR")
//!     .with_admin_area("São Paulo")
//!     .with_locality("São Paulo");
//!
//! let keys: Vec<String> = applicable_levels(&location).into_iter().map(|k| k.key).collect();
//! assert_eq!(keys, vec!["br", "br.sao_paulo", "br.sao_paulo.sao_paulo"]);
//! assert_eq!(normalize("Zürich"), "zurich");
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod geo;
pub mod models;
pub mod utils;

pub use cache::{CatalogueFileStore, CataloguePersisting, LastContext};
pub use config::StoreConfig;
pub use error::{CacheError, Result};
