use async_trait::async_trait;

use crate::error::Result;
use crate::models::{CachedCatalogueSnapshot, CachedSection, LocationSummary};

/// Sections restored from the most recent persist, with the pointer that
/// located them.
#[derive(Debug, Clone, PartialEq)]
pub struct LastContext {
    pub sections: Vec<CachedSection>,
    pub snapshot: CachedCatalogueSnapshot,
}

/// Storage contract for geo-scoped catalogue content.
#[async_trait]
pub trait CataloguePersisting: Send + Sync {
    /// Store sections resolved for `location`. The implementation chooses
    /// the geo level(s) written. Empty `sections` is a no-op.
    async fn persist(
        &self,
        sections: &[CachedSection],
        section_order: &[String],
        location: &LocationSummary,
    ) -> Result<()>;

    /// Merge everything cached for the location's levels, general to
    /// specific. Empty when nothing is cached.
    async fn restore(&self, location: &LocationSummary) -> Result<Vec<CachedSection>>;

    /// Restore whatever the last persist pointed at, without a fresh location.
    async fn restore_last_context(&self) -> Result<Option<LastContext>>;

    /// Delete contexts older than the configured maximum age. Returns the
    /// number removed.
    async fn clear_expired(&self) -> Result<usize>;
}
