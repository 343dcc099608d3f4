//! Request handling: validate, look up, refresh through the oracle, store.
//!
//! [`PricingService`] is the piece a transport (the axum server, or any
//! other caller) drives. On a miss it sends the target plus the cache's
//! refresh candidates to the oracle in one call, reconciles the answer and
//! stores every returned price, so the round trip also refreshes entries
//! that were about to expire.

pub mod catalog;

pub use catalog::{Catalog, PriceQuery};

use std::sync::Arc;

use tracing::{info, instrument};

use crate::cache::{Lookup, ReferenceCache};
use crate::oracle::PricingOracle;
use crate::reconcile::reconcile;
use crate::types::{Identifier, Reference};
use crate::{MuninnError, Result};

/// Prices identifiers, serving from the cache when possible.
///
/// Built once at start-up and shared by reference across request handlers.
pub struct PricingService {
    catalog: Catalog,
    cache: Arc<ReferenceCache>,
    oracle: Arc<dyn PricingOracle>,
}

impl PricingService {
    pub fn new(
        catalog: Catalog,
        cache: Arc<ReferenceCache>,
        oracle: Arc<dyn PricingOracle>,
    ) -> Self {
        Self {
            catalog,
            cache,
            oracle,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn cache(&self) -> &ReferenceCache {
        &self.cache
    }

    /// Validate `query` and price the identifier it names.
    pub async fn quote(&self, query: &PriceQuery) -> Result<Reference> {
        let target = self.catalog.identifier(query)?;
        self.price(&target).await
    }

    /// Price an already-validated identifier.
    ///
    /// The fetch time is taken before the oracle call, so a slow oracle
    /// shortens the stored entries' TTL rather than extending it. Oracle
    /// and reconciliation failures leave the cache untouched.
    #[instrument(skip_all, fields(target = %target))]
    pub async fn price(&self, target: &Identifier) -> Result<Reference> {
        let candidates = match self.cache.lookup_or_select_candidates(target)? {
            Lookup::Hit(reference) => {
                info!("cache hit");
                return Ok(reference);
            }
            Lookup::Miss(candidates) => candidates,
        };
        info!(
            batch = candidates.len(),
            oracle = self.oracle.name(),
            "cache miss, fetching"
        );

        let fetched_at = self.cache.now();
        let rates = self.oracle.fetch(&candidates).await?;
        let references = reconcile(target, fetched_at, rates)?;
        self.cache.store(&references)?;

        references
            .into_iter()
            .next()
            .ok_or(MuninnError::InvalidResponse)
    }
}
