//! Muninn - refresh-aware price cache in front of a batch pricing oracle
//!
//! Prices are expensive to fetch but the oracle accepts a batch of
//! identifiers per call. Muninn caches each fetched price for a fixed
//! duration and, on every miss, piggybacks the identifiers that are about
//! to go stale onto the same oracle call, so popular entries are refreshed
//! before they expire.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use muninn::oracle::HttpOracle;
//! use muninn::{CacheConfig, Catalog, PriceQuery, PricingService, ReferenceCache};
//!
//! #[tokio::main]
//! async fn main() -> muninn::Result<()> {
//!     let oracle = HttpOracle::new("http://localhost:8080", "oracle-token")?;
//!     let cache = ReferenceCache::new(CacheConfig::default())?;
//!     let service = PricingService::new(Catalog::default(), Arc::new(cache), Arc::new(oracle));
//!
//!     let query = PriceQuery::new("Summer", "FloatingPointResort", "SingletonRoom");
//!     let reference = service.quote(&query).await?;
//!     println!("{}", reference.rate);
//!     Ok(())
//! }
//! ```
//!
//! # Using the cache directly
//!
//! ```rust
//! use muninn::{CacheConfig, Identifier, Lookup, Reference, ReferenceCache};
//!
//! # fn main() -> muninn::Result<()> {
//! let cache = ReferenceCache::new(CacheConfig::default())?;
//! let id = Identifier::new("Summer", "GitawayHotel", "BooleanTwin");
//!
//! let Lookup::Miss(batch) = cache.lookup_or_select_candidates(&id)? else {
//!     unreachable!("empty cache");
//! };
//! assert_eq!(batch, vec![id.clone()]);
//!
//! cache.store(&[Reference::new(id.clone(), "12000", cache.now())])?;
//! assert!(cache.lookup_or_select_candidates(&id)?.is_hit());
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod clock;
pub mod error;
pub mod oracle;
pub mod pricing;
pub mod reconcile;
#[cfg(feature = "server")]
pub mod server;
pub mod telemetry;
pub mod types;
mod version;

// Re-export main types at crate root
pub use cache::{CacheConfig, Lookup, ReferenceCache};
pub use error::{MuninnError, Result};
pub use pricing::{Catalog, PriceQuery, PricingService};
pub use reconcile::reconcile;
pub use types::{Identifier, Rate, Reference};
pub use version::{BuildInfo, PKG_VERSION};
