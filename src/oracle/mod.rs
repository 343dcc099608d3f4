//! Pricing oracle access.
//!
//! The oracle is an external, rate-limited service that prices a batch of
//! identifiers per call. [`PricingOracle`] is the seam the request handler
//! depends on:
//!
//! - [`HttpOracle`]: the real client (reqwest, JSON over HTTP).
//! - [`RetryingOracle`]: decorator adding backoff on transient errors.
//!
//! The cache never talks to the oracle; the handler calls it between a
//! miss and the following store, outside the cache lock.

pub mod http;
pub mod retry;
pub mod wire;

pub use http::HttpOracle;
pub use retry::{RetryConfig, RetryingOracle};
pub use wire::OracleRate;

use async_trait::async_trait;

use crate::Result;
use crate::types::Identifier;

/// A source of prices for batches of identifiers.
#[async_trait]
pub trait PricingOracle: Send + Sync {
    /// Oracle name for logging/debugging.
    fn name(&self) -> &str;

    /// Price `identifiers` in one call.
    ///
    /// The answer is not guaranteed to cover every identifier, nor to
    /// preserve order; reconciliation deals with that.
    async fn fetch(&self, identifiers: &[Identifier]) -> Result<Vec<OracleRate>>;
}
