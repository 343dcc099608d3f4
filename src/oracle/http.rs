//! HTTP client for the pricing oracle.
//!
//! `POST {base_url}/pricing` with a `token` header and a JSON batch of
//! identifiers; the oracle answers with one rate per identifier it priced.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;

use super::PricingOracle;
use super::wire::{OracleRate, PricingRequest, PricingResponse};
use crate::telemetry;
use crate::types::Identifier;
use crate::{MuninnError, Result};

/// Default oracle deadline.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for the pricing oracle's batch endpoint.
#[derive(Clone)]
pub struct HttpOracle {
    token: String,
    http: Client,
    base_url: String,
    timeout: Duration,
}

impl HttpOracle {
    /// Create a client with the default 30s deadline.
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Result<Self> {
        Self::with_timeout(base_url, token, DEFAULT_TIMEOUT)
    }

    /// Create a client with a custom per-request deadline.
    pub fn with_timeout(
        base_url: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = Client::builder().timeout(timeout).build().map_err(|e| {
            MuninnError::Configuration(format!("failed to build HTTP client: {e}"))
        })?;

        Ok(Self {
            token: token.into(),
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post_pricing(&self, identifiers: &[Identifier]) -> Result<Vec<OracleRate>> {
        let url = format!("{}/pricing", self.base_url);

        let response = self
            .http
            .post(&url)
            .header("token", &self.token)
            .json(&PricingRequest {
                attributes: identifiers,
            })
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if status.as_u16() == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .map(Duration::from_secs);
            return Err(MuninnError::RateLimited { retry_after });
        }

        let body = response.text().await.map_err(|e| self.transport_error(e))?;
        if !status.is_success() {
            return Err(MuninnError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let parsed: PricingResponse = serde_json::from_str(&body)?;
        Ok(parsed.rates)
    }

    fn transport_error(&self, e: reqwest::Error) -> MuninnError {
        if e.is_timeout() {
            MuninnError::Timeout(self.timeout)
        } else {
            MuninnError::Http(e.to_string())
        }
    }
}

#[async_trait]
impl PricingOracle for HttpOracle {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch(&self, identifiers: &[Identifier]) -> Result<Vec<OracleRate>> {
        let start = Instant::now();
        let result = self.post_pricing(identifiers).await;

        let status = if result.is_ok() { "ok" } else { "error" };
        metrics::counter!(telemetry::ORACLE_REQUESTS_TOTAL, "status" => status).increment(1);
        metrics::histogram!(telemetry::ORACLE_REQUEST_DURATION_SECONDS)
            .record(start.elapsed().as_secs_f64());

        result
    }
}
