//! HTTP surface for the pricing service.
//!
//! Routes:
//! - `GET /pricing?period=..&hotel=..&room=..` → `{"rate": "12000"}`
//! - `GET /health` → `{"status": "ok"}`
//!
//! Validation failures answer 400 with `{"error": ..}`; anything else that
//! goes wrong (oracle down, timeout, inconsistent response) answers 500
//! with `{"error": "Failed to get pricing: .."}`.

pub mod config;

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};

use crate::cache::ReferenceCache;
use crate::oracle::{HttpOracle, PricingOracle, RetryingOracle};
use crate::pricing::{PriceQuery, PricingService};
use crate::types::Rate;
use crate::{MuninnError, Result};

use config::{Config, Secrets};

/// Build the pricing service described by `config`.
///
/// Requires an oracle token, from the secrets file or the environment.
pub fn build_service(config: &Config, secrets: &Secrets) -> Result<PricingService> {
    let token = secrets.oracle_token().ok_or_else(|| {
        MuninnError::Configuration(format!(
            "no oracle token: set [oracle] token in secrets.toml or {}",
            config::ORACLE_TOKEN_ENV
        ))
    })?;

    let http =
        HttpOracle::with_timeout(&config.oracle.base_url, token, config.oracle.timeout())?;
    let oracle: Arc<dyn PricingOracle> = if config.oracle.max_attempts > 1 {
        Arc::new(RetryingOracle::new(Arc::new(http), config.oracle.retry()))
    } else {
        Arc::new(http)
    };

    let cache = ReferenceCache::new(config.cache.clone().into())?;
    Ok(PricingService::new(
        config.catalog.clone(),
        Arc::new(cache),
        oracle,
    ))
}

/// Router serving `service`.
pub fn router(service: Arc<PricingService>) -> Router {
    Router::new()
        .route("/pricing", get(get_pricing))
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

/// Serve until Ctrl+C or SIGTERM.
pub async fn serve(listener: TcpListener, service: Arc<PricingService>) -> std::io::Result<()> {
    axum::serve(listener, router(service))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("server shutdown complete");
    Ok(())
}

#[derive(Serialize)]
struct RateBody {
    rate: Rate,
}

async fn get_pricing(
    State(service): State<Arc<PricingService>>,
    Query(query): Query<PriceQuery>,
) -> std::result::Result<Json<RateBody>, AppError> {
    let reference = service.quote(&query).await?;
    Ok(Json(RateBody {
        rate: reference.rate,
    }))
}

async fn health_check() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Error type that implements IntoResponse
struct AppError(MuninnError);

impl From<MuninnError> for AppError {
    fn from(err: MuninnError) -> Self {
        Self(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = if self.0.is_client_error() {
            debug!(error = %self.0, "rejected pricing request");
            (StatusCode::BAD_REQUEST, self.0.to_string())
        } else {
            error!(error = %self.0, "pricing request failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to get pricing: {}", self.0),
            )
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Graceful shutdown handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("received SIGTERM, starting graceful shutdown");
        },
    }
}
