//! muninnd: the Muninn pricing daemon.
//!
//! Serves cached prices over HTTP, refreshing them in batches through the
//! pricing oracle.

use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use muninn::server::config::{Config, Secrets};
use muninn::server::{build_service, serve};

/// Muninn daemon, a refresh-aware pricing cache.
#[derive(Parser)]
#[command(name = "muninnd")]
#[command(version = muninn::PKG_VERSION)]
#[command(about = "Muninn pricing cache daemon")]
struct Args {
    /// Path to configuration file.
    #[arg(short, long)]
    config: Option<std::path::PathBuf>,

    /// Address to bind, overriding `[server] address`.
    #[arg(short, long, env = "MUNINN_ADDRESS")]
    address: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    // Load configuration
    let mut config = Config::load(args.config.as_deref())?;
    if let Some(address) = args.address {
        config.server.address = address;
    }
    let secrets = Secrets::load()?;

    let service = build_service(&config, &secrets)?;

    let listener = TcpListener::bind(&config.server.address).await.map_err(|e| {
        muninn::MuninnError::Configuration(format!(
            "cannot bind {}: {e}",
            config.server.address
        ))
    })?;
    let addr = listener.local_addr()?;

    info!(
        version = %muninn::BuildInfo::current(),
        %addr,
        oracle = %config.oracle.base_url,
        "muninnd starting"
    );

    serve(listener, Arc::new(service)).await?;

    Ok(())
}
