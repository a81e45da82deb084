//! Potability server - serves predictions from the best available bundle
//!
//! Resolves the artifact bundle once at startup and exits if none is usable.

use anyhow::{Context, Result};
use potability_lib::{resolve, ServiceMetrics, StructuredLogger};
use potability_server::{api, ServerConfig, ServingContext};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const SERVICE_NAME: &str = "potability-server";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting potability-server");

    let config = ServerConfig::load().context("Failed to load server configuration")?;
    info!(models_dir = %config.models_dir.display(), addr = %config.addr(), "Server configured");

    let bundle = resolve(&config.models_dir).with_context(|| {
        format!(
            "No artifact bundle could be loaded from {}",
            config.models_dir.display()
        )
    })?;

    let metrics = ServiceMetrics::new();
    let ctx = Arc::new(ServingContext::new(
        bundle,
        metrics,
        StructuredLogger::new(SERVICE_NAME),
    ));

    let addr = config.addr();
    ctx.logger().log_startup(SERVER_VERSION, &addr);

    api::serve(&addr, Arc::clone(&ctx), async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for shutdown signal");
        }
    })
    .await?;

    ctx.logger().log_shutdown("SIGINT received");
    info!("Shutting down");
    Ok(())
}
