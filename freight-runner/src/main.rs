use anyhow::Result;
use freight_core::db::run_migrations;
use freight_core::{Config, FreightContext};
use freight_store::run_sweeper;
use tokio;
use tracing;
use tracing_subscriber;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Starting Freightline runner");

    let config = Config::from_env();
    run_migrations(&config.database.url).await?;

    let ctx = FreightContext::new(config).await?;
    tracing::info!("Freightline context initialized");

    let ctx_clone = ctx.clone();
    let sweeper = tokio::spawn(async move {
        if let Err(e) = run_sweeper(ctx_clone).await {
            tracing::error!("Refresh token sweeper error: {}", e);
        }
    });

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received, stopping");
    sweeper.abort();

    Ok(())
}
