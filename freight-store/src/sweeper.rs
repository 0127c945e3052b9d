use anyhow::Result;
use chrono::Utc;
use freight_core::db::get_connection;
use freight_core::FreightContext;
use std::time::Duration;
use tracing;

use crate::refresh_tokens;

/// Periodically delete expired refresh tokens. Errors are logged and the
/// loop keeps going.
pub async fn run(ctx: FreightContext) -> Result<()> {
    let interval = Duration::from_secs(ctx.config.tokens.sweep_interval_secs.max(1));
    tracing::info!("Starting refresh token sweeper (every {:?})", interval);

    loop {
        match sweep(&ctx).await {
            Ok(0) => tracing::debug!("No expired refresh tokens"),
            Ok(deleted) => tracing::info!("Deleted {} expired refresh token(s)", deleted),
            Err(e) => tracing::error!("Error in refresh token sweeper: {}", e),
        }

        tokio::time::sleep(interval).await;
    }
}

async fn sweep(ctx: &FreightContext) -> Result<usize> {
    let mut conn = get_connection(&ctx.db_pool).await?;
    let deleted = refresh_tokens::delete_expired(&mut conn, Utc::now()).await?;
    Ok(deleted)
}
