use shieldlab::prelude::*;
use tracing_subscriber::EnvFilter;

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,shieldlab=debug,tower_http=debug")),
        )
        .with_target(true)
        .init();

    let config = ServerConfig::load()?;
    let server = ShieldlabServer::builder().config(config).build().await?;

    tracing::info!(addr = %server.local_addr()?, ui = %server.app().config().allowed_origin, "CSRF lab backend ready");
    tracing::warn!("demo server: sessions live in memory and one endpoint is CSRF-vulnerable on purpose");

    server
        .run_until(async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => tracing::info!("shutdown requested"),
                Err(error) => {
                    tracing::error!(%error, "failed to listen for Ctrl-C, shutting down")
                }
            }
        })
        .await?;
    Ok(())
}
