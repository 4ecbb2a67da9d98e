//! spin-relay - relay the studio automation feed to Bluesky

use std::net::SocketAddr;

use anyhow::Context;
use libspincast::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    libspincast::logging::init_default();

    let config = Config::load().context("failed to load configuration")?;
    if config.access.allowed_prefixes.is_empty() {
        tracing::warn!("allowlist is empty; every request will be rejected");
    }

    let app = spin_relay::router(&config)?;

    let listener = tokio::net::TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.server.bind))?;
    tracing::info!(addr = %config.server.bind, "spin-relay listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("server error")
}
