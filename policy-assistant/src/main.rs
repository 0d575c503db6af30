use anyhow::Context as _;
use policy_assistant::{
    PolicyStore,
    config::ServiceConfig,
    server::{AppState, router},
    telemetry::init_tracing,
};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServiceConfig::from_env()?;
    init_tracing(config.log_format);

    let store = PolicyStore::load(config.policy_fixture.as_deref())
        .context("failed to load policy store")?;

    let app = router(AppState::new(Arc::new(store)));

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    info!("Server running on http://{}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
}
