use std::sync::Arc;

use anyhow::Context;

use stockcast_api::app;
use stockcast_infra::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    stockcast_observability::init();

    let config = AppConfig::load().context("failed to load configuration")?;
    let (services, alerts) = app::services::build_services(&config)
        .await
        .context("failed to wire services")?;

    let app = app::build_app(Arc::new(services), config.max_concurrent_requests);

    let listener = tokio::net::TcpListener::bind(config.socket_addr()?)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    alerts.shutdown();
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
