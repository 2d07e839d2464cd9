//! axum service exposing the symptom checker over HTTP.

mod routes;
mod state;

pub use routes::router;
pub use state::{AppState, ModelStatus, SERVICE_NAME, ServiceConfig};

use anyhow::Context;
use tracing::{info, warn};

/// Bind `config` and serve `state` until Ctrl-C.
pub async fn serve(config: &ServiceConfig, state: AppState) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port))
        .await
        .with_context(|| format!("binding {}:{}", config.host, config.port))?;
    info!(addr = %listener.local_addr()?, model_loaded = state.predictor().is_some(), "listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "cannot listen for Ctrl-C; running until killed");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
