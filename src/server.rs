use crate::adapters::GeminiClient;
use crate::api::{build_router, AppState, RouterOptions};
use crate::core::{AnalysisGateway, ConfigProvider, DirectoryStore};
use crate::utils::error::{AdvisorError, Result};
use std::sync::Arc;

/// Loads the directory and wires the provider, gateway and router together.
/// Nothing is served until this returns, so lookups never see a half-loaded
/// directory.
pub fn prepare<C: ConfigProvider>(config: &C) -> Result<axum::Router> {
    let directory = DirectoryStore::load(config.doctors_csv())?;
    if directory.is_empty() {
        tracing::warn!(
            path = config.doctors_csv(),
            "Dataset has no dermatology practitioners, /api/doctors will return an empty list"
        );
    }

    let api_key = config.api_key().ok_or_else(|| AdvisorError::MissingConfigError {
        field: "api_key".to_string(),
    })?;
    let provider = GeminiClient::new(
        api_key,
        config.model(),
        config.provider_base_url(),
        config.request_timeout(),
    )?;
    tracing::info!(
        model = config.model(),
        timeout = ?config.request_timeout(),
        retry_attempts = config.retry_attempts(),
        "Gemini provider configured"
    );

    let gateway = AnalysisGateway::new(
        Arc::new(provider),
        config.request_timeout(),
        config.retry_attempts(),
    );

    let options = RouterOptions {
        body_limit: config.body_limit_bytes(),
        allowed_origins: config.allowed_origins().to_vec(),
    };

    Ok(build_router(AppState::new(gateway, directory), &options))
}

pub async fn run<C: ConfigProvider>(config: &C) -> Result<()> {
    let app = prepare(config)?;

    let address = format!("{}:{}", config.host(), config.port());
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!("🚀 Server live on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
