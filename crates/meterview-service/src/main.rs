//! Meterview Service - HTTP API for the metering dashboard
//!
//! This is the main entry point for the meterview service.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use meterview_service::{create_router, AppState, ServiceConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,meterview_service=debug,meterview_client=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Meterview Service");

    // Load configuration from environment
    let config = ServiceConfig::from_env();

    tracing::info!(
        listen_addr = %config.listen_addr,
        metering_configured = %config.metering_url.is_some(),
        identity_configured = %config.identity_url.is_some(),
        insecure = %config.insecure,
        statistics_concurrency = %config.statistics_concurrency,
        averaging = ?config.averaging,
        "Service configuration loaded"
    );

    // Build app state
    let state = AppState::new(config.clone());

    // Create the router
    let app = create_router(state);
    tracing::info!("Router configured with all API endpoints");

    // Start HTTP server
    tracing::info!(listen_addr = %config.listen_addr, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
