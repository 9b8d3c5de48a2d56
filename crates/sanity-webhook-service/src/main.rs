//! Sanity Webhook Service - receiver for signed Sanity webhooks
//!
//! This is the main entry point for the sanity-webhook service.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sanity_webhook_service::{create_router, AppState, ServiceConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,sanity_webhook=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Sanity Webhook Service");

    // Load configuration from environment
    let config = ServiceConfig::from_env();

    tracing::info!(
        listen_addr = %config.listen_addr,
        webhook_paths = ?config.webhook_paths,
        halt_on_error = %config.halt_on_error,
        max_body_bytes = %config.body_limits.max_length,
        secret_from_file = %config.webhook_secret.is_some(),
        "Service configuration loaded"
    );

    // Invalid guard configuration aborts startup
    let state = AppState::new(config.clone())?;

    let app = create_router(state);
    tracing::info!("Router configured with webhook endpoints");

    tracing::info!(listen_addr = %config.listen_addr, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
