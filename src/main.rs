//! Order Risk Gateway server

use std::net::SocketAddr;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use order_risk_gateway::{config::Config, create_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before the filter reads RUST_LOG
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "order_risk_gateway=debug,tower_http=debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env();

    tracing::info!("Order risk gateway starting ({})", config.environment);
    tracing::info!(
        "Detector: {} (timeout {:?}), fail-safe policy: {}",
        config.detector.kind,
        config.detector.timeout,
        config.fail_safe
    );
    if config.control_api_key.is_none() {
        if config.is_production() {
            tracing::warn!("CONTROL_API_KEY unset: accuracy-control writes are disabled");
        } else {
            tracing::warn!("CONTROL_API_KEY unset: accuracy-control writes are open");
        }
    }

    // Build application state
    let state = AppState::from_config(config.clone())?;
    let settings = state.gateway.get_accuracy_settings();
    tracing::info!(
        "Accuracy control: enabled={}, target={}, noise={:.2}, bias={:.2}",
        settings.enabled,
        settings.target_percentage(),
        settings.noise_factor,
        settings.bias_factor
    );

    // Build router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
