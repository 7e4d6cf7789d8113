//! Order Risk Verification Gateway
//!
//! Decides allow/block for each order from behavioral telemetry and order
//! context, with a live-tunable accuracy degradation control.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                  ORDER RISK GATEWAY                          │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌──────────┐   ┌──────────────────────────────────────────┐ │
//! │  │  HTTP    │──▶│  VerificationGateway                     │ │
//! │  │  (Axum)  │   │   validate -> features -> settings       │ │
//! │  └────┬─────┘   │   ┌────────────┐   ┌──────────────────┐  │ │
//! │       │         │   │ Classifier │   │ Detector (timed) │  │ │
//! │       │         │   └─────┬──────┘   └────────┬─────────┘  │ │
//! │       │         │         └──── Combiner ─────┘            │ │
//! │       ▼         └──────────────────────────────────────────┘ │
//! │  ┌──────────────┐                                            │
//! │  │AccuracyStore │◀── operator (accuracy-control)             │
//! │  └──────────────┘                                            │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod handlers;
pub mod logic;
pub mod middleware;
pub mod models;

use std::sync::Arc;

use anyhow::Context;
use axum::{
    Router,
    routing::{get, post},
    middleware as axum_middleware,
};
use tower_http::{
    cors::{CorsLayer, Any},
    trace::TraceLayer,
    compression::CompressionLayer,
};

pub use error::{AppError, AppResult};

use crate::config::Config;
use crate::logic::{detector, AccuracyStore, VerificationGateway};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<VerificationGateway>,
    pub config: Config,
}

impl AppState {
    /// Wire store, detector and gateway from configuration.
    pub fn from_config(config: Config) -> anyhow::Result<Self> {
        let store = AccuracyStore::new(config.initial_accuracy)
            .context("Initial accuracy settings out of bounds")?;

        let detector = detector::build(&config.detector)
            .context("Failed to create anomaly detector")?;

        let gateway = VerificationGateway::new(Arc::new(store), detector, config.gateway_options());

        Ok(Self {
            gateway: Arc::new(gateway),
            config,
        })
    }
}

/// Create the main router with all routes
pub fn create_router(state: AppState) -> Router {
    // Public routes
    let public_routes = Router::new()
        .route("/health", get(handlers::health::check))
        .route("/api/v1/verify", post(handlers::verify::verify))
        .route("/api/v1/accuracy-control", get(handlers::accuracy::get))
        .route("/api/v1/accuracy/evaluate", post(handlers::accuracy::evaluate))
        .route("/api/v1/model-info", get(handlers::model::info))
        .route("/api/v1/stats", get(handlers::model::stats));

    // Operator routes (control key)
    let operator_routes = Router::new()
        .route("/api/v1/accuracy-control", post(handlers::accuracy::update))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_operator
        ));

    Router::new()
        .merge(public_routes)
        .merge(operator_routes)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        )
        .with_state(state)
}
