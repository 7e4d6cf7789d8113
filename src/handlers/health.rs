//! Health check handler

use axum::{extract::State, Json};
use serde::Serialize;

use crate::logic::DetectorKind;
use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    detector: DetectorKind,
    timestamp: i64,
}

pub async fn check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        detector: state.gateway.detector_kind(),
        timestamp: chrono::Utc::now().timestamp(),
    })
}
