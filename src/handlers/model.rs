//! Model info and gateway statistics

use axum::{extract::State, Json};
use serde::Serialize;

use crate::logic::classifier::ClassifierWeights;
use crate::logic::features::{layout_hash, FEATURE_LAYOUT, FEATURE_VERSION};
use crate::logic::{DetectorKind, FailSafePolicy, GatewayStats};
use crate::models::{AccuracySettings, PaymentMethod};
use crate::AppState;

#[derive(Serialize)]
pub struct ModelInfo {
    pub feature_version: u8,
    pub layout_hash: String,
    pub features: &'static [&'static str],
    pub weights: ClassifierWeights,
    pub decision_threshold: f64,
    pub supported_payment_types: Vec<&'static str>,
    pub detector: DetectorKind,
    pub detector_timeout_ms: u64,
    pub fail_safe_policy: FailSafePolicy,
    pub accuracy: AccuracySettings,
}

pub async fn info(State(state): State<AppState>) -> Json<ModelInfo> {
    let gateway = &state.gateway;
    let weights = gateway.classifier().weights().clone();

    Json(ModelInfo {
        feature_version: FEATURE_VERSION,
        layout_hash: format!("{:08x}", layout_hash()),
        features: FEATURE_LAYOUT,
        decision_threshold: weights.threshold,
        weights,
        supported_payment_types: PaymentMethod::supported(),
        detector: gateway.detector_kind(),
        detector_timeout_ms: gateway.options().detector_timeout.as_millis() as u64,
        fail_safe_policy: gateway.options().fail_safe,
        accuracy: gateway.get_accuracy_settings(),
    })
}

pub async fn stats(State(state): State<AppState>) -> Json<GatewayStats> {
    Json(state.gateway.stats())
}
