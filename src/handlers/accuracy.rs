//! Accuracy control handlers

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};

use crate::middleware::auth::OperatorContext;
use crate::models::{AccuracySettings, AccuracySettingsUpdate, EvaluationReport, EvaluationRequest};
use crate::{AppResult, AppState};

/// Current degradation settings
pub async fn get(State(state): State<AppState>) -> Json<AccuracySettings> {
    Json(state.gateway.get_accuracy_settings())
}

/// Replace the degradation settings. All four fields are required.
pub async fn update(
    State(state): State<AppState>,
    operator: OperatorContext,
    payload: Result<Json<AccuracySettingsUpdate>, JsonRejection>,
) -> AppResult<Json<AccuracySettings>> {
    let Json(update) = payload?;
    let candidate = update.into_candidate()?;

    let stored = state.gateway.set_accuracy_settings(candidate)?;
    tracing::info!(authenticated = operator.authenticated, "Accuracy settings changed by {}", operator.operator);

    Ok(Json(stored))
}

/// Score labeled samples under the current settings
pub async fn evaluate(
    State(state): State<AppState>,
    payload: Result<Json<EvaluationRequest>, JsonRejection>,
) -> AppResult<Json<EvaluationReport>> {
    let Json(request) = payload?;
    let report = state.gateway.evaluate(request.samples)?;
    Ok(Json(report))
}
