//! Order verification handler

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};

use crate::models::{VerifyRequest, VerifyResponse};
use crate::{AppResult, AppState};

/// Verify one order submission
pub async fn verify(
    State(state): State<AppState>,
    payload: Result<Json<VerifyRequest>, JsonRejection>,
) -> AppResult<Json<VerifyResponse>> {
    let Json(request) = payload?;
    let decision = state.gateway.verify_request(request).await?;
    Ok(Json(decision.into()))
}
