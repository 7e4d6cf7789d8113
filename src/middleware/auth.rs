//! Operator authentication middleware
//!
//! Guards accuracy-control writes. With `CONTROL_API_KEY` set the request must
//! carry `Authorization: Bearer <key>`. Without a key, development lets writes
//! through as `anonymous` and production refuses them.

use axum::{
    extract::{State, Request},
    middleware::Next,
    response::Response,
    http::header::AUTHORIZATION,
};
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use sha2::{Sha256, Digest};

use crate::{AppState, AppError};

/// Who is changing the settings, for the audit log
#[derive(Debug, Clone)]
pub struct OperatorContext {
    /// `operator:<key fingerprint>` or `anonymous`
    pub operator: String,
    pub authenticated: bool,
}

impl OperatorContext {
    fn anonymous() -> Self {
        Self {
            operator: "anonymous".to_string(),
            authenticated: false,
        }
    }
}

/// Middleware: Require operator key for control writes
pub async fn require_operator(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let operator = match state.config.control_api_key.as_deref() {
        Some(expected) => {
            let presented = hash_token(&extract_bearer_token(&req)?);
            if presented != hash_token(expected) {
                tracing::warn!("Rejected accuracy-control write: operator key mismatch");
                return Err(AppError::Unauthorized);
            }
            OperatorContext {
                operator: format!("operator:{}", &presented[..8]),
                authenticated: true,
            }
        }
        None if state.config.is_production() => {
            tracing::warn!("Rejected accuracy-control write: CONTROL_API_KEY not configured in production");
            return Err(AppError::Unauthorized);
        }
        None => OperatorContext::anonymous(),
    };

    req.extensions_mut().insert(operator);

    Ok(next.run(req).await)
}

/// Extract bearer token from Authorization header
fn extract_bearer_token(req: &Request) -> Result<String, AppError> {
    let auth_header = req.headers()
        .get(AUTHORIZATION)
        .ok_or(AppError::Unauthorized)?
        .to_str()
        .map_err(|_| AppError::Unauthorized)?;

    auth_header
        .strip_prefix("Bearer ")
        .map(|token| token.trim().to_string())
        .ok_or(AppError::Unauthorized)
}

fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

// Implement FromRequestParts for OperatorContext
#[axum::async_trait]
impl<S> FromRequestParts<S> for OperatorContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions
            .get::<OperatorContext>()
            .cloned()
            .ok_or(AppError::Unauthorized)
    }
}
