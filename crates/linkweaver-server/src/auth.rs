//! Bearer auth middleware (§6): every endpoint except `/api/health`
//! requires an exact-match `Authorization: Bearer <API_SECRET_KEY>` header.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::Response;

use crate::error::ApiError;
use crate::state::AppState;

pub async fn require_bearer_auth(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header_value = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let expected = format!("Bearer {}", state.config.api_secret_key);
    if header_value != expected {
        return Err(ApiError::new(StatusCode::UNAUTHORIZED, "Unauthorized", None));
    }

    Ok(next.run(request).await)
}
