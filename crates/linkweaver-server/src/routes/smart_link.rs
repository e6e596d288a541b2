use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use linkweaver_core::recommender::{SmartLinkRequest, SmartLinkResponse};

use crate::error::ApiError;
use crate::state::AppState;

pub async fn smart_link(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SmartLinkRequest>,
) -> Result<Json<SmartLinkResponse>, ApiError> {
    if request.content.trim().is_empty() {
        return Err(ApiError::validation("content must not be empty"));
    }
    let response = state.recommender.recommend(request).await?;
    Ok(Json(response))
}
