use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use linkweaver_core::llm::MetaTags;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct MetaGenerateRequest {
    pub title: String,
    pub summary: String,
}

pub async fn meta_generate(
    State(state): State<Arc<AppState>>,
    Json(request): Json<MetaGenerateRequest>,
) -> Result<Json<MetaTags>, ApiError> {
    if request.title.trim().is_empty() {
        return Err(ApiError::validation("title is required"));
    }
    let tags = state.llm.generate_meta(&request.title, &request.summary).await?;
    Ok(Json(tags))
}
