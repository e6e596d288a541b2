use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use linkweaver_core::auditor::{ExistingLink, LinkAuditReport};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LinkAuditRequest {
    pub post_id: i64,
    pub content: String,
    #[serde(default)]
    pub existing_links: Vec<ExistingLink>,
    #[serde(default = "default_max_suggestions")]
    pub max_suggestions: usize,
}

fn default_max_suggestions() -> usize {
    5
}

pub async fn link_audit(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LinkAuditRequest>,
) -> Result<Json<LinkAuditReport>, ApiError> {
    let article = state
        .catalog
        .get(request.post_id)
        .await?
        .ok_or_else(|| ApiError::validation("article not found"))?;

    let report = state
        .auditor
        .audit(&article, &request.content, &request.existing_links, request.max_suggestions)
        .await?;
    Ok(Json(report))
}
