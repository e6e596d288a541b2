//! Dismissed-opportunity endpoints (§3 Dismissed opportunity, §6).

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use chrono::Utc;
use linkweaver_core::article::DismissedLink;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct DismissQuery {
    pub post_id: i64,
}

#[derive(Debug, Serialize)]
pub struct DismissedListResponse {
    pub dismissed: Vec<DismissedLink>,
}

pub async fn list_dismissed(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DismissQuery>,
) -> Json<DismissedListResponse> {
    Json(DismissedListResponse { dismissed: state.seo_cache.dismissed_for(query.post_id) })
}

#[derive(Debug, Deserialize)]
pub struct DismissRequest {
    pub post_id: i64,
    pub target_id: i64,
    pub reason: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DismissResponse {
    pub success: bool,
}

pub async fn dismiss_opportunity(
    State(state): State<Arc<AppState>>,
    Json(request): Json<DismissRequest>,
) -> Result<Json<DismissResponse>, ApiError> {
    state.seo_cache.dismiss(request.post_id, request.target_id, request.reason.clone());

    if let Some(mut article) = state.catalog.get(request.post_id).await? {
        if !article.dismissed_links.iter().any(|d| d.target_id == request.target_id) {
            article.dismissed_links.push(DismissedLink {
                target_id: request.target_id,
                dismissed_at: Utc::now(),
                reason: request.reason,
            });
            state.catalog.upsert(article).await?;
        }
    }

    Ok(Json(DismissResponse { success: true }))
}

#[derive(Debug, Deserialize)]
pub struct RestoreQuery {
    pub post_id: i64,
    pub target_id: i64,
}

pub async fn restore_opportunity(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RestoreQuery>,
) -> Result<Json<DismissResponse>, ApiError> {
    state.seo_cache.restore(query.post_id, query.target_id);

    if let Some(mut article) = state.catalog.get(query.post_id).await? {
        let before = article.dismissed_links.len();
        article.dismissed_links.retain(|d| d.target_id != query.target_id);
        if article.dismissed_links.len() != before {
            state.catalog.upsert(article).await?;
        }
    }

    Ok(Json(DismissResponse { success: true }))
}
