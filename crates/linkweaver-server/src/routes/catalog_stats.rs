use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use linkweaver_core::article::ContentType;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct CatalogStatsResponse {
    pub total_articles: usize,
    pub posts: usize,
    pub pages: usize,
    pub pillars: usize,
}

pub async fn catalog_stats(State(state): State<Arc<AppState>>) -> Result<Json<CatalogStatsResponse>, ApiError> {
    let articles = state.catalog.list_all().await?;
    let posts = articles.iter().filter(|a| a.content_type == ContentType::Post).count();
    let pages = articles.iter().filter(|a| a.content_type == ContentType::Page).count();
    let pillars = articles.iter().filter(|a| a.is_pillar).count();

    Ok(Json(CatalogStatsResponse { total_articles: articles.len(), posts, pages, pillars }))
}
