use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct SeoMetricsResponse {
    pub article_count: usize,
    pub orphan_count: usize,
    pub critical_orphan_count: usize,
    pub reciprocal_pair_count: usize,
    pub average_pagerank: f64,
}

pub async fn seo_metrics(State(state): State<Arc<AppState>>) -> Json<SeoMetricsResponse> {
    let snapshot = state.seo_cache.snapshot();
    let average_pagerank = if snapshot.pagerank.ranks.is_empty() {
        0.0
    } else {
        snapshot.pagerank.ranks.values().sum::<f64>() / snapshot.pagerank.ranks.len() as f64
    };

    Json(SeoMetricsResponse {
        article_count: snapshot.articles.len(),
        orphan_count: snapshot.orphans.len(),
        critical_orphan_count: snapshot.orphans.iter().filter(|o| o.critical).count(),
        reciprocal_pair_count: snapshot.reciprocal_pairs.len(),
        average_pagerank,
    })
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub success: bool,
}

pub async fn refresh_seo_metrics(
    State(state): State<Arc<AppState>>,
) -> Result<Json<RefreshResponse>, ApiError> {
    state.refresh_seo_cache().await?;
    Ok(Json(RefreshResponse { success: true }))
}
