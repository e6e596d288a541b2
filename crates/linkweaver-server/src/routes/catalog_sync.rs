//! Catalog sync (§4.B/§4.C + §9 Open Question (a)): ingest an article,
//! enrich it via the LLM's auto-analyze operation, embed it, and upsert it
//! into the vector catalog. Implements the "simpler path" variant the
//! design notes call for, with semantic-enrichment left as an optional
//! follow-up rather than a required step. CMS-supplied classification
//! fields take precedence over whatever auto-analyze would have produced.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use linkweaver_core::article::{Article, ContentLifespan, ContentType, DifficultyLevel, FunnelStage};
use linkweaver_core::llm::AutoAnalysis;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CatalogSyncRequest {
    pub post_id: i64,
    pub title: String,
    pub url: String,
    pub slug: String,
    pub content: String,
    pub content_type: ContentType,
    #[serde(default)]
    pub topic_cluster: Option<String>,
    #[serde(default)]
    pub related_clusters: Vec<String>,
    #[serde(default)]
    pub funnel_stage: Option<FunnelStage>,
    #[serde(default)]
    pub target_persona: Option<String>,
    #[serde(default)]
    pub difficulty_level: Option<DifficultyLevel>,
    #[serde(default)]
    pub quality_score: Option<u8>,
    #[serde(default)]
    pub content_lifespan: Option<ContentLifespan>,
    #[serde(default)]
    pub is_pillar: bool,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub main_topics: Option<Vec<String>>,
    #[serde(default)]
    pub semantic_keywords: Option<Vec<String>>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct CatalogSyncResponse {
    pub success: bool,
    pub action: &'static str,
    pub post_id: i64,
    pub vector_id: String,
    pub generated_summary: String,
    pub generated_keywords: Vec<String>,
    pub auto_analyzed: bool,
}

fn vector_id_for(post_id: i64) -> String {
    format!("article-{post_id}")
}

/// Merges CMS-supplied classification over the LLM's auto-analyze result,
/// skipping the LLM call entirely when the request already carries the full
/// set of classification fields it would otherwise produce.
async fn resolve_article(
    state: &AppState,
    request: CatalogSyncRequest,
    existing: Option<&Article>,
) -> Result<(Article, bool), ApiError> {
    let plain_body = linkweaver_core::html::strip_tags(&request.content);

    let needs_analysis = request.summary.is_none()
        || request.topic_cluster.is_none()
        || request.quality_score.is_none()
        || request.main_topics.is_none();

    let analysis = if needs_analysis {
        state.llm.auto_analyze(&request.title, &plain_body).await.unwrap_or_default()
    } else {
        AutoAnalysis::default()
    };

    let summary = request.summary.unwrap_or(analysis.summary);
    let main_topics = request.main_topics.unwrap_or(analysis.main_topics);
    let semantic_keywords = request.semantic_keywords.unwrap_or(analysis.semantic_keywords);
    let topic_cluster = request.topic_cluster.unwrap_or(analysis.topic_cluster);
    let target_persona = request.target_persona.unwrap_or(analysis.target_persona);
    let quality_score = request.quality_score.unwrap_or_else(|| analysis.quality_score.max(1));

    let embedding = state.embeddings.embed_article(&request.title, &summary, &plain_body).await?;

    let published_at = request
        .published_at
        .or_else(|| existing.map(|a| a.published_at))
        .unwrap_or_else(Utc::now);
    let updated_at = request
        .updated_at
        .or_else(|| existing.map(|a| a.updated_at))
        .unwrap_or_else(Utc::now);
    let dismissed_links = existing.map(|a| a.dismissed_links.clone()).unwrap_or_default();

    let mut article = Article {
        post_id: request.post_id,
        title: request.title,
        url: request.url,
        slug: request.slug,
        content_type: request.content_type,
        embedding,
        summary,
        main_topics,
        semantic_keywords,
        suggested_anchors: analysis.suggested_anchors,
        questions_answered: analysis.questions_answered,
        topic_cluster,
        related_clusters: request.related_clusters,
        funnel_stage: request.funnel_stage.unwrap_or(FunnelStage::Unknown),
        target_persona,
        difficulty_level: request.difficulty_level.unwrap_or(DifficultyLevel::Intermediate),
        content_lifespan: request.content_lifespan.unwrap_or(ContentLifespan::Evergreen),
        quality_score,
        is_pillar: request.is_pillar,
        inbound_anchors: existing.map(|a| a.inbound_anchors.clone()).unwrap_or_default(),
        outbound_links: existing.map(|a| a.outbound_links.clone()).unwrap_or_default(),
        inbound_link_count: existing.map(|a| a.inbound_link_count).unwrap_or(0),
        dismissed_links,
        published_at,
        updated_at,
        entities: analysis.entities,
    };
    article.enforce_pillar_invariant();

    Ok((article, needs_analysis))
}

pub async fn catalog_sync(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CatalogSyncRequest>,
) -> Result<Json<CatalogSyncResponse>, ApiError> {
    if request.title.trim().is_empty() || request.content.trim().is_empty() {
        return Err(ApiError::validation("title and content are required"));
    }

    let existing = state.catalog.get(request.post_id).await?;
    let action = if existing.is_some() { "updated" } else { "created" };
    let post_id = request.post_id;

    let (article, auto_analyzed) = resolve_article(&state, request, existing.as_ref()).await?;
    let generated_summary = article.summary.clone();
    let generated_keywords = article.semantic_keywords.clone();

    state.catalog.upsert(article).await?;

    Ok(Json(CatalogSyncResponse {
        success: true,
        action,
        post_id,
        vector_id: vector_id_for(post_id),
        generated_summary,
        generated_keywords,
        auto_analyzed,
    }))
}

#[derive(Debug, Deserialize)]
pub struct CatalogDeleteQuery {
    pub post_id: i64,
}

pub async fn catalog_delete(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CatalogDeleteQuery>,
) -> Result<Json<CatalogSyncResponse>, ApiError> {
    state.catalog.delete(query.post_id).await?;
    Ok(Json(CatalogSyncResponse {
        success: true,
        action: "updated",
        post_id: query.post_id,
        vector_id: vector_id_for(query.post_id),
        generated_summary: String::new(),
        generated_keywords: vec![],
        auto_analyzed: false,
    }))
}

#[derive(Debug, Deserialize)]
pub struct CatalogSyncBatchRequest {
    pub articles: Vec<CatalogSyncRequest>,
}

#[derive(Debug, Serialize)]
pub struct CatalogSyncBatchResponse {
    pub success: bool,
    pub synced: usize,
    pub failed: usize,
}

/// Syncs up to the batch size the LLM client chunks internally
/// (`batch_analyze`, ≤10 per chunk); failures for one article don't abort
/// the rest (§7 propagation policy — per-article isolation).
pub async fn catalog_sync_batch(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CatalogSyncBatchRequest>,
) -> Result<Json<CatalogSyncBatchResponse>, ApiError> {
    let mut synced = 0;
    let mut failed = 0;

    for item in request.articles {
        let post_id = item.post_id;
        let existing = match state.catalog.get(post_id).await {
            Ok(existing) => existing,
            Err(err) => {
                tracing::warn!(error = %err, post_id, "catalog lookup failed during batch sync");
                failed += 1;
                continue;
            }
        };

        let (article, _) = match resolve_article(&state, item, existing.as_ref()).await {
            Ok(result) => result,
            Err(err) => {
                tracing::warn!(post_id, "embedding failed during batch sync: {}", err.message.unwrap_or_default());
                failed += 1;
                continue;
            }
        };

        match state.catalog.upsert(article).await {
            Ok(()) => synced += 1,
            Err(err) => {
                tracing::warn!(error = %err, "catalog upsert failed during batch sync");
                failed += 1;
            }
        }
    }

    Ok(Json(CatalogSyncBatchResponse { success: true, synced, failed }))
}
