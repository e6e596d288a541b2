//! Link recommender orchestrator (§4.H): the 14-step pipeline that turns a
//! post body into ranked link proposals. Ties together the embedding
//! client, the vector catalog, the entity retriever, the LLM client, the
//! SEO cache, and the anchor finder.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::anchor_finder;
use crate::article::{Article, ContentType, FunnelStage, OutboundLink};
use crate::cache::{DedupSlot, InFlightDedup, ResponseCache};
use crate::catalog::VectorCatalog;
use crate::embeddings::EmbeddingClient;
use crate::entity;
use crate::enhancements::{self, EnhancementScorer, NoOpEnhancements};
use crate::error::Result;
use crate::html;
use crate::llm::{AnchorCandidate as LlmAnchorCandidate, LlmClient};
use crate::scoring::{hybrid_score, HybridWeights, SeoCache};
use crate::scoring::seo::{score_link, SeoScoreInput};

const RETRIEVAL_TOP_K: usize = 50;
const PREFILTER_SIMILARITY: f32 = 0.25;
const RERANK_TOP_N: usize = 20;
const FUNNEL_STAGES: [FunnelStage; 3] = [FunnelStage::Awareness, FunnelStage::Consideration, FunnelStage::Decision];

fn default_min_score() -> f64 {
    40.0
}

fn default_use_claude_analysis() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmartLinkRequest {
    pub post_id: i64,
    pub content: String,
    #[serde(default)]
    pub content_type: Option<ContentType>,
    pub max_links: usize,
    #[serde(default)]
    pub strict_silo: bool,
    #[serde(default)]
    pub auto_insert: bool,
    /// Bypasses the response cache lookup for this call (§4.H step 1).
    #[serde(default)]
    pub skip_cache: bool,
    /// Target ids excluded from retrieval in addition to existing outbound
    /// links and the source itself (§4.H step 5).
    #[serde(default)]
    pub exclude_ids: Vec<i64>,
    /// Minimum hybrid score (0-100 scale) a candidate must clear to survive
    /// scoring (§4.H step 7).
    #[serde(default = "default_min_score")]
    pub min_score: f64,
    /// Whether to ask the LLM to pick verbatim anchors before falling back
    /// to the anchor finder (§4.H step 10).
    #[serde(default = "default_use_claude_analysis")]
    pub use_claude_analysis: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkProposal {
    pub target_id: i64,
    pub target_url: String,
    pub anchor_text: String,
    pub hybrid_score: f64,
    pub seo_score: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SmartLinkStats {
    pub candidates_found: usize,
    pub passed_scoring: usize,
    pub average_score: f64,
    pub links_generated: usize,
    pub links_inserted: usize,
    pub funnel_distribution: std::collections::HashMap<String, usize>,
    pub velocity_status: String,
    pub entity_based_candidates: usize,
    pub cross_encoder_reranked: usize,
    pub skipped: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmartLinkResponse {
    pub success: bool,
    pub links: Vec<LinkProposal>,
    pub linked_content: Option<String>,
    pub stats: SmartLinkStats,
    pub message: Option<String>,
    #[serde(default)]
    pub cached: bool,
    #[serde(default)]
    pub deduplicated: bool,
}

pub struct Recommender {
    catalog: Arc<dyn VectorCatalog>,
    embeddings: Arc<dyn EmbeddingClient>,
    llm: Arc<dyn LlmClient>,
    seo_cache: Arc<SeoCache>,
    enhancement_scorer: Arc<dyn EnhancementScorer>,
    response_cache: ResponseCache<SmartLinkResponse>,
    dedup: InFlightDedup<SmartLinkResponse>,
}

impl Recommender {
    pub fn new(
        catalog: Arc<dyn VectorCatalog>,
        embeddings: Arc<dyn EmbeddingClient>,
        llm: Arc<dyn LlmClient>,
        seo_cache: Arc<SeoCache>,
    ) -> Self {
        Self::with_enhancement_scorer(catalog, embeddings, llm, seo_cache, Arc::new(NoOpEnhancements))
    }

    /// Same as [`Recommender::new`] but with a non-default enhancement
    /// scorer (§4.H step 8 extension point).
    pub fn with_enhancement_scorer(
        catalog: Arc<dyn VectorCatalog>,
        embeddings: Arc<dyn EmbeddingClient>,
        llm: Arc<dyn LlmClient>,
        seo_cache: Arc<SeoCache>,
        enhancement_scorer: Arc<dyn EnhancementScorer>,
    ) -> Self {
        Self {
            catalog,
            embeddings,
            llm,
            seo_cache,
            enhancement_scorer,
            response_cache: ResponseCache::new(),
            dedup: InFlightDedup::new(),
        }
    }

    fn cache_key(request: &SmartLinkRequest) -> String {
        let mut hasher = Sha256::new();
        hasher.update(request.post_id.to_le_bytes());
        hasher.update(request.content.as_bytes());
        hasher.update(request.max_links.to_le_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Runs the 14-step pipeline, deduplicating concurrent requests that
    /// share the same `(post_id, content, max_links)` key (§3 Recommendation,
    /// §5 in-flight dedup, §8 S1/S2).
    pub async fn recommend(&self, request: SmartLinkRequest) -> Result<SmartLinkResponse> {
        let key = Self::cache_key(&request);

        if !request.skip_cache {
            if let Some(mut cached) = self.response_cache.get(&key) {
                cached.cached = true;
                return Ok(cached);
            }
        }

        match self.dedup.register(&key) {
            DedupSlot::Leader => {
                let result = self.recommend_uncached(request).await;
                match result {
                    Ok(response) => {
                        self.response_cache.insert(key.clone(), response.clone());
                        self.dedup.complete(&key, response.clone());
                        Ok(response)
                    }
                    Err(err) => {
                        // Followers would otherwise hang forever; broadcast an
                        // empty failure response so they can fall through.
                        let failure = SmartLinkResponse {
                            success: false,
                            links: vec![],
                            linked_content: None,
                            stats: SmartLinkStats::default(),
                            message: Some(err.to_string()),
                            cached: false,
                            deduplicated: false,
                        };
                        self.dedup.complete(&key, failure);
                        Err(err)
                    }
                }
            }
            DedupSlot::Follower(mut receiver) => {
                let mut response = receiver.recv().await.map_err(|e| {
                    crate::error::Error::Internal(format!("dedup broadcast dropped: {e}"))
                })?;
                response.deduplicated = true;
                Ok(response)
            }
        }
    }

    async fn recommend_uncached(&self, request: SmartLinkRequest) -> Result<SmartLinkResponse> {
        if self.seo_cache.is_stale() {
            let articles = self.catalog.list_all().await?;
            self.seo_cache.refresh(articles);
        }

        if request.max_links == 0 {
            return Ok(empty_response(Some("maxLinks is 0".to_string())));
        }

        let Some(source) = self.catalog.get(request.post_id).await? else {
            return Ok(empty_response(Some("source article not found".to_string())));
        };

        // Pages never receive automatic links (§3 invariant source-page-empty, §8 S4).
        // Checked against both the stored article and the request's own
        // contentType so a CMS can flag a not-yet-synced page as such.
        if source.content_type == ContentType::Page || request.content_type == Some(ContentType::Page) {
            return Ok(SmartLinkResponse {
                success: true,
                links: vec![],
                linked_content: None,
                stats: SmartLinkStats::default(),
                message: Some("Pages do not receive automatic links".to_string()),
                cached: false,
                deduplicated: false,
            });
        }

        let existing_links = source.outbound_links.len();
        if existing_links >= request.max_links {
            return Ok(SmartLinkResponse {
                success: true,
                links: vec![],
                linked_content: None,
                stats: SmartLinkStats { skipped: true, ..Default::default() },
                message: Some("existing links already meet maxLinks".to_string()),
                cached: false,
                deduplicated: false,
            });
        }

        let plain_body = html::strip_tags(&request.content);
        let query_vector = self.embeddings.embed(&plain_body).await?;

        let dismissed: HashSet<i64> = self
            .seo_cache
            .dismissed_for(source.post_id)
            .into_iter()
            .map(|d| d.target_id)
            .collect();

        let exclude: Vec<i64> = source
            .outbound_links
            .iter()
            .map(|l| l.target_id)
            .chain(std::iter::once(source.post_id))
            .chain(request.exclude_ids.iter().copied())
            .chain(dismissed.iter().copied())
            .collect();

        let vector_matches = self.catalog.query(&query_vector, RETRIEVAL_TOP_K, &exclude).await?;
        let all_articles = self.catalog.list_all().await?;
        let entity_matches = entity::retrieve(&source, &all_articles);

        let mut candidate_ids: Vec<i64> = vector_matches
            .iter()
            .filter(|m| m.score >= PREFILTER_SIMILARITY)
            .map(|m| m.article.post_id)
            .filter(|id| !dismissed.contains(id))
            .collect();
        for entity_match in &entity_matches {
            if !candidate_ids.contains(&entity_match.post_id) && !dismissed.contains(&entity_match.post_id) {
                candidate_ids.push(entity_match.post_id);
            }
        }

        if candidate_ids.is_empty() {
            return Ok(empty_response(Some("no candidates in the retrieval pool".to_string())));
        }

        let mut candidates: Vec<Article> = all_articles
            .into_iter()
            .filter(|a| candidate_ids.contains(&a.post_id))
            .collect();

        // Two-stage re-rank: cross-encoder over the top RERANK_TOP_N similarity
        // hits, then keep up to max_links * 3 going into hybrid scoring.
        let texts: Vec<String> = candidates.iter().map(|a| a.summary.clone()).collect();
        let rerank_scores = self
            .llm
            .cross_encoder_rerank(&plain_body, &texts)
            .await
            .unwrap_or_else(|_| vec![0.5; candidates.len()]);

        let mut scored: Vec<(Article, f32, f64)> = candidates
            .drain(..)
            .zip(rerank_scores)
            .map(|(article, rerank)| {
                let sim = vector_matches
                    .iter()
                    .find(|m| m.article.post_id == article.post_id)
                    .map(|m| m.score)
                    .unwrap_or(0.0);
                (article, sim, rerank as f64)
            })
            .collect();
        scored.sort_by(|a, b| b.2.partial_cmp(&a.2).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(RERANK_TOP_N.max(request.max_links * 3));

        let weights = HybridWeights::default();
        let entity_based_candidates = entity_matches.len();
        let cross_encoder_reranked = scored.len();
        let min_hybrid_score = request.min_score / 100.0;
        let mut hybrid: Vec<(Article, f32, f64)> = scored
            .into_iter()
            .filter_map(|(article, sim, _rerank)| {
                hybrid_score(&source, &article, sim, weights, request.strict_silo)
                    .filter(|s| *s >= min_hybrid_score)
                    .map(|s| (article, sim, s))
            })
            .collect();
        hybrid.sort_by(|a, b| b.2.partial_cmp(&a.2).unwrap_or(std::cmp::Ordering::Equal));

        if hybrid.is_empty() {
            return Ok(empty_response(Some("no candidates cleared the hybrid score threshold".to_string())));
        }

        let passed_scoring = hybrid.len();
        let average_score = hybrid.iter().map(|(_, _, s)| s).sum::<f64>() / hybrid.len() as f64;

        // Enhancements: seasonal boost / decay / E-E-A-T / link velocity
        // (§4.H step 8), then resort by the enhanced score.
        let mut enhanced: Vec<(Article, f32, f64)> = hybrid
            .into_iter()
            .map(|(article, sim, score)| {
                let breakdown = enhancements::apply(self.enhancement_scorer.as_ref(), score, &article);
                (article, sim, breakdown.enhanced_score)
            })
            .collect();
        enhanced.sort_by(|a, b| b.2.partial_cmp(&a.2).unwrap_or(std::cmp::Ordering::Equal));

        // Funnel balancing: greedily keep a documented distribution across
        // awareness/consideration/decision, falling back to the unbalanced
        // ranking when a stage doesn't have enough candidates (§4.H step 9).
        let hybrid = funnel_balance(enhanced, request.max_links.max(1) * 3);

        let candidates_considered = hybrid.len();

        // Anchor selection: try the LLM first, fall back to the anchor
        // finder for anything it couldn't verify verbatim (§3 invariant
        // anchor-verbatim). Skipped entirely when the caller opts out of
        // LLM analysis.
        let llm_anchors = if request.use_claude_analysis {
            let llm_candidates: Vec<LlmAnchorCandidate> = hybrid
                .iter()
                .map(|(article, _, _)| LlmAnchorCandidate { target_id: article.post_id, anchor: article.title.clone() })
                .collect();
            self.llm
                .select_anchors(&request.content, &llm_candidates)
                .await
                .unwrap_or_default()
        } else {
            Vec::new()
        };

        let lower_content = request.content.to_lowercase();
        let mut used_anchors: HashSet<String> = HashSet::new();
        let mut proposals = Vec::new();

        for (article, _sim, hybrid_score_value) in &hybrid {
            if proposals.len() >= request.max_links {
                break;
            }

            let verified = llm_anchors
                .iter()
                .find(|a| a.target_id == article.post_id)
                .filter(|a| lower_content.contains(&a.anchor.to_lowercase()))
                .map(|a| a.anchor.clone());

            let anchor_text = match verified {
                Some(anchor) => anchor,
                None => match anchor_finder::find_anchor(&article.title, &plain_body, &used_anchors) {
                    Some(found) => found.text,
                    None => continue,
                },
            };

            if used_anchors.contains(&anchor_text.to_lowercase()) {
                continue;
            }

            let offset = lower_content.find(&anchor_text.to_lowercase()).unwrap_or(0);
            let seo = score_link(&self.seo_cache, &SeoScoreInput {
                source: &source,
                target: article,
                anchor: &anchor_text,
                anchor_offset: offset,
                source_plain_body: &plain_body,
                source_html_body: &request.content,
            });
            if !seo.allowed {
                continue;
            }

            used_anchors.insert(anchor_text.to_lowercase());
            proposals.push(LinkProposal {
                target_id: article.post_id,
                target_url: article.url.clone(),
                anchor_text,
                hybrid_score: *hybrid_score_value,
                seo_score: seo.score,
            });
        }

        proposals.sort_by(|a, b| {
            let a_combined = a.hybrid_score + 0.2 * a.seo_score;
            let b_combined = b.hybrid_score + 0.2 * b.seo_score;
            b_combined.partial_cmp(&a_combined).unwrap_or(std::cmp::Ordering::Equal)
        });
        proposals.truncate(request.max_links);

        let mut linked_content = None;
        let mut links_inserted = 0;
        if request.auto_insert {
            let mut html_body = request.content.clone();
            for proposal in &proposals {
                if let Some(updated) = html::insert_link(&html_body, &proposal.anchor_text, &proposal.target_url) {
                    html_body = updated;
                    links_inserted += 1;
                    self.seo_cache.track_anchor_usage(source.post_id, proposal.target_id, &proposal.anchor_text);
                    self.persist_link_async(source.post_id, proposal.target_id, proposal.anchor_text.clone());
                }
            }
            linked_content = Some(html_body);
        }

        let mut funnel_distribution: std::collections::HashMap<String, usize> = std::collections::HashMap::new();
        for proposal in &proposals {
            if let Some((article, ..)) = hybrid.iter().find(|(a, ..)| a.post_id == proposal.target_id) {
                *funnel_distribution.entry(funnel_stage_label(article.funnel_stage).to_string()).or_insert(0) += 1;
            }
        }

        let stats = SmartLinkStats {
            candidates_found: candidates_considered,
            passed_scoring,
            average_score,
            links_generated: proposals.len(),
            links_inserted,
            funnel_distribution,
            velocity_status: "not_tracked".to_string(),
            entity_based_candidates,
            cross_encoder_reranked,
            skipped: false,
        };

        Ok(SmartLinkResponse {
            success: true,
            links: proposals,
            linked_content,
            stats,
            message: None,
            cached: false,
            deduplicated: false,
        })
    }

    /// Fire-and-forget persistence of a newly inserted link (§4.H step 12,
    /// §7: post-insert persistence logs and swallows errors rather than
    /// failing the request that already succeeded).
    fn persist_link_async(&self, source_id: i64, target_id: i64, anchor: String) {
        let catalog = self.catalog.clone();
        tokio::spawn(async move {
            if let Ok(Some(mut article)) = catalog.get(source_id).await {
                article.outbound_links.push(OutboundLink {
                    target_id,
                    anchor,
                    created_at: chrono::Utc::now(),
                });
                if let Err(err) = catalog.upsert(article).await {
                    tracing::error!(error = %err, source_id, target_id, "failed to persist inserted link");
                }
            }
            if let Err(err) = catalog.increment_inbound_links(target_id).await {
                tracing::error!(error = %err, target_id, "failed to increment inbound link count");
            }
        });
    }
}

fn funnel_stage_label(stage: FunnelStage) -> &'static str {
    match stage {
        FunnelStage::Awareness => "awareness",
        FunnelStage::Consideration => "consideration",
        FunnelStage::Decision => "decision",
        FunnelStage::Unknown => "unknown",
    }
}

/// Greedily keeps a documented distribution across the three named funnel
/// stages, filling any quota a stage can't meet with the best remaining
/// candidates regardless of stage (§4.H step 9).
fn funnel_balance(ranked: Vec<(Article, f32, f64)>, max_candidates: usize) -> Vec<(Article, f32, f64)> {
    if max_candidates == 0 || ranked.is_empty() {
        return vec![];
    }

    let quota = max_candidates.div_ceil(FUNNEL_STAGES.len());
    let mut stage_counts: std::collections::HashMap<FunnelStage, usize> = std::collections::HashMap::new();
    let mut selected = Vec::with_capacity(max_candidates);
    let mut leftovers = Vec::new();

    for item in ranked {
        if selected.len() >= max_candidates {
            leftovers.push(item);
            continue;
        }
        let count = stage_counts.entry(item.0.funnel_stage).or_insert(0);
        if *count < quota {
            *count += 1;
            selected.push(item);
        } else {
            leftovers.push(item);
        }
    }

    for item in leftovers {
        if selected.len() >= max_candidates {
            break;
        }
        selected.push(item);
    }

    selected
}

fn empty_response(message: Option<String>) -> SmartLinkResponse {
    SmartLinkResponse {
        success: true,
        links: vec![],
        linked_content: None,
        stats: SmartLinkStats::default(),
        message,
        cached: false,
        deduplicated: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::article::{ContentLifespan, DifficultyLevel, FunnelStage};
    use crate::catalog::InMemoryCatalog;
    use crate::embeddings::normalize;
    use crate::llm::{AutoAnalysis, MetaTags};
    use async_trait::async_trait;
    use chrono::Utc;

    struct StubEmbeddings;

    #[async_trait]
    impl EmbeddingClient for StubEmbeddings {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            let mut v = vec![text.len() as f32, 1.0];
            normalize(&mut v);
            Ok(v)
        }
    }

    struct StubLlm;

    #[async_trait]
    impl LlmClient for StubLlm {
        async fn summarize(&self, _text: &str) -> Result<String> {
            Ok(String::new())
        }
        async fn extract_keywords(&self, _text: &str) -> Result<Vec<String>> {
            Ok(vec![])
        }
        async fn auto_analyze(&self, _title: &str, _body: &str) -> Result<AutoAnalysis> {
            Ok(AutoAnalysis::default())
        }
        async fn generate_meta(&self, _title: &str, _summary: &str) -> Result<MetaTags> {
            Ok(MetaTags::default())
        }
        async fn select_anchors(
            &self,
            _source_body: &str,
            _candidates: &[LlmAnchorCandidate],
        ) -> Result<Vec<LlmAnchorCandidate>> {
            Ok(vec![])
        }
        async fn extract_anchor_suggestions(&self, _text: &str) -> Result<Vec<String>> {
            Ok(vec![])
        }
        async fn extract_questions(&self, _text: &str) -> Result<Vec<String>> {
            Ok(vec![])
        }
        async fn cross_encoder_rerank(&self, _query: &str, candidates: &[String]) -> Result<Vec<f32>> {
            Ok(vec![0.8; candidates.len()])
        }
    }

    fn article(post_id: i64, title: &str, content_type: ContentType) -> Article {
        Article {
            post_id,
            title: title.to_string(),
            url: format!("https://example.com/{post_id}"),
            slug: format!("article-{post_id}"),
            content_type,
            embedding: {
                let mut v = vec![(title.len() + post_id as usize) as f32, 1.0];
                normalize(&mut v);
                v
            },
            summary: title.to_string(),
            main_topics: vec![],
            semantic_keywords: vec![title.to_lowercase()],
            suggested_anchors: vec![],
            questions_answered: vec![],
            topic_cluster: "general".into(),
            related_clusters: vec![],
            funnel_stage: FunnelStage::Awareness,
            target_persona: String::new(),
            difficulty_level: DifficultyLevel::Intermediate,
            content_lifespan: ContentLifespan::Evergreen,
            quality_score: 80,
            is_pillar: false,
            inbound_anchors: vec![],
            outbound_links: vec![],
            inbound_link_count: 5,
            dismissed_links: vec![],
            published_at: Utc::now(),
            updated_at: Utc::now(),
            entities: vec![],
        }
    }

    async fn build_recommender() -> (Recommender, Arc<InMemoryCatalog>) {
        let catalog = Arc::new(InMemoryCatalog::new());
        catalog.upsert(article(1, "Cap Rate Guide", ContentType::Post)).await.unwrap();
        catalog
            .upsert(article(2, "Rental Cash Flow Basics", ContentType::Post))
            .await
            .unwrap();

        let seo_cache = Arc::new(SeoCache::new());
        seo_cache.refresh(vec![
            article(1, "Cap Rate Guide", ContentType::Post),
            article(2, "Rental Cash Flow Basics", ContentType::Post),
        ]);

        let recommender = Recommender::new(
            catalog.clone(),
            Arc::new(StubEmbeddings),
            Arc::new(StubLlm),
            seo_cache,
        );
        (recommender, catalog)
    }

    #[tokio::test]
    async fn max_links_zero_returns_empty_with_message() {
        let (recommender, _) = build_recommender().await;
        let response = recommender
            .recommend(SmartLinkRequest {
                post_id: 1,
                content: "<p>Cash flow matters a lot.</p>".to_string(),
                content_type: None,
                max_links: 0,
                strict_silo: false,
                auto_insert: false,
                skip_cache: false,
                exclude_ids: vec![],
                min_score: default_min_score(),
                use_claude_analysis: true,
            })
            .await
            .unwrap();
        assert!(response.links.is_empty());
        assert!(response.message.is_some());
    }

    #[tokio::test]
    async fn page_source_always_returns_empty_links() {
        let catalog = Arc::new(InMemoryCatalog::new());
        catalog.upsert(article(1, "Our Pillar Page", ContentType::Page)).await.unwrap();
        let seo_cache = Arc::new(SeoCache::new());
        seo_cache.refresh(vec![article(1, "Our Pillar Page", ContentType::Page)]);
        let recommender = Recommender::new(catalog, Arc::new(StubEmbeddings), Arc::new(StubLlm), seo_cache);

        let response = recommender
            .recommend(SmartLinkRequest {
                post_id: 1,
                content: "<p>Some page content.</p>".to_string(),
                content_type: None,
                max_links: 3,
                strict_silo: false,
                auto_insert: false,
                skip_cache: false,
                exclude_ids: vec![],
                min_score: default_min_score(),
                use_claude_analysis: true,
            })
            .await
            .unwrap();
        assert!(response.links.is_empty());
        assert_eq!(response.message.as_deref(), Some("Pages do not receive automatic links"));
    }

    #[tokio::test]
    async fn cached_second_call_is_marked_cached() {
        let (recommender, _) = build_recommender().await;
        let request = SmartLinkRequest {
            post_id: 1,
            content: "<p>Rental cash flow matters a lot for every investor out there.</p>".to_string(),
            content_type: None,
            max_links: 1,
            strict_silo: false,
            auto_insert: false,
            skip_cache: false,
            exclude_ids: vec![],
            min_score: default_min_score(),
            use_claude_analysis: true,
        };
        let first = recommender.recommend(request.clone()).await.unwrap();
        let second = recommender.recommend(request).await.unwrap();
        assert!(!first.cached);
        assert!(second.cached);
        assert_eq!(first.links.len(), second.links.len());
    }

    #[tokio::test]
    async fn dismissed_targets_never_reappear_as_proposals() {
        let (recommender, _) = build_recommender().await;
        recommender.seo_cache.dismiss(1, 2, Some("not relevant".to_string()));

        let response = recommender
            .recommend(SmartLinkRequest {
                post_id: 1,
                content: "<p>Rental cash flow matters a lot for every investor out there.</p>".to_string(),
                content_type: None,
                max_links: 1,
                strict_silo: false,
                auto_insert: false,
                skip_cache: false,
                exclude_ids: vec![],
                min_score: default_min_score(),
                use_claude_analysis: true,
            })
            .await
            .unwrap();

        assert!(response.links.iter().all(|l| l.target_id != 2));
    }
}
