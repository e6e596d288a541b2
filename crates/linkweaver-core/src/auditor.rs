//! Link auditor (§4.I): classifies an article's existing outbound links as
//! valid/broken/suboptimal, surfaces missing-link opportunities, and flags
//! topic clusters with redundant link patterns.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::anchor_finder;
use crate::article::Article;
use crate::catalog::VectorCatalog;
use crate::embeddings::{cosine_similarity, EmbeddingClient};
use crate::error::Result;
use crate::html;
use crate::scoring::hybrid_score;
use crate::scoring::hybrid::HybridWeights;

/// Similarity below which an existing link is flagged suboptimal rather
/// than valid (§4.I).
const SUBOPTIMAL_SIMILARITY_THRESHOLD: f32 = 0.7;
const OPPORTUNITY_RETRIEVAL_TOP_K: usize = 30;
const OPPORTUNITY_MIN_SCORE: f64 = 0.4;
const CLUSTER_REDUNDANCY_THRESHOLD: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkStatus {
    Valid,
    Broken,
    Suboptimal,
}

/// A link the caller reports as already present in the content, audited
/// against the catalog (§6 `existingLinks[]`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExistingLink {
    pub target_id: i64,
    pub anchor: String,
}

/// An alternative target that scores better than the one currently linked,
/// surfaced when a link is flagged suboptimal (§4.I).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BetterOption {
    pub target_id: i64,
    pub target_url: String,
    pub quality_score: u8,
    pub similarity: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditedLink {
    pub target_id: i64,
    pub anchor: String,
    pub status: LinkStatus,
    pub similarity: Option<f32>,
    #[serde(default)]
    pub better_options: Vec<BetterOption>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissingOpportunity {
    pub target_id: i64,
    pub target_url: String,
    pub anchor_text: String,
    pub hybrid_score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterRedundancy {
    pub topic_cluster: String,
    pub target_id: i64,
    pub link_count: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LinkAuditReport {
    pub links: Vec<AuditedLink>,
    pub missing_opportunities: Vec<MissingOpportunity>,
    pub cluster_redundancies: Vec<ClusterRedundancy>,
}

pub struct LinkAuditor {
    catalog: Arc<dyn VectorCatalog>,
    embeddings: Arc<dyn EmbeddingClient>,
}

impl LinkAuditor {
    pub fn new(catalog: Arc<dyn VectorCatalog>, embeddings: Arc<dyn EmbeddingClient>) -> Self {
        Self { catalog, embeddings }
    }

    /// `content` is the live body the CMS is about to save (§6 required
    /// field); `existing_links` are the links already present in it. Both
    /// are the caller's, not the stored article's, since the article may
    /// not yet reflect unsaved edits.
    pub async fn audit(
        &self,
        source: &Article,
        content: &str,
        existing_links: &[ExistingLink],
        max_suggestions: usize,
    ) -> Result<LinkAuditReport> {
        let links = self.classify_existing_links(source, existing_links).await?;

        let plain_body = html::strip_tags(content);
        let existing_targets: HashSet<i64> = existing_links.iter().map(|l| l.target_id).collect();
        let missing_opportunities = self
            .find_missing_opportunities(source, &plain_body, &existing_targets, max_suggestions)
            .await?;

        let cluster_redundancies = self.find_cluster_redundancies(source, existing_links);

        Ok(LinkAuditReport { links, missing_opportunities, cluster_redundancies })
    }

    async fn classify_existing_links(
        &self,
        source: &Article,
        existing_links: &[ExistingLink],
    ) -> Result<Vec<AuditedLink>> {
        let mut audited = Vec::with_capacity(existing_links.len());
        for link in existing_links {
            let Some(target) = self.catalog.get(link.target_id).await? else {
                audited.push(AuditedLink {
                    target_id: link.target_id,
                    anchor: link.anchor.clone(),
                    status: LinkStatus::Broken,
                    similarity: None,
                    better_options: vec![],
                });
                continue;
            };

            let anchor_embedding = self.embeddings.embed(&link.anchor).await?;
            let similarity = cosine_similarity(&anchor_embedding, &target.embedding);

            let exclude = vec![source.post_id, target.post_id];
            let alternatives = self
                .catalog
                .query(&anchor_embedding, OPPORTUNITY_RETRIEVAL_TOP_K, &exclude)
                .await?;

            let mut better_options: Vec<BetterOption> = alternatives
                .into_iter()
                .filter(|m| {
                    m.article.quality_score > target.quality_score && m.score > SUBOPTIMAL_SIMILARITY_THRESHOLD
                })
                .map(|m| BetterOption {
                    target_id: m.article.post_id,
                    target_url: m.article.url.clone(),
                    quality_score: m.article.quality_score,
                    similarity: m.score,
                })
                .collect();
            better_options.sort_by(|a, b| b.similarity.partial_cmp(&a.similarity).unwrap_or(std::cmp::Ordering::Equal));
            better_options.truncate(2);

            let status = if better_options.is_empty() { LinkStatus::Valid } else { LinkStatus::Suboptimal };

            audited.push(AuditedLink {
                target_id: link.target_id,
                anchor: link.anchor.clone(),
                status,
                similarity: Some(similarity),
                better_options,
            });
        }
        Ok(audited)
    }

    async fn find_missing_opportunities(
        &self,
        source: &Article,
        plain_body: &str,
        existing_targets: &HashSet<i64>,
        max_suggestions: usize,
    ) -> Result<Vec<MissingOpportunity>> {
        let embedding = self.embeddings.embed(plain_body).await?;
        let mut exclude: Vec<i64> = existing_targets.iter().copied().collect();
        exclude.push(source.post_id);

        let matches = self
            .catalog
            .query(&embedding, OPPORTUNITY_RETRIEVAL_TOP_K, &exclude)
            .await?;

        let weights = HybridWeights::default();
        let mut used_anchors: HashSet<String> = HashSet::new();
        let mut opportunities = Vec::new();

        for candidate_match in &matches {
            if opportunities.len() >= max_suggestions {
                break;
            }
            let Some(score) = hybrid_score(source, &candidate_match.article, candidate_match.score, weights, false)
            else {
                continue;
            };
            if score < OPPORTUNITY_MIN_SCORE {
                continue;
            }
            let Some(found) = anchor_finder::find_anchor(&candidate_match.article.title, plain_body, &used_anchors)
            else {
                continue;
            };
            used_anchors.insert(found.text.to_lowercase());
            opportunities.push(MissingOpportunity {
                target_id: candidate_match.article.post_id,
                target_url: candidate_match.article.url.clone(),
                anchor_text: found.text,
                hybrid_score: score,
            });
        }

        Ok(opportunities)
    }

    /// Flags targets linked to more than [`CLUSTER_REDUNDANCY_THRESHOLD`]
    /// times from within the same topic cluster, a sign of over-linking
    /// within a silo rather than spreading links across clusters.
    fn find_cluster_redundancies(&self, source: &Article, existing_links: &[ExistingLink]) -> Vec<ClusterRedundancy> {
        let mut counts: std::collections::HashMap<i64, usize> = std::collections::HashMap::new();
        for link in existing_links {
            *counts.entry(link.target_id).or_insert(0) += 1;
        }
        counts
            .into_iter()
            .filter(|(_, count)| *count > CLUSTER_REDUNDANCY_THRESHOLD)
            .map(|(target_id, count)| ClusterRedundancy {
                topic_cluster: source.topic_cluster.clone(),
                target_id,
                link_count: count,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::article::{ContentLifespan, ContentType, DifficultyLevel, FunnelStage, OutboundLink};
    use crate::catalog::InMemoryCatalog;
    use async_trait::async_trait;
    use chrono::Utc;

    struct StubEmbeddings;

    #[async_trait]
    impl EmbeddingClient for StubEmbeddings {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![1.0, 0.0])
        }
    }

    fn article(post_id: i64, quality_score: u8) -> Article {
        Article {
            post_id,
            title: format!("Article {post_id}"),
            url: format!("https://example.com/{post_id}"),
            slug: format!("article-{post_id}"),
            content_type: ContentType::Post,
            embedding: vec![1.0, 0.0],
            summary: "Some summary text about the topic.".into(),
            main_topics: vec![],
            semantic_keywords: vec![],
            suggested_anchors: vec![],
            questions_answered: vec![],
            topic_cluster: "general".into(),
            related_clusters: vec![],
            funnel_stage: FunnelStage::Unknown,
            target_persona: String::new(),
            difficulty_level: DifficultyLevel::Intermediate,
            content_lifespan: ContentLifespan::Evergreen,
            quality_score,
            is_pillar: false,
            inbound_anchors: vec![],
            outbound_links: vec![],
            inbound_link_count: 1,
            dismissed_links: vec![],
            published_at: Utc::now(),
            updated_at: Utc::now(),
            entities: vec![],
        }
    }

    #[tokio::test]
    async fn broken_link_has_no_target() {
        let catalog = Arc::new(InMemoryCatalog::new());
        let source = article(1, 80);
        catalog.upsert(source.clone()).await.unwrap();
        let existing_links = vec![ExistingLink { target_id: 999, anchor: "gone".into() }];

        let auditor = LinkAuditor::new(catalog, Arc::new(StubEmbeddings));
        let report = auditor.audit(&source, "<p>gone</p>", &existing_links, 5).await.unwrap();
        assert_eq!(report.links[0].status, LinkStatus::Broken);
    }

    #[tokio::test]
    async fn cluster_redundancy_flagged_above_threshold() {
        let catalog = Arc::new(InMemoryCatalog::new());
        let source = article(1, 80);
        catalog.upsert(source.clone()).await.unwrap();
        catalog.upsert(article(2, 80)).await.unwrap();
        let existing_links: Vec<ExistingLink> =
            (0..3).map(|_| ExistingLink { target_id: 2, anchor: "link".into() }).collect();

        let auditor = LinkAuditor::new(catalog, Arc::new(StubEmbeddings));
        let report = auditor.audit(&source, "<p>link link link</p>", &existing_links, 5).await.unwrap();
        assert_eq!(report.cluster_redundancies.len(), 1);
        assert_eq!(report.cluster_redundancies[0].link_count, 3);
    }

    #[tokio::test]
    async fn suboptimal_link_surfaces_better_options() {
        let catalog = Arc::new(InMemoryCatalog::new());
        let source = article(1, 80);
        let mut weak_target = article(2, 30);
        weak_target.embedding = vec![0.0, 1.0];
        let mut strong_alternative = article(3, 90);
        strong_alternative.embedding = vec![1.0, 0.0];
        catalog.upsert(source.clone()).await.unwrap();
        catalog.upsert(weak_target.clone()).await.unwrap();
        catalog.upsert(strong_alternative.clone()).await.unwrap();
        let existing_links = vec![ExistingLink { target_id: 2, anchor: "weak link".into() }];

        let auditor = LinkAuditor::new(catalog, Arc::new(StubEmbeddings));
        let report = auditor.audit(&source, "<p>weak link</p>", &existing_links, 5).await.unwrap();

        assert_eq!(report.links[0].status, LinkStatus::Suboptimal);
        assert!(!report.links[0].better_options.is_empty());
        assert_eq!(report.links[0].better_options[0].target_id, 3);
    }
}
