//! The `Article` entity and its nested link-state records (§3 DATA MODEL).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Post,
    Page,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FunnelStage {
    Awareness,
    Consideration,
    Decision,
    #[default]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DifficultyLevel {
    Beginner,
    #[default]
    Intermediate,
    Advanced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentLifespan {
    #[default]
    Evergreen,
    Timely,
    Seasonal,
}

/// Classification of an inbound anchor's text, used by the anchor-usage
/// cache and the per-link SEO score (§4.E steps 2-3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnchorType {
    Branded,
    ExactMatch,
    PartialMatch,
    Generic,
    NakedUrl,
    Natural,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundAnchor {
    pub text: String,
    pub source_id: i64,
    pub anchor_type: AnchorType,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboundLink {
    pub target_id: i64,
    pub anchor: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DismissedLink {
    pub target_id: i64,
    pub dismissed_at: DateTime<Utc>,
    pub reason: Option<String>,
}

/// A single article in the vector catalog. `post_id` is the externally
/// assigned CMS identity; upsert overwrites by `post_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub post_id: i64,
    pub title: String,
    pub url: String,
    pub slug: String,
    pub content_type: ContentType,

    pub embedding: Vec<f32>,
    pub summary: String,
    pub main_topics: Vec<String>,
    pub semantic_keywords: Vec<String>,
    pub suggested_anchors: Vec<String>,
    pub questions_answered: Vec<String>,

    pub topic_cluster: String,
    pub related_clusters: Vec<String>,
    pub funnel_stage: FunnelStage,
    pub target_persona: String,
    pub difficulty_level: DifficultyLevel,
    pub content_lifespan: ContentLifespan,
    /// 1..=100
    pub quality_score: u8,
    pub is_pillar: bool,

    pub inbound_anchors: Vec<InboundAnchor>,
    pub outbound_links: Vec<OutboundLink>,
    pub inbound_link_count: u32,
    pub dismissed_links: Vec<DismissedLink>,

    pub published_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// Entities extracted by the LLM's auto-analyze operation during sync
    /// (§4.F — entity extraction is part of the auto-analyze contract).
    #[serde(default)]
    pub entities: Vec<String>,
}

impl Article {
    /// Enforces the invariant: `is_pillar` is true only when
    /// `content_type == Page`.
    pub fn enforce_pillar_invariant(&mut self) {
        if self.content_type != ContentType::Page {
            self.is_pillar = false;
        }
    }

    pub fn is_dismissed(&self, target_id: i64) -> bool {
        self.dismissed_links.iter().any(|d| d.target_id == target_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(content_type: ContentType) -> Article {
        Article {
            post_id: 1,
            title: "Title".into(),
            url: "https://example.com/title".into(),
            slug: "title".into(),
            content_type,
            embedding: vec![0.0; 8],
            summary: String::new(),
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
            quality_score: 50,
            is_pillar: true,
            inbound_anchors: vec![],
            outbound_links: vec![],
            inbound_link_count: 0,
            dismissed_links: vec![],
            published_at: Utc::now(),
            updated_at: Utc::now(),
            entities: vec![],
        }
    }

    #[test]
    fn pillar_forced_false_for_post() {
        let mut a = sample(ContentType::Post);
        a.enforce_pillar_invariant();
        assert!(!a.is_pillar);
    }

    #[test]
    fn pillar_preserved_for_page() {
        let mut a = sample(ContentType::Page);
        a.enforce_pillar_invariant();
        assert!(a.is_pillar);
    }
}
