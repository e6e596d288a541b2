//! Hybrid candidate scorer (§4.D): blends vector similarity with topical,
//! funnel, persona, quality, pillar, and content-type signals. Weights sum
//! to 1 so the combined score stays in roughly the same range as the
//! similarity it's built from.

use crate::article::{Article, ContentType, FunnelStage};

#[derive(Debug, Clone, Copy)]
pub struct HybridWeights {
    pub vector_similarity: f64,
    pub topic_cluster: f64,
    pub funnel_stage: f64,
    pub persona: f64,
    pub quality: f64,
    pub pillar: f64,
    pub content_type: f64,
}

impl Default for HybridWeights {
    fn default() -> Self {
        Self {
            vector_similarity: 0.45,
            topic_cluster: 0.15,
            funnel_stage: 0.1,
            persona: 0.1,
            quality: 0.1,
            pillar: 0.05,
            content_type: 0.05,
        }
    }
}

/// Scores `candidate` against `source` and a raw vector similarity already
/// computed by the caller. `strict_silo` drops any candidate whose cluster is
/// neither the source's own cluster nor one of its related clusters.
pub fn hybrid_score(
    source: &Article,
    candidate: &Article,
    similarity: f32,
    weights: HybridWeights,
    strict_silo: bool,
) -> Option<f64> {
    if strict_silo
        && candidate.topic_cluster != source.topic_cluster
        && !source.related_clusters.contains(&candidate.topic_cluster)
    {
        return None;
    }

    let topic_score = if candidate.topic_cluster == source.topic_cluster {
        1.0
    } else if source.related_clusters.contains(&candidate.topic_cluster) {
        0.5
    } else {
        0.0
    };

    let funnel_score = funnel_affinity(source.funnel_stage, candidate.funnel_stage);

    let persona_score = if !source.target_persona.is_empty()
        && source.target_persona.eq_ignore_ascii_case(&candidate.target_persona)
    {
        1.0
    } else {
        0.3
    };

    let quality_score = candidate.quality_score as f64 / 100.0;

    let pillar_score = if candidate.is_pillar { 1.0 } else { 0.0 };

    let content_type_score = match candidate.content_type {
        ContentType::Page => 1.0,
        ContentType::Post => 0.7,
    };

    Some(
        similarity as f64 * weights.vector_similarity
            + topic_score * weights.topic_cluster
            + funnel_score * weights.funnel_stage
            + persona_score * weights.persona
            + quality_score * weights.quality
            + pillar_score * weights.pillar
            + content_type_score * weights.content_type,
    )
}

/// Funnel stages adjacent in the awareness -> consideration -> decision
/// progression score higher than distant or unknown pairings, encouraging
/// links that move a reader one step down the funnel.
fn funnel_affinity(source: FunnelStage, target: FunnelStage) -> f64 {
    let rank = |s: FunnelStage| match s {
        FunnelStage::Awareness => 0,
        FunnelStage::Consideration => 1,
        FunnelStage::Decision => 2,
        FunnelStage::Unknown => -1,
    };
    let (a, b) = (rank(source), rank(target));
    if a < 0 || b < 0 {
        0.4
    } else {
        match (b - a).abs() {
            0 => 0.6,
            1 => 1.0,
            _ => 0.3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::article::{ContentLifespan, DifficultyLevel};
    use chrono::Utc;

    fn article(topic: &str, funnel: FunnelStage, content_type: ContentType) -> Article {
        Article {
            post_id: 1,
            title: "T".into(),
            url: "u".into(),
            slug: "s".into(),
            content_type,
            embedding: vec![],
            summary: String::new(),
            main_topics: vec![],
            semantic_keywords: vec![],
            suggested_anchors: vec![],
            questions_answered: vec![],
            topic_cluster: topic.into(),
            related_clusters: vec![],
            funnel_stage: funnel,
            target_persona: String::new(),
            difficulty_level: DifficultyLevel::Intermediate,
            content_lifespan: ContentLifespan::Evergreen,
            quality_score: 80,
            is_pillar: false,
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
    fn strict_silo_drops_cross_cluster_candidates() {
        let source = article("cluster-a", FunnelStage::Awareness, ContentType::Post);
        let candidate = article("cluster-b", FunnelStage::Awareness, ContentType::Post);
        assert!(hybrid_score(&source, &candidate, 0.9, HybridWeights::default(), true).is_none());
    }

    #[test]
    fn same_cluster_scores_higher_than_unrelated() {
        let source = article("cluster-a", FunnelStage::Awareness, ContentType::Post);
        let same = article("cluster-a", FunnelStage::Consideration, ContentType::Post);
        let other = article("cluster-z", FunnelStage::Awareness, ContentType::Post);
        let weights = HybridWeights::default();
        let same_score = hybrid_score(&source, &same, 0.5, weights, false).unwrap();
        let other_score = hybrid_score(&source, &other, 0.5, weights, false).unwrap();
        assert!(same_score > other_score);
    }
}
