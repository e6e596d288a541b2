//! Per-recommendation score enhancements (§4.H step 8). Seasonal boost,
//! E-E-A-T, and link-velocity are referenced by name upstream but their
//! numeric factors were never pinned down, so each is a pluggable no-op
//! here — swap an `EnhancementScorer` implementation in without touching
//! the recommender pipeline. Decay is concrete: it is driven by
//! `contentLifespan` and how long ago the target was last updated.

use chrono::Utc;
use serde::Serialize;

use crate::article::{Article, ContentLifespan};

const SEASONAL_STALE_AGE_DAYS: i64 = 365;
const TIMELY_STALE_AGE_DAYS: i64 = 120;
const SEASONAL_DECAY_PENALTY: f64 = 0.08;
const TIMELY_DECAY_PENALTY: f64 = 0.05;

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct EnhancementBreakdown {
    pub seasonal_boost: f64,
    pub decay: f64,
    pub eeat: f64,
    pub velocity_penalty: f64,
    pub enhanced_score: f64,
}

/// A pluggable per-candidate score adjustment applied after hybrid scoring.
pub trait EnhancementScorer: Send + Sync {
    /// Multiplicative factor applied to the base score. `1.0` is neutral.
    fn seasonal_boost(&self, _target: &Article) -> f64 {
        1.0
    }

    /// Additive authority/trust signal. Defaults to no contribution.
    fn eeat(&self, _target: &Article) -> f64 {
        0.0
    }

    /// Additive penalty (expressed as a negative number) for targets that
    /// are accumulating inbound links too fast. Defaults to no penalty.
    fn velocity_penalty(&self, _target: &Article) -> f64 {
        0.0
    }
}

/// Default scorer: seasonal boost neutral, E-E-A-T and velocity no-op.
pub struct NoOpEnhancements;

impl EnhancementScorer for NoOpEnhancements {}

fn decay_penalty(target: &Article) -> f64 {
    let age_days = (Utc::now() - target.updated_at).num_days();
    match target.content_lifespan {
        ContentLifespan::Evergreen => 0.0,
        ContentLifespan::Seasonal if age_days > SEASONAL_STALE_AGE_DAYS => -SEASONAL_DECAY_PENALTY,
        ContentLifespan::Timely if age_days > TIMELY_STALE_AGE_DAYS => -TIMELY_DECAY_PENALTY,
        _ => 0.0,
    }
}

pub fn apply(scorer: &dyn EnhancementScorer, base_score: f64, target: &Article) -> EnhancementBreakdown {
    let seasonal_boost = scorer.seasonal_boost(target);
    let decay = decay_penalty(target);
    let eeat = scorer.eeat(target);
    let velocity_penalty = scorer.velocity_penalty(target);
    let enhanced_score = base_score * seasonal_boost + decay + eeat + velocity_penalty;
    EnhancementBreakdown { seasonal_boost, decay, eeat, velocity_penalty, enhanced_score }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::article::{ContentType, DifficultyLevel, FunnelStage};
    use chrono::Duration;

    fn stale_seasonal_article() -> Article {
        Article {
            post_id: 1,
            title: "Winter Tax Tips".into(),
            url: "https://example.com/1".into(),
            slug: "winter-tax-tips".into(),
            content_type: ContentType::Post,
            embedding: vec![],
            summary: String::new(),
            main_topics: vec![],
            semantic_keywords: vec![],
            suggested_anchors: vec![],
            questions_answered: vec![],
            topic_cluster: "tax".into(),
            related_clusters: vec![],
            funnel_stage: FunnelStage::Awareness,
            target_persona: String::new(),
            difficulty_level: DifficultyLevel::Intermediate,
            content_lifespan: ContentLifespan::Seasonal,
            quality_score: 70,
            is_pillar: false,
            inbound_anchors: vec![],
            outbound_links: vec![],
            inbound_link_count: 0,
            dismissed_links: vec![],
            published_at: Utc::now() - Duration::days(400),
            updated_at: Utc::now() - Duration::days(400),
            entities: vec![],
        }
    }

    #[test]
    fn no_op_scorer_leaves_seasonal_boost_neutral_and_authority_signals_zero() {
        let breakdown = apply(&NoOpEnhancements, 0.8, &stale_seasonal_article());
        assert_eq!(breakdown.seasonal_boost, 1.0);
        assert_eq!(breakdown.eeat, 0.0);
        assert_eq!(breakdown.velocity_penalty, 0.0);
    }

    #[test]
    fn stale_seasonal_content_takes_a_decay_penalty() {
        let breakdown = apply(&NoOpEnhancements, 0.8, &stale_seasonal_article());
        assert!(breakdown.decay < 0.0);
        assert!(breakdown.enhanced_score < 0.8);
    }
}
