//! Entity/knowledge-graph retriever (§4.F): a lightweight complement to
//! vector search. Scores candidates by entity overlap with the source
//! article rather than embedding distance, so it can surface relevant
//! articles the vector index's nearest-neighbor cutoff might miss.

use crate::article::Article;

#[derive(Debug, Clone)]
pub struct EntityCandidate {
    pub post_id: i64,
    pub score: f64,
    pub overlap: usize,
}

/// Base score 0.5 plus 0.1 per overlapping entity, matching §4.F's
/// `0.5 + 0.1 * overlap_count` formula. Articles with zero overlap are
/// excluded.
pub fn retrieve(source: &Article, candidates: &[Article]) -> Vec<EntityCandidate> {
    if source.entities.is_empty() {
        return Vec::new();
    }
    let source_entities: std::collections::HashSet<&str> =
        source.entities.iter().map(String::as_str).collect();

    let mut results: Vec<EntityCandidate> = candidates
        .iter()
        .filter(|c| c.post_id != source.post_id)
        .filter_map(|candidate| {
            let overlap = candidate
                .entities
                .iter()
                .filter(|e| source_entities.contains(e.as_str()))
                .count();
            if overlap == 0 {
                None
            } else {
                Some(EntityCandidate {
                    post_id: candidate.post_id,
                    score: 0.5 + 0.1 * overlap as f64,
                    overlap,
                })
            }
        })
        .collect();

    results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    results
}
