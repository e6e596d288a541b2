//! Embedding client (§4.A): turns an article's title/summary/body into a
//! unit-norm vector. The embedding provider itself is an external HTTP
//! black box; this module owns the article-aware text composition and
//! normalization around it.

mod openai;

pub use openai::OpenAiEmbeddingClient;

use async_trait::async_trait;

use crate::error::Result;

/// Token budget for the composed embedding input. Providers bill and
/// truncate by token count; we approximate tokens as whitespace words times
/// a small fudge factor rather than pulling in a tokenizer dependency.
pub const TOKEN_BUDGET: usize = 8000;

#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    /// Embeds raw text and returns a unit-norm vector.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embeds an article by composing its title, summary, and body with
    /// the weighting described in §4.A: title and summary are repeated to
    /// bias the resulting vector toward topical signal before the full
    /// body is appended, then the whole thing is truncated to
    /// [`TOKEN_BUDGET`].
    async fn embed_article(&self, title: &str, summary: &str, body: &str) -> Result<Vec<f32>> {
        let composed = compose_article_text(title, summary, body);
        self.embed(&composed).await
    }
}

/// Builds the weighted text blob fed to the embedding provider. Title is
/// repeated 3x and summary 2x ahead of the body so short, topically dense
/// fields carry proportionally more weight in the resulting embedding than
/// their raw character count would suggest.
pub fn compose_article_text(title: &str, summary: &str, body: &str) -> String {
    let weighted = format!(
        "{title} {title} {title} {summary} {summary} {body}",
        title = title.trim(),
        summary = summary.trim(),
        body = body.trim(),
    );
    truncate_to_token_budget(&weighted, TOKEN_BUDGET)
}

fn truncate_to_token_budget(text: &str, budget: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() <= budget {
        text.split_whitespace().collect::<Vec<_>>().join(" ")
    } else {
        words[..budget].join(" ")
    }
}

/// Normalizes `vector` to unit length in place. No-ops on a zero vector
/// rather than dividing by zero, matching the provider contract that a
/// degenerate embedding is still a valid (if useless) vector.
pub fn normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        for v in vector.iter_mut() {
            *v /= norm;
        }
    }
}

/// Cosine similarity between two equal-length vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|v| v * v).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm_a <= f32::EPSILON || norm_b <= f32::EPSILON {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compose_weights_title_and_summary_ahead_of_body() {
        let composed = compose_article_text("Cap Rate", "Quick primer", "body body body");
        assert!(composed.matches("Cap").count() >= 3);
        assert!(composed.matches("primer").count() >= 2);
    }

    #[test]
    fn truncate_respects_budget() {
        let long = "word ".repeat(TOKEN_BUDGET * 2);
        let truncated = truncate_to_token_budget(&long, TOKEN_BUDGET);
        assert_eq!(truncated.split_whitespace().count(), TOKEN_BUDGET);
    }

    #[test]
    fn normalize_produces_unit_length() {
        let mut v = vec![3.0, 4.0];
        normalize(&mut v);
        let len = (v[0] * v[0] + v[1] * v[1]).sqrt();
        assert!((len - 1.0).abs() < 1e-5);
    }

    #[test]
    fn cosine_similarity_of_identical_vectors_is_one() {
        let v = vec![1.0, 2.0, 3.0];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-5);
    }
}
