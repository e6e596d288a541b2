//! LLM client (§4.B): nine typed operations used across catalog sync and
//! the recommender pipeline. The provider itself is an external black box;
//! this module owns prompt shaping, JSON extraction, retry-with-backoff,
//! and the documented fallback defaults each operation falls back to when
//! the provider returns malformed output.

mod anthropic;
mod json_extract;

pub use anthropic::AnthropicClient;
pub use json_extract::{extract_json, extract_json_value};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::Result;

/// Short-lived operations (summarize, extract-keywords, generate-meta,
/// select-anchors): 60s deadline per §5.
pub const SHORT_TIMEOUT: Duration = Duration::from_secs(60);

/// Long-running operations (auto-analyze, batch-analyze, cross-encoder
/// rerank over many candidates): 300s deadline per §5.
pub const LONG_TIMEOUT: Duration = Duration::from_secs(300);

/// Auto-analyze result: the full set of enrichment fields populated during
/// catalog sync (§4.B auto-analyze, §9 Open Question (c) — entity
/// extraction is part of this contract).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AutoAnalysis {
    pub summary: String,
    pub main_topics: Vec<String>,
    pub semantic_keywords: Vec<String>,
    pub suggested_anchors: Vec<String>,
    pub questions_answered: Vec<String>,
    pub topic_cluster: String,
    pub target_persona: String,
    pub quality_score: u8,
    pub entities: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetaTags {
    pub title: String,
    pub description: String,
}

/// A candidate anchor/target pairing considered by `select_anchors`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnchorCandidate {
    pub target_id: i64,
    pub anchor: String,
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn summarize(&self, text: &str) -> Result<String>;

    async fn extract_keywords(&self, text: &str) -> Result<Vec<String>>;

    async fn auto_analyze(&self, title: &str, body: &str) -> Result<AutoAnalysis>;

    async fn generate_meta(&self, title: &str, summary: &str) -> Result<MetaTags>;

    /// Proposes anchor text for each candidate target. Callers MUST verify
    /// every returned anchor is a verbatim, case-insensitive substring of
    /// the source body (§3 invariant anchor-verbatim) before using it; this
    /// client makes no such guarantee about its own output.
    async fn select_anchors(
        &self,
        source_body: &str,
        candidates: &[AnchorCandidate],
    ) -> Result<Vec<AnchorCandidate>>;

    async fn extract_anchor_suggestions(&self, text: &str) -> Result<Vec<String>>;

    async fn extract_questions(&self, text: &str) -> Result<Vec<String>>;

    /// Analyzes articles in chunks of at most 10 (provider context-window
    /// courtesy limit), returning one `AutoAnalysis` per input article in
    /// order.
    async fn batch_analyze(&self, articles: &[(String, String)]) -> Result<Vec<AutoAnalysis>> {
        let mut results = Vec::with_capacity(articles.len());
        for chunk in articles.chunks(10) {
            for (title, body) in chunk {
                let analysis = self
                    .auto_analyze(title, body)
                    .await
                    .unwrap_or_else(|_| AutoAnalysis::default());
                results.push(analysis);
            }
        }
        Ok(results)
    }

    /// Re-scores `candidates` against `query` using a cross-encoder style
    /// prompt, returning scores in the same order as `candidates`.
    async fn cross_encoder_rerank(&self, query: &str, candidates: &[String]) -> Result<Vec<f32>>;
}

/// Retries `op` up to 3 attempts with 1s/2s/4s backoff, matching the
/// upstream-transient policy in §7. Used for the single-shot LLM calls
/// (not `batch_analyze`, which already isolates failures per-article).
pub async fn retry_with_backoff<F, Fut, T>(mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let delays = [Duration::from_secs(1), Duration::from_secs(2), Duration::from_secs(4)];
    let mut last_err = None;
    for delay in delays {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                tracing::warn!(error = %err, "llm call failed, retrying after {:?}", delay);
                last_err = Some(err);
                tokio::time::sleep(delay).await;
            }
        }
    }
    op().await.map_err(|err| {
        tracing::error!(error = %err, "llm call failed after retries");
        last_err.unwrap_or(err)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn retry_with_backoff_succeeds_after_failures() {
        let attempts = AtomicU32::new(0);
        let result = retry_with_backoff(|| {
            let n = attempts.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(crate::error::Error::Llm("transient".into()))
                } else {
                    Ok(42)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
    }
}
