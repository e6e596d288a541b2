//! Reqwest-based client targeting an Anthropic-compatible messages
//! endpoint. Mirrors the teacher's sibling reqwest clients
//! (`OllamaClient`/`OpenRouterClient` in the aigent pack): one
//! `reqwest::Client`, a base URL, and an API key, with each operation
//! shaping its own single-turn prompt.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{
    extract_json_value, retry_with_backoff, AnchorCandidate, AutoAnalysis, LlmClient, MetaTags,
};
use crate::error::{Error, Result};

#[derive(Debug, Clone)]
pub struct AnthropicClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl AnthropicClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: "https://api.anthropic.com/v1".to_string(),
            api_key: api_key.into(),
            model: "claude-3-5-sonnet-latest".to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        retry_with_backoff(|| self.complete_once(prompt)).await
    }

    async fn complete_once(&self, prompt: &str) -> Result<String> {
        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            max_tokens: u32,
            messages: Vec<Msg<'a>>,
        }
        #[derive(Serialize)]
        struct Msg<'a> {
            role: &'a str,
            content: &'a str,
        }
        #[derive(Deserialize)]
        struct Resp {
            content: Vec<ContentBlock>,
        }
        #[derive(Deserialize)]
        struct ContentBlock {
            text: String,
        }

        let response = self
            .client
            .post(format!("{}/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&Req {
                model: &self.model,
                max_tokens: 2048,
                messages: vec![Msg { role: "user", content: prompt }],
            })
            .send()
            .await
            .map_err(|e| Error::Llm(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Llm(format!("{status}: {body}")));
        }

        let parsed: Resp = response.json().await.map_err(|e| Error::Llm(e.to_string()))?;
        Ok(parsed.content.into_iter().map(|b| b.text).collect::<Vec<_>>().join(""))
    }
}

#[async_trait]
impl LlmClient for AnthropicClient {
    async fn summarize(&self, text: &str) -> Result<String> {
        let prompt = format!(
            "Summarize the following article in 2-3 sentences, plain text only:\n\n{text}"
        );
        match self.complete(&prompt).await {
            Ok(summary) => Ok(summary.trim().to_string()),
            Err(err) => {
                tracing::warn!(error = %err, "summarize failed, falling back to truncation");
                Ok(fallback_summary(text))
            }
        }
    }

    async fn extract_keywords(&self, text: &str) -> Result<Vec<String>> {
        let prompt = format!(
            "Extract up to 8 SEO keywords from this article as a JSON array of strings, nothing else:\n\n{text}"
        );
        let response = self.complete(&prompt).await.unwrap_or_default();
        Ok(extract_json_value(&response)
            .and_then(|v| v.as_array().cloned())
            .map(|arr| arr.into_iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
            .unwrap_or_default())
    }

    async fn auto_analyze(&self, title: &str, body: &str) -> Result<AutoAnalysis> {
        let prompt = format!(
            "Analyze this article and respond with a single JSON object with keys: \
             summary (string), main_topics (array of strings), semantic_keywords (array of strings), \
             suggested_anchors (array of strings), questions_answered (array of strings), \
             topic_cluster (string), target_persona (string), quality_score (integer 1-100), \
             entities (array of strings). Title: {title}\n\nBody:\n{body}"
        );
        let response = self.complete(&prompt).await.unwrap_or_default();
        match extract_json_value(&response) {
            Some(value) => Ok(serde_json::from_value(value).unwrap_or_default()),
            None => {
                tracing::warn!("auto_analyze returned malformed JSON, using fallback defaults");
                Ok(AutoAnalysis {
                    summary: fallback_summary(body),
                    quality_score: 50,
                    ..Default::default()
                })
            }
        }
    }

    async fn generate_meta(&self, title: &str, summary: &str) -> Result<MetaTags> {
        let prompt = format!(
            "Write an SEO meta title (<=60 chars) and meta description (<=160 chars) for this \
             article as a JSON object {{\"title\": ..., \"description\": ...}}. \
             Article title: {title}\nSummary: {summary}"
        );
        let response = self.complete(&prompt).await.unwrap_or_default();
        Ok(extract_json_value(&response)
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or_else(|| MetaTags { title: title.to_string(), description: summary.to_string() }))
    }

    async fn select_anchors(
        &self,
        source_body: &str,
        candidates: &[AnchorCandidate],
    ) -> Result<Vec<AnchorCandidate>> {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }
        let candidate_list = json!(candidates
            .iter()
            .map(|c| json!({ "target_id": c.target_id, "anchor": c.anchor }))
            .collect::<Vec<_>>());
        let prompt = format!(
            "Given this source article body, pick the best anchor text for each candidate target \
             from phrases that literally appear in the body. Respond with a JSON array of \
             objects {{\"target_id\": ..., \"anchor\": ...}}. Candidates: {candidate_list}\n\n\
             Body:\n{source_body}"
        );
        let response = self.complete(&prompt).await.unwrap_or_default();
        Ok(extract_json_value(&response)
            .and_then(|v| v.as_array().cloned())
            .map(|arr| {
                arr.into_iter()
                    .filter_map(|v| serde_json::from_value::<AnchorCandidate>(v).ok())
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn extract_anchor_suggestions(&self, text: &str) -> Result<Vec<String>> {
        self.extract_keywords(text).await
    }

    async fn extract_questions(&self, text: &str) -> Result<Vec<String>> {
        let prompt = format!(
            "List up to 5 questions this article answers, as a JSON array of strings:\n\n{text}"
        );
        let response = self.complete(&prompt).await.unwrap_or_default();
        Ok(extract_json_value(&response)
            .and_then(|v| v.as_array().cloned())
            .map(|arr| arr.into_iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
            .unwrap_or_default())
    }

    async fn cross_encoder_rerank(&self, query: &str, candidates: &[String]) -> Result<Vec<f32>> {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }
        let numbered = candidates
            .iter()
            .enumerate()
            .map(|(i, c)| format!("{i}: {c}"))
            .collect::<Vec<_>>()
            .join("\n");
        let prompt = format!(
            "Score each candidate's relevance to the query on a 0.0-1.0 scale. Respond with a \
             JSON array of floats in the same order as the candidates.\n\nQuery: {query}\n\n\
             Candidates:\n{numbered}"
        );
        let response = self.complete(&prompt).await.unwrap_or_default();
        let scores: Vec<f32> = extract_json_value(&response)
            .and_then(|v| v.as_array().cloned())
            .map(|arr| arr.into_iter().filter_map(|v| v.as_f64()).map(|f| f as f32).collect())
            .unwrap_or_default();
        if scores.len() == candidates.len() {
            Ok(scores)
        } else {
            tracing::warn!("cross_encoder_rerank returned malformed scores, using neutral 0.5");
            Ok(vec![0.5; candidates.len()])
        }
    }
}

/// Fallback used when the LLM is unreachable or returns malformed output:
/// the first two sentences of the body, or a hard character truncation if
/// no sentence boundary is found (§7 upstream-malformed policy).
fn fallback_summary(text: &str) -> String {
    let sentences = crate::html::split_sentences(text);
    if sentences.len() >= 2 {
        format!("{} {}", sentences[0], sentences[1])
    } else if let Some(first) = sentences.first() {
        (*first).to_string()
    } else {
        text.chars().take(200).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn claude_reply(text: &str) -> serde_json::Value {
        json!({ "content": [{ "text": text }] })
    }

    #[tokio::test]
    async fn generate_meta_parses_the_json_object_from_the_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/messages"))
            .and(header("x-api-key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(claude_reply(
                "Here you go:\n```json\n{\"title\": \"Cap Rate Guide\", \"description\": \"Learn cap rates.\"}\n```",
            )))
            .mount(&server)
            .await;

        let client = AnthropicClient::new("test-key").with_base_url(server.uri());
        let tags = client.generate_meta("Cap Rate Guide", "A guide").await.unwrap();
        assert_eq!(tags.title, "Cap Rate Guide");
        assert_eq!(tags.description, "Learn cap rates.");
    }

    #[tokio::test]
    async fn auto_analyze_falls_back_on_malformed_json() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(claude_reply("not json at all")))
            .mount(&server)
            .await;

        let client = AnthropicClient::new("test-key").with_base_url(server.uri());
        let analysis = client.auto_analyze("Title", "Body").await.unwrap();
        assert_eq!(analysis.quality_score, 50);
        assert!(!analysis.summary.is_empty());
    }
}
