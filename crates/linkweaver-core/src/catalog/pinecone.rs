//! Reqwest-based client for a Pinecone-like managed vector index. Article
//! fields are serialized into the vector's metadata payload (§6: "Article
//! metadata fields as JSON scalars/lists in the vector index").

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::{QueryMatch, VectorCatalog};
use crate::article::Article;
use crate::error::{Error, Result};

#[derive(Debug, Clone)]
pub struct PineconeCatalog {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    index: String,
}

impl PineconeCatalog {
    pub fn new(api_key: impl Into<String>, index: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: "https://api.pinecone.io".to_string(),
            api_key: api_key.into(),
            index: index.into(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn vector_key(&self, post_id: i64) -> String {
        format!("article-{post_id}")
    }
}

#[async_trait]
impl VectorCatalog for PineconeCatalog {
    async fn upsert(&self, article: Article) -> Result<()> {
        let metadata = serde_json::to_value(&article).map_err(|e| Error::Catalog(e.to_string()))?;
        let body = json!({
            "vectors": [{
                "id": self.vector_key(article.post_id),
                "values": article.embedding,
                "metadata": metadata,
            }],
        });
        let response = self
            .client
            .post(format!("{}/vectors/upsert", self.base_url))
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-Index", &self.index)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Catalog(e.to_string()))?;
        ensure_success(response).await
    }

    async fn get(&self, post_id: i64) -> Result<Option<Article>> {
        let response = self
            .client
            .get(format!("{}/vectors/fetch", self.base_url))
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-Index", &self.index)
            .query(&[("ids", self.vector_key(post_id))])
            .send()
            .await
            .map_err(|e| Error::Catalog(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Error::Catalog(response.status().to_string()));
        }

        let body: serde_json::Value = response.json().await.map_err(|e| Error::Catalog(e.to_string()))?;
        let key = self.vector_key(post_id);
        match body.get("vectors").and_then(|v| v.get(key.as_str())).and_then(|v| v.get("metadata")) {
            Some(metadata) => Ok(serde_json::from_value(metadata.clone()).ok()),
            None => Ok(None),
        }
    }

    async fn delete(&self, post_id: i64) -> Result<()> {
        let response = self
            .client
            .post(format!("{}/vectors/delete", self.base_url))
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-Index", &self.index)
            .json(&json!({ "ids": [self.vector_key(post_id)] }))
            .send()
            .await
            .map_err(|e| Error::Catalog(e.to_string()))?;
        ensure_success(response).await
    }

    async fn query(&self, vector: &[f32], top_k: usize, exclude_ids: &[i64]) -> Result<Vec<QueryMatch>> {
        let response = self
            .client
            .post(format!("{}/query", self.base_url))
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-Index", &self.index)
            .json(&json!({
                "vector": vector,
                "topK": top_k + exclude_ids.len(),
                "includeMetadata": true,
            }))
            .send()
            .await
            .map_err(|e| Error::Catalog(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Error::Catalog(response.status().to_string()));
        }

        #[derive(Deserialize)]
        struct QueryResponse {
            matches: Vec<Match>,
        }
        #[derive(Deserialize)]
        struct Match {
            score: f32,
            metadata: serde_json::Value,
        }

        let parsed: QueryResponse = response.json().await.map_err(|e| Error::Catalog(e.to_string()))?;
        let results = parsed
            .matches
            .into_iter()
            .filter_map(|m| {
                let article: Article = serde_json::from_value(m.metadata).ok()?;
                if exclude_ids.contains(&article.post_id) {
                    None
                } else {
                    Some(QueryMatch { article, score: m.score })
                }
            })
            .take(top_k)
            .collect();
        Ok(results)
    }

    async fn list_all(&self) -> Result<Vec<Article>> {
        let response = self
            .client
            .get(format!("{}/vectors/list", self.base_url))
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-Index", &self.index)
            .send()
            .await
            .map_err(|e| Error::Catalog(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Error::Catalog(response.status().to_string()));
        }

        #[derive(Deserialize)]
        struct ListResponse {
            vectors: Vec<ListedVector>,
        }
        #[derive(Deserialize)]
        struct ListedVector {
            metadata: serde_json::Value,
        }

        let parsed: ListResponse = response.json().await.map_err(|e| Error::Catalog(e.to_string()))?;
        Ok(parsed
            .vectors
            .into_iter()
            .filter_map(|v| serde_json::from_value(v.metadata).ok())
            .collect())
    }

    async fn increment_inbound_links(&self, post_id: i64) -> Result<()> {
        if let Some(mut article) = self.get(post_id).await? {
            article.inbound_link_count += 1;
            self.upsert(article).await
        } else {
            Ok(())
        }
    }
}

async fn ensure_success(response: reqwest::Response) -> Result<()> {
    if response.status().is_success() {
        Ok(())
    } else {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(Error::Catalog(format!("{status}: {body}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::article::{ContentLifespan, ContentType, DifficultyLevel, FunnelStage};
    use chrono::Utc;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fixture_article() -> Article {
        Article {
            post_id: 42,
            title: "Cap Rate Guide".into(),
            url: "https://example.com/42".into(),
            slug: "cap-rate-guide".into(),
            content_type: ContentType::Post,
            embedding: vec![0.1, 0.2],
            summary: "A guide to cap rates.".into(),
            main_topics: vec![],
            semantic_keywords: vec![],
            suggested_anchors: vec![],
            questions_answered: vec![],
            topic_cluster: "real-estate".into(),
            related_clusters: vec![],
            funnel_stage: FunnelStage::Awareness,
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

    #[tokio::test]
    async fn get_returns_none_when_the_vector_is_absent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/vectors/fetch"))
            .and(header("Api-Key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "vectors": {} })))
            .mount(&server)
            .await;

        let catalog = PineconeCatalog::new("test-key", "articles").with_base_url(server.uri());
        assert!(catalog.get(42).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn get_deserializes_article_metadata_when_present() {
        let server = MockServer::start().await;
        let article = fixture_article();
        Mock::given(method("GET"))
            .and(path("/vectors/fetch"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "vectors": { "article-42": { "metadata": serde_json::to_value(&article).unwrap() } }
            })))
            .mount(&server)
            .await;

        let catalog = PineconeCatalog::new("test-key", "articles").with_base_url(server.uri());
        let fetched = catalog.get(42).await.unwrap().unwrap();
        assert_eq!(fetched.post_id, 42);
        assert_eq!(fetched.title, "Cap Rate Guide");
    }

    #[tokio::test]
    async fn upsert_surfaces_server_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/vectors/upsert"))
            .respond_with(ResponseTemplate::new(500).set_body_string("index unavailable"))
            .mount(&server)
            .await;

        let catalog = PineconeCatalog::new("test-key", "articles").with_base_url(server.uri());
        let err = catalog.upsert(fixture_article()).await.unwrap_err();
        assert!(err.to_string().contains("500"));
    }
}

