//! In-process catalog used by tests and local development. Not wired into
//! the server by default; the real deployment targets [`super::PineconeCatalog`].

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use super::{QueryMatch, VectorCatalog};
use crate::article::Article;
use crate::embeddings::cosine_similarity;
use crate::error::Result;

#[derive(Default)]
pub struct InMemoryCatalog {
    articles: RwLock<HashMap<i64, Article>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VectorCatalog for InMemoryCatalog {
    async fn upsert(&self, article: Article) -> Result<()> {
        self.articles.write().unwrap().insert(article.post_id, article);
        Ok(())
    }

    async fn get(&self, post_id: i64) -> Result<Option<Article>> {
        Ok(self.articles.read().unwrap().get(&post_id).cloned())
    }

    async fn delete(&self, post_id: i64) -> Result<()> {
        self.articles.write().unwrap().remove(&post_id);
        Ok(())
    }

    async fn query(&self, vector: &[f32], top_k: usize, exclude_ids: &[i64]) -> Result<Vec<QueryMatch>> {
        let mut scored: Vec<QueryMatch> = self
            .articles
            .read()
            .unwrap()
            .values()
            .filter(|a| !exclude_ids.contains(&a.post_id))
            .map(|a| QueryMatch { article: a.clone(), score: cosine_similarity(vector, &a.embedding) })
            .collect();
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);
        Ok(scored)
    }

    async fn list_all(&self) -> Result<Vec<Article>> {
        Ok(self.articles.read().unwrap().values().cloned().collect())
    }

    async fn increment_inbound_links(&self, post_id: i64) -> Result<()> {
        if let Some(article) = self.articles.write().unwrap().get_mut(&post_id) {
            article.inbound_link_count += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::article::{ContentLifespan, ContentType, DifficultyLevel, FunnelStage};
    use chrono::Utc;

    fn article(post_id: i64, embedding: Vec<f32>) -> Article {
        Article {
            post_id,
            title: format!("Article {post_id}"),
            url: format!("https://example.com/{post_id}"),
            slug: format!("article-{post_id}"),
            content_type: ContentType::Post,
            embedding,
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
    async fn upsert_is_idempotent() {
        let catalog = InMemoryCatalog::new();
        catalog.upsert(article(1, vec![1.0, 0.0])).await.unwrap();
        catalog.upsert(article(1, vec![1.0, 0.0])).await.unwrap();
        assert_eq!(catalog.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delete_then_get_returns_none() {
        let catalog = InMemoryCatalog::new();
        catalog.upsert(article(1, vec![1.0, 0.0])).await.unwrap();
        catalog.delete(1).await.unwrap();
        assert!(catalog.get(1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn query_excludes_requested_ids() {
        let catalog = InMemoryCatalog::new();
        catalog.upsert(article(1, vec![1.0, 0.0])).await.unwrap();
        catalog.upsert(article(2, vec![1.0, 0.0])).await.unwrap();
        let results = catalog.query(&[1.0, 0.0], 10, &[2]).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].article.post_id, 1);
    }
}
