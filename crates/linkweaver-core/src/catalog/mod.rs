//! Vector catalog (§4.C): the article store, backed by an external
//! managed vector index. Articles and all their enrichment metadata are
//! stored as the index's per-vector metadata payload (§6 persisted state);
//! there is no separate database.

mod memory;
mod pinecone;

pub use memory::InMemoryCatalog;
pub use pinecone::PineconeCatalog;

use async_trait::async_trait;

use crate::article::Article;
use crate::error::Result;

#[derive(Debug, Clone)]
pub struct QueryMatch {
    pub article: Article,
    pub score: f32,
}

#[async_trait]
pub trait VectorCatalog: Send + Sync {
    /// Inserts or overwrites the article keyed by `post_id`. Idempotent:
    /// repeated upserts with the same content produce the same stored
    /// state (§3 invariant, §5 "no DB transactions").
    async fn upsert(&self, article: Article) -> Result<()>;

    async fn get(&self, post_id: i64) -> Result<Option<Article>>;

    async fn delete(&self, post_id: i64) -> Result<()>;

    /// Nearest-neighbor query by embedding, excluding `exclude_ids`.
    async fn query(&self, vector: &[f32], top_k: usize, exclude_ids: &[i64]) -> Result<Vec<QueryMatch>>;

    async fn list_all(&self) -> Result<Vec<Article>>;

    async fn list_pillars(&self) -> Result<Vec<Article>> {
        Ok(self.list_all().await?.into_iter().filter(|a| a.is_pillar).collect())
    }

    async fn increment_inbound_links(&self, post_id: i64) -> Result<()>;
}
