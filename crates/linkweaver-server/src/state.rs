//! Shared application state handed to every axum handler.

use std::sync::Arc;

use linkweaver_core::article::Article;
use linkweaver_core::auditor::LinkAuditor;
use linkweaver_core::catalog::{PineconeCatalog, VectorCatalog};
use linkweaver_core::embeddings::{EmbeddingClient, OpenAiEmbeddingClient};
use linkweaver_core::llm::{AnthropicClient, LlmClient};
use linkweaver_core::recommender::Recommender;
use linkweaver_core::{Config, SeoCache};

pub struct AppState {
    pub config: Config,
    pub catalog: Arc<dyn VectorCatalog>,
    pub embeddings: Arc<dyn EmbeddingClient>,
    pub llm: Arc<dyn LlmClient>,
    pub seo_cache: Arc<SeoCache>,
    pub recommender: Recommender,
    pub auditor: LinkAuditor,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let catalog: Arc<dyn VectorCatalog> =
            Arc::new(PineconeCatalog::new(config.pinecone_api_key.clone(), config.pinecone_index.clone()));
        let embeddings: Arc<dyn EmbeddingClient> =
            Arc::new(OpenAiEmbeddingClient::new(config.openai_api_key.clone()));
        let llm: Arc<dyn LlmClient> = Arc::new(AnthropicClient::new(config.anthropic_api_key.clone()));
        let seo_cache = Arc::new(SeoCache::new());

        let recommender = Recommender::new(catalog.clone(), embeddings.clone(), llm.clone(), seo_cache.clone());
        let auditor = LinkAuditor::new(catalog.clone(), embeddings.clone());

        Self { config, catalog, embeddings, llm, seo_cache, recommender, auditor }
    }

    /// Pulls the full catalog and rebuilds the SEO cache. Used both at
    /// startup and by the periodic background warmer (§4.E refresh,
    /// mirroring the teacher's periodic consolidation loop).
    pub async fn refresh_seo_cache(&self) -> linkweaver_core::Result<()> {
        let articles: Vec<Article> = self.catalog.list_all().await?;
        self.seo_cache.refresh(articles);
        Ok(())
    }
}
