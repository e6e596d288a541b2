//! Error types for the catalog, embedding, LLM, and scoring layers.

/// Crate-wide error type. Mirrors the teacher's per-module `thiserror` enums
/// (`VectorSearchError`, `RerankerError`, `StorageError`) but unified at the
/// crate boundary since callers (the recommender, the auditor, the HTTP
/// handlers) need to match on a single type.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    #[error("embedding provider error: {0}")]
    Embedding(String),

    #[error("LLM provider error: {0}")]
    Llm(String),

    #[error("vector catalog error: {0}")]
    Catalog(String),

    #[error("invalid input: {0}")]
    Validation(String),

    #[error("upstream request timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;
