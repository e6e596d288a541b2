//! Internal-linking intelligence engine.
//!
//! Owns catalog sync enrichment, the link recommender pipeline, the
//! site-wide SEO cache, and the link auditor. The CMS plugin, the managed
//! vector index, the LLM provider, and the embedding provider are external
//! collaborators; this crate talks to them through the
//! [`catalog::VectorCatalog`], [`llm::LlmClient`], and
//! [`embeddings::EmbeddingClient`] traits rather than assuming a specific
//! vendor.

pub mod anchor_finder;
pub mod article;
pub mod auditor;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod embeddings;
pub mod enhancements;
pub mod entity;
pub mod error;
pub mod html;
pub mod llm;
pub mod recommender;
pub mod scoring;
pub mod text;

pub use article::Article;
pub use auditor::{LinkAuditReport, LinkAuditor};
pub use config::Config;
pub use error::{Error, Result};
pub use recommender::{Recommender, SmartLinkRequest, SmartLinkResponse};
pub use scoring::SeoCache;
