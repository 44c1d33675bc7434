//! Knowledge store trait — external similarity search over reference documents.
//!
//! The pipeline builds a deterministic query string, asks the store for the
//! top-k snippets, and passes them through to generation unmodified. An empty
//! result set is valid ("no additional context").

use crate::error::KnowledgeError;
use async_trait::async_trait;

/// An external similarity-search collaborator holding reference documents
/// (recipes, cuisine notes, ingredient combination rules).
#[async_trait]
pub trait KnowledgeStore: Send + Sync {
    /// A human-readable name for this store (e.g., "remote", "memory").
    fn name(&self) -> &str;

    /// Retrieve up to `top_k` snippets ranked by relevance to `query`.
    async fn retrieve(
        &self,
        query: &str,
        top_k: usize,
    ) -> std::result::Result<Vec<String>, KnowledgeError>;

    /// Health check — can we reach the store?
    async fn health_check(&self) -> std::result::Result<bool, KnowledgeError> {
        Ok(true)
    }
}
