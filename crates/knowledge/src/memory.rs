//! In-memory knowledge store.
//!
//! Holds embedded documents and ranks them by cosine similarity to the
//! embedded query. Useful for local setups and deterministic tests.

use crate::vector::cosine_similarity;
use async_trait::async_trait;
use menuforge_core::error::KnowledgeError;
use menuforge_core::provider::{EmbeddingRequest, Provider};
use menuforge_core::KnowledgeStore;
use std::sync::Arc;
use tracing::debug;

/// One reference document with its embedding.
#[derive(Debug, Clone)]
pub struct Document {
    pub text: String,
    pub embedding: Vec<f32>,
}

/// An in-process knowledge store over embedded documents.
pub struct InMemoryStore {
    documents: Vec<Document>,
    embedder: Arc<dyn Provider>,
    embedding_model: String,
}

impl InMemoryStore {
    pub fn new(embedder: Arc<dyn Provider>, embedding_model: impl Into<String>) -> Self {
        Self {
            documents: Vec::new(),
            embedder,
            embedding_model: embedding_model.into(),
        }
    }

    /// Add a document with a precomputed embedding.
    pub fn add_document(&mut self, text: impl Into<String>, embedding: Vec<f32>) {
        self.documents.push(Document { text: text.into(), embedding });
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[async_trait]
impl KnowledgeStore for InMemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<String>, KnowledgeError> {
        if self.documents.is_empty() {
            return Ok(Vec::new());
        }

        let response = self
            .embedder
            .embed(EmbeddingRequest {
                model: self.embedding_model.clone(),
                inputs: vec![query.to_string()],
            })
            .await
            .map_err(|e| KnowledgeError::EmbeddingFailed(e.to_string()))?;

        let query_embedding = response
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| KnowledgeError::EmbeddingFailed("No embedding returned".into()))?;

        let mut scored: Vec<(f32, &Document)> = self
            .documents
            .iter()
            .map(|doc| (cosine_similarity(&doc.embedding, &query_embedding), doc))
            .collect();

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);

        debug!(count = scored.len(), "In-memory store ranked documents");
        Ok(scored.into_iter().map(|(_, doc)| doc.text.clone()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use menuforge_core::error::ProviderError;
    use menuforge_core::provider::{EmbeddingResponse, ProviderRequest, ProviderResponse};

    /// An embedder that maps known queries to fixed vectors.
    struct FixedEmbedder {
        vector: Vec<f32>,
    }

    #[async_trait]
    impl Provider for FixedEmbedder {
        fn name(&self) -> &str {
            "fixed_embedder"
        }

        async fn complete(
            &self,
            _request: ProviderRequest,
        ) -> Result<ProviderResponse, ProviderError> {
            Err(ProviderError::NotConfigured("completion unsupported".into()))
        }

        async fn embed(
            &self,
            _request: EmbeddingRequest,
        ) -> Result<EmbeddingResponse, ProviderError> {
            Ok(EmbeddingResponse {
                embeddings: vec![self.vector.clone()],
                model: "fixed".into(),
                usage: None,
            })
        }
    }

    #[tokio::test]
    async fn empty_store_returns_no_snippets() {
        let store = InMemoryStore::new(Arc::new(FixedEmbedder { vector: vec![1.0, 0.0] }), "fixed");
        let snippets = store.retrieve("anything", 5).await.unwrap();
        assert!(snippets.is_empty());
    }

    #[tokio::test]
    async fn ranks_by_similarity_and_truncates() {
        let mut store =
            InMemoryStore::new(Arc::new(FixedEmbedder { vector: vec![1.0, 0.0] }), "fixed");
        store.add_document("far", vec![0.0, 1.0]);
        store.add_document("near", vec![1.0, 0.1]);
        store.add_document("middle", vec![0.5, 0.5]);

        let snippets = store.retrieve("query", 2).await.unwrap();
        assert_eq!(snippets, vec!["near".to_string(), "middle".to_string()]);
    }

    #[tokio::test]
    async fn embedder_failure_surfaces_as_knowledge_error() {
        struct BrokenEmbedder;

        #[async_trait]
        impl Provider for BrokenEmbedder {
            fn name(&self) -> &str {
                "broken"
            }

            async fn complete(
                &self,
                _request: ProviderRequest,
            ) -> Result<ProviderResponse, ProviderError> {
                Err(ProviderError::NotConfigured("no".into()))
            }

            async fn embed(
                &self,
                _request: EmbeddingRequest,
            ) -> Result<EmbeddingResponse, ProviderError> {
                Err(ProviderError::Network("embedding endpoint down".into()))
            }
        }

        let mut store = InMemoryStore::new(Arc::new(BrokenEmbedder), "fixed");
        store.add_document("doc", vec![1.0]);

        let result = store.retrieve("query", 5).await;
        assert!(matches!(result, Err(KnowledgeError::EmbeddingFailed(_))));
    }
}
