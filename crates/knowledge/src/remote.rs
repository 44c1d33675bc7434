//! Remote vector-index knowledge store.
//!
//! Embeds the query text via the configured provider, then queries a hosted
//! vector index (Pinecone-style `/query` endpoint) and returns the ranked
//! snippet texts unmodified.

use async_trait::async_trait;
use menuforge_core::error::KnowledgeError;
use menuforge_core::provider::{EmbeddingRequest, Provider};
use menuforge_core::KnowledgeStore;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, warn};

/// A hosted vector index reached over HTTP.
pub struct RemoteVectorStore {
    index_url: String,
    api_key: String,
    embedder: Arc<dyn Provider>,
    embedding_model: String,
    client: reqwest::Client,
}

impl RemoteVectorStore {
    pub fn new(
        index_url: impl Into<String>,
        api_key: impl Into<String>,
        embedder: Arc<dyn Provider>,
        embedding_model: impl Into<String>,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            index_url: index_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            embedder,
            embedding_model: embedding_model.into(),
            client,
        }
    }

    async fn embed_query(&self, query: &str) -> Result<Vec<f32>, KnowledgeError> {
        let response = self
            .embedder
            .embed(EmbeddingRequest {
                model: self.embedding_model.clone(),
                inputs: vec![query.to_string()],
            })
            .await
            .map_err(|e| KnowledgeError::EmbeddingFailed(e.to_string()))?;

        response
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| KnowledgeError::EmbeddingFailed("No embedding returned".into()))
    }
}

#[async_trait]
impl KnowledgeStore for RemoteVectorStore {
    fn name(&self) -> &str {
        "remote"
    }

    async fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<String>, KnowledgeError> {
        let vector = self.embed_query(query).await?;

        let body = serde_json::json!({
            "vector": vector,
            "topK": top_k,
            "includeMetadata": true,
        });

        let response = self
            .client
            .post(format!("{}/query", self.index_url))
            .header("Api-Key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| KnowledgeError::QueryFailed(e.to_string()))?;

        let status = response.status().as_u16();
        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Vector index returned error");
            return Err(KnowledgeError::QueryFailed(format!(
                "index returned status {status}"
            )));
        }

        let parsed: QueryResponse = response
            .json()
            .await
            .map_err(|e| KnowledgeError::QueryFailed(format!("Failed to parse response: {e}")))?;

        let snippets: Vec<String> = parsed
            .matches
            .into_iter()
            .filter_map(|m| m.metadata.and_then(|meta| meta.text))
            .collect();

        debug!(count = snippets.len(), "Vector index returned snippets");
        Ok(snippets)
    }

    async fn health_check(&self) -> Result<bool, KnowledgeError> {
        let response = self
            .client
            .get(format!("{}/describe_index_stats", self.index_url))
            .header("Api-Key", &self.api_key)
            .send()
            .await
            .map_err(|e| KnowledgeError::QueryFailed(e.to_string()))?;
        Ok(response.status().is_success())
    }
}

// --- Index API types (internal) ---

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(Debug, Deserialize)]
struct QueryMatch {
    #[serde(default)]
    metadata: Option<MatchMetadata>,
}

#[derive(Debug, Deserialize)]
struct MatchMetadata {
    #[serde(default)]
    text: Option<String>,
}
