//! Error types for the menuforge domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all menuforge operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Intent extraction errors ---
    #[error("Intent error: {0}")]
    Intent(#[from] IntentError),

    // --- Ingredient source errors ---
    #[error("Inventory error: {0}")]
    Inventory(#[from] InventoryError),

    // --- Knowledge retrieval errors ---
    #[error("Knowledge error: {0}")]
    Knowledge(#[from] KnowledgeError),

    // --- Menu generation errors ---
    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// Errors from the intent extraction stage.
///
/// Every variant maps to the `intent_parse_error` failure reason — the
/// pipeline cannot proceed without a usable intent.
#[derive(Debug, Error)]
pub enum IntentError {
    #[error("Extractor returned undecodable output: {0}")]
    Unparseable(String),

    #[error("Extracted intent has no budget field")]
    MissingBudget,

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Source unavailable: {0}")]
    Unavailable(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),
}

#[derive(Debug, Error)]
pub enum KnowledgeError {
    #[error("Embedding generation failed: {0}")]
    EmbeddingFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Store not configured: {0}")]
    NotConfigured(String),
}

/// Errors from menu generation and adjustment.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Composer returned undecodable output: {0}")]
    Unparseable(String),

    #[error("Composed menu is malformed: {0}")]
    InvalidStructure(String),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_displays_correctly() {
        let err = Error::Provider(ProviderError::ApiError {
            status_code: 429,
            message: "Too many requests".into(),
        });
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("Too many requests"));
    }

    #[test]
    fn intent_error_wraps_provider_error() {
        let err = IntentError::Provider(ProviderError::Timeout("extract".into()));
        assert!(err.to_string().contains("timed out"));
    }

    #[test]
    fn generation_error_displays_structure_problem() {
        let err = Error::Generation(GenerationError::InvalidStructure(
            "item 2 has negative price".into(),
        ));
        assert!(err.to_string().contains("negative price"));
    }
}
