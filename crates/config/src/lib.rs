//! Configuration loading, validation, and management for menuforge.
//!
//! Loads configuration from `menuforge.toml` (path overridable via the
//! `MENUFORGE_CONFIG` environment variable) with environment variable
//! overrides for secrets. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// The root configuration structure.
///
/// Maps directly to `menuforge.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key shared by all providers (can be overridden per-provider)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Default LLM provider
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Default model
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Default temperature
    #[serde(default = "default_temperature")]
    pub default_temperature: f32,

    /// Default max tokens per LLM response
    #[serde(default = "default_max_tokens")]
    pub default_max_tokens: u32,

    /// Display currency for budgets and prices
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Provider-specific configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,

    /// Budget policy
    #[serde(default)]
    pub budget: BudgetConfig,

    /// Ingredient inventory configuration
    #[serde(default)]
    pub inventory: InventoryConfig,

    /// Knowledge store configuration
    #[serde(default)]
    pub knowledge: KnowledgeConfig,

    /// Gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,
}

fn default_provider() -> String {
    "openai".into()
}
fn default_model() -> String {
    "gpt-4.1-mini".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    4096
}
fn default_currency() -> String {
    "VND".into()
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("default_provider", &self.default_provider)
            .field("default_model", &self.default_model)
            .field("default_temperature", &self.default_temperature)
            .field("default_max_tokens", &self.default_max_tokens)
            .field("currency", &self.currency)
            .field("providers", &self.providers)
            .field("budget", &self.budget)
            .field("inventory", &self.inventory)
            .field("knowledge", &self.knowledge)
            .field("gateway", &self.gateway)
            .finish()
    }
}

/// Configuration for a single LLM provider.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("default_model", &self.default_model)
            .finish()
    }
}

/// Budget defaults applied when a query names no budget.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetConfig {
    /// Assumed spend per person when the user names no budget.
    #[serde(default = "default_per_person")]
    pub default_per_person: f64,
}

fn default_per_person() -> f64 {
    60_000.0
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self { default_per_person: default_per_person() }
    }
}

/// Which ingredient source backs the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryConfig {
    /// "sqlite" or "builtin"
    #[serde(default = "default_inventory_backend")]
    pub backend: String,

    /// SQLite database path (used when backend = "sqlite")
    #[serde(default = "default_sqlite_path")]
    pub sqlite_path: String,

    /// Per-source fetch timeout in seconds
    #[serde(default = "default_source_timeout")]
    pub timeout_secs: u64,
}

fn default_inventory_backend() -> String {
    "builtin".into()
}
fn default_sqlite_path() -> String {
    "ingredients.db".into()
}
fn default_source_timeout() -> u64 {
    10
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            backend: default_inventory_backend(),
            sqlite_path: default_sqlite_path(),
            timeout_secs: default_source_timeout(),
        }
    }
}

/// Knowledge store settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct KnowledgeConfig {
    /// "remote" or "memory"
    #[serde(default = "default_knowledge_backend")]
    pub backend: String,

    /// Vector index query endpoint (used when backend = "remote")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_url: Option<String>,

    /// Vector index API key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Embedding model used to vectorize queries
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// How many snippets to retrieve per request
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_knowledge_backend() -> String {
    "memory".into()
}
fn default_embedding_model() -> String {
    "text-embedding-3-small".into()
}
fn default_top_k() -> usize {
    5
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            backend: default_knowledge_backend(),
            index_url: None,
            api_key: None,
            embedding_model: default_embedding_model(),
            top_k: default_top_k(),
        }
    }
}

impl std::fmt::Debug for KnowledgeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KnowledgeConfig")
            .field("backend", &self.backend)
            .field("index_url", &self.index_url)
            .field("api_key", &redact(&self.api_key))
            .field("embedding_model", &self.embedding_model)
            .field("top_k", &self.top_k)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Suggest requests allowed per client per minute
    #[serde(default = "default_rate_limit")]
    pub rate_limit_per_minute: usize,
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    8080
}
fn default_rate_limit() -> usize {
    10
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            rate_limit_per_minute: default_rate_limit(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_provider: default_provider(),
            default_model: default_model(),
            default_temperature: default_temperature(),
            default_max_tokens: default_max_tokens(),
            currency: default_currency(),
            providers: HashMap::new(),
            budget: BudgetConfig::default(),
            inventory: InventoryConfig::default(),
            knowledge: KnowledgeConfig::default(),
            gateway: GatewayConfig::default(),
        }
    }
}

impl AppConfig {
    /// Resolve the config file path: `MENUFORGE_CONFIG` or `./menuforge.toml`.
    pub fn default_path() -> PathBuf {
        std::env::var("MENUFORGE_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("menuforge.toml"))
    }

    /// Load configuration from the default path, falling back to defaults if
    /// the file does not exist, then apply environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        let mut config = if path.exists() {
            Self::load_from(&path)?
        } else {
            tracing::debug!(path = %path.display(), "No config file found, using defaults");
            Self::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&raw)?)
    }

    /// Apply secret overrides from the environment.
    ///
    /// Recognized: `MENUFORGE_API_KEY`, `MENUFORGE_KNOWLEDGE_API_KEY`,
    /// `MENUFORGE_KNOWLEDGE_INDEX_URL`.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var("MENUFORGE_API_KEY") {
            if !key.is_empty() {
                self.api_key = Some(key);
            }
        }
        if let Ok(key) = std::env::var("MENUFORGE_KNOWLEDGE_API_KEY") {
            if !key.is_empty() {
                self.knowledge.api_key = Some(key);
            }
        }
        if let Ok(url) = std::env::var("MENUFORGE_KNOWLEDGE_INDEX_URL") {
            if !url.is_empty() {
                self.knowledge.index_url = Some(url);
            }
        }
    }

    /// The API key for a given provider: per-provider key, else the global key.
    pub fn provider_api_key(&self, provider: &str) -> Option<String> {
        self.providers
            .get(provider)
            .and_then(|p| p.api_key.clone())
            .or_else(|| self.api_key.clone())
    }

    /// Validate that all required configuration is present.
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Ollama runs locally and needs no key; every hosted provider does.
        if self.default_provider != "ollama" && self.provider_api_key(&self.default_provider).is_none()
        {
            return Err(ConfigError::Invalid(format!(
                "Missing API key for provider '{}' (set MENUFORGE_API_KEY or [providers.{}] api_key)",
                self.default_provider, self.default_provider
            )));
        }

        match self.inventory.backend.as_str() {
            "sqlite" | "builtin" => {}
            other => {
                return Err(ConfigError::Invalid(format!(
                    "Invalid inventory backend '{other}' (expected 'sqlite' or 'builtin')"
                )))
            }
        }

        match self.knowledge.backend.as_str() {
            "memory" => {}
            "remote" => {
                if self.knowledge.index_url.is_none() {
                    return Err(ConfigError::Invalid(
                        "knowledge.index_url is required when knowledge.backend = \"remote\"".into(),
                    ));
                }
            }
            other => {
                return Err(ConfigError::Invalid(format!(
                    "Invalid knowledge backend '{other}' (expected 'remote' or 'memory')"
                )))
            }
        }

        if self.budget.default_per_person <= 0.0 {
            return Err(ConfigError::Invalid(
                "budget.default_per_person must be positive".into(),
            ));
        }

        if self.knowledge.top_k == 0 {
            return Err(ConfigError::Invalid("knowledge.top_k must be at least 1".into()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_toml_yields_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.default_provider, "openai");
        assert_eq!(config.gateway.port, 8080);
        assert_eq!(config.knowledge.top_k, 5);
        assert_eq!(config.inventory.backend, "builtin");
        assert!((config.budget.default_per_person - 60_000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
            default_provider = "ollama"
            currency = "KRW"

            [gateway]
            port = 9000

            [knowledge]
            backend = "memory"
            top_k = 3
            "#
        )
        .unwrap();

        let config = AppConfig::load_from(file.path()).unwrap();
        assert_eq!(config.default_provider, "ollama");
        assert_eq!(config.currency, "KRW");
        assert_eq!(config.gateway.port, 9000);
        assert_eq!(config.knowledge.top_k, 3);
    }

    #[test]
    fn validate_requires_api_key_for_hosted_provider() {
        let config = AppConfig::default();
        assert!(config.validate().is_err());

        let mut keyed = AppConfig::default();
        keyed.api_key = Some("sk-test".into());
        assert!(keyed.validate().is_ok());
    }

    #[test]
    fn validate_allows_ollama_without_key() {
        let mut config = AppConfig::default();
        config.default_provider = "ollama".into();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_remote_knowledge_requires_index_url() {
        let mut config = AppConfig::default();
        config.api_key = Some("sk-test".into());
        config.knowledge.backend = "remote".into();
        assert!(config.validate().is_err());

        config.knowledge.index_url = Some("https://index.example.com".into());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn per_provider_key_beats_global_key() {
        let mut config = AppConfig::default();
        config.api_key = Some("global".into());
        config.providers.insert(
            "openai".into(),
            ProviderConfig { api_key: Some("specific".into()), ..Default::default() },
        );
        assert_eq!(config.provider_api_key("openai").as_deref(), Some("specific"));
        assert_eq!(config.provider_api_key("groq").as_deref(), Some("global"));
    }

    #[test]
    fn debug_redacts_secrets() {
        let mut config = AppConfig::default();
        config.api_key = Some("sk-secret".into());
        config.knowledge.api_key = Some("pc-secret".into());
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(!debug.contains("pc-secret"));
        assert!(debug.contains("[REDACTED]"));
    }
}
