//! LLM provider implementations for menuforge.
//!
//! The pipeline talks to hosted models exclusively through the
//! [`Provider`](menuforge_core::Provider) trait; this crate supplies the
//! OpenAI-compatible HTTP implementation (which covers OpenAI, OpenRouter,
//! Ollama, Groq, and most other hosted endpoints) and a router that builds
//! the configured provider set.

pub mod openai_compat;
pub mod router;

pub use openai_compat::OpenAiCompatProvider;
pub use router::{build_from_config, ProviderRouter};
