//! # Menuforge Core
//!
//! Domain types, collaborator traits, and error definitions for the menuforge
//! suggestion pipeline. This crate has **zero framework dependencies** — it
//! defines the domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator the pipeline consumes (LLM provider,
//! ingredient source, knowledge store, and the LLM-backed stage contracts) is
//! defined as a trait here. Implementations live in their respective crates.
//! This enables:
//! - Swapping implementations via configuration
//! - Deterministic testing with scripted fakes for every external call
//! - Clean dependency graph (all crates depend inward on core)

pub mod error;
pub mod provider;
pub mod intent;
pub mod ingredient;
pub mod inventory;
pub mod knowledge;
pub mod menu;
pub mod verdict;
pub mod state;
pub mod response;
pub mod stages;

// Re-export key types at crate root for ergonomics
pub use error::{Error, Result};
pub use provider::{Message, Provider, ProviderRequest, ProviderResponse, Role, Usage};
pub use intent::{Intent, MealType};
pub use ingredient::{Freshness, Ingredient};
pub use inventory::{FilterSpec, IngredientSource};
pub use knowledge::KnowledgeStore;
pub use menu::{DishCategory, Menu, MenuIngredient, MenuItem};
pub use verdict::{BudgetBreach, ValidationVerdict};
pub use state::{FailureReason, PipelineState, PipelineStatus};
pub use response::{MenuResponse, ResponseMetadata, ResponseStatus};
pub use stages::{
    AdjustInputs, ComposeInputs, Composition, Extraction, FilterSpecBuilder, IntentExtractor,
    MenuComposer,
};
