//! Ingredient inventory sources for menuforge.
//!
//! Every source implements [`IngredientSource`](menuforge_core::IngredientSource)
//! and returns a read-only snapshot already narrowed by a
//! [`FilterSpec`](menuforge_core::FilterSpec):
//!
//! - [`SqliteSource`] — a SQLite-backed inventory (sqlx)
//! - [`BuiltinSource`] — an embedded snapshot, the defined fallback when the
//!   primary source is unavailable
//! - [`FallbackSource`] — an ordered chain with per-source timeout

pub mod builtin;
pub mod fallback;
pub mod sqlite;

pub use builtin::BuiltinSource;
pub use fallback::FallbackSource;
pub use sqlite::SqliteSource;
