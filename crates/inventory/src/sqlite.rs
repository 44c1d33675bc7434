//! SQLite ingredient backend.
//!
//! A single `ingredients` table holding the inventory snapshot. The
//! `FilterSpec` is compiled into a parameterized WHERE clause so narrowing
//! happens in the database; result order is insertion order, which keeps the
//! prefilter's tie-breaking deterministic.

use async_trait::async_trait;
use menuforge_core::error::InventoryError;
use menuforge_core::{FilterSpec, Freshness, Ingredient, IngredientSource};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::{debug, info};

/// A SQLite-backed ingredient source.
pub struct SqliteSource {
    pool: SqlitePool,
}

impl SqliteSource {
    /// Create a new SQLite source from a file path.
    ///
    /// The database and schema are created automatically. Pass `":memory:"`
    /// for an in-process ephemeral database (useful for tests).
    pub async fn new(path: &str) -> Result<Self, InventoryError> {
        let options = SqliteConnectOptions::from_str(path)
            .map_err(|e| InventoryError::Storage(format!("Invalid SQLite path: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        // An in-memory database exists per connection; a single connection
        // keeps every query looking at the same data.
        let max_connections = if path.contains(":memory:") { 1 } else { 4 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(|e| InventoryError::Storage(format!("Failed to open SQLite: {e}")))?;

        let source = Self { pool };
        source.run_migrations().await?;
        info!("SQLite ingredient source initialized at {path}");
        Ok(source)
    }

    async fn run_migrations(&self) -> Result<(), InventoryError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS ingredients (
                iid         INTEGER PRIMARY KEY AUTOINCREMENT,
                name        TEXT UNIQUE NOT NULL,
                quantity    REAL NOT NULL,
                unit        TEXT NOT NULL,
                freshness   TEXT NOT NULL DEFAULT 'unknown',
                unit_price  REAL NOT NULL,
                category    TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| InventoryError::MigrationFailed(format!("ingredients table: {e}")))?;

        debug!("SQLite migrations complete");
        Ok(())
    }

    /// Insert or update one inventory row.
    pub async fn upsert(&self, ingredient: &Ingredient) -> Result<(), InventoryError> {
        sqlx::query(
            r#"
            INSERT INTO ingredients (name, quantity, unit, freshness, unit_price, category)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(name) DO UPDATE SET
                quantity = excluded.quantity,
                unit = excluded.unit,
                freshness = excluded.freshness,
                unit_price = excluded.unit_price,
                category = excluded.category
            "#,
        )
        .bind(&ingredient.name)
        .bind(ingredient.quantity)
        .bind(&ingredient.unit)
        .bind(ingredient.freshness.as_str())
        .bind(ingredient.unit_price)
        .bind(&ingredient.category)
        .execute(&self.pool)
        .await
        .map_err(|e| InventoryError::Storage(format!("upsert failed: {e}")))?;
        Ok(())
    }

    /// Compile a spec into WHERE clauses (binds are applied in the same order).
    fn build_where(spec: &FilterSpec) -> Vec<String> {
        let mut clauses = Vec::new();

        if spec.max_unit_price.is_some() {
            clauses.push("unit_price <= ?".to_string());
        }

        if !spec.include_categories.is_empty() {
            let marks = vec!["?"; spec.include_categories.len()].join(", ");
            clauses.push(format!("COALESCE(LOWER(category), '') IN ({marks})"));
        }

        if !spec.exclude_categories.is_empty() {
            let marks = vec!["?"; spec.exclude_categories.len()].join(", ");
            clauses.push(format!("COALESCE(LOWER(category), '') NOT IN ({marks})"));
        }

        if !spec.name_contains.is_empty() {
            let likes = vec!["LOWER(name) LIKE ?"; spec.name_contains.len()].join(" OR ");
            clauses.push(format!("({likes})"));
        }

        for _ in &spec.name_excludes {
            clauses.push("LOWER(name) NOT LIKE ?".to_string());
        }

        clauses
    }
}

#[async_trait]
impl IngredientSource for SqliteSource {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn fetch(&self, spec: &FilterSpec) -> Result<Vec<Ingredient>, InventoryError> {
        let mut sql = String::from(
            "SELECT name, quantity, unit, freshness, unit_price, category FROM ingredients",
        );
        let clauses = Self::build_where(spec);
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY iid");

        let mut query = sqlx::query(&sql);
        if let Some(ceiling) = spec.max_unit_price {
            query = query.bind(ceiling);
        }
        for category in &spec.include_categories {
            query = query.bind(category.to_lowercase());
        }
        for category in &spec.exclude_categories {
            query = query.bind(category.to_lowercase());
        }
        for term in &spec.name_contains {
            query = query.bind(format!("%{}%", term.to_lowercase()));
        }
        for term in &spec.name_excludes {
            query = query.bind(format!("%{}%", term.to_lowercase()));
        }

        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| InventoryError::QueryFailed(format!("fetch failed: {e}")))?;

        let mut ingredients = Vec::with_capacity(rows.len());
        for row in rows {
            let freshness: String = row
                .try_get("freshness")
                .map_err(|e| InventoryError::QueryFailed(format!("freshness column: {e}")))?;
            ingredients.push(Ingredient {
                name: row
                    .try_get("name")
                    .map_err(|e| InventoryError::QueryFailed(format!("name column: {e}")))?,
                quantity: row
                    .try_get("quantity")
                    .map_err(|e| InventoryError::QueryFailed(format!("quantity column: {e}")))?,
                unit: row
                    .try_get("unit")
                    .map_err(|e| InventoryError::QueryFailed(format!("unit column: {e}")))?,
                freshness: Freshness::parse(&freshness),
                unit_price: row
                    .try_get("unit_price")
                    .map_err(|e| InventoryError::QueryFailed(format!("unit_price column: {e}")))?,
                category: row
                    .try_get("category")
                    .map_err(|e| InventoryError::QueryFailed(format!("category column: {e}")))?,
            });
        }

        debug!(matched = ingredients.len(), "SQLite inventory filtered");
        Ok(ingredients)
    }

    async fn health_check(&self) -> Result<bool, InventoryError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| InventoryError::Unavailable(e.to_string()))?;
        Ok(true)
    }
}
