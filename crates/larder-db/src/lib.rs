//! # larder-db
//!
//! PostgreSQL storage layer for larder.
//!
//! This crate provides:
//! - Connection pool management
//! - Repository implementations for shopping lists and share links
//! - The recipe-catalog ingredient source consumed by the aggregator
//!
//! ## Example
//!
//! ```rust,ignore
//! use larder_db::Database;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/larder").await?;
//!
//!     let list = db.lists.create(Some("Week 12".to_string())).await?;
//!     println!("Created list: {}", list.id);
//!     Ok(())
//! }
//! ```
pub mod ingredients;
pub mod links;
pub mod lists;
pub mod pool;

// Test fixtures for integration tests
// Note: Always compiled so integration tests (in tests/) can use DEFAULT_TEST_DATABASE_URL
pub mod test_fixtures;

// Re-export core types
pub use larder_core::*;

pub use ingredients::PgIngredientSource;
pub use links::PgShareLinkRepository;
pub use lists::PgShoppingListRepository;
pub use pool::{create_pool, create_pool_with_config, PoolConfig};

/// Combined database context with all repositories.
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    /// Shopping list repository.
    pub lists: PgShoppingListRepository,
    /// Share link repository.
    pub share_links: PgShareLinkRepository,
    /// Ingredient source over the recipe catalog.
    pub ingredients: PgIngredientSource,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            lists: PgShoppingListRepository::new(pool.clone()),
            share_links: PgShareLinkRepository::new(pool.clone()),
            ingredients: PgIngredientSource::new(pool.clone()),
            pool,
        }
    }

    /// Create a new Database instance by connecting to the given URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = create_pool(url).await?;
        Ok(Self::new(pool))
    }

    /// Create with custom pool configuration.
    pub async fn connect_with_config(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Connect to test database (for integration tests).
    #[cfg(test)]
    pub async fn connect_test() -> Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| crate::test_fixtures::DEFAULT_TEST_DATABASE_URL.to_string());
        Self::connect(&database_url).await
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self::new(self.pool.clone())
    }
}
