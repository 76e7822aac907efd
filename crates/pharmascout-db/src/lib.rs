//! PharmaScout Database Layer
//!
//! Provides `SQLite` persistence for discovered API manufacturers.
//! Uses `SQLx` for pooled async access and embedded migrations.
//!
//! # Architecture
//!
//! - **Migrations**: SQL migrations are embedded and versioned using `SQLx`
//! - **Connection Pooling**: Configurable pool; `:memory:` is pinned to one connection
//! - **Store Boundary**: [`ManufacturerStore`] is what the discovery pipeline
//!   depends on; [`Database`] is its `SQLite` implementation
//!
//! # Example
//!
//! ```ignore
//! use pharmascout_db::{Database, ManufacturerStore};
//!
//! let db = Database::new("pharmascout.db", 5).await?;
//! db.run_migrations().await?;
//! let known = db.query_by_api_name("Paracetamol").await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod connection;
pub mod error;
pub mod manufacturers;
pub mod migrations;

// Re-export commonly used types
pub use connection::ScoutPool;
pub use error::{DatabaseError, Result};
pub use manufacturers::{ManufacturerRecord, MatchMode, NewManufacturerRecord};

use async_trait::async_trait;
use pharmascout_core::DatabaseConfig;
use std::path::Path;

/// Durable store of manufacturer records.
///
/// Implementations must make `insert_batch` all-or-nothing.
#[async_trait]
pub trait ManufacturerStore: Send + Sync {
    /// All stored records for an ingredient (case-insensitive).
    async fn query_by_api_name(&self, api_name: &str) -> Result<Vec<ManufacturerRecord>>;

    /// Store every record in one transaction, returning them with ids assigned.
    async fn insert_batch(
        &self,
        records: Vec<NewManufacturerRecord>,
    ) -> Result<Vec<ManufacturerRecord>>;

    /// Delete records whose source name matches `pattern`; returns the count.
    async fn delete_by_source_pattern(&self, pattern: &str, mode: MatchMode) -> Result<u64>;
}

/// High-level database interface with migrations.
///
/// This provides a convenient wrapper around `ScoutPool` that handles
/// initialization and migration.
#[derive(Debug, Clone)]
pub struct Database {
    pool: ScoutPool,
}

impl Database {
    /// Open a database connection pool.
    ///
    /// # Arguments
    /// * `path` - Path to the database file (or `:memory:` for in-memory)
    /// * `max_connections` - Pool size for file databases
    pub async fn new(path: impl AsRef<Path>, max_connections: u32) -> Result<Self> {
        let pool = ScoutPool::new(path, max_connections).await?;
        Ok(Self { pool })
    }

    /// Open the database described by the `[database]` config section and
    /// bring its schema up to date.
    pub async fn open(config: &DatabaseConfig) -> Result<Self> {
        let db = Self::new(&config.path, config.max_connections).await?;
        db.run_migrations().await?;
        Ok(db)
    }

    /// Run all pending database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        migrations::run_migrations(self.pool.pool()).await
    }

    /// Get the current schema version.
    pub async fn get_schema_version(&self) -> Result<i64> {
        migrations::get_schema_version(self.pool.pool()).await
    }

    /// Get a reference to the underlying connection pool.
    #[must_use]
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Sqlite> {
        self.pool.pool()
    }

    /// Close the database connection gracefully.
    pub async fn close(self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl ManufacturerStore for Database {
    async fn query_by_api_name(&self, api_name: &str) -> Result<Vec<ManufacturerRecord>> {
        manufacturers::query_by_api_name(self.pool(), api_name).await
    }

    async fn insert_batch(
        &self,
        records: Vec<NewManufacturerRecord>,
    ) -> Result<Vec<ManufacturerRecord>> {
        manufacturers::insert_batch(self.pool(), records).await
    }

    async fn delete_by_source_pattern(&self, pattern: &str, mode: MatchMode) -> Result<u64> {
        manufacturers::delete_by_source_pattern(self.pool(), pattern, mode).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_open_from_config_runs_migrations() {
        let temp_dir = tempfile::TempDir::new().expect("create temp dir");
        let config = DatabaseConfig {
            path: temp_dir.path().join("scout.db"),
            max_connections: 2,
        };

        let db = Database::open(&config).await.expect("open database");
        assert_eq!(db.get_schema_version().await.expect("schema version"), 1);
        db.close().await;
    }

    #[tokio::test]
    async fn test_store_trait_object() {
        let db = Database::new(":memory:", 1).await.expect("open database");
        db.run_migrations().await.expect("run migrations");
        let store: Arc<dyn ManufacturerStore> = Arc::new(db);

        store
            .insert_batch(vec![NewManufacturerRecord {
                api_name: "Metformin".to_string(),
                manufacturer_name: "Wanbury Ltd".to_string(),
                location: None,
                product: Some("Metformin Hydrochloride".to_string()),
                source_name: "CDSCO".to_string(),
            }])
            .await
            .expect("insert batch");

        let found = store
            .query_by_api_name("METFORMIN")
            .await
            .expect("query records");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].manufacturer_name, "Wanbury Ltd");

        let deleted = store
            .delete_by_source_pattern("CDSCO", MatchMode::Exact)
            .await
            .expect("delete records");
        assert_eq!(deleted, 1);
    }
}
