//! # curio-db
//!
//! PostgreSQL database layer for curio.
//!
//! This crate provides:
//! - Connection pool management
//! - The aggregate writer and association store for item lists and
//!   editorial lists
//! - The activity trail
//! - The write pipeline that runs each mutation as one transaction
//!
//! ## Example
//!
//! ```rust,ignore
//! use curio_db::{Actor, AggregateInput, AggregateKind, Database};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/curio").await?;
//!
//!     let list = db.pipeline.create(
//!         AggregateKind::ItemList,
//!         &Actor::user(7),
//!         AggregateInput {
//!             title: "Trip".to_string(),
//!             item_ids: vec![1, 2, 3],
//!             ..Default::default()
//!         },
//!     ).await?;
//!
//!     println!("Created list {} (v{})", list.id, list.version);
//!     Ok(())
//! }
//! ```
pub mod activity;
pub mod aggregates;
pub mod items;
pub mod members;
pub mod pipeline;
pub mod pool;

// Test fixtures for integration tests
// Note: Always compiled so integration tests (in tests/) can use DEFAULT_TEST_DATABASE_URL
pub mod test_fixtures;

// Re-export core types
pub use curio_core::*;

pub use activity::{PgActivityRepository, PgAuditRecorder};
pub use aggregates::PgAggregateWriter;
pub use items::PgItemRepository;
pub use members::PgMembershipStore;
pub use pipeline::{PipelineStage, WritePipeline};
pub use pool::{
    create_lazy_pool, create_pool, create_pool_with_config, log_pool_metrics, PoolConfig,
    PoolStats,
};

use sqlx::PgPool;

/// Combined database context with all repositories.
#[derive(Clone)]
pub struct Database {
    /// The underlying connection pool.
    pub pool: PgPool,
    /// Aggregate reads (writes go through `pipeline`).
    pub aggregates: PgAggregateWriter,
    /// Activity feed.
    pub activity: PgActivityRepository,
    /// Transactional create/update/delete of aggregates.
    pub pipeline: WritePipeline,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self {
            aggregates: PgAggregateWriter::new(pool.clone()),
            activity: PgActivityRepository::new(pool.clone()),
            pipeline: WritePipeline::new(pool.clone()),
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

    /// Create without connecting; the first query opens a connection.
    pub fn connect_lazy(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_lazy_pool(url, config)?;
        Ok(Self::new(pool))
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
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}
