//! Database connection pool management.

use cairn_config::DatabaseConfig;
use cairn_core::{CairnError, CairnResult, HealthCheck, HealthStatus, Interface};
use async_trait::async_trait;
use shaku::Component;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::sync::Arc;
use tracing::{info, warn};

/// Interface for database pool operations.
#[async_trait]
pub trait DatabasePoolInterface: Interface + Send + Sync {
    /// Returns a reference to the underlying PostgreSQL pool.
    fn inner(&self) -> &PgPool;

    /// Checks if the database connection is healthy.
    async fn health_check(&self) -> CairnResult<()>;

    /// Runs database migrations.
    async fn run_migrations(&self) -> CairnResult<()>;

    /// Closes the database pool.
    async fn close(&self);
}

/// Database pool wrapper.
#[derive(Component, Clone)]
#[shaku(interface = DatabasePoolInterface)]
pub struct DatabasePool {
    pool: PgPool,
}

impl DatabasePool {
    /// Creates a new database pool from configuration.
    pub async fn new(config: &DatabaseConfig) -> CairnResult<Self> {
        info!("Connecting to PostgreSQL at {}:{}...", config.host, config.port);

        let pool = PgPoolOptions::new()
            .min_connections(config.min_connections)
            .max_connections(config.max_connections)
            .acquire_timeout(config.connect_timeout())
            .idle_timeout(Some(config.idle_timeout()))
            .connect(&config.connection_url())
            .await
            .map_err(|e| {
                warn!("Failed to connect to database: {}", e);
                CairnError::Database(format!("Failed to connect: {}", e))
            })?;

        info!("PostgreSQL connection pool established");
        Ok(Self { pool })
    }

    /// Wraps a pre-existing pool (for Shaku injection).
    #[must_use]
    pub fn with_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DatabasePoolInterface for DatabasePool {
    fn inner(&self) -> &PgPool {
        &self.pool
    }

    async fn health_check(&self) -> CairnResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| CairnError::Database(format!("Health check failed: {}", e)))?;
        Ok(())
    }

    async fn run_migrations(&self) -> CairnResult<()> {
        info!("Running database migrations...");
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| CairnError::Database(format!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }

    async fn close(&self) {
        info!("Closing database connection pool...");
        self.pool.close().await;
        info!("Database connection pool closed");
    }
}

impl std::fmt::Debug for DatabasePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabasePool")
            .field("size", &self.pool.size())
            .field("num_idle", &self.pool.num_idle())
            .finish()
    }
}

/// Readiness probe backed by a `SELECT 1` round-trip.
pub struct DatabaseHealthCheck {
    pool: Arc<dyn DatabasePoolInterface>,
}

impl DatabaseHealthCheck {
    #[must_use]
    pub fn new(pool: Arc<dyn DatabasePoolInterface>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HealthCheck for DatabaseHealthCheck {
    fn name(&self) -> &str {
        "database"
    }

    async fn check(&self) -> HealthStatus {
        match self.pool.health_check().await {
            Ok(()) => HealthStatus::Healthy,
            Err(e) => HealthStatus::Unhealthy(e.to_string()),
        }
    }
}

/// Creates a shared database pool.
pub async fn create_pool(config: &DatabaseConfig) -> CairnResult<Arc<DatabasePool>> {
    let pool = DatabasePool::new(config).await?;
    Ok(Arc::new(pool))
}
