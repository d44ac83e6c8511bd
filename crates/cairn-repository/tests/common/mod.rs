//! Common test infrastructure for database integration tests.

use cairn_config::DatabaseConfig;
use cairn_repository::{DatabasePool, DatabasePoolInterface};
use std::sync::Arc;
use testcontainers::{runners::AsyncRunner, ContainerAsync};
use testcontainers_modules::postgres::Postgres;

/// Test database container wrapper.
///
/// Manages a PostgreSQL testcontainer lifecycle and provides a database pool.
pub struct TestDatabase {
    _container: ContainerAsync<Postgres>,
    pool: Arc<DatabasePool>,
}

impl TestDatabase {
    /// Starts a fresh PostgreSQL container and applies migrations.
    pub async fn new() -> Self {
        let container = Postgres::default()
            .start()
            .await
            .expect("Failed to start PostgreSQL container");

        let port = container
            .get_host_port_ipv4(5432)
            .await
            .expect("Failed to get PostgreSQL port");

        // The module's image defaults to postgres/postgres on database "postgres".
        let config = DatabaseConfig {
            host: "127.0.0.1".to_string(),
            port,
            name: "postgres".to_string(),
            min_connections: 1,
            max_connections: 5,
            log_queries: true,
            ..DatabaseConfig::default()
        };

        let pool = Self::connect_with_retry(&config, 30).await;

        pool.run_migrations()
            .await
            .expect("Failed to run migrations");

        Self {
            _container: container,
            pool: Arc::new(pool),
        }
    }

    /// Returns a handle to the database pool.
    pub fn pool(&self) -> Arc<dyn DatabasePoolInterface> {
        self.pool.clone()
    }

    async fn connect_with_retry(config: &DatabaseConfig, max_attempts: u32) -> DatabasePool {
        let mut attempts = 0;
        loop {
            attempts += 1;
            match DatabasePool::new(config).await {
                Ok(pool) => return pool,
                Err(e) => {
                    if attempts >= max_attempts {
                        panic!("Failed to connect to database after {} attempts: {}", max_attempts, e);
                    }
                    tokio::time::sleep(std::time::Duration::from_secs(1)).await;
                }
            }
        }
    }
}
