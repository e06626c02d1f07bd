// PostgreSQL connection pool

use crate::config::DatabaseConfig;
use crate::errors::DatabaseError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{info, instrument};

/// Managed connection pool to the content store database
#[derive(Debug, Clone)]
pub struct DbPool {
    pool: PgPool,
}

impl DbPool {
    /// Connect to the content store
    ///
    /// # Errors
    /// Returns `DatabaseError::ConnectionFailed` if unable to establish a connection
    #[instrument(skip(config), fields(max_connections = config.max_connections))]
    pub async fn new(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .connect(&config.url)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to connect to content store");
                DatabaseError::ConnectionFailed(e.to_string())
            })?;

        info!(
            max_connections = config.max_connections,
            min_connections = config.min_connections,
            "Content store pool ready"
        );

        Ok(Self { pool })
    }

    /// Wrap an existing pool
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| DatabaseError::HealthCheckFailed(e.to_string()))?;
        Ok(())
    }

    /// Close all connections; call during graceful shutdown
    #[instrument(skip(self))]
    pub async fn close(&self) {
        self.pool.close().await;
        info!("Content store pool closed");
    }
}
