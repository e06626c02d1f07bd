// PostgreSQL-backed host options

use crate::db::repositories::queries::option_queries;
use crate::db::DbPool;
use crate::errors::RepositoryError;
use crate::repository::OptionsStore;
use async_trait::async_trait;
use tracing::instrument;

/// Options persisted as JSON values in the `publisher_options` table
pub struct PgOptionsStore {
    pool: DbPool,
}

impl PgOptionsStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OptionsStore for PgOptionsStore {
    #[instrument(skip(self))]
    async fn get_bool(&self, name: &str) -> Result<Option<bool>, RepositoryError> {
        let value: Option<serde_json::Value> = sqlx::query_scalar(option_queries::SELECT_VALUE)
            .bind(name)
            .fetch_optional(self.pool.pool())
            .await?;

        match value {
            None => Ok(None),
            Some(serde_json::Value::Bool(b)) => Ok(Some(b)),
            Some(other) => Err(RepositoryError::Query(format!(
                "Option '{}' is not a boolean: {}",
                name, other
            ))),
        }
    }

    #[instrument(skip(self))]
    async fn set_bool(&self, name: &str, value: bool) -> Result<(), RepositoryError> {
        sqlx::query(option_queries::UPSERT_VALUE)
            .bind(name)
            .bind(serde_json::Value::Bool(value))
            .execute(self.pool.pool())
            .await?;

        tracing::info!(option = name, value, "Option updated");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn add_bool(&self, name: &str, value: bool) -> Result<bool, RepositoryError> {
        let result = sqlx::query(option_queries::INSERT_IF_ABSENT)
            .bind(name)
            .bind(serde_json::Value::Bool(value))
            .execute(self.pool.pool())
            .await?;

        Ok(result.rows_affected() == 1)
    }
}
