// PostgreSQL content repository

use crate::db::repositories::queries::{content_queries, content_type_queries};
use crate::db::DbPool;
use crate::errors::RepositoryError;
use crate::models::{ContentId, ContentItem, ContentStatus, OverdueCandidate, TransitionOutcome};
use crate::repository::ContentRepository;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::instrument;

/// Content repository backed by the `contents` and `content_types` tables
pub struct PgContentRepository {
    pool: DbPool,
}

impl PgContentRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ContentRepository for PgContentRepository {
    #[instrument(skip(self), fields(type_count = content_types.len()))]
    async fn query_overdue(
        &self,
        content_types: &[String],
        before: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<OverdueCandidate>, RepositoryError> {
        let limit = i64::try_from(limit)
            .map_err(|_| RepositoryError::Query(format!("Scan limit out of range: {}", limit)))?;

        let candidates = sqlx::query_as::<_, OverdueCandidate>(content_queries::SELECT_OVERDUE)
            .bind(content_types)
            .bind(ContentStatus::Future.to_string())
            .bind(before)
            .bind(limit)
            .fetch_all(self.pool.pool())
            .await?;

        tracing::debug!(count = candidates.len(), "Fetched overdue candidates");
        Ok(candidates)
    }

    #[instrument(skip(self))]
    async fn get_by_id(&self, id: ContentId) -> Result<Option<ContentItem>, RepositoryError> {
        let query = format!(
            "SELECT {} FROM contents WHERE id = $1",
            content_queries::SELECT_ITEM_COLUMNS
        );

        let item = sqlx::query_as::<_, ContentItem>(&query)
            .bind(id)
            .fetch_optional(self.pool.pool())
            .await?;

        Ok(item)
    }

    #[instrument(skip(self))]
    async fn publish(&self, id: ContentId) -> Result<TransitionOutcome, RepositoryError> {
        let result = sqlx::query(content_queries::PUBLISH_IF_SCHEDULED)
            .bind(id)
            .bind(ContentStatus::Published.to_string())
            .bind(ContentStatus::Future.to_string())
            .execute(self.pool.pool())
            .await?;

        if result.rows_affected() == 1 {
            Ok(TransitionOutcome::Published)
        } else {
            Ok(TransitionOutcome::Rejected(
                "item is no longer scheduled".to_string(),
            ))
        }
    }

    #[instrument(skip(self))]
    async fn registered_content_types(&self) -> Result<Vec<String>, RepositoryError> {
        let names: Vec<String> =
            sqlx::query_scalar(content_type_queries::SELECT_REGISTERED_PUBLIC)
                .fetch_all(self.pool.pool())
                .await?;
        Ok(names)
    }
}
