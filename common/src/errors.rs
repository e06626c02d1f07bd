// Error taxonomy for the publication pipeline and its backing stores

use crate::models::PublicationResult;
use thiserror::Error;

/// Errors raised by a content repository or host options adapter
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// The store could not be reached at all. Aborts the remaining batch.
    #[error("Content repository unavailable: {0}")]
    Unavailable(String),

    /// A single statement failed while the store itself is reachable
    #[error("Repository query failed: {0}")]
    Query(String),
}

impl RepositoryError {
    /// Whether the failure affects every remaining operation, not just the current item
    pub fn is_systemic(&self) -> bool {
        matches!(self, RepositoryError::Unavailable(_))
    }
}

/// Debounce gate backing-store errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GateError {
    #[error("Debounce gate unavailable: {0}")]
    Unavailable(String),
}

/// Pipeline-level failures surfaced to the trigger boundary
#[derive(Error, Debug)]
pub enum PublishError {
    #[error("Invalid scan filter: {0}")]
    InvalidFilter(String),

    #[error("Overdue scan failed: {0}")]
    Scan(#[from] RepositoryError),

    #[error(
        "Publication batch aborted after {} attempted ({} published): {source}",
        .partial.attempted,
        .partial.published
    )]
    RepositoryUnavailable {
        source: RepositoryError,
        partial: PublicationResult,
    },
}

impl PublishError {
    /// Result accumulated before the batch was aborted, if any
    pub fn partial(&self) -> Option<&PublicationResult> {
        match self {
            PublishError::RepositoryUnavailable { partial, .. } => Some(partial),
            _ => None,
        }
    }
}

/// Database connection errors raised while building the pool
#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Database connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Database health check failed: {0}")]
    HealthCheckFailed(String),
}

/// Redis connection errors raised while building the pool
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Redis error: {0}")]
    RedisError(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::Protocol(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => RepositoryError::Unavailable(err.to_string()),
            sqlx::Error::Database(db_err) => RepositoryError::Query(db_err.message().to_string()),
            _ => RepositoryError::Query(err.to_string()),
        }
    }
}

impl From<redis::RedisError> for GateError {
    fn from(err: redis::RedisError) -> Self {
        GateError::Unavailable(err.to_string())
    }
}

impl From<redis::RedisError> for StorageError {
    fn from(err: redis::RedisError) -> Self {
        StorageError::RedisError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_timeout_is_systemic() {
        let err: RepositoryError = sqlx::Error::PoolTimedOut.into();
        assert!(err.is_systemic());
    }

    #[test]
    fn test_row_not_found_is_not_systemic() {
        let err: RepositoryError = sqlx::Error::RowNotFound.into();
        assert!(!err.is_systemic());
        assert!(matches!(err, RepositoryError::Query(_)));
    }

    #[test]
    fn test_aborted_batch_message_carries_partial_counts() {
        let partial = PublicationResult {
            attempted: 3,
            published: 2,
            ..Default::default()
        };
        let err = PublishError::RepositoryUnavailable {
            source: RepositoryError::Unavailable("connection reset".to_string()),
            partial,
        };

        let message = err.to_string();
        assert!(message.contains("3 attempted"));
        assert!(message.contains("2 published"));
        assert!(message.contains("connection reset"));
        assert_eq!(err.partial().map(|p| p.published), Some(2));
    }

    #[test]
    fn test_scan_error_has_no_partial() {
        let err = PublishError::from(RepositoryError::Query("syntax".to_string()));
        assert!(err.partial().is_none());
    }
}
