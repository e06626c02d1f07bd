// Capability traits for the external content store and host option storage

use crate::errors::RepositoryError;
use crate::models::{ContentId, ContentItem, OverdueCandidate, TransitionOutcome};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// The content store the publisher reads from and requests transitions on.
///
/// Implementations must tolerate concurrent callers. `publish` must be safe to
/// call on an item that is already published: it either does nothing and
/// reports `Rejected`, or reports `Published` without side effects.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContentRepository: Send + Sync {
    /// Scheduled items of the given types due strictly before `before`,
    /// oldest first, at most `limit` rows.
    async fn query_overdue(
        &self,
        content_types: &[String],
        before: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<OverdueCandidate>, RepositoryError>;

    async fn get_by_id(&self, id: ContentId) -> Result<Option<ContentItem>, RepositoryError>;

    async fn publish(&self, id: ContentId) -> Result<TransitionOutcome, RepositoryError>;

    /// Public content types registered beyond the defaults
    async fn registered_content_types(&self) -> Result<Vec<String>, RepositoryError>;
}

/// Persistent boolean options owned by the host
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OptionsStore: Send + Sync {
    async fn get_bool(&self, name: &str) -> Result<Option<bool>, RepositoryError>;

    async fn set_bool(&self, name: &str, value: bool) -> Result<(), RepositoryError>;

    /// Store `value` only if the option does not exist yet. Returns whether it was written.
    async fn add_bool(&self, name: &str, value: bool) -> Result<bool, RepositoryError>;
}
