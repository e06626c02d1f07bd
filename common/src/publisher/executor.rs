// Publication executor: re-validates each candidate and performs the transition

use crate::errors::{PublishError, RepositoryError};
use crate::models::{
    ContentId, ContentStatus, PublicationFailure, PublicationResult, TransitionOutcome,
};
use crate::repository::ContentRepository;
use crate::telemetry;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// What happened to a single candidate
#[derive(Debug, Clone, PartialEq, Eq)]
enum ItemOutcome {
    Published,
    Skipped(&'static str),
    Failed(String),
}

/// Publishes overdue candidates one at a time, in the order given
#[derive(Clone)]
pub struct PublicationExecutor {
    repository: Arc<dyn ContentRepository>,
}

impl PublicationExecutor {
    pub fn new(repository: Arc<dyn ContentRepository>) -> Self {
        Self { repository }
    }

    /// Publish every candidate that is still scheduled when re-read.
    ///
    /// Items that vanished or changed status are skipped. A rejected or failed
    /// transition is recorded and the batch continues. Only an unreachable
    /// repository aborts the batch, returning the counts accumulated so far.
    #[instrument(skip(self, ids), fields(candidates = ids.len()))]
    pub async fn publish_overdue(&self, ids: &[ContentId]) -> Result<PublicationResult, PublishError> {
        let mut result = PublicationResult::default();

        for &id in ids {
            let outcome = match self.publish_one(id).await {
                Ok(outcome) => outcome,
                Err(source) => {
                    error!(
                        item_id = id,
                        attempted_so_far = result.attempted,
                        published_so_far = result.published,
                        error = %source,
                        "Content repository unavailable, aborting publication batch"
                    );
                    return Err(PublishError::RepositoryUnavailable {
                        source,
                        partial: result,
                    });
                }
            };

            result.attempted += 1;
            match outcome {
                ItemOutcome::Published => result.published += 1,
                ItemOutcome::Skipped(reason) => {
                    debug!(item_id = id, reason, "Skipped stale candidate");
                    telemetry::record_skipped();
                    result.skipped += 1;
                }
                ItemOutcome::Failed(reason) => {
                    telemetry::record_publish_error(&reason);
                    result.errors.push(PublicationFailure { item_id: id, reason });
                }
            }
        }

        Ok(result)
    }

    /// Err only for systemic repository failures
    async fn publish_one(&self, id: ContentId) -> Result<ItemOutcome, RepositoryError> {
        if id <= 0 {
            return Ok(ItemOutcome::Skipped("invalid id"));
        }

        // Re-read: another run may have published, unscheduled or deleted it
        let item = match self.repository.get_by_id(id).await {
            Ok(Some(item)) => item,
            Ok(None) => return Ok(ItemOutcome::Skipped("item no longer exists")),
            Err(e) if e.is_systemic() => return Err(e),
            Err(e) => {
                warn!(item_id = id, error = %e, "Failed to re-read candidate");
                return Ok(ItemOutcome::Failed(e.to_string()));
            }
        };

        if item.status != ContentStatus::Future {
            return Ok(ItemOutcome::Skipped("item is no longer scheduled"));
        }

        match self.repository.publish(id).await {
            Ok(TransitionOutcome::Published) => {
                info!(
                    item_id = id,
                    title = %item.title,
                    content_type = %item.content_type,
                    scheduled_at = %item.scheduled_at_utc,
                    "Published overdue content item"
                );
                telemetry::record_published(&item.content_type);
                Ok(ItemOutcome::Published)
            }
            Ok(TransitionOutcome::Rejected(reason)) => {
                warn!(item_id = id, reason = %reason, "Publish transition rejected");
                Ok(ItemOutcome::Failed(reason))
            }
            Err(e) if e.is_systemic() => Err(e),
            Err(e) => {
                warn!(item_id = id, error = %e, "Publish transition failed");
                Ok(ItemOutcome::Failed(e.to_string()))
            }
        }
    }
}
