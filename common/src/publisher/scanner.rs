// Due-item scanner

use crate::errors::RepositoryError;
use crate::models::{is_zero_timestamp, ContentId, ScanFilter};
use crate::repository::ContentRepository;
use crate::telemetry;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Finds overdue scheduled items through the content repository
#[derive(Clone)]
pub struct DueItemScanner {
    repository: Arc<dyn ContentRepository>,
}

impl DueItemScanner {
    pub fn new(repository: Arc<dyn ContentRepository>) -> Self {
        Self { repository }
    }

    /// Ids of items with status `Future`, a type in the filter, and a
    /// scheduled time strictly before the cutoff; oldest first, truncated to
    /// the filter's limit.
    ///
    /// The repository is trusted for the query itself; rows it returns are
    /// still checked against the cutoff, the zero timestamp and the limit.
    #[instrument(skip(self, filter), fields(
        content_types = ?filter.content_types(),
        cutoff = %filter.cutoff_utc(),
        limit = filter.limit()
    ))]
    pub async fn find_overdue(&self, filter: &ScanFilter) -> Result<Vec<ContentId>, RepositoryError> {
        if !filter.has_content_types() {
            debug!("No allowed content types, skipping overdue query");
            return Ok(Vec::new());
        }

        let mut candidates = self
            .repository
            .query_overdue(filter.content_types(), filter.cutoff_utc(), filter.limit())
            .await?;

        let returned = candidates.len();
        candidates.retain(|c| {
            !is_zero_timestamp(&c.scheduled_at_utc) && c.scheduled_at_utc < filter.cutoff_utc()
        });
        if candidates.len() != returned {
            warn!(
                dropped = returned - candidates.len(),
                "Repository returned rows outside the scan window"
            );
        }

        candidates.sort_by(|a, b| {
            a.scheduled_at_utc
                .cmp(&b.scheduled_at_utc)
                .then(a.id.cmp(&b.id))
        });
        candidates.truncate(filter.limit());

        telemetry::set_overdue_candidates(candidates.len());
        debug!(count = candidates.len(), "Overdue candidates found");

        Ok(candidates.into_iter().map(|c| c.id).collect())
    }
}
