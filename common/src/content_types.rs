// Allowed content type resolution

use crate::config::PublisherConfig;
use crate::errors::RepositoryError;
use crate::repository::ContentRepository;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Extension point the host can use to rewrite the allowed type list
pub trait ContentTypeFilter: Send + Sync {
    fn filter(&self, content_types: Vec<String>) -> Vec<String>;
}

impl<F> ContentTypeFilter for F
where
    F: Fn(Vec<String>) -> Vec<String> + Send + Sync,
{
    fn filter(&self, content_types: Vec<String>) -> Vec<String> {
        self(content_types)
    }
}

/// Builds the set of content types the scanner may publish.
///
/// Order of application: defaults, then types registered in the store, then
/// every host filter in registration order, then configured extras, then
/// configured exclusions.
#[derive(Clone, Default)]
pub struct ContentTypeResolver {
    defaults: Vec<String>,
    extra: Vec<String>,
    excluded: Vec<String>,
    filters: Vec<Arc<dyn ContentTypeFilter>>,
}

impl ContentTypeResolver {
    pub fn new(defaults: Vec<String>) -> Self {
        Self {
            defaults,
            ..Default::default()
        }
    }

    pub fn from_config(config: &PublisherConfig) -> Self {
        Self {
            defaults: config.default_content_types.clone(),
            extra: config.extra_content_types.clone(),
            excluded: config.excluded_content_types.clone(),
            filters: Vec::new(),
        }
    }

    pub fn with_filter(mut self, filter: Arc<dyn ContentTypeFilter>) -> Self {
        self.filters.push(filter);
        self
    }

    #[instrument(skip(self, repository))]
    pub async fn allowed_content_types(
        &self,
        repository: &dyn ContentRepository,
    ) -> Result<Vec<String>, RepositoryError> {
        let registered = repository.registered_content_types().await?;

        let mut types: Vec<String> = self.defaults.iter().cloned().chain(registered).collect();
        for filter in &self.filters {
            types = filter.filter(types);
        }
        types.extend(self.extra.iter().cloned());

        let resolved = normalize(types, &self.excluded);
        debug!(content_types = ?resolved, "Resolved allowed content types");
        Ok(resolved)
    }
}

fn normalize(types: Vec<String>, excluded: &[String]) -> Vec<String> {
    let mut resolved: Vec<String> = Vec::with_capacity(types.len());
    for content_type in types {
        let content_type = content_type.trim();
        if content_type.is_empty()
            || excluded.iter().any(|e| e == content_type)
            || resolved.iter().any(|t| t == content_type)
        {
            continue;
        }
        resolved.push(content_type.to_string());
    }
    resolved
}
