// Render hook for Axum: runs the opportunistic trigger before content renders

use crate::models::{PageKind, RenderContext};
use crate::publisher::PublishingService;
use axum::{
    extract::{Request, State},
    http::{header::HeaderMap, Method},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::instrument;

/// URL layout used to classify content requests.
///
/// Paths matching none of the configured routes classify as
/// `PageKind::Other` and never trigger publication.
#[derive(Debug, Clone)]
pub struct RenderRoutes {
    pub admin_prefix: String,
    pub single_prefixes: Vec<String>,
    /// Static pages served under a common prefix
    pub page_prefixes: Vec<String>,
    /// Static pages matched exactly, e.g. `/about`
    pub page_paths: Vec<String>,
    pub archive_prefixes: Vec<String>,
    pub search_path: String,
    pub feed_segment: String,
}

impl Default for RenderRoutes {
    fn default() -> Self {
        Self {
            admin_prefix: "/admin".to_string(),
            single_prefixes: vec!["/posts/".to_string()],
            page_prefixes: vec!["/pages/".to_string()],
            page_paths: Vec::new(),
            archive_prefixes: vec![
                "/category/".to_string(),
                "/tag/".to_string(),
                "/author/".to_string(),
            ],
            search_path: "/search".to_string(),
            feed_segment: "feed".to_string(),
        }
    }
}

impl RenderRoutes {
    /// Derive a render context from the request line and headers
    pub fn classify(&self, method: &Method, path: &str, headers: &HeaderMap) -> RenderContext {
        let is_admin = path == self.admin_prefix
            || path.starts_with(&format!("{}/", self.admin_prefix.trim_end_matches('/')));
        let is_main_query = method == Method::GET || method == Method::HEAD;

        let is_ajax = headers
            .get("x-requested-with")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.eq_ignore_ascii_case("xmlhttprequest"));

        let trimmed = path.trim_end_matches('/');
        let is_asset = trimmed.rsplit('/').next().is_some_and(|segment| segment.contains('.'));

        let page_kind = if is_ajax {
            PageKind::Ajax
        } else if path == "/" || path.is_empty() {
            PageKind::FrontPage
        } else if trimmed.rsplit('/').next() == Some(self.feed_segment.as_str()) {
            PageKind::Feed
        } else if is_asset {
            PageKind::Other
        } else if trimmed == self.search_path {
            PageKind::Search
        } else if self.single_prefixes.iter().any(|p| path.starts_with(p.as_str())) {
            PageKind::Single
        } else if self.page_paths.iter().any(|p| p.trim_end_matches('/') == trimmed)
            || self.page_prefixes.iter().any(|p| path.starts_with(p.as_str()))
        {
            PageKind::Page
        } else if self.archive_prefixes.iter().any(|p| path.starts_with(p.as_str())) {
            PageKind::Archive
        } else {
            PageKind::Other
        };

        RenderContext {
            is_admin,
            is_main_query,
            page_kind,
        }
    }
}

/// State for [`publish_on_render`]
pub struct RenderHook {
    service: Arc<PublishingService>,
    routes: RenderRoutes,
}

impl RenderHook {
    pub fn new(service: Arc<PublishingService>, routes: RenderRoutes) -> Self {
        Self { service, routes }
    }
}

/// Axum middleware; install with `middleware::from_fn_with_state(hook, publish_on_render)`.
///
/// A `RenderContext` already present in the request extensions wins over
/// path-based classification; hosts that resolve routes themselves insert one
/// (for example `PageKind::NotFound` for unmatched routes). The response never
/// depends on the outcome.
#[instrument(skip_all, fields(path = %request.uri().path()))]
pub async fn publish_on_render(
    State(hook): State<Arc<RenderHook>>,
    request: Request,
    next: Next,
) -> Response {
    let context = match request.extensions().get::<RenderContext>() {
        Some(context) => *context,
        None => hook
            .routes
            .classify(request.method(), request.uri().path(), request.headers()),
    };

    // Outcome is logged inside the service
    let _ = hook.service.on_render(&context).await;

    next.run(request).await
}
