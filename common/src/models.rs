use crate::errors::PublishError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;

/// Opaque content identifier. Valid identifiers are positive.
pub type ContentId = i64;

// ============================================================================
// Content Models
// ============================================================================

/// ContentStatus represents the lifecycle state of a content item
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ContentStatus {
    Draft,
    Pending,
    Private,
    Future,
    Published,
    Trash,
}

impl std::fmt::Display for ContentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContentStatus::Draft => write!(f, "draft"),
            ContentStatus::Pending => write!(f, "pending"),
            ContentStatus::Private => write!(f, "private"),
            ContentStatus::Future => write!(f, "future"),
            ContentStatus::Published => write!(f, "published"),
            ContentStatus::Trash => write!(f, "trash"),
        }
    }
}

impl FromStr for ContentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(ContentStatus::Draft),
            "pending" => Ok(ContentStatus::Pending),
            "private" => Ok(ContentStatus::Private),
            "future" => Ok(ContentStatus::Future),
            "published" => Ok(ContentStatus::Published),
            "trash" => Ok(ContentStatus::Trash),
            _ => Err(format!("Invalid content status: {}", s)),
        }
    }
}

impl TryFrom<String> for ContentStatus {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::from_str(&s)
    }
}

/// ContentItem is a single piece of content owned by the content store
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq, Eq)]
pub struct ContentItem {
    pub id: ContentId,
    pub title: String,
    #[sqlx(try_from = "String")]
    pub status: ContentStatus,
    pub content_type: String,
    pub scheduled_at_utc: DateTime<Utc>,
}

/// A row returned by the overdue query, before re-validation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, FromRow, PartialEq, Eq)]
pub struct OverdueCandidate {
    pub id: ContentId,
    pub scheduled_at_utc: DateTime<Utc>,
}

/// The "never scheduled" timestamp some legacy rows carry
pub fn is_zero_timestamp(ts: &DateTime<Utc>) -> bool {
    ts.timestamp() == 0 && ts.timestamp_subsec_nanos() == 0
}

/// Outcome of asking the store to move an item to published
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionOutcome {
    Published,
    Rejected(String),
}

// ============================================================================
// Scan and Publication Models
// ============================================================================

/// Parameters of a single overdue scan. Built fresh per scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanFilter {
    content_types: Vec<String>,
    cutoff_utc: DateTime<Utc>,
    limit: usize,
}

impl ScanFilter {
    /// Build a filter for items scheduled strictly before `cutoff_utc`.
    ///
    /// Content types are de-duplicated preserving first occurrence; blank names
    /// are dropped. An empty type set is allowed and yields an empty scan.
    pub fn new<I, S>(
        content_types: I,
        cutoff_utc: DateTime<Utc>,
        limit: usize,
    ) -> Result<Self, PublishError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if limit == 0 {
            return Err(PublishError::InvalidFilter(
                "limit must be greater than 0".to_string(),
            ));
        }

        let mut types: Vec<String> = Vec::new();
        for content_type in content_types {
            let content_type = content_type.into();
            let trimmed = content_type.trim();
            if trimmed.is_empty() || types.iter().any(|t| t == trimmed) {
                continue;
            }
            types.push(trimmed.to_string());
        }

        Ok(Self {
            content_types: types,
            cutoff_utc,
            limit,
        })
    }

    pub fn content_types(&self) -> &[String] {
        &self.content_types
    }

    /// Only scheduled items are ever scanned
    pub fn status(&self) -> ContentStatus {
        ContentStatus::Future
    }

    pub fn cutoff_utc(&self) -> DateTime<Utc> {
        self.cutoff_utc
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn has_content_types(&self) -> bool {
        !self.content_types.is_empty()
    }
}

/// A per-item publication failure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PublicationFailure {
    pub item_id: ContentId,
    pub reason: String,
}

/// Aggregate result of one publication batch
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PublicationResult {
    pub attempted: usize,
    pub published: usize,
    pub skipped: usize,
    pub errors: Vec<PublicationFailure>,
}

impl PublicationResult {
    pub fn is_empty(&self) -> bool {
        self.attempted == 0
    }
}

// ============================================================================
// Render Context
// ============================================================================

/// Kind of page a content-serving request resolves to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PageKind {
    FrontPage,
    Single,
    Page,
    Archive,
    Feed,
    Search,
    Ajax,
    NotFound,
    Other,
}

/// What the host knows about the request that is about to render
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RenderContext {
    pub is_admin: bool,
    pub is_main_query: bool,
    pub page_kind: PageKind,
}

impl RenderContext {
    pub fn new(page_kind: PageKind) -> Self {
        Self {
            is_admin: false,
            is_main_query: true,
            page_kind,
        }
    }

    /// Public, primary render of a page kind that sees steady traffic
    pub fn is_eligible(&self) -> bool {
        !self.is_admin
            && self.is_main_query
            && matches!(
                self.page_kind,
                PageKind::FrontPage | PageKind::Single | PageKind::Page
            )
    }
}

/// Snapshot of the publisher's effective configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PublisherStatus {
    pub version: String,
    pub allowed_content_types: Vec<String>,
    pub debounce_ttl_seconds: u64,
    pub max_items_per_run: usize,
    pub periodic_enabled: bool,
}
