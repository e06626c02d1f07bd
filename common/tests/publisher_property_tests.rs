// Property-based tests for overdue scanning and publication

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use common::config::PublisherConfig;
use common::debounce::{DebounceGate, InMemoryDebounceGate};
use common::errors::RepositoryError;
use common::models::{
    ContentId, ContentItem, ContentStatus, OverdueCandidate, PageKind, RenderContext, ScanFilter,
    TransitionOutcome,
};
use common::publisher::{DueItemScanner, PublicationExecutor, PublishingService};
use common::repository::{ContentRepository, OptionsStore};
use proptest::prelude::*;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// In-memory content store

#[derive(Default)]
struct InMemoryContentStore {
    items: Mutex<HashMap<ContentId, ContentItem>>,
    failing_publish: HashSet<ContentId>,
    overdue_queries: AtomicUsize,
    publish_calls: Mutex<Vec<ContentId>>,
}

impl InMemoryContentStore {
    fn with_items(items: Vec<ContentItem>) -> Self {
        Self {
            items: Mutex::new(items.into_iter().map(|i| (i.id, i)).collect()),
            ..Default::default()
        }
    }

    fn failing(mut self, ids: impl IntoIterator<Item = ContentId>) -> Self {
        self.failing_publish = ids.into_iter().collect();
        self
    }

    fn status_of(&self, id: ContentId) -> Option<ContentStatus> {
        self.items.lock().unwrap().get(&id).map(|i| i.status)
    }

    fn overdue_queries(&self) -> usize {
        self.overdue_queries.load(Ordering::SeqCst)
    }

    fn published_ids(&self) -> Vec<ContentId> {
        self.publish_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ContentRepository for InMemoryContentStore {
    async fn query_overdue(
        &self,
        content_types: &[String],
        before: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<OverdueCandidate>, RepositoryError> {
        self.overdue_queries.fetch_add(1, Ordering::SeqCst);

        let items = self.items.lock().unwrap();
        let mut rows: Vec<OverdueCandidate> = items
            .values()
            .filter(|i| i.status == ContentStatus::Future)
            .filter(|i| content_types.contains(&i.content_type))
            .filter(|i| i.scheduled_at_utc < before)
            .map(|i| OverdueCandidate {
                id: i.id,
                scheduled_at_utc: i.scheduled_at_utc,
            })
            .collect();
        rows.sort_by(|a, b| {
            a.scheduled_at_utc
                .cmp(&b.scheduled_at_utc)
                .then(a.id.cmp(&b.id))
        });
        rows.truncate(limit);
        Ok(rows)
    }

    async fn get_by_id(&self, id: ContentId) -> Result<Option<ContentItem>, RepositoryError> {
        Ok(self.items.lock().unwrap().get(&id).cloned())
    }

    async fn publish(&self, id: ContentId) -> Result<TransitionOutcome, RepositoryError> {
        if self.failing_publish.contains(&id) {
            return Err(RepositoryError::Query(format!("constraint violated on {}", id)));
        }

        let mut items = self.items.lock().unwrap();
        match items.get_mut(&id) {
            Some(item) if item.status == ContentStatus::Future => {
                item.status = ContentStatus::Published;
                self.publish_calls.lock().unwrap().push(id);
                Ok(TransitionOutcome::Published)
            }
            Some(_) => Ok(TransitionOutcome::Rejected(
                "item is no longer scheduled".to_string(),
            )),
            None => Ok(TransitionOutcome::Rejected("item not found".to_string())),
        }
    }

    async fn registered_content_types(&self) -> Result<Vec<String>, RepositoryError> {
        Ok(Vec::new())
    }
}

struct NoOptions;

#[async_trait]
impl OptionsStore for NoOptions {
    async fn get_bool(&self, _name: &str) -> Result<Option<bool>, RepositoryError> {
        Ok(None)
    }

    async fn set_bool(&self, _name: &str, _value: bool) -> Result<(), RepositoryError> {
        Ok(())
    }

    async fn add_bool(&self, _name: &str, _value: bool) -> Result<bool, RepositoryError> {
        Ok(false)
    }
}

fn item_at(id: ContentId, status: ContentStatus, content_type: &str, at: DateTime<Utc>) -> ContentItem {
    ContentItem {
        id,
        title: format!("Item {}", id),
        status,
        content_type: content_type.to_string(),
        scheduled_at_utc: at,
    }
}

fn status_strategy() -> impl Strategy<Value = ContentStatus> {
    prop_oneof![
        4 => Just(ContentStatus::Future),
        1 => Just(ContentStatus::Draft),
        1 => Just(ContentStatus::Pending),
        1 => Just(ContentStatus::Private),
        1 => Just(ContentStatus::Published),
        1 => Just(ContentStatus::Trash),
    ]
}

fn cutoff() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

/// *For any* content store and limit L, the scan returns the L earliest
/// overdue scheduled items of allowed types, oldest first.
#[test]
fn property_scan_returns_earliest_overdue_in_order() {
    proptest!(|(
        rows in prop::collection::vec(
            (status_strategy(), -7200i64..7200i64, prop::bool::ANY),
            0..40
        ),
        limit in 1usize..15,
    )| {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let now = cutoff();
            let items: Vec<ContentItem> = rows
                .iter()
                .enumerate()
                .map(|(i, (status, offset, is_post))| {
                    let content_type = if *is_post { "post" } else { "attachment" };
                    item_at(i as i64 + 1, *status, content_type, now + ChronoDuration::seconds(*offset))
                })
                .collect();

            let mut expected: Vec<&ContentItem> = items
                .iter()
                .filter(|i| i.status == ContentStatus::Future)
                .filter(|i| i.content_type == "post")
                .filter(|i| i.scheduled_at_utc < now)
                .collect();
            expected.sort_by(|a, b| a.scheduled_at_utc.cmp(&b.scheduled_at_utc).then(a.id.cmp(&b.id)));
            let expected: Vec<ContentId> = expected.iter().take(limit).map(|i| i.id).collect();

            let store = Arc::new(InMemoryContentStore::with_items(items.clone()));
            let scanner = DueItemScanner::new(store.clone());
            let filter = ScanFilter::new(vec!["post"], now, limit).unwrap();

            let ids = scanner.find_overdue(&filter).await.unwrap();

            prop_assert!(ids.len() <= limit);
            prop_assert_eq!(&ids, &expected);

            let by_id: HashMap<ContentId, &ContentItem> = items.iter().map(|i| (i.id, i)).collect();
            for pair in ids.windows(2) {
                prop_assert!(by_id[&pair[0]].scheduled_at_utc <= by_id[&pair[1]].scheduled_at_utc);
            }
            Ok(())
        })?;
    });
}

/// The cutoff is exclusive: an item due exactly now is not overdue yet
#[tokio::test]
async fn test_scan_cutoff_is_strict() {
    let now = cutoff();
    let store = Arc::new(InMemoryContentStore::with_items(vec![
        item_at(1, ContentStatus::Future, "post", now),
        item_at(2, ContentStatus::Future, "post", now - ChronoDuration::seconds(1)),
    ]));
    let scanner = DueItemScanner::new(store);
    let filter = ScanFilter::new(vec!["post"], now, 10).unwrap();

    assert_eq!(scanner.find_overdue(&filter).await.unwrap(), vec![2]);
}

#[tokio::test]
async fn test_scan_ignores_never_scheduled_items() {
    let now = cutoff();
    let store = Arc::new(InMemoryContentStore::with_items(vec![
        item_at(1, ContentStatus::Future, "post", Utc.timestamp_opt(0, 0).unwrap()),
        item_at(2, ContentStatus::Future, "post", now - ChronoDuration::minutes(5)),
    ]));
    let scanner = DueItemScanner::new(store);
    let filter = ScanFilter::new(vec!["post"], now, 10).unwrap();

    assert_eq!(scanner.find_overdue(&filter).await.unwrap(), vec![2]);
}

/// *For any* candidate list, including candidates whose status changed after
/// the scan, only items still scheduled at publish time are published.
#[test]
fn property_never_publishes_unscheduled_items() {
    proptest!(|(statuses in prop::collection::vec(status_strategy(), 1..30))| {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let due = Utc::now() - ChronoDuration::hours(1);
            let items: Vec<ContentItem> = statuses
                .iter()
                .enumerate()
                .map(|(i, status)| item_at(i as i64 + 1, *status, "post", due))
                .collect();
            let ids: Vec<ContentId> = items.iter().map(|i| i.id).collect();
            let scheduled: HashSet<ContentId> = items
                .iter()
                .filter(|i| i.status == ContentStatus::Future)
                .map(|i| i.id)
                .collect();

            let store = Arc::new(InMemoryContentStore::with_items(items.clone()));
            let executor = PublicationExecutor::new(store.clone());

            let result = executor.publish_overdue(&ids).await.unwrap();

            prop_assert_eq!(result.attempted, ids.len());
            prop_assert_eq!(result.published, scheduled.len());
            prop_assert_eq!(result.skipped, ids.len() - scheduled.len());
            prop_assert!(result.errors.is_empty());

            for id in store.published_ids() {
                prop_assert!(scheduled.contains(&id));
            }
            for item in &items {
                if item.status != ContentStatus::Future {
                    prop_assert_eq!(store.status_of(item.id), Some(item.status));
                }
            }
            Ok(())
        })?;
    });
}

/// *For any* subset of failing transitions, the other items still publish
#[test]
fn property_item_failures_are_isolated() {
    proptest!(|(
        count in 1usize..20,
        failing_mask in prop::collection::vec(prop::bool::weighted(0.3), 20),
    )| {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let due = Utc::now() - ChronoDuration::hours(1);
            let items: Vec<ContentItem> = (1..=count as i64)
                .map(|id| item_at(id, ContentStatus::Future, "post", due))
                .collect();
            let failing: Vec<ContentId> = (1..=count as i64)
                .filter(|id| failing_mask[(*id - 1) as usize])
                .collect();
            let ids: Vec<ContentId> = items.iter().map(|i| i.id).collect();

            let store = Arc::new(InMemoryContentStore::with_items(items).failing(failing.clone()));
            let executor = PublicationExecutor::new(store.clone());

            let result = executor.publish_overdue(&ids).await.unwrap();

            prop_assert_eq!(result.attempted, count);
            prop_assert_eq!(result.published, count - failing.len());
            let failed_ids: Vec<ContentId> = result.errors.iter().map(|e| e.item_id).collect();
            prop_assert_eq!(failed_ids, failing);
            Ok(())
        })?;
    });
}

#[tokio::test]
async fn test_one_failing_item_of_five() {
    let due = Utc::now() - ChronoDuration::hours(1);
    let items: Vec<ContentItem> = (1..=5)
        .map(|id| item_at(id, ContentStatus::Future, "post", due))
        .collect();
    let store = Arc::new(InMemoryContentStore::with_items(items).failing([3]));
    let executor = PublicationExecutor::new(store.clone());

    let result = executor.publish_overdue(&[1, 2, 3, 4, 5]).await.unwrap();

    assert_eq!(result.attempted, 5);
    assert_eq!(result.published, 4);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].item_id, 3);
    assert_eq!(store.status_of(3), Some(ContentStatus::Future));
    assert_eq!(store.published_ids(), vec![1, 2, 4, 5]);
}

/// *For any* number of concurrent callers, exactly one acquires an open gate
#[test]
fn property_gate_admits_one_concurrent_caller() {
    proptest!(ProptestConfig::with_cases(32), |(callers in 2usize..64)| {
        let rt = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(4)
            .enable_all()
            .build()
            .unwrap();
        let acquired = rt.block_on(async {
            let gate = Arc::new(InMemoryDebounceGate::new());
            let handles: Vec<_> = (0..callers)
                .map(|_| {
                    let gate = gate.clone();
                    tokio::spawn(async move {
                        gate.try_acquire("content_publisher_last_check", Duration::from_secs(300))
                            .await
                            .unwrap()
                    })
                })
                .collect();

            let mut acquired = 0;
            for handle in handles {
                if handle.await.unwrap() {
                    acquired += 1;
                }
            }
            acquired
        });

        prop_assert_eq!(acquired, 1);
    });
}

fn render_service(ttl_seconds: u64, store: Arc<InMemoryContentStore>) -> PublishingService {
    let config = PublisherConfig {
        debounce_ttl_seconds: ttl_seconds,
        ..Default::default()
    };
    PublishingService::new(
        config,
        store,
        Arc::new(InMemoryDebounceGate::new()),
        Arc::new(NoOptions),
    )
}

#[tokio::test]
async fn test_back_to_back_renders_scan_once_within_window() {
    let store = Arc::new(InMemoryContentStore::default());
    let service = render_service(300, store.clone());
    let context = RenderContext::new(PageKind::FrontPage);

    service.on_render(&context).await;
    service.on_render(&context).await;

    assert_eq!(store.overdue_queries(), 1);
}

#[tokio::test]
async fn test_zero_ttl_scans_on_every_render() {
    let store = Arc::new(InMemoryContentStore::default());
    let service = render_service(0, store.clone());
    let context = RenderContext::new(PageKind::Single);

    service.on_render(&context).await;
    service.on_render(&context).await;

    assert_eq!(store.overdue_queries(), 2);
}

#[tokio::test]
async fn test_render_publishes_overdue_post_end_to_end() {
    let now = Utc::now();
    let store = Arc::new(InMemoryContentStore::with_items(vec![
        item_at(10, ContentStatus::Future, "post", now - ChronoDuration::minutes(30)),
        item_at(11, ContentStatus::Future, "post", now + ChronoDuration::hours(2)),
        item_at(12, ContentStatus::Future, "attachment", now - ChronoDuration::minutes(30)),
    ]));
    let service = render_service(300, store.clone());

    let outcome = service.on_render(&RenderContext::new(PageKind::Page)).await;

    assert_eq!(outcome.published(), 1);
    assert_eq!(store.status_of(10), Some(ContentStatus::Published));
    assert_eq!(store.status_of(11), Some(ContentStatus::Future));
    assert_eq!(store.status_of(12), Some(ContentStatus::Future));
}

#[tokio::test]
async fn test_empty_content_types_issue_no_query() {
    let store = Arc::new(InMemoryContentStore::default());
    let config = PublisherConfig {
        default_content_types: Vec::new(),
        ..Default::default()
    };
    let service = PublishingService::new(
        config,
        store.clone(),
        Arc::new(InMemoryDebounceGate::new()),
        Arc::new(NoOptions),
    );

    let result = service.run_pipeline().await.unwrap();

    assert_eq!(result.attempted, 0);
    assert_eq!(store.overdue_queries(), 0);
}
