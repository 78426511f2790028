//! Tests for adapter module

use super::*;
use crate::config::{DiffMode, PagingConfig, SessionConfig};
use crate::diff::{DiffPolicy, ListChange, ValueDiffPolicy};
use crate::error::{Error, Result};
use crate::pagination::QueryDescriptor;
use crate::store::mock::{FlakyStore, GatedStore};
use crate::store::{DocumentRef, MemoryStore, Snapshot, Store};
use crate::types::SortDirection;
use futures::StreamExt;
use pretty_assertions::assert_eq;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

#[derive(Debug, Clone, PartialEq, Deserialize)]
struct Article {
    title: String,
    #[serde(rename = "categoryId")]
    category_id: f64,
}

// ============================================================================
// Helpers
// ============================================================================

/// a..e in category 5, x in 6, w in 4
fn articles() -> MemoryStore {
    MemoryStore::from_value(json!({
        "articles": {
            "a": {"title": "A", "categoryId": 5},
            "b": {"title": "B", "categoryId": 5},
            "c": {"title": "C", "categoryId": 5},
            "d": {"title": "D", "categoryId": 5},
            "e": {"title": "E", "categoryId": 5},
            "w": {"title": "W", "categoryId": 4},
            "x": {"title": "X", "categoryId": 6}
        }
    }))
}

fn options(store: Arc<dyn Store>, category: f64, page_size: usize) -> PagingOptions<Article> {
    PagingOptions::builder()
        .set_query_json(
            store,
            QueryDescriptor::new("articles", "categoryId", category, true),
            PagingConfig::new(page_size),
        )
        .build()
        .unwrap()
}

async fn started(store: Arc<dyn Store>, page_size: usize) -> PagingAdapter<Article> {
    let adapter = PagingAdapter::new(options(store, 5.0, page_size)).unwrap();
    adapter.start().await;
    adapter
}

async fn keys(adapter: &PagingAdapter<Article>) -> Vec<String> {
    adapter
        .snapshots()
        .await
        .iter()
        .map(|s| s.key().to_string())
        .collect()
}

async fn load_all(adapter: &PagingAdapter<Article>) -> usize {
    let mut loads = 0;
    while let LoadOutcome::Appended(_) = adapter.load_more().await.unwrap() {
        loads += 1;
        assert!(loads < 50, "session did not terminate");
    }
    loads
}

// ============================================================================
// Options Tests
// ============================================================================

#[test]
fn test_builder_requires_query() {
    let err = PagingOptions::<Article>::builder().build().unwrap_err();
    assert!(matches!(err, Error::Config { .. }));
    assert!(err.to_string().contains("set_query()"));
}

#[test]
fn test_builder_validates() {
    let store: Arc<dyn Store> = Arc::new(articles());

    let err = PagingOptions::<Article>::builder()
        .set_query_json(
            store.clone(),
            QueryDescriptor::new("articles", "", 5.0, true),
            PagingConfig::default(),
        )
        .build()
        .unwrap_err();
    assert!(matches!(err, Error::MissingConfigField { .. }));

    let err = PagingOptions::<Article>::builder()
        .set_query_json(
            store,
            QueryDescriptor::new("articles", "categoryId", 5.0, true),
            PagingConfig::new(0),
        )
        .build()
        .unwrap_err();
    assert!(matches!(err, Error::InvalidConfigValue { .. }));
}

#[test]
fn test_from_session() {
    let session = SessionConfig {
        path: "articles".to_string(),
        category_field: "categoryId".to_string(),
        category_value: 5.0,
        direction: SortDirection::Descending,
        paging: PagingConfig::new(3),
        diff: DiffMode::Key,
    };

    let parser = |s: &Snapshot| -> Result<String> { Ok(s.key().to_string()) };
    let options = PagingOptions::<String>::from_session(Arc::new(articles()), &session, parser)
        .unwrap();

    assert!(!options.descriptor().is_ascending());
    assert_eq!(options.config().page_size, 3);
}

// ============================================================================
// Lifecycle Tests
// ============================================================================

#[tokio::test]
async fn test_idle_adapter_does_not_load() {
    let store = Arc::new(FlakyStore::new(articles()));
    let adapter = PagingAdapter::new(options(store.clone(), 5.0, 2)).unwrap();

    assert!(!adapter.is_active().await);
    assert_eq!(adapter.load_more().await.unwrap(), LoadOutcome::Inactive);
    assert!(store.queries().is_empty());
    assert!(!adapter.needs_more(0).await);
}

#[tokio::test]
async fn test_start_stop_are_idempotent() {
    let adapter = PagingAdapter::new(options(Arc::new(articles()), 5.0, 2)).unwrap();

    adapter.start().await;
    adapter.start().await;
    assert!(adapter.is_active().await);
    assert_eq!(adapter.generation().await, 0);

    adapter.stop().await;
    let generation = adapter.generation().await;
    adapter.stop().await;
    assert!(!adapter.is_active().await);
    assert_eq!(adapter.generation().await, generation);
}

#[tokio::test]
async fn test_loads_category_to_exhaustion() {
    let adapter = started(Arc::new(articles()), 2).await;

    let loads = load_all(&adapter).await;

    assert_eq!(loads, 3);
    assert_eq!(keys(&adapter).await, vec!["a", "b", "c", "d", "e"]);
    assert!(adapter.is_exhausted().await);
    assert_eq!(adapter.load_state().await, LoadState::Complete);
    assert_eq!(adapter.load_more().await.unwrap(), LoadOutcome::Exhausted);
}

#[tokio::test]
async fn test_descending_session() {
    let store: Arc<dyn Store> = Arc::new(articles());
    let options = PagingOptions::<Article>::builder()
        .set_query_json(
            store,
            QueryDescriptor::new("articles", "categoryId", 5.0, false),
            PagingConfig::new(2).with_initial_load_size(3),
        )
        .build()
        .unwrap();
    let adapter = PagingAdapter::new(options).unwrap();
    adapter.start().await;

    let first = adapter.load_more().await.unwrap();
    assert_eq!(first.change().unwrap().inserted, 0..3);
    assert_eq!(keys(&adapter).await, vec!["e", "d", "c"]);

    load_all(&adapter).await;
    assert_eq!(keys(&adapter).await, vec!["e", "d", "c", "b", "a"]);
}

#[tokio::test]
async fn test_stop_retains_list_and_resumes() {
    let adapter = started(Arc::new(articles()), 2).await;
    adapter.load_more().await.unwrap();

    adapter.stop().await;
    assert_eq!(adapter.len().await, 2);
    assert_eq!(adapter.load_more().await.unwrap(), LoadOutcome::Inactive);

    adapter.start().await;
    adapter.load_more().await.unwrap();
    assert_eq!(keys(&adapter).await, vec!["a", "b", "c", "d"]);
}

#[tokio::test]
async fn test_stop_discards_late_result() {
    let store = Arc::new(GatedStore::new(articles()));
    let adapter = started(store.clone(), 2).await;

    let mut pending = Box::pin(adapter.load_more());
    assert!(futures::poll!(pending.as_mut()).is_pending());
    assert_eq!(adapter.load_state().await, LoadState::Loading);

    adapter.stop().await;
    store.release(1);

    assert_eq!(pending.await.unwrap(), LoadOutcome::Superseded);
    assert!(adapter.is_empty().await);
    assert_eq!(adapter.load_state().await, LoadState::Idle);
}

#[tokio::test]
async fn test_concurrent_load_reports_in_flight() {
    let store = Arc::new(GatedStore::new(articles()));
    let adapter = started(store.clone(), 2).await;

    let mut pending = Box::pin(adapter.load_more());
    assert!(futures::poll!(pending.as_mut()).is_pending());

    assert_eq!(adapter.load_more().await.unwrap(), LoadOutcome::InFlight);
    assert_eq!(adapter.load_state().await, LoadState::Loading);

    store.release(1);
    assert!(matches!(pending.await.unwrap(), LoadOutcome::Appended(_)));
    assert_eq!(adapter.len().await, 2);

    store.release(1);
    adapter.load_more().await.unwrap();
    assert_eq!(keys(&adapter).await, vec!["a", "b", "c", "d"]);
}

#[tokio::test]
async fn test_cancelled_load_releases_session() {
    let store = Arc::new(GatedStore::new(articles()));
    let adapter = started(store.clone(), 2).await;

    let mut pending = Box::pin(adapter.load_more());
    assert!(futures::poll!(pending.as_mut()).is_pending());
    drop(pending);

    store.release(1);
    assert!(matches!(
        adapter.load_more().await.unwrap(),
        LoadOutcome::Appended(_)
    ));
    assert_eq!(keys(&adapter).await, vec!["a", "b"]);
}

#[tokio::test]
async fn test_replace_query_clears_and_keeps_state() {
    let store: Arc<dyn Store> = Arc::new(articles());
    let adapter = started(store.clone(), 10).await;
    load_all(&adapter).await;
    assert_eq!(adapter.len().await, 5);

    adapter.replace_query(options(store.clone(), 6.0, 10)).await.unwrap();
    assert!(adapter.is_active().await);
    assert!(adapter.is_empty().await);
    assert!(!adapter.is_exhausted().await);
    assert_eq!(adapter.load_state().await, LoadState::Idle);

    load_all(&adapter).await;
    assert_eq!(keys(&adapter).await, vec!["x"]);

    adapter.stop().await;
    adapter.replace_query(options(store, 4.0, 10)).await.unwrap();
    assert!(!adapter.is_active().await);
    assert_eq!(adapter.options().await.descriptor().category_value, 4.0);
}

#[tokio::test]
async fn test_replace_query_discards_in_flight_page() {
    let store = Arc::new(GatedStore::new(articles()));
    let adapter = started(store.clone(), 2).await;

    let mut pending = Box::pin(adapter.load_more());
    assert!(futures::poll!(pending.as_mut()).is_pending());

    adapter
        .replace_query(options(Arc::new(articles()), 6.0, 2))
        .await
        .unwrap();
    store.release(1);
    assert_eq!(pending.await.unwrap(), LoadOutcome::Superseded);

    adapter.load_more().await.unwrap();
    assert_eq!(keys(&adapter).await, vec!["x"]);
}

#[tokio::test]
async fn test_replaced_session_loads_while_old_page_is_pending() {
    let store = Arc::new(GatedStore::new(articles()));
    let adapter = started(store.clone(), 2).await;

    let mut pending = Box::pin(adapter.load_more());
    assert!(futures::poll!(pending.as_mut()).is_pending());

    adapter
        .replace_query(options(Arc::new(articles()), 6.0, 2))
        .await
        .unwrap();
    assert!(matches!(
        adapter.load_more().await.unwrap(),
        LoadOutcome::Appended(_)
    ));

    store.release(1);
    assert_eq!(pending.await.unwrap(), LoadOutcome::Superseded);
    assert_eq!(keys(&adapter).await, vec!["x"]);
}

#[tokio::test]
async fn test_refresh_restarts_session() {
    let store = Arc::new(articles());
    let adapter = started(store.clone(), 10).await;
    load_all(&adapter).await;

    store.remove("articles/c").await;
    adapter.refresh().await.unwrap();
    assert!(adapter.is_empty().await);

    load_all(&adapter).await;
    assert_eq!(keys(&adapter).await, vec!["a", "b", "d", "e"]);
}

#[test]
fn test_replace_query_with_missing_path() {
    tokio_test::block_on(async {
        let store: Arc<dyn Store> = Arc::new(articles());
        let adapter = started(store.clone(), 2).await;
        adapter.load_more().await.unwrap();

        let missing = PagingOptions::builder()
            .set_query_json(
                store,
                QueryDescriptor::new("missing", "categoryId", 5.0, true),
                PagingConfig::new(2),
            )
            .build()
            .unwrap();
        adapter.replace_query(missing).await.unwrap();

        let err = adapter.load_more().await.unwrap_err();
        assert!(err.is_not_found());
        assert!(adapter.is_empty().await);
    });
}

// ============================================================================
// Failure Tests
// ============================================================================

#[tokio::test]
async fn test_failed_load_keeps_data_and_retries_same_cursor() {
    let store = Arc::new(FlakyStore::new(articles()));
    let adapter = started(store.clone(), 2).await;
    adapter.load_more().await.unwrap();

    store.fail_next(1);
    let err = adapter.load_more().await.unwrap_err();
    assert!(matches!(err, Error::Transport { .. }));
    assert_eq!(keys(&adapter).await, vec!["a", "b"]);
    assert_eq!(
        adapter.load_state().await,
        LoadState::Error {
            message: err.to_string(),
            retryable: true,
        }
    );

    let outcome = adapter.retry().await.unwrap();
    assert_eq!(outcome.change().unwrap().inserted, 2..4);
    assert_eq!(keys(&adapter).await, vec!["a", "b", "c", "d"]);

    let queries = store.queries();
    assert_eq!(queries.len(), 3);
    assert_eq!(queries[1], queries[2]);
}

#[tokio::test]
async fn test_retry_without_error() {
    let adapter = started(Arc::new(articles()), 2).await;
    assert_eq!(adapter.retry().await.unwrap(), LoadOutcome::NothingToRetry);
}

#[tokio::test]
async fn test_missing_path_is_not_found() {
    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    let adapter = started(store, 2).await;

    let err = adapter.load_more().await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(
        adapter.load_state().await,
        LoadState::Error {
            message: err.to_string(),
            retryable: false,
        }
    );
}

// ============================================================================
// Merge Tests
// ============================================================================

#[tokio::test]
async fn test_overlap_record_is_not_redelivered() {
    let store = Arc::new(articles());
    let options = PagingOptions::<Article>::builder()
        .set_query_json(
            store.clone(),
            QueryDescriptor::new("articles", "categoryId", 5.0, true),
            PagingConfig::new(2),
        )
        .set_diff_policy(ValueDiffPolicy)
        .build()
        .unwrap();
    let adapter = PagingAdapter::new(options).unwrap();
    adapter.start().await;
    adapter.load_more().await.unwrap();

    // b is the cursor record; b0 lands right behind it
    store
        .set("articles/b", json!({"title": "B2", "categoryId": 5}))
        .await;
    store
        .set("articles/b0", json!({"title": "B0", "categoryId": 5}))
        .await;
    adapter.load_more().await.unwrap();

    assert_eq!(adapter.item_at(1).await.unwrap().title, "B");
    assert_eq!(keys(&adapter).await, vec!["a", "b", "b0", "c"]);
}

#[tokio::test]
async fn test_parsed_diff_policy() {
    let store: Arc<dyn Store> = Arc::new(articles());
    let options = PagingOptions::<Article>::builder()
        .set_query_json(
            store,
            QueryDescriptor::new("articles", "categoryId", 5.0, true),
            PagingConfig::new(2),
        )
        .with_parsed_diff()
        .build()
        .unwrap();

    let a = Snapshot::new(
        DocumentRef::new("articles", "a"),
        json!({"title": "A", "categoryId": 5, "views": 1}),
    );
    let a2 = Snapshot::new(
        DocumentRef::new("articles", "a"),
        json!({"title": "A", "categoryId": 5, "views": 2}),
    );
    assert!(options.diff_policy().same_content(&a, &a2));
}

// ============================================================================
// Access Tests
// ============================================================================

#[tokio::test]
async fn test_item_access() {
    let store = Arc::new(articles());
    let adapter = started(store.clone(), 3).await;
    adapter.load_more().await.unwrap();

    let item = adapter.item_at(2).await.unwrap();
    assert_eq!(
        item,
        Article {
            title: "C".to_string(),
            category_id: 5.0,
        }
    );
    assert_eq!(adapter.snapshot_at(0).await.unwrap().key(), "a");
    assert!(adapter.snapshot_at(3).await.is_none());

    let reference = adapter.get_ref(1).await.unwrap();
    assert_eq!(reference, DocumentRef::new("articles", "b"));

    let err = adapter.item_at(3).await.unwrap_err();
    assert!(matches!(err, Error::IndexOutOfBounds { index: 3, len: 3 }));
    assert!(adapter.get_ref(7).await.is_err());

    store
        .set("articles/b", json!({"title": "B!", "categoryId": 5}))
        .await;
    let current = adapter.fetch_current(1).await.unwrap().unwrap();
    assert_eq!(current.child("title"), Some(&json!("B!")));

    store.remove("articles/b").await;
    assert!(adapter.fetch_current(1).await.unwrap().is_none());
}

#[tokio::test]
async fn test_item_parse_failure() {
    let store: Arc<dyn Store> = Arc::new(MemoryStore::from_value(json!({
        "articles": {"a": {"categoryId": 5, "title": 42}}
    })));
    let adapter = started(store, 2).await;
    adapter.load_more().await.unwrap();

    let err = adapter.item_at(0).await.unwrap_err();
    assert!(matches!(err, Error::Parse { .. }));
}

#[tokio::test]
async fn test_needs_more() {
    let store: Arc<dyn Store> = Arc::new(articles());
    let options = PagingOptions::<Article>::builder()
        .set_query_json(
            store,
            QueryDescriptor::new("articles", "categoryId", 5.0, true),
            PagingConfig::new(2).with_prefetch_distance(1),
        )
        .build()
        .unwrap();
    let adapter = PagingAdapter::new(options).unwrap();
    adapter.start().await;

    assert!(adapter.needs_more(0).await);
    adapter.load_more().await.unwrap();
    adapter.load_more().await.unwrap();
    assert_eq!(adapter.len().await, 4);

    assert!(!adapter.needs_more(0).await);
    assert!(!adapter.needs_more(2).await);
    assert!(adapter.needs_more(3).await);

    assert!(adapter.needs_more(usize::MAX).await);

    load_all(&adapter).await;
    assert!(!adapter.needs_more(4).await);
    assert!(!adapter.needs_more(usize::MAX).await);
}

// ============================================================================
// Subscription Tests
// ============================================================================

#[tokio::test]
async fn test_subscribers_receive_updates() {
    let store: Arc<dyn Store> = Arc::new(articles());
    let adapter = started(store.clone(), 3).await;
    let mut rx = adapter.subscribe();

    adapter.load_more().await.unwrap();
    let update = rx.recv().await.unwrap();
    assert_eq!(update.generation, 0);
    assert_eq!(update.len, 3);
    assert_eq!(
        update.kind,
        UpdateKind::Merged {
            change: ListChange {
                inserted: 0..3,
                changed: vec![],
                unchanged: 0,
            },
            exhausted: false,
        }
    );

    adapter.replace_query(options(store, 6.0, 3)).await.unwrap();
    let update = rx.recv().await.unwrap();
    assert_eq!(update.kind, UpdateKind::Reset);
    assert_eq!(update.generation, 1);
    assert_eq!(update.len, 0);
}

#[tokio::test]
async fn test_failure_update_and_serialization() {
    let store = Arc::new(FlakyStore::new(articles()));
    let adapter = started(store.clone(), 3).await;
    let mut rx = adapter.subscribe();

    store.fail_next(1);
    adapter.load_more().await.unwrap_err();

    let update = rx.recv().await.unwrap();
    assert!(matches!(update.kind, UpdateKind::LoadFailed { .. }));

    let value = serde_json::to_value(&update).unwrap();
    assert_eq!(value["kind"], "load_failed");
    assert_eq!(value["len"], 0);
    assert!(value["emitted_at"].is_string());
}

#[tokio::test]
async fn test_update_stream() {
    let adapter = started(Arc::new(articles()), 2).await;
    let stream = adapter.updates();

    load_all(&adapter).await;
    drop(adapter);

    let lens: Vec<usize> = stream.map(|u| u.len).collect().await;
    assert_eq!(lens, vec![2, 4, 5]);
}

#[tokio::test]
async fn test_dropped_receiver_unsubscribes() {
    let adapter = started(Arc::new(articles()), 2).await;
    let rx = adapter.subscribe();
    drop(rx);

    assert!(adapter.load_more().await.is_ok());
}

// ============================================================================
// Lifecycle Binding Tests
// ============================================================================

async fn wait_for_active(adapter: &PagingAdapter<Article>, expected: bool) {
    tokio::time::timeout(Duration::from_secs(1), async {
        while adapter.is_active().await != expected {
            tokio::task::yield_now().await;
        }
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn test_bind_lifecycle() {
    let adapter = Arc::new(PagingAdapter::new(options(Arc::new(articles()), 5.0, 2)).unwrap());
    let (tx, rx) = watch::channel(Lifecycle::Stopped);
    let handle = adapter.bind_lifecycle(rx);

    tx.send(Lifecycle::Started).unwrap();
    wait_for_active(&adapter, true).await;
    adapter.load_more().await.unwrap();

    tx.send(Lifecycle::Stopped).unwrap();
    wait_for_active(&adapter, false).await;
    assert_eq!(adapter.len().await, 2);

    tx.send(Lifecycle::Started).unwrap();
    wait_for_active(&adapter, true).await;

    tx.send(Lifecycle::Destroyed).unwrap();
    handle.await.unwrap();
    assert!(!adapter.is_active().await);
}

#[tokio::test]
async fn test_bind_lifecycle_ends_when_sender_dropped() {
    let adapter = Arc::new(PagingAdapter::new(options(Arc::new(articles()), 5.0, 2)).unwrap());
    let (tx, rx) = watch::channel(Lifecycle::Started);
    let handle = adapter.bind_lifecycle(rx);

    wait_for_active(&adapter, true).await;
    drop(tx);
    handle.await.unwrap();
    assert!(adapter.is_active().await);
}
