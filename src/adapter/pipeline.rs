//! Paging adapter
//!
//! Feeds one growing list from a paging session. The consumer drives loading
//! with [`PagingAdapter::load_more`]; the lifecycle owner calls `start` and
//! `stop`, either directly or through [`PagingAdapter::bind_lifecycle`].

use super::options::PagingOptions;
use super::types::{Lifecycle, ListUpdate, LoadOutcome, LoadState, UpdateKind};
use crate::diff::PageAssembler;
use crate::error::{Error, Result};
use crate::pagination::{CategoryPagingSource, Cursor};
use crate::store::{DocumentRef, Snapshot};
use futures::Stream;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, watch, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Capacity of the update channel
const UPDATE_CHANNEL_CAPACITY: usize = 64;

/// Mutable state of the adapter
struct Inner<T> {
    options: PagingOptions<T>,
    source: Arc<CategoryPagingSource>,
    /// Bumped by `stop` and `replace_query`; loads started under an older
    /// generation are discarded
    generation: u64,
    /// Held by the one outstanding `load_more` of the current session
    load_permit: Arc<Mutex<()>>,
    active: bool,
    next: Option<Cursor>,
    pages_loaded: usize,
    exhausted: bool,
    load_state: LoadState,
    list: PageAssembler,
}

/// Paginated list backed by a category paging session
///
/// State machine: `Idle -> Active -> Idle` through [`start`](Self::start) and
/// [`stop`](Self::stop). Stopping keeps the list; replacing the query clears it
/// and keeps the Active/Idle state.
pub struct PagingAdapter<T> {
    inner: RwLock<Inner<T>>,
    updates: broadcast::Sender<ListUpdate>,
}

impl<T: 'static> PagingAdapter<T> {
    /// Create an idle adapter for `options`
    pub fn new(options: PagingOptions<T>) -> Result<Self> {
        let source = Arc::new(options.source()?);
        let (updates, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);

        Ok(Self {
            inner: RwLock::new(Inner {
                options,
                source,
                generation: 0,
                load_permit: Arc::new(Mutex::new(())),
                active: false,
                next: None,
                pages_loaded: 0,
                exhausted: false,
                load_state: LoadState::Idle,
                list: PageAssembler::new(),
            }),
            updates,
        })
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Begin accepting pages (no-op when already active)
    pub async fn start(&self) {
        let mut inner = self.inner.write().await;
        if !inner.active {
            inner.active = true;
            info!(generation = inner.generation, "Paging adapter started");
        }
    }

    /// Stop accepting pages; the list is retained
    ///
    /// A load still in flight is discarded when it completes.
    pub async fn stop(&self) {
        let mut inner = self.inner.write().await;
        if inner.active {
            inner.active = false;
            inner.generation += 1;
            if inner.load_state == LoadState::Loading {
                inner.load_state = LoadState::Idle;
            }
            info!(
                generation = inner.generation,
                len = inner.list.len(),
                "Paging adapter stopped"
            );
        }
    }

    /// Swap in a new session
    ///
    /// The in-flight session is abandoned and the list cleared. An active
    /// adapter stays active, an idle one stays idle.
    pub async fn replace_query(&self, options: PagingOptions<T>) -> Result<()> {
        let source = Arc::new(options.source()?);

        let mut inner = self.inner.write().await;
        inner.generation += 1;
        inner.options = options;
        inner.source = source;
        inner.load_permit = Arc::new(Mutex::new(()));
        inner.next = None;
        inner.pages_loaded = 0;
        inner.exhausted = false;
        inner.load_state = LoadState::Idle;
        inner.list.clear();

        info!(
            generation = inner.generation,
            active = inner.active,
            descriptor = ?inner.options.descriptor(),
            "Replaced paging query"
        );
        self.publish(ListUpdate::new(inner.generation, UpdateKind::Reset, 0));
        Ok(())
    }

    /// Restart the current query from its first page
    pub async fn refresh(&self) -> Result<()> {
        let options = self.inner.read().await.options.clone();
        self.replace_query(options).await
    }

    /// Bind start/stop to a lifecycle
    ///
    /// The returned task follows the lifecycle until it reaches
    /// [`Lifecycle::Destroyed`] or its sender is dropped.
    pub fn bind_lifecycle(self: &Arc<Self>, mut lifecycle: watch::Receiver<Lifecycle>) -> JoinHandle<()>
    where
        T: Send + Sync,
    {
        let adapter = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                let state = *lifecycle.borrow_and_update();
                match state {
                    Lifecycle::Started => adapter.start().await,
                    Lifecycle::Stopped => adapter.stop().await,
                    Lifecycle::Destroyed => {
                        adapter.stop().await;
                        break;
                    }
                }
                if lifecycle.changed().await.is_err() {
                    break;
                }
            }
            debug!("Lifecycle binding ended");
        })
    }

    // ========================================================================
    // Loading
    // ========================================================================

    /// Load the next page and merge it into the list
    ///
    /// A failed load leaves the list and cursor untouched, so calling again
    /// retries the same page. The load is claimed under the state lock, so a
    /// concurrent call never reads the cursor this load is about to replace.
    pub async fn load_more(&self) -> Result<LoadOutcome> {
        let (_permit, source, cursor, load_size, generation, diff) = {
            let mut inner = self.inner.write().await;
            if !inner.active {
                return Ok(LoadOutcome::Inactive);
            }
            if inner.exhausted {
                return Ok(LoadOutcome::Exhausted);
            }
            // Released on return or when this future is dropped
            let Ok(permit) = Arc::clone(&inner.load_permit).try_lock_owned() else {
                return Ok(LoadOutcome::InFlight);
            };
            inner.load_state = LoadState::Loading;
            let load_size = inner.options.config().load_size(inner.pages_loaded == 0);
            (
                permit,
                Arc::clone(&inner.source),
                inner.next.clone(),
                load_size,
                inner.generation,
                Arc::clone(inner.options.diff_policy()),
            )
        };

        let result = source.load_page(cursor.as_ref(), load_size).await;

        let mut inner = self.inner.write().await;
        if inner.generation != generation {
            debug!(
                generation,
                current = inner.generation,
                "Discarding page from superseded session"
            );
            return Ok(LoadOutcome::Superseded);
        }

        match result {
            Ok(page) => {
                let change = inner.list.append_page(page.items, diff.as_ref());
                inner.exhausted = page.next.is_none();
                inner.next = page.next;
                inner.pages_loaded += 1;
                inner.load_state = if inner.exhausted {
                    LoadState::Complete
                } else {
                    LoadState::Idle
                };

                debug!(
                    page = inner.pages_loaded,
                    inserted = change.inserted.len(),
                    changed = change.changed.len(),
                    exhausted = inner.exhausted,
                    "Merged page"
                );
                self.publish(ListUpdate::new(
                    generation,
                    UpdateKind::Merged {
                        change: change.clone(),
                        exhausted: inner.exhausted,
                    },
                    inner.list.len(),
                ));
                Ok(LoadOutcome::Appended(change))
            }
            Err(Error::LoadInProgress) => Ok(LoadOutcome::InFlight),
            Err(e) => {
                warn!(error = %e, cursor = ?cursor, "Page load failed");
                inner.load_state = LoadState::Error {
                    message: e.to_string(),
                    retryable: e.is_retryable(),
                };
                self.publish(ListUpdate::new(
                    generation,
                    UpdateKind::LoadFailed {
                        message: e.to_string(),
                    },
                    inner.list.len(),
                ));
                Err(e)
            }
        }
    }

    /// Retry the last failed load with the same cursor
    pub async fn retry(&self) -> Result<LoadOutcome> {
        if !self.inner.read().await.load_state.is_error() {
            return Ok(LoadOutcome::NothingToRetry);
        }
        self.load_more().await
    }

    /// Check if the consumer looking at `index` should ask for more data
    pub async fn needs_more(&self, index: usize) -> bool {
        let inner = self.inner.read().await;
        inner.active
            && !inner.exhausted
            && index.saturating_add(inner.options.config().prefetch_distance) >= inner.list.len()
    }

    // ========================================================================
    // Subscription
    // ========================================================================

    /// Subscribe to list updates; drop the receiver to unsubscribe
    pub fn subscribe(&self) -> broadcast::Receiver<ListUpdate> {
        self.updates.subscribe()
    }

    /// List updates as a stream
    pub fn updates(&self) -> impl Stream<Item = ListUpdate> + Send + 'static {
        futures::stream::unfold(self.subscribe(), |mut rx| async move {
            loop {
                match rx.recv().await {
                    Ok(update) => return Some((update, rx)),
                    Err(RecvError::Lagged(missed)) => {
                        warn!(missed, "Update stream lagged, skipped list updates");
                    }
                    Err(RecvError::Closed) => return None,
                }
            }
        })
    }

    fn publish(&self, update: ListUpdate) {
        // No subscribers is fine
        let _ = self.updates.send(update);
    }

    // ========================================================================
    // List Access
    // ========================================================================

    /// Parsed record at `index`
    pub async fn item_at(&self, index: usize) -> Result<T> {
        let inner = self.inner.read().await;
        let snapshot = Self::snapshot_in(&inner, index)?;
        inner.options.parser().parse(snapshot)
    }

    /// Raw snapshot at `index`
    pub async fn snapshot_at(&self, index: usize) -> Option<Snapshot> {
        self.inner.read().await.list.get(index).cloned()
    }

    /// Store reference of the record at `index`
    pub async fn get_ref(&self, index: usize) -> Result<DocumentRef> {
        let inner = self.inner.read().await;
        Ok(Self::snapshot_in(&inner, index)?.reference().clone())
    }

    /// Re-read the record at `index` from the store
    ///
    /// Returns `None` if the record no longer exists.
    pub async fn fetch_current(&self, index: usize) -> Result<Option<Snapshot>> {
        let (store, reference) = {
            let inner = self.inner.read().await;
            let reference = Self::snapshot_in(&inner, index)?.reference().clone();
            (Arc::clone(inner.options.store()), reference)
        };
        store.get(&reference).await
    }

    /// All listed snapshots, in order
    pub async fn snapshots(&self) -> Vec<Snapshot> {
        self.inner.read().await.list.items().to_vec()
    }

    /// Number of listed records
    pub async fn len(&self) -> usize {
        self.inner.read().await.list.len()
    }

    /// Check if the list is empty
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.list.is_empty()
    }

    // ========================================================================
    // State
    // ========================================================================

    /// Check if the adapter is accepting pages
    pub async fn is_active(&self) -> bool {
        self.inner.read().await.active
    }

    /// Check if the session has no more pages
    pub async fn is_exhausted(&self) -> bool {
        self.inner.read().await.exhausted
    }

    /// State of the current load attempt
    pub async fn load_state(&self) -> LoadState {
        self.inner.read().await.load_state.clone()
    }

    /// Current session generation
    pub async fn generation(&self) -> u64 {
        self.inner.read().await.generation
    }

    /// Options of the current session
    pub async fn options(&self) -> PagingOptions<T> {
        self.inner.read().await.options.clone()
    }

    fn snapshot_in(inner: &Inner<T>, index: usize) -> Result<&Snapshot> {
        inner.list.get(index).ok_or(Error::IndexOutOfBounds {
            index,
            len: inner.list.len(),
        })
    }
}
