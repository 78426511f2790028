//! Test doubles for the store interface

use super::types::{DocumentRef, QueryResult, RangeQuery, Snapshot, Store};
use super::MemoryStore;
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::Semaphore;

/// Wraps a [`MemoryStore`], failing a configurable number of queries
/// and recording every query it sees
#[derive(Debug, Default)]
pub struct FlakyStore {
    pub inner: MemoryStore,
    failures: AtomicUsize,
    queries: Mutex<Vec<RangeQuery>>,
}

impl FlakyStore {
    pub fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            failures: AtomicUsize::new(0),
            queries: Mutex::new(Vec::new()),
        }
    }

    /// Fail the next `n` queries with a transport error
    pub fn fail_next(&self, n: usize) {
        self.failures.store(n, Ordering::SeqCst);
    }

    /// Queries received so far
    pub fn queries(&self) -> Vec<RangeQuery> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl Store for FlakyStore {
    async fn range_query(&self, query: &RangeQuery) -> Result<QueryResult> {
        self.queries.lock().unwrap().push(query.clone());
        let should_fail = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if should_fail {
            return Err(Error::transport("simulated network failure"));
        }
        self.inner.range_query(query).await
    }

    async fn get(&self, reference: &DocumentRef) -> Result<Option<Snapshot>> {
        self.inner.get(reference).await
    }
}

/// Wraps a [`MemoryStore`], holding every query until a permit is released
#[derive(Debug)]
pub struct GatedStore {
    pub inner: MemoryStore,
    gate: Semaphore,
}

impl GatedStore {
    pub fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            gate: Semaphore::new(0),
        }
    }

    /// Let `n` queries through
    pub fn release(&self, n: usize) {
        self.gate.add_permits(n);
    }
}

#[async_trait]
impl Store for GatedStore {
    async fn range_query(&self, query: &RangeQuery) -> Result<QueryResult> {
        let permit = self
            .gate
            .acquire()
            .await
            .map_err(|e| Error::transport(e.to_string()))?;
        permit.forget();
        self.inner.range_query(query).await
    }

    async fn get(&self, reference: &DocumentRef) -> Result<Option<Snapshot>> {
        self.inner.get(reference).await
    }
}
