//! Store types and traits
//!
//! Defines the query shape and record snapshots shared by every store.

use crate::error::Result;
use crate::types::JsonValue;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Document Reference
// ============================================================================

/// Location of a single record in the store
///
/// Stable for the lifetime of the record, so it can be used to re-query the
/// record after the page holding it has been assembled.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentRef {
    /// Path of the parent collection (e.g., "shop/articles")
    pub path: String,
    /// Key of the record within the collection
    pub key: String,
}

impl DocumentRef {
    /// Create a new reference
    pub fn new(path: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            key: key.into(),
        }
    }

    /// Full slash-separated path of the record
    pub fn full_path(&self) -> String {
        let parent = self.path.trim_matches('/');
        if parent.is_empty() {
            self.key.clone()
        } else {
            format!("{parent}/{}", self.key)
        }
    }
}

impl fmt::Display for DocumentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_path())
    }
}

// ============================================================================
// Snapshot
// ============================================================================

/// Immutable snapshot of one record at query time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    reference: DocumentRef,
    value: JsonValue,
}

impl Snapshot {
    /// Create a snapshot for the record at `reference`
    pub fn new(reference: DocumentRef, value: JsonValue) -> Self {
        Self { reference, value }
    }

    /// Unique key of the record within its collection
    pub fn key(&self) -> &str {
        &self.reference.key
    }

    /// Raw document value
    pub fn value(&self) -> &JsonValue {
        &self.value
    }

    /// Location of the record
    pub fn reference(&self) -> &DocumentRef {
        &self.reference
    }

    /// Get a child value by slash-separated path (e.g., "meta/categoryId")
    pub fn child(&self, path: &str) -> Option<&JsonValue> {
        let mut current = &self.value;
        for part in path.split('/').filter(|p| !p.is_empty()) {
            current = current.as_object()?.get(part)?;
        }
        Some(current)
    }

    /// Get a numeric child value
    pub fn child_f64(&self, path: &str) -> Option<f64> {
        self.child(path).and_then(JsonValue::as_f64)
    }
}

// ============================================================================
// Range Query
// ============================================================================

/// One end of a range query
///
/// Without a key, the bound covers every child with `value`. With a key, the
/// bound is the composite position `(value, key)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryBound {
    /// Value of the ordered child field
    pub value: f64,
    /// Optional key narrowing the bound within equal values
    pub key: Option<String>,
}

impl QueryBound {
    /// Bound on a value only
    pub fn value(value: f64) -> Self {
        Self { value, key: None }
    }

    /// Bound on a value and key
    pub fn with_key(value: f64, key: impl Into<String>) -> Self {
        Self {
            value,
            key: Some(key.into()),
        }
    }
}

/// Limit applied to a range query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryLimit {
    /// Keep the first `n` children of the range
    First(usize),
    /// Keep the last `n` children of the range (still returned in ascending order)
    Last(usize),
}

/// An ordered range query over the children of one path
///
/// Children are ordered by the `order_by` child field, ties broken by key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeQuery {
    /// Collection path
    pub path: String,
    /// Child field the store orders by
    pub order_by: String,
    /// Inclusive lower bound
    pub start: Option<QueryBound>,
    /// Inclusive upper bound
    pub end: Option<QueryBound>,
    /// Optional limit
    pub limit: Option<QueryLimit>,
}

impl RangeQuery {
    /// Create a query over `path` ordered by the child field `field`
    pub fn order_by_child(path: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            order_by: field.into(),
            start: None,
            end: None,
            limit: None,
        }
    }

    /// Start at `value`, optionally narrowed by `key`
    #[must_use]
    pub fn start_at(mut self, value: f64, key: Option<&str>) -> Self {
        self.start = Some(QueryBound {
            value,
            key: key.map(String::from),
        });
        self
    }

    /// End at `value`, optionally narrowed by `key`
    #[must_use]
    pub fn end_at(mut self, value: f64, key: Option<&str>) -> Self {
        self.end = Some(QueryBound {
            value,
            key: key.map(String::from),
        });
        self
    }

    /// Keep the first `n` children
    #[must_use]
    pub fn limit_to_first(mut self, n: usize) -> Self {
        self.limit = Some(QueryLimit::First(n));
        self
    }

    /// Keep the last `n` children
    #[must_use]
    pub fn limit_to_last(mut self, n: usize) -> Self {
        self.limit = Some(QueryLimit::Last(n));
        self
    }
}

impl fmt::Display for RangeQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} orderByChild({})", self.path, self.order_by)?;
        if let Some(start) = &self.start {
            write!(f, " startAt({}, {:?})", start.value, start.key)?;
        }
        if let Some(end) = &self.end {
            write!(f, " endAt({}, {:?})", end.value, end.key)?;
        }
        match self.limit {
            Some(QueryLimit::First(n)) => write!(f, " limitToFirst({n})"),
            Some(QueryLimit::Last(n)) => write!(f, " limitToLast({n})"),
            None => Ok(()),
        }
    }
}

/// Result of a range query
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    /// Whether the queried path exists at all
    pub exists: bool,
    /// Matching children in ascending store order
    pub children: Vec<Snapshot>,
}

impl QueryResult {
    /// Result for a path that does not exist
    pub fn missing() -> Self {
        Self::default()
    }

    /// Result for an existing path
    pub fn found(children: Vec<Snapshot>) -> Self {
        Self {
            exists: true,
            children,
        }
    }
}

// ============================================================================
// Store Trait
// ============================================================================

/// Read-only access to an ordered, hierarchical key-value store
///
/// Implementations are shared across sessions and must not assume exclusive
/// access. Transport failures are reported as [`crate::Error::Transport`].
#[async_trait]
pub trait Store: Send + Sync {
    /// Run an ordered range query
    async fn range_query(&self, query: &RangeQuery) -> Result<QueryResult>;

    /// Fetch a single record by reference
    async fn get(&self, reference: &DocumentRef) -> Result<Option<Snapshot>>;
}
