//! Pagination types
//!
//! Defines the cursor, the query descriptor of a paging session and the page
//! produced by each load.

use crate::error::{Error, Result};
use crate::store::Snapshot;
use crate::types::SortDirection;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

// ============================================================================
// Cursor
// ============================================================================

/// Resume position of a session: the last record of the previous page
///
/// Ordered by `order_value`, ties broken by `key`. The store can only range
/// over `order_value`, so the key narrows the bound and is used to recognise
/// the overlap record re-returned at the start of the next page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cursor {
    /// Value of the ordered field of the last record
    pub order_value: f64,
    /// Key of the last record
    pub key: String,
}

impl Cursor {
    /// Create a new cursor
    pub fn new(order_value: f64, key: impl Into<String>) -> Self {
        Self {
            order_value,
            key: key.into(),
        }
    }
}

impl PartialEq for Cursor {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Cursor {}

impl PartialOrd for Cursor {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Cursor {
    fn cmp(&self, other: &Self) -> Ordering {
        self.order_value
            .total_cmp(&other.order_value)
            .then_with(|| self.key.cmp(&other.key))
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.order_value, self.key)
    }
}

// ============================================================================
// Query Descriptor
// ============================================================================

/// What a paging session reads: one category of one collection, in one direction
///
/// Immutable for the lifetime of a session. A different descriptor means a
/// new session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryDescriptor {
    /// Collection path in the store
    pub path: String,
    /// Child field holding the category (also the ordered field)
    pub category_field: String,
    /// Category value every returned record must carry
    pub category_value: f64,
    /// Scan direction
    #[serde(default)]
    pub direction: SortDirection,
}

impl QueryDescriptor {
    /// Create a new descriptor
    pub fn new(
        path: impl Into<String>,
        category_field: impl Into<String>,
        category_value: f64,
        is_ascending: bool,
    ) -> Self {
        Self {
            path: path.into(),
            category_field: category_field.into(),
            category_value,
            direction: SortDirection::from_ascending(is_ascending),
        }
    }

    /// Check if this session walks in ascending order
    pub fn is_ascending(&self) -> bool {
        self.direction.is_ascending()
    }

    /// Check that the descriptor can be turned into a query
    pub fn validate(&self) -> Result<()> {
        if self.category_field.trim().is_empty() {
            return Err(Error::missing_field("category_field"));
        }
        if !self.category_value.is_finite() {
            return Err(Error::invalid_value(
                "category_value",
                format!("must be a finite number, got {}", self.category_value),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Page
// ============================================================================

/// One loaded page, in presentation order
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// Records of the page
    pub items: Vec<Snapshot>,
    /// Where the next page starts; `None` once the category is exhausted
    pub next: Option<Cursor>,
    /// Items before this page; the store cannot report it, so always `None`
    pub items_before: Option<usize>,
    /// Items after this page; always `None`
    pub items_after: Option<usize>,
}

impl Page {
    /// Create a page; counts are unknown
    pub fn new(items: Vec<Snapshot>, next: Option<Cursor>) -> Self {
        Self {
            items,
            next,
            items_before: None,
            items_after: None,
        }
    }

    /// Check if this is the last page of the session
    pub fn is_terminal(&self) -> bool {
        self.next.is_none()
    }

    /// Number of records on the page
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the page holds no records
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Keys of the page's records, in order
    pub fn keys(&self) -> Vec<&str> {
        self.items.iter().map(Snapshot::key).collect()
    }
}

/// Result of a single page load
pub type PageResult = Result<Page>;
