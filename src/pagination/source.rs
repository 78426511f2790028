//! Category paging source
//!
//! Loads one page at a time from a [`Store`], turning the store's single-field
//! range queries into category-filtered pages with composite cursors.

use super::reconcile::{apply_category_boundary, assemble_page, Boundary};
use super::types::{Cursor, Page, QueryDescriptor};
use crate::error::{Error, Result};
use crate::store::{RangeQuery, Store};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Page loader for one paging session
///
/// Holds the session's immutable [`QueryDescriptor`]. At most one load may be
/// outstanding; an overlapping call fails with [`Error::LoadInProgress`]
/// without reaching the store.
pub struct CategoryPagingSource {
    store: Arc<dyn Store>,
    descriptor: QueryDescriptor,
    in_flight: AtomicBool,
}

impl CategoryPagingSource {
    /// Create a source for `descriptor`
    pub fn new(store: Arc<dyn Store>, descriptor: QueryDescriptor) -> Result<Self> {
        descriptor.validate()?;
        Ok(Self {
            store,
            descriptor,
            in_flight: AtomicBool::new(false),
        })
    }

    /// The session's query descriptor
    pub fn descriptor(&self) -> &QueryDescriptor {
        &self.descriptor
    }

    /// Check if a load is currently outstanding
    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Build the range query for the page after `cursor`
    ///
    /// Pages after the first ask for one extra record to make room for the
    /// overlap record the store returns again at the bound.
    pub fn build_query(&self, cursor: Option<&Cursor>, page_size: usize) -> RangeQuery {
        let d = &self.descriptor;
        let query = RangeQuery::order_by_child(&d.path, &d.category_field);
        let bound_key = cursor.map(|c| c.key.as_str());
        let limit = if cursor.is_some() {
            page_size + 1
        } else {
            page_size
        };

        if d.is_ascending() {
            query
                .start_at(d.category_value, bound_key)
                .limit_to_first(limit)
        } else {
            query
                .end_at(d.category_value, bound_key)
                .limit_to_last(limit)
        }
    }

    /// Load the page after `cursor`, or the first page when `cursor` is `None`
    ///
    /// Failures leave no trace in the session, so retrying with the same
    /// cursor returns the page a first-try success would have.
    pub async fn load_page(&self, cursor: Option<&Cursor>, page_size: usize) -> Result<Page> {
        if page_size == 0 {
            return Err(Error::invalid_value("page_size", "must be at least 1"));
        }

        let _guard = InFlightGuard::acquire(&self.in_flight)?;

        let query = self.build_query(cursor, page_size);
        debug!(query = %query, cursor = ?cursor, "Loading page");

        let result = self.store.range_query(&query).await?;
        if !result.exists {
            return Err(Error::not_found(&self.descriptor.path));
        }

        let d = &self.descriptor;
        let mut items = assemble_page(result.children, cursor, d.direction);
        for item in &items {
            debug!(
                key = item.key(),
                category = ?item.child(&d.category_field),
                "Add record"
            );
        }

        let boundary = apply_category_boundary(&mut items, &d.category_field, d.category_value);
        if let Boundary::Terminal { trimmed } = &boundary {
            debug!(trimmed, "Reached category boundary");
        }

        let next = boundary.into_next();
        debug!(count = items.len(), next = ?next, "Loaded page");

        Ok(Page::new(items, next))
    }
}

impl fmt::Debug for CategoryPagingSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CategoryPagingSource")
            .field("descriptor", &self.descriptor)
            .field("in_flight", &self.is_loading())
            .finish_non_exhaustive()
    }
}

/// Marks a load as outstanding until dropped
///
/// Dropping also covers a load future that is cancelled mid-flight.
struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| Error::LoadInProgress)?;
        Ok(Self { flag })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
