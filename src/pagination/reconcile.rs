//! Page reconciliation
//!
//! Pure functions that turn the raw children of a range query into a clean
//! page. They never touch the store, so every boundary case can be exercised
//! on an in-memory list.

use super::types::Cursor;
use crate::store::Snapshot;
use crate::types::SortDirection;
use tracing::debug;

/// Outcome of the category boundary check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Boundary {
    /// Every record matched; continue from this cursor
    Continue(Cursor),
    /// The category is exhausted; `trimmed` mismatching records were dropped
    Terminal {
        /// Number of records removed from the end of the page
        trimmed: usize,
    },
}

impl Boundary {
    /// Cursor for the next page, if any
    pub fn into_next(self) -> Option<Cursor> {
        match self {
            Self::Continue(cursor) => Some(cursor),
            Self::Terminal { .. } => None,
        }
    }

    /// Check if this ends the session
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Terminal { .. })
    }
}

/// Check if a record carries the given category value
///
/// A missing or non-numeric category counts as a mismatch.
pub fn matches_category(snapshot: &Snapshot, field: &str, value: f64) -> bool {
    snapshot.child_f64(field) == Some(value)
}

/// Remove the overlap record re-returned by a bounded query
///
/// Ascending scans return the cursor record first, descending scans
/// (`limit_to_last`) return it last. It is only removed when its key matches
/// the cursor: if the cursor record was deleted between loads the store
/// returns no overlap, and the edge record is a new one.
pub fn strip_overlap(
    children: &mut Vec<Snapshot>,
    cursor: &Cursor,
    direction: SortDirection,
) -> Option<Snapshot> {
    let index = match direction {
        SortDirection::Ascending => 0,
        SortDirection::Descending => children.len().checked_sub(1)?,
    };

    if children.get(index)?.key() == cursor.key {
        Some(children.remove(index))
    } else {
        debug!(cursor = %cursor, "Overlap record missing, keeping edge record");
        None
    }
}

/// Arrange the raw children of a query into presentation order
///
/// Children arrive in ascending store order. Subsequent pages first lose the
/// overlap record; descending sessions are then reversed so that each page
/// continues where the previous one ended.
pub fn assemble_page(
    mut children: Vec<Snapshot>,
    cursor: Option<&Cursor>,
    direction: SortDirection,
) -> Vec<Snapshot> {
    if let Some(cursor) = cursor {
        strip_overlap(&mut children, cursor, direction);
    }

    if direction == SortDirection::Descending {
        children.reverse();
    }

    children
}

/// Detect the category boundary and trim records past it
///
/// Precondition: the page comes from a contiguous range scan, so records of a
/// different category can only sit at its end. Only that trailing run is
/// removed; records before the first match from the end are not inspected.
pub fn apply_category_boundary(page: &mut Vec<Snapshot>, field: &str, value: f64) -> Boundary {
    let Some(last) = page.last() else {
        return Boundary::Terminal { trimmed: 0 };
    };

    if matches_category(last, field, value) {
        return Boundary::Continue(Cursor::new(value, last.key()));
    }

    let mut trimmed = 0;
    while page
        .last()
        .is_some_and(|snapshot| !matches_category(snapshot, field, value))
    {
        if let Some(removed) = page.pop() {
            debug!(
                key = removed.key(),
                category = ?removed.child(field),
                "Removed record past category boundary"
            );
            trimmed += 1;
        }
    }

    Boundary::Terminal { trimmed }
}
