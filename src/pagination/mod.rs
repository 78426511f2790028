//! Pagination module
//!
//! Cursor-based, category-filtered page loading.
//!
//! # Overview
//!
//! The store orders by exactly one child field and accepts a start or end
//! bound of `(value, key)`. The pagination module builds a composite cursor on
//! top of that:
//! - `CategoryPagingSource` - Issues one bounded query per page
//! - `reconcile` - Strips the overlap record and trims past the category boundary
//! - `Cursor` / `Page` / `QueryDescriptor` - The values exchanged with callers

pub mod reconcile;
mod source;
mod types;

pub use reconcile::Boundary;
pub use source::CategoryPagingSource;
pub use types::{Cursor, Page, PageResult, QueryDescriptor};
