//! Store module
//!
//! The ordered key-value store the pager reads from.
//!
//! # Overview
//!
//! The store module provides:
//! - `Store` - The async range-query interface the page loader consumes
//! - `RangeQuery` - A query ordered by one child field with optional bounds and a limit
//! - `Snapshot` / `DocumentRef` - Immutable record snapshots and their locations
//! - `MemoryStore` - An in-memory hierarchical store with the same ordering rules

mod memory;
mod types;

pub use memory::MemoryStore;
pub use types::{
    DocumentRef, QueryBound, QueryLimit, QueryResult, RangeQuery, Snapshot, Store,
};

#[cfg(test)]
pub(crate) mod mock;
