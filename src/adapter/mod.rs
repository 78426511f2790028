//! Adapter module
//!
//! Bridges a paging session to a consuming list.
//!
//! # Overview
//!
//! The adapter module provides:
//! - `PagingOptions` - Store, query, paging sizes, parser and diff policy of a session
//! - `PagingAdapter` - One growing, deduplicated list fed page by page, with
//!   explicit `start` / `stop` / `replace_query`
//! - `ListUpdate` - Change notifications broadcast to subscribers
//! - `Lifecycle` - Lifecycle states an adapter can be bound to

mod options;
mod pipeline;
mod types;

pub use options::{PagingOptions, PagingOptionsBuilder};
pub use pipeline::PagingAdapter;
pub use types::{Lifecycle, ListUpdate, LoadOutcome, LoadState, UpdateKind};

#[cfg(test)]
mod tests;
