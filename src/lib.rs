// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # Category Pager
//!
//! Cursor-based pagination over one category of an ordered key-value store.
//!
//! The store can order by a single child field and bound a range by
//! `(value, key)`. This crate builds category-filtered, forward-only paging on
//! top of that: it stitches pages together through an overlap record, stops at
//! the category boundary and feeds a deduplicated list to a consumer.
//!
//! ## Features
//!
//! - **Composite Cursors**: Resume by `(category value, key)` in either direction
//! - **Boundary Detection**: Trims records past the category and ends the session
//! - **Single-Flight Loads**: One outstanding page per session, cancellation safe
//! - **Pipeline Adapter**: Start/stop/replace sessions, diff-aware merging, update broadcast
//! - **Session Files**: YAML/JSON session configuration
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use category_pager::adapter::{PagingAdapter, PagingOptions};
//! use category_pager::config::PagingConfig;
//! use category_pager::pagination::QueryDescriptor;
//! use category_pager::store::MemoryStore;
//! use std::sync::Arc;
//!
//! #[derive(serde::Deserialize)]
//! struct Article {
//!     title: String,
//! }
//!
//! #[tokio::main]
//! async fn main() -> category_pager::Result<()> {
//!     let store = Arc::new(MemoryStore::from_file("articles.json")?);
//!
//!     let options = PagingOptions::<Article>::builder()
//!         .set_query_json(
//!             store,
//!             QueryDescriptor::new("articles", "categoryId", 5.0, true),
//!             PagingConfig::new(20),
//!         )
//!         .build()?;
//!
//!     let adapter = PagingAdapter::new(options)?;
//!     adapter.start().await;
//!     adapter.load_more().await?;
//!
//!     let first = adapter.item_at(0).await?;
//!     println!("{}", first.title);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        PagingAdapter                            │
//! │  start() / stop() / replace_query()   load_more() → ListUpdate  │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌──────────────┬───────────────┴───────┬──────────────────────────┐
//! │    Diff      │      Pagination       │          Store           │
//! ├──────────────┼───────────────────────┼──────────────────────────┤
//! │ Assembler    │ CategoryPagingSource  │ RangeQuery               │
//! │ Key / Value  │ Overlap stripping     │ MemoryStore              │
//! │ Parsed       │ Category boundary     │ get(DocumentRef)         │
//! └──────────────┴───────────────────────┴──────────────────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the pager
pub mod error;

/// Common types and type aliases
pub mod types;

/// Store interface and in-memory store
pub mod store;

/// Snapshot parsers
pub mod parser;

/// Category-filtered page loading
pub mod pagination;

/// List assembly and diff policies
pub mod diff;

/// Paging adapter feeding a consumer list
pub mod adapter;

/// Session configuration
pub mod config;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use adapter::{PagingAdapter, PagingOptions};
pub use config::{load_session_config, load_session_config_from_str, PagingConfig, SessionConfig};
pub use pagination::{CategoryPagingSource, Cursor, Page, QueryDescriptor};
pub use store::{MemoryStore, Snapshot, Store};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
