//! Diff module
//!
//! Record identity, content equality and page assembly for consuming lists.
//!
//! # Overview
//!
//! The diff module provides:
//! - `DiffPolicy` - How two snapshots compare (same record? same content?)
//! - `KeyDiffPolicy`, `ValueDiffPolicy`, `ParsedDiffPolicy`, `FnDiffPolicy` - Built-in policies
//! - `PageAssembler` - Merges pages into one key-deduplicated list and reports the change

mod assembler;
mod policy;

pub use assembler::{ListChange, PageAssembler};
pub use policy::{DiffPolicy, FnDiffPolicy, KeyDiffPolicy, ParsedDiffPolicy, ValueDiffPolicy};
