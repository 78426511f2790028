//! Diff policies
//!
//! Identity is always the record key unless a policy says otherwise. Content
//! equality decides whether an already-listed record must be re-rendered.

use crate::parser::SnapshotParser;
use crate::store::Snapshot;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Compares snapshots for incremental rendering
pub trait DiffPolicy: Send + Sync {
    /// Check if both snapshots describe the same record
    fn same_item(&self, old: &Snapshot, new: &Snapshot) -> bool {
        old.key() == new.key()
    }

    /// Check if the record's content is unchanged
    fn same_content(&self, old: &Snapshot, new: &Snapshot) -> bool;
}

/// Identity by key; content equality falls back to identity
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyDiffPolicy;

impl DiffPolicy for KeyDiffPolicy {
    fn same_content(&self, old: &Snapshot, new: &Snapshot) -> bool {
        self.same_item(old, new)
    }
}

/// Content equality on the raw document values
#[derive(Debug, Clone, Copy, Default)]
pub struct ValueDiffPolicy;

impl DiffPolicy for ValueDiffPolicy {
    fn same_content(&self, old: &Snapshot, new: &Snapshot) -> bool {
        old.value() == new.value()
    }
}

/// Content equality on parsed models
///
/// A snapshot that fails to parse is treated as changed.
pub struct ParsedDiffPolicy<T> {
    parser: Arc<dyn SnapshotParser<T>>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> ParsedDiffPolicy<T> {
    /// Create a policy comparing models produced by `parser`
    pub fn new(parser: Arc<dyn SnapshotParser<T>>) -> Self {
        Self {
            parser,
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for ParsedDiffPolicy<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParsedDiffPolicy")
            .field("model", &std::any::type_name::<T>())
            .finish()
    }
}

impl<T: PartialEq> DiffPolicy for ParsedDiffPolicy<T> {
    fn same_content(&self, old: &Snapshot, new: &Snapshot) -> bool {
        match (self.parser.parse(old), self.parser.parse(new)) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }
}

/// Content equality supplied by a closure
pub struct FnDiffPolicy<F> {
    same_content: F,
}

impl<F> FnDiffPolicy<F>
where
    F: Fn(&Snapshot, &Snapshot) -> bool + Send + Sync,
{
    /// Create a policy from a content comparator
    pub fn new(same_content: F) -> Self {
        Self { same_content }
    }
}

impl<F> fmt::Debug for FnDiffPolicy<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnDiffPolicy").finish_non_exhaustive()
    }
}

impl<F> DiffPolicy for FnDiffPolicy<F>
where
    F: Fn(&Snapshot, &Snapshot) -> bool + Send + Sync,
{
    fn same_content(&self, old: &Snapshot, new: &Snapshot) -> bool {
        (self.same_content)(old, new)
    }
}
