//! Snapshot parsers
//!
//! Turn raw store snapshots into typed models. A parser is injected into each
//! session so the pager itself stays agnostic of the record type.

use crate::error::{Error, Result};
use crate::store::Snapshot;
use serde::de::DeserializeOwned;
use std::fmt;
use std::marker::PhantomData;

/// Parses a raw snapshot into a model of type `T`
pub trait SnapshotParser<T>: Send + Sync {
    /// Parse a snapshot
    fn parse(&self, snapshot: &Snapshot) -> Result<T>;
}

impl<T, F> SnapshotParser<T> for F
where
    F: Fn(&Snapshot) -> Result<T> + Send + Sync,
{
    fn parse(&self, snapshot: &Snapshot) -> Result<T> {
        self(snapshot)
    }
}

/// Deserializes the snapshot value with serde
pub struct JsonParser<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonParser<T> {
    /// Create a new JSON parser
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for JsonParser<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for JsonParser<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for JsonParser<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonParser")
            .field("model", &std::any::type_name::<T>())
            .finish()
    }
}

impl<T: DeserializeOwned> SnapshotParser<T> for JsonParser<T> {
    fn parse(&self, snapshot: &Snapshot) -> Result<T> {
        T::deserialize(snapshot.value()).map_err(|e| Error::parse(snapshot.key(), e.to_string()))
    }
}

/// Returns the snapshot itself, for callers that work on raw records
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityParser;

impl SnapshotParser<Snapshot> for IdentityParser {
    fn parse(&self, snapshot: &Snapshot) -> Result<Snapshot> {
        Ok(snapshot.clone())
    }
}
