//! In-memory store implementation
//!
//! Holds a JSON tree and answers range queries with the ordering rules of a
//! realtime document database: children are ordered by one child field, with
//! missing values first, then booleans, numbers, strings and nested objects,
//! ties broken by key.

use super::types::{DocumentRef, QueryBound, QueryLimit, QueryResult, RangeQuery, Snapshot, Store};
use crate::error::{Error, Result};
use crate::types::{JsonObject, JsonValue};
use async_trait::async_trait;
use std::cmp::Ordering;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory hierarchical store
#[derive(Debug, Clone)]
pub struct MemoryStore {
    root: Arc<RwLock<JsonValue>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::from_value(JsonValue::Object(JsonObject::new()))
    }

    /// Create a store holding the given tree
    pub fn from_value(value: JsonValue) -> Self {
        Self {
            root: Arc::new(RwLock::new(value)),
        }
    }

    /// Create a store from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let value: JsonValue = serde_json::from_str(json)?;
        Ok(Self::from_value(value))
    }

    /// Create a store from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(Error::Io)?;
        Self::from_json(&contents)
    }

    /// Set the value at a slash-separated path, creating parents as needed
    pub async fn set(&self, path: &str, value: JsonValue) {
        let mut root = self.root.write().await;
        let mut current = &mut *root;
        for part in segments(path) {
            if !current.is_object() {
                *current = JsonValue::Object(JsonObject::new());
            }
            let Some(map) = current.as_object_mut() else {
                return;
            };
            current = map
                .entry(part.to_string())
                .or_insert_with(|| JsonValue::Object(JsonObject::new()));
        }
        *current = value;
    }

    /// Remove the value at a slash-separated path
    pub async fn remove(&self, path: &str) -> Option<JsonValue> {
        let parts: Vec<&str> = segments(path).collect();
        let (last, parents) = parts.split_last()?;

        let mut root = self.root.write().await;
        let mut current = &mut *root;
        for part in parents {
            current = current.as_object_mut()?.get_mut(*part)?;
        }
        current.as_object_mut()?.remove(*last)
    }

    /// Snapshot the whole tree
    pub async fn to_value(&self) -> JsonValue {
        self.root.read().await.clone()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn range_query(&self, query: &RangeQuery) -> Result<QueryResult> {
        let root = self.root.read().await;
        let Some(container) = resolve(&root, &query.path).filter(|v| !v.is_null()) else {
            return Ok(QueryResult::missing());
        };

        let Some(map) = container.as_object() else {
            return Ok(QueryResult::found(Vec::new()));
        };

        let mut children: Vec<(&String, &JsonValue)> = map
            .iter()
            .filter(|(key, value)| {
                let sort_value = order_value(value, &query.order_by);
                let after_start = query.start.as_ref().map_or(true, |bound| {
                    compare_to_bound(sort_value, key, bound) != Ordering::Less
                });
                let before_end = query.end.as_ref().map_or(true, |bound| {
                    compare_to_bound(sort_value, key, bound) != Ordering::Greater
                });
                after_start && before_end
            })
            .collect();

        children.sort_by(|(ka, va), (kb, vb)| {
            compare_values(
                order_value(va, &query.order_by),
                order_value(vb, &query.order_by),
            )
            .then_with(|| ka.cmp(kb))
        });

        let children = match query.limit {
            Some(QueryLimit::First(n)) => {
                children.truncate(n);
                children
            }
            Some(QueryLimit::Last(n)) => {
                let skip = children.len().saturating_sub(n);
                children.split_off(skip)
            }
            None => children,
        };

        let path = query.path.trim_matches('/');
        Ok(QueryResult::found(
            children
                .into_iter()
                .map(|(key, value)| Snapshot::new(DocumentRef::new(path, key), value.clone()))
                .collect(),
        ))
    }

    async fn get(&self, reference: &DocumentRef) -> Result<Option<Snapshot>> {
        let root = self.root.read().await;
        Ok(resolve(&root, &reference.full_path())
            .filter(|v| !v.is_null())
            .map(|value| Snapshot::new(reference.clone(), value.clone())))
    }
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|p| !p.is_empty())
}

fn resolve<'a>(root: &'a JsonValue, path: &str) -> Option<&'a JsonValue> {
    let mut current = root;
    for part in segments(path) {
        current = current.as_object()?.get(part)?;
    }
    Some(current)
}

/// Value of the ordered child, `None` when missing
fn order_value<'a>(value: &'a JsonValue, field: &str) -> Option<&'a JsonValue> {
    resolve(value, field).filter(|v| !v.is_null())
}

/// Type rank used to order children of mixed types
fn rank(value: Option<&JsonValue>) -> u8 {
    match value {
        None | Some(JsonValue::Null) => 0,
        Some(JsonValue::Bool(_)) => 1,
        Some(JsonValue::Number(_)) => 2,
        Some(JsonValue::String(_)) => 3,
        Some(JsonValue::Array(_) | JsonValue::Object(_)) => 4,
    }
}

fn compare_values(a: Option<&JsonValue>, b: Option<&JsonValue>) -> Ordering {
    rank(a).cmp(&rank(b)).then_with(|| match (a, b) {
        (Some(JsonValue::Bool(x)), Some(JsonValue::Bool(y))) => x.cmp(y),
        (Some(JsonValue::Number(x)), Some(JsonValue::Number(y))) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.total_cmp(&y)
        }
        (Some(JsonValue::String(x)), Some(JsonValue::String(y))) => x.cmp(y),
        _ => Ordering::Equal,
    })
}

/// Position of a child relative to a numeric bound
fn compare_to_bound(value: Option<&JsonValue>, key: &str, bound: &QueryBound) -> Ordering {
    let bound_value = serde_json::Number::from_f64(bound.value).map(JsonValue::Number);
    compare_values(value, bound_value.as_ref()).then_with(|| {
        bound
            .key
            .as_deref()
            .map_or(Ordering::Equal, |bound_key| key.cmp(bound_key))
    })
}
