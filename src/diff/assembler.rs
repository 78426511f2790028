//! Page assembler
//!
//! Keeps the growing list of a subscription: pages are appended in delivery
//! order, records already listed are never duplicated.

use super::policy::DiffPolicy;
use crate::store::Snapshot;
use serde::Serialize;
use std::collections::HashMap;
use std::ops::Range;

/// Change applied to the list by one merge
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ListChange {
    /// Positions of newly appended records
    pub inserted: Range<usize>,
    /// Positions of records replaced in place because their content changed
    pub changed: Vec<usize>,
    /// Number of records skipped as unchanged duplicates
    pub unchanged: usize,
}

impl ListChange {
    /// Check if the merge changed nothing visible
    pub fn is_empty(&self) -> bool {
        self.inserted.is_empty() && self.changed.is_empty()
    }
}

/// Ordered, key-deduplicated list of snapshots
#[derive(Debug, Clone, Default)]
pub struct PageAssembler {
    items: Vec<Snapshot>,
    positions: HashMap<String, usize>,
}

impl PageAssembler {
    /// Create an empty list
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a page at the end of the list
    ///
    /// A record whose key is already listed stays at its position; it is
    /// replaced when `policy` reports different content.
    pub fn append_page(&mut self, page: Vec<Snapshot>, policy: &dyn DiffPolicy) -> ListChange {
        let start = self.items.len();
        let mut changed = Vec::new();
        let mut unchanged = 0;

        for snapshot in page {
            match self.positions.get(snapshot.key()) {
                Some(&index) => {
                    let existing = &self.items[index];
                    if policy.same_item(existing, &snapshot)
                        && policy.same_content(existing, &snapshot)
                    {
                        unchanged += 1;
                    } else {
                        self.items[index] = snapshot;
                        if index < start && !changed.contains(&index) {
                            changed.push(index);
                        }
                    }
                }
                None => {
                    self.positions
                        .insert(snapshot.key().to_string(), self.items.len());
                    self.items.push(snapshot);
                }
            }
        }

        ListChange {
            inserted: start..self.items.len(),
            changed,
            unchanged,
        }
    }

    /// Get the snapshot at `index`
    pub fn get(&self, index: usize) -> Option<&Snapshot> {
        self.items.get(index)
    }

    /// Position of the record with `key`
    pub fn position(&self, key: &str) -> Option<usize> {
        self.positions.get(key).copied()
    }

    /// All snapshots in list order
    pub fn items(&self) -> &[Snapshot] {
        &self.items
    }

    /// Number of listed records
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the list is empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Remove every record
    pub fn clear(&mut self) {
        self.items.clear();
        self.positions.clear();
    }
}
