//! Adapter types
//!
//! Load states, outcomes and the change notifications sent to subscribers.

use crate::diff::ListChange;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Lifecycle of the consumer an adapter is bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Lifecycle {
    /// Consumer is not visible; pages are not wanted
    #[default]
    Stopped,
    /// Consumer is visible; pages are wanted
    Started,
    /// Consumer is gone; the binding ends
    Destroyed,
}

/// State of the current load attempt
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LoadState {
    /// Nothing in flight
    #[default]
    Idle,
    /// A page is being loaded
    Loading,
    /// The last attempt failed; already listed data is untouched
    Error {
        /// Error message
        message: String,
        /// Whether retrying with the same cursor may succeed
        retryable: bool,
    },
    /// The category is exhausted
    Complete,
}

impl LoadState {
    /// Check if the last attempt failed
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}

/// Result of asking the adapter for more data
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A page was merged into the list
    Appended(ListChange),
    /// No more pages in this session
    Exhausted,
    /// The adapter is stopped
    Inactive,
    /// A load is already in flight
    InFlight,
    /// The session was stopped or replaced while loading; the page was dropped
    Superseded,
    /// The last load did not fail, so there is nothing to retry
    NothingToRetry,
}

impl LoadOutcome {
    /// Change applied by this load, if any
    pub fn change(&self) -> Option<&ListChange> {
        match self {
            Self::Appended(change) => Some(change),
            _ => None,
        }
    }
}

/// What happened to the list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UpdateKind {
    /// The list was cleared for a new session
    Reset,
    /// A page was merged
    Merged {
        /// Applied change
        change: ListChange,
        /// Whether this was the last page
        exhausted: bool,
    },
    /// A load failed
    LoadFailed {
        /// Error message
        message: String,
    },
}

/// Notification broadcast to subscribers after every list change
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListUpdate {
    /// Session generation the update belongs to
    pub generation: u64,
    /// Kind of update
    #[serde(flatten)]
    pub kind: UpdateKind,
    /// List length after the update
    pub len: usize,
    /// When the update was emitted
    pub emitted_at: DateTime<Utc>,
}

impl ListUpdate {
    /// Create an update stamped with the current time
    pub fn new(generation: u64, kind: UpdateKind, len: usize) -> Self {
        Self {
            generation,
            kind,
            len,
            emitted_at: Utc::now(),
        }
    }
}
