//! Common types used throughout Category Pager
//!
//! This module contains shared type definitions, type aliases,
//! and utility types used across multiple modules.

use serde::{Deserialize, Serialize};

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// JSON object type
pub type JsonObject = serde_json::Map<String, JsonValue>;

// ============================================================================
// Sort Direction
// ============================================================================

/// Direction in which a session walks the ordered collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    /// Start at the category value and walk towards larger order values
    #[default]
    Ascending,
    /// End at the category value and walk towards smaller order values
    Descending,
}

impl SortDirection {
    /// Build a direction from an `is_ascending` flag
    pub fn from_ascending(is_ascending: bool) -> Self {
        if is_ascending {
            Self::Ascending
        } else {
            Self::Descending
        }
    }

    /// Check if this is ascending
    pub fn is_ascending(self) -> bool {
        matches!(self, Self::Ascending)
    }
}

// ============================================================================
// Log Level
// ============================================================================

/// Log level for CLI output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    /// Trace
    Trace,
    /// Debug
    Debug,
    /// Info
    Info,
    /// Warn
    Warn,
    /// Error
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}
