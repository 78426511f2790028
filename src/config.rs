//! Configuration types for paging sessions
//!
//! A session is configured either programmatically through
//! [`crate::adapter::PagingOptions`] or from a YAML/JSON file describing the
//! query, the paging sizes and the diff mode.

use crate::error::{Error, Result};
use crate::pagination::QueryDescriptor;
use crate::types::SortDirection;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

// ============================================================================
// Paging Config
// ============================================================================

/// Page sizes and prefetch behaviour
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagingConfig {
    /// Records per page
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Records requested for the first page (defaults to `page_size`)
    #[serde(default)]
    pub initial_load_size: Option<usize>,

    /// Distance from the end of the list at which more data is wanted
    #[serde(default = "default_prefetch_distance")]
    pub prefetch_distance: usize,
}

fn default_page_size() -> usize {
    20
}

fn default_prefetch_distance() -> usize {
    5
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            initial_load_size: None,
            prefetch_distance: default_prefetch_distance(),
        }
    }
}

impl PagingConfig {
    /// Create a config with the given page size
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size,
            ..Self::default()
        }
    }

    /// Set the size of the first page
    #[must_use]
    pub fn with_initial_load_size(mut self, size: usize) -> Self {
        self.initial_load_size = Some(size);
        self
    }

    /// Set the prefetch distance
    #[must_use]
    pub fn with_prefetch_distance(mut self, distance: usize) -> Self {
        self.prefetch_distance = distance;
        self
    }

    /// Number of records to request for a load
    pub fn load_size(&self, first: bool) -> usize {
        if first {
            self.initial_load_size.unwrap_or(self.page_size)
        } else {
            self.page_size
        }
    }

    /// Validate the sizes
    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(Error::invalid_value("page_size", "must be at least 1"));
        }
        if self.initial_load_size == Some(0) {
            return Err(Error::invalid_value(
                "initial_load_size",
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Diff Mode
// ============================================================================

/// Content comparison used when a record shows up again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffMode {
    /// Compare keys only
    Key,
    /// Compare raw document values
    #[default]
    Value,
}

// ============================================================================
// Session Config
// ============================================================================

/// A paging session described in a config file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Collection path in the store
    pub path: String,

    /// Child field holding the category
    pub category_field: String,

    /// Category value to page through
    pub category_value: f64,

    /// Scan direction
    #[serde(default)]
    pub direction: SortDirection,

    /// Page sizes
    #[serde(default)]
    pub paging: PagingConfig,

    /// Diff mode
    #[serde(default)]
    pub diff: DiffMode,
}

impl SessionConfig {
    /// Query descriptor for this session
    pub fn descriptor(&self) -> QueryDescriptor {
        QueryDescriptor {
            path: self.path.clone(),
            category_field: self.category_field.clone(),
            category_value: self.category_value,
            direction: self.direction,
        }
    }

    /// Validate the session
    pub fn validate(&self) -> Result<()> {
        if self.path.trim_matches('/').is_empty() {
            return Err(Error::missing_field("path"));
        }
        self.descriptor().validate()?;
        self.paging.validate()
    }
}

/// Load a session config from a YAML or JSON file
pub fn load_session_config(path: impl AsRef<Path>) -> Result<SessionConfig> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;

    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        let config: SessionConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    } else {
        load_session_config_from_str(&content)
    }
}

/// Load a session config from a YAML string
pub fn load_session_config_from_str(yaml: &str) -> Result<SessionConfig> {
    let config: SessionConfig = serde_yaml::from_str(yaml)?;

    config.validate()?;
    Ok(config)
}
