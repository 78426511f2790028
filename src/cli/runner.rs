//! CLI runner - executes commands

use crate::adapter::{LoadOutcome, PagingAdapter, PagingOptions};
use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::config::{load_session_config, DiffMode, PagingConfig, SessionConfig};
use crate::error::{Error, Result, ResultExt};
use crate::parser::IdentityParser;
use crate::store::{MemoryStore, Snapshot};
use crate::types::{LogLevel, SortDirection};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Page { data, .. } => {
                let session = self.load_session()?;
                for msg in self.collect_pages(data, &session).await? {
                    self.output_message(&msg);
                }
                Ok(())
            }
            Commands::Validate => self.validate(),
        }
    }

    /// Load the session config and apply command-line overrides
    fn load_session(&self) -> Result<SessionConfig> {
        let base = match &self.cli.config {
            Some(path) => Some(load_session_config(path)?),
            None => None,
        };

        let Commands::Page {
            path,
            field,
            value,
            descending,
            page_size,
            ..
        } = &self.cli.command
        else {
            return base.ok_or_else(|| Error::config("Session config not specified (use -C flag)"));
        };

        let mut session = match base {
            Some(session) => session,
            None => SessionConfig {
                path: path.clone().ok_or_else(|| Error::missing_field("path"))?,
                category_field: field.clone().ok_or_else(|| Error::missing_field("field"))?,
                category_value: value.ok_or_else(|| Error::missing_field("value"))?,
                direction: SortDirection::Ascending,
                paging: PagingConfig::default(),
                diff: DiffMode::default(),
            },
        };

        if let Some(path) = path {
            session.path.clone_from(path);
        }
        if let Some(field) = field {
            session.category_field.clone_from(field);
        }
        if let Some(value) = value {
            session.category_value = *value;
        }
        if *descending {
            session.direction = SortDirection::Descending;
        }
        if let Some(size) = page_size {
            session.paging.page_size = *size;
        }

        session.validate()?;
        Ok(session)
    }

    /// Drive a session to exhaustion, returning one message per page and a
    /// final state message
    async fn collect_pages(&self, data: &Path, session: &SessionConfig) -> Result<Vec<Value>> {
        let max_pages = match &self.cli.command {
            Commands::Page { max_pages, .. } => *max_pages,
            Commands::Validate => None,
        };

        let store = MemoryStore::from_file(data)
            .with_context(|| format!("Failed to load data file '{}'", data.display()))?;
        let store = Arc::new(store);
        let options = PagingOptions::<Snapshot>::from_session(store, session, IdentityParser)?;
        let adapter = PagingAdapter::new(options)?;
        adapter.start().await;

        let start = Instant::now();
        let mut messages = Vec::new();
        let mut pages = 0;

        while max_pages.map_or(true, |max| pages < max) {
            let change = match adapter.load_more().await? {
                LoadOutcome::Appended(change) => change,
                _ => break,
            };
            pages += 1;

            let snapshots = adapter.snapshots().await;
            let exhausted = adapter.is_exhausted().await;
            let records: Vec<Value> = snapshots[change.inserted.clone()]
                .iter()
                .map(|s| json!({ "key": s.key(), "value": s.value() }))
                .collect();

            messages.push(json!({
                "type": "PAGE",
                "page": {
                    "number": pages,
                    "count": records.len(),
                    "records": records,
                    "exhausted": exhausted,
                }
            }));
        }

        let len = adapter.len().await;
        let exhausted = adapter.is_exhausted().await;
        let load_state = adapter.load_state().await;
        adapter.stop().await;

        info!(
            pages,
            records = len,
            exhausted,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Paging session finished"
        );

        messages.push(json!({
            "type": "STATE",
            "state": {
                "pages": pages,
                "records": len,
                "exhausted": exhausted,
                "load_state": load_state,
            }
        }));
        Ok(messages)
    }

    /// Validate session config
    fn validate(&self) -> Result<()> {
        let path = self
            .cli
            .config
            .as_ref()
            .ok_or_else(|| Error::config("Session config not specified (use -C flag)"))?;
        let session = load_session_config(path)?;

        self.output_message(&json!({
            "type": "LOG",
            "log": {
                "level": LogLevel::Info,
                "message": format!(
                    "Session '{}' by {} = {} ({:?}, page size {}) is valid",
                    session.path,
                    session.category_field,
                    session.category_value,
                    session.direction,
                    session.paging.page_size
                )
            }
        }));

        Ok(())
    }

    /// Output a message
    fn output_message(&self, msg: &Value) {
        match self.cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(msg).unwrap_or_default());
            }
            OutputFormat::Pretty => {
                println!("{}", serde_json::to_string_pretty(msg).unwrap_or_default());
            }
        }
    }
}
