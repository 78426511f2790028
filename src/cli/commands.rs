//! CLI commands and argument parsing

use crate::types::LogLevel;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Category Pager CLI
#[derive(Parser, Debug)]
#[command(name = "category-pager")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Session configuration file (YAML or JSON)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log level (overrides --verbose)
    #[arg(long, global = true, value_enum)]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Level for the tracing subscriber
    pub fn tracing_level(&self) -> tracing::Level {
        match (self.log_level, self.verbose) {
            (Some(level), _) => level.into(),
            (None, true) => tracing::Level::DEBUG,
            (None, false) => tracing::Level::INFO,
        }
    }
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Page through one category of a JSON data file
    Page {
        /// Data file (JSON tree) used to seed the in-memory store
        #[arg(short, long)]
        data: PathBuf,

        /// Collection path (overrides the config file)
        #[arg(long)]
        path: Option<String>,

        /// Category field (overrides the config file)
        #[arg(long)]
        field: Option<String>,

        /// Category value (overrides the config file)
        #[arg(long)]
        value: Option<f64>,

        /// Scan in descending order
        #[arg(long)]
        descending: bool,

        /// Records per page (overrides the config file)
        #[arg(long)]
        page_size: Option<usize>,

        /// Stop after this many pages
        #[arg(long)]
        max_pages: Option<usize>,
    },

    /// Validate a session configuration
    Validate,
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one message per line)
    Json,
    /// Human-readable output
    Pretty,
}
