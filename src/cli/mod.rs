//! CLI module
//!
//! Command-line interface for paging through a category of a JSON data file.
//!
//! # Commands
//!
//! - `page` - Load every page of a session and print each one
//! - `validate` - Validate a session configuration

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::Runner;
