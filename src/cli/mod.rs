//! CLI module
//!
//! Command-line interface for trying out pager configurations.
//!
//! # Commands
//!
//! - `simulate` - Scroll through an in-memory dataset and report fetches
//! - `validate` - Check a configuration file
//! - `params` - Print the request parameters for a page

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat, SimulateArgs};
pub use runner::Runner;
