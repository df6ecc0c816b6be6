//! CLI commands and argument parsing

use crate::types::LogLevel;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Scroll-triggered pagination controller CLI
#[derive(Parser, Debug)]
#[command(name = "infiniscroll")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Pager configuration file (YAML or JSON)
    #[arg(short, long, global = true)]
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

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scroll through an in-memory dataset and report every fetch
    Simulate(SimulateArgs),

    /// Validate a configuration file
    Validate,

    /// Print the request parameters for a given page
    Params {
        /// Pages already loaded
        #[arg(long, default_value = "1")]
        page: u32,

        /// Items currently in the collection (used when page_size is unset)
        #[arg(long, default_value = "0")]
        collection_len: usize,

        /// Last item in the collection as JSON (key mode)
        #[arg(long)]
        last_item: Option<String>,
    },
}

/// Options for `simulate`
#[derive(Args, Debug, Clone)]
pub struct SimulateArgs {
    /// Items available from the data source
    #[arg(long, default_value = "100")]
    pub items: usize,

    /// Height of one rendered item in pixels
    #[arg(long, default_value = "40")]
    pub item_height: f64,

    /// Viewport height in pixels
    #[arg(long, default_value = "600")]
    pub viewport: f64,

    /// Pixels scrolled per step
    #[arg(long, default_value = "200")]
    pub step: f64,

    /// Maximum number of scroll steps
    #[arg(long, default_value = "100")]
    pub max_steps: usize,

    /// Pause between scroll steps in milliseconds
    #[arg(long, default_value = "20")]
    pub step_delay_ms: u64,

    /// Simulated fetch latency in milliseconds
    #[arg(long, default_value = "0")]
    pub latency_ms: u64,

    /// Fail this many fetches before serving pages
    #[arg(long, default_value = "0")]
    pub fail_first: usize,

    /// Resize the viewport to this height halfway through
    #[arg(long)]
    pub resize_to: Option<f64>,
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one message per line)
    Json,
    /// Human-readable output
    Pretty,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simulate() {
        let cli = Cli::try_parse_from([
            "infiniscroll",
            "simulate",
            "--items",
            "35",
            "--fail-first",
            "1",
            "-f",
            "pretty",
        ])
        .unwrap();

        assert_eq!(cli.format, OutputFormat::Pretty);
        let Commands::Simulate(args) = cli.command else {
            panic!("expected simulate");
        };
        assert_eq!(args.items, 35);
        assert_eq!(args.fail_first, 1);
        assert!((args.viewport - 600.0).abs() < f64::EPSILON);
        assert!(args.resize_to.is_none());
    }

    #[test]
    fn test_parse_params_with_global_config() {
        let cli = Cli::try_parse_from([
            "infiniscroll",
            "params",
            "--page",
            "3",
            "--config",
            "pager.yaml",
            "--log-level",
            "debug",
        ])
        .unwrap();

        assert_eq!(cli.config, Some(PathBuf::from("pager.yaml")));
        assert_eq!(cli.log_level, Some(LogLevel::Debug));
        assert!(matches!(cli.command, Commands::Params { page: 3, .. }));
    }
}
