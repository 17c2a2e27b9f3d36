//! # Reel CLI
//!
//! Command-line interface for the Reel media search core.
//!
//! ## Commands
//!
//! - `reel ngrams <words>...` - Show the n-grams of one or more words
//! - `reel query <catalog> <text>` - Search a JSON item catalog
//! - `reel filter <catalog>` - Replay a catalog and delta script through a live filter
//! - `reel status <catalog>` - Show index statistics for a catalog
//! - `reel config` - Show or initialize the configuration file
//!
//! ## Example Usage
//!
//! ```bash
//! # Search a catalog for items whose title or description contains "second"
//! reel query library.json second
//!
//! # Watch the "news" subset while a delta script is applied
//! reel filter library.json --deltas changes.json --query news
//! ```

mod app;
mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Reel - Incremental search over a media library
#[derive(Parser)]
#[command(name = "reel")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Break words into n-grams
    Ngrams {
        /// Words to break up
        #[arg(required = true)]
        words: Vec<String>,

        /// Shortest n-gram length
        #[arg(long, default_value = "1")]
        min: usize,

        /// Longest n-gram length
        #[arg(long, default_value = "3")]
        max: usize,
    },

    /// Search an item catalog
    Query {
        /// JSON file holding an array of items
        catalog: PathBuf,

        /// Search text (case-insensitive)
        text: String,

        /// How to answer the query (index, verified, scan)
        #[arg(short, long, default_value = "verified")]
        mode: SearchMode,

        /// Maximum number of results to show
        #[arg(short, long)]
        limit: Option<usize>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        output: OutputFormat,
    },

    /// Replay a catalog and its deltas through a live filter
    Filter {
        /// JSON file holding an array of items
        catalog: PathBuf,

        /// JSON file holding an array of deltas to apply in order
        #[arg(short, long)]
        deltas: Option<PathBuf>,

        /// Query in effect when the catalog is loaded
        #[arg(short = 'Q', long)]
        query: Option<String>,

        /// Queries to switch to after the deltas, in order
        #[arg(short, long)]
        search: Vec<String>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        output: OutputFormat,
    },

    /// Show index statistics for a catalog
    Status {
        /// JSON file holding an array of items
        catalog: PathBuf,
    },

    /// Show the active configuration
    Config {
        /// Write the default configuration if no file exists yet
        #[arg(long)]
        init: bool,
    },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

/// Which search path answers a query
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SearchMode {
    /// Token AND over the inverted index
    Index,
    /// Index candidates confirmed by substring match
    #[default]
    Verified,
    /// Linear scan with no index
    Scan,
}

impl std::str::FromStr for SearchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "index" => Ok(SearchMode::Index),
            "verified" => Ok(SearchMode::Verified),
            "scan" => Ok(SearchMode::Scan),
            _ => Err(format!("Unknown search mode: {}", s)),
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration first so it can supply the default log level
    let config = match &cli.config {
        Some(path) => reel_core::Config::load_from(path)?,
        None => reel_core::Config::load()?,
    };

    let log_level = if cli.quiet {
        "error".to_string()
    } else {
        match cli.verbose {
            0 => config.general.log_level.clone(),
            1 => "debug".to_string(),
            _ => "trace".to_string(),
        }
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level)))
        .init();

    match cli.command {
        Commands::Ngrams { words, min, max } => commands::ngrams::run(&words, min, max),
        Commands::Query {
            catalog,
            text,
            mode,
            limit,
            output,
        } => commands::query::run(config, &catalog, &text, mode, limit, output),
        Commands::Filter {
            catalog,
            deltas,
            query,
            search,
            output,
        } => commands::filter::run(
            config,
            &catalog,
            deltas.as_deref(),
            query.as_deref(),
            &search,
            output,
        ),
        Commands::Status { catalog } => commands::status::run(config, &catalog),
        Commands::Config { init } => commands::config::run(config, cli.config.as_deref(), init),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_parse() {
        assert_eq!("json".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert_eq!("TEXT".parse::<OutputFormat>(), Ok(OutputFormat::Text));
        assert!("yaml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_search_mode_parse() {
        assert_eq!("scan".parse::<SearchMode>(), Ok(SearchMode::Scan));
        assert_eq!("Index".parse::<SearchMode>(), Ok(SearchMode::Index));
        assert!("fuzzy".parse::<SearchMode>().is_err());
    }

    #[test]
    fn test_cli_parses_filter() {
        let cli = Cli::try_parse_from([
            "reel", "filter", "lib.json", "-d", "deltas.json", "-Q", "news", "-s", "sport", "-s",
            "",
        ])
        .unwrap();

        match cli.command {
            Commands::Filter {
                deltas,
                query,
                search,
                ..
            } => {
                assert_eq!(deltas, Some(PathBuf::from("deltas.json")));
                assert_eq!(query.as_deref(), Some("news"));
                assert_eq!(search, vec!["sport".to_string(), String::new()]);
            }
            _ => panic!("expected filter command"),
        }
    }
}
