//! Command line argument parsing for the curator CLI using clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

/// Curator - artwork search with LLM query augmentation
#[derive(Parser, Debug, Clone)]
#[command(name = "curator")]
#[command(about = "Index artwork metadata and search it with LLM-augmented queries")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct CuratorArgs {
    /// Verbosity level (0=quiet, 1=normal, 2=verbose, 3=debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "human", global = true)]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Configuration file (JSON)
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl CuratorArgs {
    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            match self.verbose {
                0 => 1, // Default to normal
                n => n,
            }
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Build the index from the metadata CSV and the vector store
    Index(IndexArgs),

    /// Search the index
    Search(SearchArgs),
}

/// Arguments for building the index
#[derive(Parser, Debug, Clone)]
pub struct IndexArgs {
    /// Metadata CSV file
    #[arg(long, value_name = "CSV_FILE")]
    pub data: Option<PathBuf>,

    /// Binary vector store with one vector per CSV row
    #[arg(long, value_name = "VECTOR_FILE")]
    pub vectors: Option<PathBuf>,

    /// Index directory (replaced if it already holds an index)
    #[arg(long, value_name = "INDEX_DIR")]
    pub index_dir: Option<PathBuf>,
}

/// Arguments for searching
#[derive(Parser, Debug, Clone)]
pub struct SearchArgs {
    /// Query string (read from stdin when omitted)
    #[arg(value_name = "QUERY")]
    pub query: Option<String>,

    /// Maximum number of results to return
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Which searches to run
    #[arg(short = 'm', long, default_value = "both")]
    pub mode: SearchMode,

    /// Index directory
    #[arg(long, value_name = "INDEX_DIR")]
    pub index_dir: Option<PathBuf>,

    /// API key for query augmentation
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,
}

/// Search modes available in CLI
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    /// Augmented search followed by plain search
    Both,
    /// Augmented search only
    Augmented,
    /// Plain search only
    Plain,
}

impl SearchMode {
    /// The augmentation flag of each search to run, in order.
    pub fn passes(self) -> &'static [bool] {
        match self {
            SearchMode::Both => &[true, false],
            SearchMode::Augmented => &[true],
            SearchMode::Plain => &[false],
        }
    }
}

/// Output formats
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}
