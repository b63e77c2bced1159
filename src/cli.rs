//! CLI argument parsing for assay

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for detection reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format (default)
    Text,
    /// JSON format for machine parsing
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "assay")]
#[command(version)]
#[command(about = "Dixon's Q-test outlier detection for chemical-composition datasets", long_about = None)]
pub struct Cli {
    /// Load settings from a TOML configuration file
    #[arg(long = "config", value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug tracing output to stderr
    #[arg(long = "debug", global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create an empty outlier store
    Init {
        /// Outlier store to create
        #[arg(long, value_name = "FILE")]
        store: Option<PathBuf>,

        /// Replace an existing store
        #[arg(long)]
        force: bool,
    },

    /// Run the Q-test over every element column and record the outliers
    Detect(DetectArgs),

    /// Record a manually chosen outlier (sample, sample+session, or single reading)
    Flag {
        /// Sample identifier
        #[arg(long, value_name = "ID")]
        sample: String,

        /// Measurement session (date)
        #[arg(long, value_name = "SESSION")]
        session: Option<String>,

        /// Element symbol (requires --session)
        #[arg(long, value_name = "ELEMENT", requires = "session")]
        element: Option<String>,

        /// Outlier store to update
        #[arg(long, value_name = "FILE")]
        store: Option<PathBuf>,
    },

    /// Remove stored outliers from a dataset
    Apply {
        /// Input CSV dataset
        #[arg(long, value_name = "CSV")]
        data: PathBuf,

        /// Outlier store to apply
        #[arg(long, value_name = "FILE")]
        store: Option<PathBuf>,

        /// Where to write the cleaned CSV dataset
        #[arg(short, long, value_name = "CSV")]
        output: PathBuf,
    },

    /// Print per-element statistics
    Summary {
        /// Input CSV dataset
        #[arg(long, value_name = "CSV")]
        data: PathBuf,

        /// Apply this outlier store before summarizing
        #[arg(long, value_name = "FILE")]
        store: Option<PathBuf>,

        /// Row filter (e.g., sample_id=A1,date=2021-03-04)
        #[arg(long, value_name = "EXPR")]
        filter: Option<String>,

        /// Element columns to summarize (default: all resolved elements)
        #[arg(long, value_delimiter = ',')]
        elements: Option<Vec<String>>,
    },

    /// List the element columns found in a dataset
    Elements {
        /// Input CSV dataset
        #[arg(long, value_name = "CSV")]
        data: PathBuf,
    },
}

#[derive(Args, Debug)]
pub struct DetectArgs {
    /// Input CSV dataset
    #[arg(long, value_name = "CSV")]
    pub data: PathBuf,

    /// Element columns to screen (default: all resolved elements)
    #[arg(long, value_delimiter = ',')]
    pub elements: Option<Vec<String>>,

    /// Outlier store to merge results into
    #[arg(long, value_name = "FILE")]
    pub store: Option<PathBuf>,

    /// Confidence level: 90, 95 or 99
    #[arg(long, value_name = "PERCENT")]
    pub confidence: Option<u32>,

    /// Stream each column through a sliding window of N values (3-30)
    #[arg(long, value_name = "N")]
    pub window: Option<usize>,

    /// Report outliers without touching the store
    #[arg(long)]
    pub dry_run: bool,

    /// Report format
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,
}
