//! CLI argument definitions using clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Output format for listing commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// File format for exports
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl From<ExportFormat> for chemeq_core::ExportFormat {
    fn from(format: ExportFormat) -> Self {
        match format {
            ExportFormat::Csv => chemeq_core::ExportFormat::Csv,
            ExportFormat::Json => chemeq_core::ExportFormat::Json,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "chemeq")]
#[command(author, version, about = "Ingest and analyse chemical equipment datasets", long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Database path (defaults to the platform data directory)
    #[arg(long, global = true, env = "CHEMEQ_DB")]
    pub database: Option<PathBuf>,

    /// Number of uploads to keep; older ones are evicted on ingest
    #[arg(long, global = true)]
    pub retention: Option<usize>,

    /// Maximum number of data rows accepted per dataset
    #[arg(long, global = true)]
    pub max_rows: Option<usize>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Validate a CSV dataset and store it
    Ingest {
        /// CSV file to ingest
        file: PathBuf,

        /// Output format for the stored upload
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// List stored uploads, newest first
    History {
        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show one upload with its statistics
    Show {
        /// Upload identifier
        id: String,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Write a plain-text report for an upload
    Report {
        /// Upload identifier
        id: String,

        /// Write to file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Export an upload's records
    Export {
        /// Upload identifier
        id: String,

        /// Export format
        #[arg(short, long, value_enum)]
        format: ExportFormat,

        /// Write to file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show database location and contents
    Info,
}
