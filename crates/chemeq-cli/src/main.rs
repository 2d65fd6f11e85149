//! Command-line interface for chemical equipment datasets.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `ingest` | Validate a CSV file and store it |
//! | `history` | List stored uploads, newest first |
//! | `show` | Show one upload with its records |
//! | `report` | Plain-text report for an upload |
//! | `export` | Export an upload as CSV or JSON |
//! | `info` | Database location and contents |

use anyhow::Result;
use chemeq_core::{IngestLimits, Pipeline};
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod format;
mod util;

use cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // When quiet mode is enabled, suppress info-level logging
    let filter = if cli.quiet {
        EnvFilter::new("warn")
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let path = util::database_path(cli.database.as_deref());
    let mut store = util::open_store(&path, cli.retention)?;

    let mut limits = IngestLimits::default();
    if let Some(max_rows) = cli.max_rows {
        anyhow::ensure!(max_rows > 0, "--max-rows must be at least 1");
        limits.max_rows = max_rows;
    }
    let pipeline = Pipeline::new(limits);

    match cli.command {
        Commands::Ingest { file, format } => {
            commands::cmd_ingest(&mut store, &pipeline, &file, format)
        }
        Commands::History { format } => commands::cmd_history(&store, format),
        Commands::Show { id, format } => commands::cmd_show(&store, &id, format),
        Commands::Report { id, output } => commands::cmd_report(&store, &id, output.as_ref()),
        Commands::Export { id, format, output } => {
            commands::cmd_export(&store, &id, format, output.as_ref())
        }
        Commands::Info => commands::cmd_info(&store, &path),
    }
}
