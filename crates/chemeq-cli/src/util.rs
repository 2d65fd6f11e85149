//! Shared helpers for CLI commands.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chemeq_store::Store;

/// Resolve the database path from the flag/env value or the platform default.
pub fn database_path(database: Option<&Path>) -> PathBuf {
    database
        .map(Path::to_path_buf)
        .unwrap_or_else(chemeq_store::default_db_path)
}

/// Open the store at `path`, applying `retention` or the default bound.
pub fn open_store(path: &Path, retention: Option<usize>) -> Result<Store> {
    let store = Store::open(path)
        .with_context(|| format!("Failed to open database {}", path.display()))?;
    store
        .with_retention(retention.unwrap_or(chemeq_types::DEFAULT_RETENTION))
        .context("Invalid --retention value")
}

/// Write output to a file or stdout.
pub fn write_output(output: Option<&PathBuf>, content: &[u8]) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write to {}", path.display()))?;
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(content)?;
            stdout.flush()?;
        }
    }
    Ok(())
}
