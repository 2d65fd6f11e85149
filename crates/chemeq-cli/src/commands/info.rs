//! Info command implementation.

use std::path::Path;

use anyhow::Result;
use chemeq_store::{Store, UploadStore};

pub fn cmd_info(store: &Store, path: &Path) -> Result<()> {
    let uploads = store.count()?;
    let records = store.count_records()?;

    println!("Database:  {}", path.display());
    if let Ok(meta) = std::fs::metadata(path) {
        println!("Size:      {} KiB", meta.len().div_ceil(1024));
    }
    println!("Uploads:   {} (keeping at most {})", uploads, store.retention());
    println!("Records:   {}", records);

    if let Some(latest) = store.list_summaries(1)?.first() {
        println!("Latest:    {} ({})", latest.id, latest.filename);
    }
    Ok(())
}
