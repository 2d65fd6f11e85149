//! Report command implementation.

use std::path::PathBuf;

use anyhow::Result;
use chemeq_core::report::render_text_report;
use chemeq_store::Store;
use tracing::info;

use super::require_upload;
use crate::util::write_output;

pub fn cmd_report(store: &Store, id: &str, output: Option<&PathBuf>) -> Result<()> {
    let upload = require_upload(store, id)?;
    let report = render_text_report(&upload);
    write_output(output, report.as_bytes())?;

    if let Some(path) = output {
        info!("Report for {} written to {}", upload.id, path.display());
    }
    Ok(())
}
