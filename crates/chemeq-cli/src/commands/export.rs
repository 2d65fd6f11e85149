//! Export command implementation.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chemeq_core::report;
use chemeq_store::Store;
use tracing::info;

use super::require_upload;
use crate::cli::ExportFormat;
use crate::util::write_output;

pub fn cmd_export(
    store: &Store,
    id: &str,
    format: ExportFormat,
    output: Option<&PathBuf>,
) -> Result<()> {
    let upload = require_upload(store, id)?;
    let content = report::export(&upload, format.into())
        .with_context(|| format!("Failed to export {}", upload.id))?;
    write_output(output, &content)?;

    if let Some(path) = output {
        info!(
            "Exported {} records from {} to {}",
            upload.records.len(),
            upload.id,
            path.display()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chemeq_core::Pipeline;

    #[test]
    fn test_export_csv_to_file() {
        let mut store = Store::open_in_memory().unwrap();
        let upload = Pipeline::default()
            .ingest(
                &mut store,
                b"name,category,flowrate,pressure,temperature\nV-1,Valve,5,1,20\n",
                "valves.csv",
            )
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("valves_export.csv");
        cmd_export(&store, &upload.id, ExportFormat::Csv, Some(&path)).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            written,
            "Equipment Name,Type,Flowrate,Pressure,Temperature\nV-1,Valve,5,1,20\n"
        );
    }
}
