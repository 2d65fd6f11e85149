//! Ingest command implementation.

use std::path::Path;

use anyhow::{Context, Result};
use chemeq_core::{IngestError, Pipeline};
use chemeq_store::Store;
use tracing::info;

use crate::cli::OutputFormat;
use crate::format::format_upload_text;
use crate::util::write_output;

pub fn cmd_ingest(
    store: &mut Store,
    pipeline: &Pipeline,
    file: &Path,
    format: OutputFormat,
) -> Result<()> {
    let bytes =
        std::fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;
    let filename = file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.display().to_string());

    let upload = pipeline
        .ingest(store, &bytes, &filename)
        .map_err(|e| describe(e, file))?;
    info!("Stored {} as {}", filename, upload.id);

    let content = match format {
        OutputFormat::Json => serde_json::to_string_pretty(&upload)? + "\n",
        OutputFormat::Text => format_upload_text(&upload),
    };
    write_output(None, content.as_bytes())
}

/// Attach the file name and a hint to validation failures.
fn describe(err: IngestError, file: &Path) -> anyhow::Error {
    let hint = match &err {
        IngestError::Schema(_) => Some(
            "expected columns: Equipment Name, Type, Flowrate, Pressure, Temperature",
        ),
        IngestError::UnsupportedFormat(_) => Some("save the sheet as CSV and retry"),
        _ => None,
    };
    let context = match hint {
        Some(hint) => format!("Failed to ingest {} ({})", file.display(), hint),
        None => format!("Failed to ingest {}", file.display()),
    };
    anyhow::Error::new(err).context(context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chemeq_store::UploadStore;

    #[test]
    fn test_ingest_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("plant.csv");
        std::fs::write(
            &file,
            "Equipment Name,Type,Flowrate,Pressure,Temperature\nP-1,Pump,10,2,30\n",
        )
        .unwrap();

        let mut store = Store::open_in_memory().unwrap();
        cmd_ingest(&mut store, &Pipeline::default(), &file, OutputFormat::Json).unwrap();

        let latest = store.latest().unwrap().unwrap();
        assert_eq!(latest.filename, "plant.csv");
        assert_eq!(latest.records.len(), 1);
    }

    #[test]
    fn test_schema_failure_mentions_columns() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("plant.csv");
        std::fs::write(&file, "Name,Type\nP-1,Pump\n").unwrap();

        let mut store = Store::open_in_memory().unwrap();
        let err = cmd_ingest(&mut store, &Pipeline::default(), &file, OutputFormat::Text)
            .unwrap_err();
        let message = format!("{:#}", err);
        assert!(message.contains("expected columns"));
        assert!(message.contains("Missing columns: flowrate, pressure, temperature"));
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_missing_file() {
        let mut store = Store::open_in_memory().unwrap();
        let err = cmd_ingest(
            &mut store,
            &Pipeline::default(),
            Path::new("/nonexistent/plant.csv"),
            OutputFormat::Text,
        )
        .unwrap_err();
        assert!(err.to_string().contains("Failed to read"));
    }
}
