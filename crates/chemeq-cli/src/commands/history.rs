//! History command implementation.

use anyhow::Result;
use chemeq_store::{Store, UploadStore};

use crate::cli::OutputFormat;
use crate::format::format_history_text;
use crate::util::write_output;

pub fn cmd_history(store: &Store, format: OutputFormat) -> Result<()> {
    let uploads = store.list_summaries(store.retention())?;

    let content = match format {
        OutputFormat::Json => serde_json::to_string_pretty(&uploads)? + "\n",
        OutputFormat::Text => format_history_text(&uploads),
    };
    write_output(None, content.as_bytes())
}
