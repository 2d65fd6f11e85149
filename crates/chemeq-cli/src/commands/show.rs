//! Show command implementation.

use anyhow::Result;
use chemeq_store::Store;

use super::require_upload;
use crate::cli::OutputFormat;
use crate::format::format_upload_text;
use crate::util::write_output;

pub fn cmd_show(store: &Store, id: &str, format: OutputFormat) -> Result<()> {
    let upload = require_upload(store, id)?;

    let content = match format {
        OutputFormat::Json => serde_json::to_string_pretty(&upload)? + "\n",
        OutputFormat::Text => format_upload_text(&upload),
    };
    write_output(None, content.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_upload() {
        let store = Store::open_in_memory().unwrap();
        let err = cmd_show(&store, "ds_missing", OutputFormat::Text).unwrap_err();
        assert!(err.to_string().contains("Upload not found: ds_missing"));
    }
}
