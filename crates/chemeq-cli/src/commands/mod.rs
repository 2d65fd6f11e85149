//! Command implementations for the CLI.

mod export;
mod history;
mod info;
mod ingest;
mod report;
mod show;

pub use export::cmd_export;
pub use history::cmd_history;
pub use info::cmd_info;
pub use ingest::cmd_ingest;
pub use report::cmd_report;
pub use show::cmd_show;

use anyhow::{Result, anyhow};
use chemeq_store::{Store, UploadStore};
use chemeq_types::Upload;

/// Load an upload or fail with a message naming the id.
fn require_upload(store: &Store, id: &str) -> Result<Upload> {
    store.get(id)?.ok_or_else(|| {
        anyhow!(
            "Upload not found: {}. Run 'chemeq history' to list stored uploads.",
            id
        )
    })
}
