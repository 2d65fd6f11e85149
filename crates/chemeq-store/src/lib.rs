//! Bounded upload retention for chemical equipment datasets.
//!
//! This crate persists ingested uploads (records plus derived statistics)
//! and keeps only the most recent ones, evicting oldest-first.
//!
//! # Features
//!
//! - [`UploadStore`] contract shared by every backend
//! - SQLite backend ([`Store`]) with transactional insert-and-evict
//! - In-memory backend ([`MemoryStore`]) for tests and embedding
//! - Pure eviction policy ([`retention::evict`]) testable without a database
//! - Paginated record queries ([`RecordQuery`])
//!
//! # Example
//!
//! ```no_run
//! use chemeq_store::{Store, UploadStore};
//!
//! let store = Store::open_default()?;
//! for upload in store.list_summaries(5)? {
//!     println!("{} {}", upload.id, upload.filename);
//! }
//! # Ok::<(), chemeq_store::Error>(())
//! ```

mod error;
mod memory;
mod queries;
pub mod retention;
mod schema;
mod store;

pub use error::{Error, Result};
pub use memory::MemoryStore;
pub use queries::RecordQuery;
pub use retention::{PutOutcome, UploadStore, evict};
pub use store::Store;

/// Default database path following platform conventions.
///
/// - Linux: `~/.local/share/chemeq/data.db`
/// - macOS: `~/Library/Application Support/chemeq/data.db`
/// - Windows: `C:\Users\<user>\AppData\Local\chemeq\data.db`
pub fn default_db_path() -> std::path::PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join("chemeq")
        .join("data.db")
}
