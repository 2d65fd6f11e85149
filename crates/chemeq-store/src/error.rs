//! Error types for chemeq-store.

use std::path::PathBuf;

/// Result type for chemeq-store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in chemeq-store.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Database error from SQLite.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Failed to create database directory.
    #[error("Failed to create database directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Timestamp outside the range the store can represent.
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Retention bound must keep at least one upload.
    #[error("Invalid retention bound {0}: must be at least 1")]
    InvalidRetention(usize),

    /// An upload with this id is already stored.
    #[error("Upload already exists: {0}")]
    DuplicateUpload(String),

    /// Aggregates do not describe the records they were stored with.
    #[error("Upload {id} is inconsistent: summary count {count} but {records} records")]
    InconsistentUpload {
        id: String,
        count: u64,
        records: usize,
    },
}
