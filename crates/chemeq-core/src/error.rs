//! Error types for chemeq-core.

use core::fmt;

use chemeq_types::{EmptyDatasetError, RowParseError, SchemaError};

/// Result type for ingest operations.
pub type Result<T> = std::result::Result<T, IngestError>;

/// Unit of an ingest size limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeUnit {
    Bytes,
    Rows,
}

impl fmt::Display for SizeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SizeUnit::Bytes => write!(f, "bytes"),
            SizeUnit::Rows => write!(f, "rows"),
        }
    }
}

/// Errors that can occur while ingesting a dataset.
///
/// Every variant except [`IngestError::Store`] is raised before anything is
/// written, so a failed ingest leaves the store untouched.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// Required columns are missing from the header.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// A data row holds a value that cannot be normalized.
    #[error(transparent)]
    RowParse(#[from] RowParseError),

    /// The dataset has a header but no rows.
    #[error(transparent)]
    EmptyDataset(#[from] EmptyDatasetError),

    /// The dataset exceeds a configured size limit.
    #[error("Dataset too large: {actual} {unit} exceeds the limit of {limit}")]
    DatasetTooLarge {
        limit: usize,
        actual: usize,
        unit: SizeUnit,
    },

    /// The file is not a CSV dataset.
    #[error("Unsupported file format: {0} (expected a .csv file)")]
    UnsupportedFormat(String),

    /// The file is not readable CSV (bad quoting, invalid UTF-8).
    #[error("Malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    /// Persisting the upload failed.
    #[error("Storage error: {0}")]
    Store(#[from] chemeq_store::Error),
}

/// Errors that can occur while exporting an upload.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// The requested format is not supported.
    #[error("Unknown export format: {0} (expected csv or json)")]
    UnknownFormat(String),

    /// CSV encoding failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON encoding failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Writing the output failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl IngestError {
    /// Stable snake_case identifier for API payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            IngestError::Schema(_) => "schema",
            IngestError::RowParse(_) => "row_parse",
            IngestError::EmptyDataset(_) => "empty_dataset",
            IngestError::DatasetTooLarge { .. } => "dataset_too_large",
            IngestError::UnsupportedFormat(_) => "unsupported_format",
            IngestError::Csv(_) => "malformed_csv",
            IngestError::Store(_) => "store",
        }
    }

    /// Whether the error was caused by the submitted data rather than the server.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, IngestError::Store(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chemeq_types::Field;

    #[test]
    fn test_kinds() {
        let err: IngestError = EmptyDatasetError.into();
        assert_eq!(err.kind(), "empty_dataset");
        assert!(err.is_client_error());

        let err: IngestError = chemeq_store::Error::InvalidRetention(0).into();
        assert_eq!(err.kind(), "store");
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_transparent_messages() {
        let err: IngestError = SchemaError {
            missing_fields: [Field::Pressure].into_iter().collect(),
        }
        .into();
        assert_eq!(err.to_string(), "Missing columns: pressure");
    }

    #[test]
    fn test_too_large_display() {
        let err = IngestError::DatasetTooLarge {
            limit: 10,
            actual: 12,
            unit: SizeUnit::Rows,
        };
        assert_eq!(err.to_string(), "Dataset too large: 12 rows exceeds the limit of 10");
    }
}
