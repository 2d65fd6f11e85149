//! Dataset ingest: validate, normalize, aggregate, then persist.
//!
//! An ingest moves through [`IngestStage`]s in order and stops at the first
//! failure. All checks run before the store is touched, so a rejected dataset
//! never produces a partial upload.
//!
//! [`Pipeline::prepare`] performs the CPU-bound steps without a store, which
//! lets a server parse a file before acquiring the store lock and then call
//! [`Pipeline::commit`].
//!
//! # Example
//!
//! ```
//! use chemeq_core::Pipeline;
//! use chemeq_store::{MemoryStore, UploadStore};
//!
//! let csv = b"Equipment Name,Type,Flowrate,Pressure,Temperature\nP-1,Pump,10,2,30\n";
//! let mut store = MemoryStore::new();
//! let upload = Pipeline::default().ingest(&mut store, csv, "plant.csv")?;
//! assert_eq!(upload.aggregates.count, 1);
//! assert_eq!(store.count()?, 1);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use core::fmt;

use time::OffsetDateTime;
use tracing::{debug, info, warn};

use chemeq_store::UploadStore;
use chemeq_types::{Upload, new_upload_id};

use crate::aggregate;
use crate::error::{IngestError, Result, SizeUnit};
use crate::normalize::{is_blank, normalize_row};
use crate::schema::validate_headers;

/// Default maximum number of data rows per dataset.
pub const DEFAULT_MAX_ROWS: usize = 10_000;

/// Default maximum dataset size in bytes (10 MiB).
pub const DEFAULT_MAX_BYTES: usize = 10 * 1024 * 1024;

/// Size limits applied before a dataset is parsed into records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestLimits {
    pub max_rows: usize,
    pub max_bytes: usize,
}

impl Default for IngestLimits {
    fn default() -> Self {
        Self {
            max_rows: DEFAULT_MAX_ROWS,
            max_bytes: DEFAULT_MAX_BYTES,
        }
    }
}

/// Progress of a single ingest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestStage {
    Received,
    Validated,
    Normalized,
    Aggregated,
    Persisted,
}

impl fmt::Display for IngestStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IngestStage::Received => "received",
            IngestStage::Validated => "validated",
            IngestStage::Normalized => "normalized",
            IngestStage::Aggregated => "aggregated",
            IngestStage::Persisted => "persisted",
        };
        f.write_str(name)
    }
}

/// Stage tracking and logging for one ingest.
struct Run<'a> {
    filename: &'a str,
    stage: IngestStage,
}

impl<'a> Run<'a> {
    fn start(filename: &'a str, bytes: usize) -> Self {
        debug!("Received {} ({} bytes)", filename, bytes);
        Self {
            filename,
            stage: IngestStage::Received,
        }
    }

    fn resume(filename: &'a str, stage: IngestStage) -> Self {
        Self { filename, stage }
    }

    fn advance(&mut self, next: IngestStage) {
        debug!("{}: {} -> {}", self.filename, self.stage, next);
        self.stage = next;
    }

    fn fail(&self, err: IngestError) -> IngestError {
        warn!(
            "Ingest of {} failed after stage {} ({}): {}",
            self.filename,
            self.stage,
            err.kind(),
            err
        );
        err
    }
}

/// A dataset that passed every check and is ready to be stored.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedUpload {
    upload: Upload,
}

impl PreparedUpload {
    /// The upload that will be stored.
    pub fn upload(&self) -> &Upload {
        &self.upload
    }
}

/// Ingest pipeline configured with size limits.
#[derive(Debug, Clone, Copy, Default)]
pub struct Pipeline {
    limits: IngestLimits,
}

impl Pipeline {
    /// Create a pipeline with the given limits.
    pub fn new(limits: IngestLimits) -> Self {
        Self { limits }
    }

    /// Limits applied by this pipeline.
    pub fn limits(&self) -> IngestLimits {
        self.limits
    }

    /// Validate, normalize and aggregate a dataset without storing it.
    pub fn prepare(&self, bytes: &[u8], filename: &str) -> Result<PreparedUpload> {
        self.prepare_at(bytes, filename, OffsetDateTime::now_utc())
    }

    /// Like [`prepare`](Self::prepare) with an explicit upload time.
    pub fn prepare_at(
        &self,
        bytes: &[u8],
        filename: &str,
        now: OffsetDateTime,
    ) -> Result<PreparedUpload> {
        let mut run = Run::start(filename, bytes.len());

        check_format(filename).map_err(|e| run.fail(e))?;
        if bytes.len() > self.limits.max_bytes {
            return Err(run.fail(IngestError::DatasetTooLarge {
                limit: self.limits.max_bytes,
                actual: bytes.len(),
                unit: SizeUnit::Bytes,
            }));
        }

        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(bytes);
        let headers = reader.headers().map_err(|e| run.fail(e.into()))?.clone();
        let columns = validate_headers(headers.iter()).map_err(|e| run.fail(e.into()))?;
        run.advance(IngestStage::Validated);

        // Empty lines never reach us from the reader, so delimiter-only
        // lines are dropped too and row indices count value rows only.
        let mut rows = Vec::new();
        for row in reader.records() {
            let row = row.map_err(|e| run.fail(e.into()))?;
            if !is_blank(&row) {
                rows.push((rows.len() + 1, row));
            }
        }
        if rows.len() > self.limits.max_rows {
            return Err(run.fail(IngestError::DatasetTooLarge {
                limit: self.limits.max_rows,
                actual: rows.len(),
                unit: SizeUnit::Rows,
            }));
        }

        let records = rows
            .iter()
            .map(|(row_index, row)| normalize_row(*row_index, row, &columns))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| run.fail(e.into()))?;
        run.advance(IngestStage::Normalized);

        let aggregates = aggregate::compute(&records).map_err(|e| run.fail(e.into()))?;
        run.advance(IngestStage::Aggregated);

        Ok(PreparedUpload {
            upload: Upload {
                id: new_upload_id(now),
                filename: filename.to_string(),
                created_at: now,
                aggregates,
                records,
            },
        })
    }

    /// Store a prepared upload, evicting old uploads as needed.
    ///
    /// Returns the upload as stored; its `created_at` may have been moved
    /// forward to keep uploads strictly ordered.
    pub fn commit<S>(&self, store: &mut S, prepared: PreparedUpload) -> Result<Upload>
    where
        S: UploadStore + ?Sized,
    {
        let upload = prepared.upload;
        let id = upload.id.clone();
        let filename = upload.filename.clone();
        let mut run = Run::resume(&filename, IngestStage::Aggregated);

        let outcome = store.put(upload).map_err(|e| run.fail(e.into()))?;
        run.advance(IngestStage::Persisted);

        info!(
            "Ingested {} as {} ({} records, {} evicted)",
            filename,
            id,
            outcome.upload.records.len(),
            outcome.evicted_ids.len()
        );
        Ok(outcome.upload)
    }

    /// Prepare and store a dataset in one step.
    pub fn ingest<S>(&self, store: &mut S, bytes: &[u8], filename: &str) -> Result<Upload>
    where
        S: UploadStore + ?Sized,
    {
        let prepared = self.prepare(bytes, filename)?;
        self.commit(store, prepared)
    }
}

/// Reject files that are clearly not CSV.
///
/// A missing extension is accepted; anything other than `.csv` is not.
fn check_format(filename: &str) -> Result<()> {
    let extension = std::path::Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        None | Some("csv") => Ok(()),
        Some(other) => Err(IngestError::UnsupportedFormat(format!(".{other}"))),
    }
}
