//! Ingest pipeline for chemical equipment datasets.
//!
//! This crate turns an uploaded CSV file into a stored [`Upload`]: header
//! validation, row normalization, summary statistics and persistence through
//! any [`UploadStore`](chemeq_store::UploadStore) backend. It also renders
//! text reports and CSV/JSON exports of stored uploads.
//!
//! # Features
//!
//! - **Tolerant headers**: case, whitespace, `_`/`-` and BOM are ignored
//! - **Row-level errors**: the first bad cell is reported with its row and field
//! - **Validate before write**: failed ingests never touch the store
//! - **Size guards**: configurable row and byte limits
//! - **Reports**: plain-text summaries and canonical CSV/JSON exports
//!
//! # Quick Start
//!
//! ```no_run
//! use chemeq_core::{Pipeline, report};
//! use chemeq_store::Store;
//!
//! let mut store = Store::open_default()?;
//! let bytes = std::fs::read("plant.csv")?;
//! let upload = Pipeline::default().ingest(&mut store, &bytes, "plant.csv")?;
//! println!("{}", report::render_text_report(&upload));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! [`Upload`]: chemeq_types::Upload

pub mod aggregate;
pub mod error;
pub mod normalize;
pub mod pipeline;
pub mod report;
pub mod schema;

pub use error::{ExportError, IngestError, Result, SizeUnit};
pub use pipeline::{IngestLimits, IngestStage, Pipeline, PreparedUpload};
pub use report::ExportFormat;
pub use schema::{ColumnMap, validate_headers};

// Re-export the data model so callers need only one dependency.
pub use chemeq_types as types;
pub use chemeq_types::{Aggregates, EquipmentRecord, Field, Upload, UploadSummary};
