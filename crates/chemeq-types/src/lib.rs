//! Shared data model for chemical equipment datasets.
//!
//! This crate provides the types exchanged between the ingest pipeline
//! (chemeq-core), the retention store (chemeq-store) and the HTTP service.
//!
//! # Features
//!
//! - [`EquipmentRecord`]: one normalized dataset row
//! - [`Aggregates`]: derived summary statistics
//! - [`Upload`]: an ingested dataset with its statistics
//! - [`Field`]: the five logical columns a dataset must provide
//! - Error types for schema and row validation
//!
//! # Example
//!
//! ```
//! use chemeq_types::{EquipmentRecord, Field};
//!
//! let record = EquipmentRecord::new("R-101", "Reactor", 120.5, 4.2, 85.0);
//! assert_eq!(record.category, "Reactor");
//! assert!(Field::Temperature.is_numeric());
//! ```

pub mod error;
pub mod field;
pub mod types;

pub use error::{EmptyDatasetError, RowParseError, SchemaError};
pub use field::Field;
pub use types::{Aggregates, EquipmentRecord, Upload, UploadSummary, new_upload_id};

/// Default number of uploads kept by the retention store.
pub const DEFAULT_RETENTION: usize = 5;
