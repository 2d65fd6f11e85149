//! Error types for dataset validation in chemeq-types.

use std::collections::BTreeSet;

use thiserror::Error;

use crate::field::Field;

/// The dataset header is missing one or more required fields.
///
/// Every missing field is reported, not just the first one found.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Missing columns: {}", format_fields(.missing_fields))]
pub struct SchemaError {
    /// Fields that no header column matched.
    pub missing_fields: BTreeSet<Field>,
}

impl SchemaError {
    /// Names of the missing fields, in canonical order.
    pub fn missing_names(&self) -> Vec<&'static str> {
        self.missing_fields.iter().map(|f| f.as_str()).collect()
    }
}

/// A data row contains a value that cannot be normalized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Row {row_index}: invalid value '{raw_value}' for field '{field}'")]
pub struct RowParseError {
    /// 1-based index of the data row (the header row is not counted).
    pub row_index: usize,
    /// Field whose value was rejected.
    pub field: Field,
    /// The raw cell text as it appeared in the dataset.
    pub raw_value: String,
}

/// The dataset contains a header but no data rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Dataset contains no equipment rows")]
pub struct EmptyDatasetError;

fn format_fields(fields: &BTreeSet<Field>) -> String {
    fields
        .iter()
        .map(|f| f.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
