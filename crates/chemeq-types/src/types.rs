//! Core types for equipment datasets.

use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::macros::format_description;

/// A single piece of equipment from an uploaded dataset.
///
/// Records are produced by normalization and are never modified afterwards;
/// each one belongs to exactly one [`Upload`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EquipmentRecord {
    /// Equipment name.
    #[cfg_attr(feature = "serde", serde(rename = "equipment_name"))]
    pub name: String,
    /// Equipment type, e.g. `Reactor` or `Pump`.
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub category: String,
    /// Flowrate in m³/h.
    pub flowrate: f64,
    /// Pressure in bar.
    pub pressure: f64,
    /// Temperature in °C.
    pub temperature: f64,
}

impl EquipmentRecord {
    /// Create a new record.
    pub fn new(
        name: impl Into<String>,
        category: impl Into<String>,
        flowrate: f64,
        pressure: f64,
        temperature: f64,
    ) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            flowrate,
            pressure,
            temperature,
        }
    }
}

/// Summary statistics derived from an upload's records.
///
/// Averages are stored at full precision. Use [`Aggregates::rounded`] to get
/// a display copy.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Aggregates {
    /// Number of records.
    pub count: u64,
    /// Mean flowrate.
    pub avg_flowrate: f64,
    /// Mean pressure.
    pub avg_pressure: f64,
    /// Mean temperature.
    pub avg_temperature: f64,
    /// Number of records per equipment type.
    pub category_counts: BTreeMap<String, u64>,
}

impl Aggregates {
    /// Return a copy with averages rounded to `places` decimal places.
    ///
    /// ```
    /// use chemeq_types::Aggregates;
    ///
    /// let agg = Aggregates { count: 3, avg_flowrate: 86.666_666, ..Default::default() };
    /// assert_eq!(agg.rounded(2).avg_flowrate, 86.67);
    /// ```
    #[must_use]
    pub fn rounded(&self, places: u32) -> Self {
        Self {
            count: self.count,
            avg_flowrate: round_to(self.avg_flowrate, places),
            avg_pressure: round_to(self.avg_pressure, places),
            avg_temperature: round_to(self.avg_temperature, places),
            category_counts: self.category_counts.clone(),
        }
    }
}

fn round_to(value: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    (value * factor).round() / factor
}

/// One ingested dataset together with its derived statistics.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Upload {
    /// Opaque unique identifier, see [`new_upload_id`].
    pub id: String,
    /// Original file name supplied by the client.
    pub filename: String,
    /// When the upload was stored.
    #[cfg_attr(feature = "serde", serde(with = "time::serde::rfc3339"))]
    pub created_at: OffsetDateTime,
    /// Statistics computed from `records` at ingest time.
    #[cfg_attr(feature = "serde", serde(rename = "summary"))]
    pub aggregates: Aggregates,
    /// Records in dataset row order.
    pub records: Vec<EquipmentRecord>,
}

impl Upload {
    /// Whether the stored aggregates agree with the records they describe.
    pub fn is_consistent(&self) -> bool {
        self.aggregates.count == self.records.len() as u64
    }

    /// Metadata and statistics without the record rows.
    pub fn summary(&self) -> UploadSummary {
        UploadSummary {
            id: self.id.clone(),
            filename: self.filename.clone(),
            created_at: self.created_at,
            aggregates: self.aggregates.clone(),
        }
    }
}

/// Upload metadata and statistics without record rows.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UploadSummary {
    /// Upload identifier.
    pub id: String,
    /// Original file name.
    pub filename: String,
    /// When the upload was stored.
    #[cfg_attr(feature = "serde", serde(with = "time::serde::rfc3339"))]
    pub created_at: OffsetDateTime,
    /// Statistics for the upload.
    #[cfg_attr(feature = "serde", serde(rename = "summary"))]
    pub aggregates: Aggregates,
}

/// Generate an upload identifier of the form `ds_YYYYmmdd_HHMMSS_xxxxxxxx`.
///
/// The suffix is taken from a random v4 UUID so two uploads created in the
/// same second still get distinct ids.
pub fn new_upload_id(now: OffsetDateTime) -> String {
    let stamp = now
        .format(format_description!("[year][month][day]_[hour][minute][second]"))
        .unwrap_or_else(|_| now.unix_timestamp().to_string());
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("ds_{}_{}", stamp, &suffix[..8])
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn sample_upload() -> Upload {
        let records = vec![
            EquipmentRecord::new("A", "Reactor", 100.0, 50.0, 80.0),
            EquipmentRecord::new("B", "Pump", 50.0, 10.0, 25.0),
        ];
        Upload {
            id: "ds_test".to_string(),
            filename: "plant.csv".to_string(),
            created_at: datetime!(2025-01-15 10:30:00 UTC),
            aggregates: Aggregates {
                count: 2,
                avg_flowrate: 75.0,
                avg_pressure: 30.0,
                avg_temperature: 52.5,
                category_counts: [("Pump".to_string(), 1), ("Reactor".to_string(), 1)]
                    .into_iter()
                    .collect(),
            },
            records,
        }
    }

    #[test]
    fn test_rounded_keeps_count_and_categories() {
        let agg = Aggregates {
            count: 3,
            avg_flowrate: 38.333_333,
            avg_pressure: 63.335,
            avg_temperature: -1.004,
            category_counts: [("Pump".to_string(), 3)].into_iter().collect(),
        };
        let rounded = agg.rounded(2);
        assert_eq!(rounded.count, 3);
        assert_eq!(rounded.avg_flowrate, 38.33);
        assert_eq!(rounded.avg_temperature, -1.0);
        assert_eq!(rounded.category_counts, agg.category_counts);
    }

    #[test]
    fn test_upload_consistency() {
        let mut upload = sample_upload();
        assert!(upload.is_consistent());

        upload.records.pop();
        assert!(!upload.is_consistent());
    }

    #[test]
    fn test_summary_drops_records() {
        let upload = sample_upload();
        let summary = upload.summary();
        assert_eq!(summary.id, upload.id);
        assert_eq!(summary.aggregates, upload.aggregates);
    }

    #[test]
    fn test_new_upload_id_format() {
        let id = new_upload_id(datetime!(2025-01-15 10:30:05 UTC));
        assert!(id.starts_with("ds_20250115_103005_"));
        assert_eq!(id.len(), "ds_20250115_103005_".len() + 8);

        let other = new_upload_id(datetime!(2025-01-15 10:30:05 UTC));
        assert_ne!(id, other);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_upload_json_shape() {
        let json = serde_json::to_value(sample_upload()).unwrap();
        assert_eq!(json["id"], "ds_test");
        assert_eq!(json["created_at"], "2025-01-15T10:30:00Z");
        assert_eq!(json["summary"]["count"], 2);
        assert_eq!(json["summary"]["category_counts"]["Reactor"], 1);
        assert_eq!(json["records"][0]["equipment_name"], "A");
        assert_eq!(json["records"][1]["type"], "Pump");
    }
}
