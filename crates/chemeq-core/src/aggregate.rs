//! Summary statistics over normalized records.

use std::collections::BTreeMap;

use chemeq_types::{Aggregates, EmptyDatasetError, EquipmentRecord};

/// Compute count, per-field means and the type histogram.
///
/// Means are kept at full precision; use [`Aggregates::rounded`] for display.
///
/// ```
/// use chemeq_core::aggregate::compute;
/// use chemeq_types::EquipmentRecord;
///
/// let records = vec![
///     EquipmentRecord::new("R-1", "Reactor", 100.0, 5.0, 80.0),
///     EquipmentRecord::new("P-1", "Pump", 50.0, 10.0, 25.0),
/// ];
/// let agg = compute(&records).unwrap();
/// assert_eq!(agg.count, 2);
/// assert_eq!(agg.avg_flowrate, 75.0);
/// ```
pub fn compute(records: &[EquipmentRecord]) -> Result<Aggregates, EmptyDatasetError> {
    if records.is_empty() {
        return Err(EmptyDatasetError);
    }

    let mut flowrate = 0.0;
    let mut pressure = 0.0;
    let mut temperature = 0.0;
    let mut category_counts: BTreeMap<String, u64> = BTreeMap::new();

    for record in records {
        flowrate += record.flowrate;
        pressure += record.pressure;
        temperature += record.temperature;
        *category_counts.entry(record.category.clone()).or_default() += 1;
    }

    let n = records.len() as f64;
    Ok(Aggregates {
        count: records.len() as u64,
        avg_flowrate: flowrate / n,
        avg_pressure: pressure / n,
        avg_temperature: temperature / n,
        category_counts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_three_row_dataset() {
        let records = vec![
            EquipmentRecord::new("R-1", "Reactor", 100.0, 50.0, 80.0),
            EquipmentRecord::new("P-1", "Pump", 60.0, 20.0, 30.0),
            EquipmentRecord::new("R-2", "Reactor", 100.0, 45.0, 80.0),
        ];
        let agg = compute(&records).unwrap();
        assert_eq!(agg.count, 3);

        let display = agg.rounded(2);
        assert_eq!(display.avg_flowrate, 86.67);
        assert_eq!(display.avg_pressure, 38.33);
        assert_eq!(display.avg_temperature, 63.33);
        assert_eq!(agg.category_counts.get("Reactor"), Some(&2));
        assert_eq!(agg.category_counts.get("Pump"), Some(&1));
    }

    #[test]
    fn test_empty_rejected() {
        assert_eq!(compute(&[]), Err(EmptyDatasetError));
    }

    #[test]
    fn test_categories_are_case_sensitive() {
        let records = vec![
            EquipmentRecord::new("a", "Pump", 1.0, 1.0, 1.0),
            EquipmentRecord::new("b", "pump", 1.0, 1.0, 1.0),
        ];
        assert_eq!(compute(&records).unwrap().category_counts.len(), 2);
    }
}
