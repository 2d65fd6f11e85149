//! Conversion of raw CSV rows into typed equipment records.

use chemeq_types::{EquipmentRecord, Field, RowParseError};

use crate::schema::ColumnMap;

/// Normalize one data row.
///
/// `row_index` is 1-based and excludes the header. Text fields are trimmed
/// and must be non-empty; numeric fields must parse as finite numbers.
pub fn normalize_row(
    row_index: usize,
    row: &csv::StringRecord,
    columns: &ColumnMap,
) -> Result<EquipmentRecord, RowParseError> {
    Ok(EquipmentRecord {
        name: text(row_index, row, columns, Field::Name)?,
        category: text(row_index, row, columns, Field::Category)?,
        flowrate: number(row_index, row, columns, Field::Flowrate)?,
        pressure: number(row_index, row, columns, Field::Pressure)?,
        temperature: number(row_index, row, columns, Field::Temperature)?,
    })
}

/// Whether every cell in the row is blank.
pub(crate) fn is_blank(row: &csv::StringRecord) -> bool {
    row.iter().all(|cell| cell.trim().is_empty())
}

fn text(
    row_index: usize,
    row: &csv::StringRecord,
    columns: &ColumnMap,
    field: Field,
) -> Result<String, RowParseError> {
    let raw = columns.cell(row, field);
    let value = raw.trim();
    if value.is_empty() {
        return Err(reject(row_index, field, raw));
    }
    Ok(value.to_string())
}

fn number(
    row_index: usize,
    row: &csv::StringRecord,
    columns: &ColumnMap,
    field: Field,
) -> Result<f64, RowParseError> {
    let raw = columns.cell(row, field);
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(reject(row_index, field, raw)),
    }
}

fn reject(row_index: usize, field: Field, raw: &str) -> RowParseError {
    RowParseError {
        row_index,
        field,
        raw_value: raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::validate_headers;

    fn columns() -> ColumnMap {
        validate_headers(["Equipment Name", "Type", "Flowrate", "Pressure", "Temperature"]).unwrap()
    }

    fn row(cells: &[&str]) -> csv::StringRecord {
        csv::StringRecord::from(cells.to_vec())
    }

    #[test]
    fn test_valid_row() {
        let record = normalize_row(1, &row(&[" R-1 ", "Reactor", "100", " 5.5 ", "-12"]), &columns()).unwrap();
        assert_eq!(record, EquipmentRecord::new("R-1", "Reactor", 100.0, 5.5, -12.0));
    }

    #[test]
    fn test_columns_in_any_order() {
        let columns =
            validate_headers(["Temperature", "Pressure", "Flowrate", "Type", "Equipment Name"]).unwrap();
        let record = normalize_row(1, &row(&["80", "4", "120", "Pump", "P-7"]), &columns).unwrap();
        assert_eq!(record, EquipmentRecord::new("P-7", "Pump", 120.0, 4.0, 80.0));
    }

    #[test]
    fn test_non_numeric_value() {
        let err = normalize_row(3, &row(&["R-1", "Reactor", "100", "5", "hot"]), &columns()).unwrap_err();
        assert_eq!(err.row_index, 3);
        assert_eq!(err.field, Field::Temperature);
        assert_eq!(err.raw_value, "hot");
    }

    #[test]
    fn test_non_finite_rejected() {
        for raw in ["NaN", "inf", "-infinity", "1e999"] {
            let err = normalize_row(1, &row(&["R-1", "Reactor", raw, "5", "60"]), &columns()).unwrap_err();
            assert_eq!(err.field, Field::Flowrate, "{raw} should be rejected");
        }
    }

    #[test]
    fn test_empty_values_rejected() {
        let err = normalize_row(2, &row(&["R-1", "Reactor", "100", "", "60"]), &columns()).unwrap_err();
        assert_eq!(err.field, Field::Pressure);
        assert_eq!(err.raw_value, "");

        let err = normalize_row(2, &row(&["  ", "Reactor", "100", "5", "60"]), &columns()).unwrap_err();
        assert_eq!(err.field, Field::Name);
    }

    #[test]
    fn test_short_row() {
        let err = normalize_row(4, &row(&["R-1", "Reactor", "100"]), &columns()).unwrap_err();
        assert_eq!(err.row_index, 4);
        assert_eq!(err.field, Field::Pressure);
    }

    #[test]
    fn test_is_blank() {
        assert!(is_blank(&row(&["", " ", ""])));
        assert!(!is_blank(&row(&["", "x"])));
    }
}
