//! Header validation for uploaded datasets.
//!
//! Header names are matched once, at the boundary, and resolved to column
//! indices. Every row lookup after that goes through [`ColumnMap`].
//!
//! # Example
//!
//! ```
//! use chemeq_core::schema::validate_headers;
//! use chemeq_types::Field;
//!
//! let columns = validate_headers([" Equipment Name", "type", "Flowrate", "Pressure", "Temperature"])?;
//! assert_eq!(columns.index(Field::Flowrate), 2);
//! # Ok::<(), chemeq_types::SchemaError>(())
//! ```

use std::collections::BTreeSet;

use chemeq_types::{Field, SchemaError};

const BOM: char = '\u{feff}';

/// Column index of each logical field in a dataset's rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMap {
    name: usize,
    category: usize,
    flowrate: usize,
    pressure: usize,
    temperature: usize,
}

impl ColumnMap {
    /// Column index holding `field`.
    #[must_use]
    pub fn index(&self, field: Field) -> usize {
        match field {
            Field::Name => self.name,
            Field::Category => self.category,
            Field::Flowrate => self.flowrate,
            Field::Pressure => self.pressure,
            Field::Temperature => self.temperature,
        }
    }

    /// Raw cell for `field`, or `""` when the row is too short.
    pub fn cell<'r>(&self, row: &'r csv::StringRecord, field: Field) -> &'r str {
        row.get(self.index(field)).unwrap_or("")
    }
}

/// Normalize a header for matching.
///
/// Drops a leading BOM and any parenthesised unit suffix, removes whitespace,
/// `_` and `-`, then lowercases. `" Flow_Rate (m3/h)"` becomes `"flowrate"`.
pub fn normalize_header(raw: &str) -> String {
    let raw = raw.trim_start_matches(BOM);
    let raw = match raw.find('(') {
        Some(pos) if pos > 0 => &raw[..pos],
        _ => raw,
    };
    raw.chars()
        .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Logical field a normalized header refers to, if any.
pub fn field_for_header(normalized: &str) -> Option<Field> {
    match normalized {
        "equipmentname" | "name" => Some(Field::Name),
        "type" | "equipmenttype" | "category" => Some(Field::Category),
        "flowrate" => Some(Field::Flowrate),
        "pressure" => Some(Field::Pressure),
        "temperature" => Some(Field::Temperature),
        _ => None,
    }
}

/// Resolve each required field to a column, reporting every missing field.
///
/// Extra columns are ignored. When two columns map to the same field, the
/// leftmost one is used.
pub fn validate_headers<I, S>(headers: I) -> Result<ColumnMap, SchemaError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut found: [Option<usize>; 5] = [None; 5];

    for (index, header) in headers.into_iter().enumerate() {
        let Some(field) = field_for_header(&normalize_header(header.as_ref())) else {
            continue;
        };
        let slot = &mut found[slot_of(field)];
        if slot.is_none() {
            *slot = Some(index);
        }
    }

    match found {
        [
            Some(name),
            Some(category),
            Some(flowrate),
            Some(pressure),
            Some(temperature),
        ] => Ok(ColumnMap {
            name,
            category,
            flowrate,
            pressure,
            temperature,
        }),
        _ => {
            let missing_fields: BTreeSet<Field> = Field::ALL
                .into_iter()
                .filter(|f| found[slot_of(*f)].is_none())
                .collect();
            Err(SchemaError { missing_fields })
        }
    }
}

fn slot_of(field: Field) -> usize {
    match field {
        Field::Name => 0,
        Field::Category => 1,
        Field::Flowrate => 2,
        Field::Pressure => 3,
        Field::Temperature => 4,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CANONICAL: [&str; 5] = ["Equipment Name", "Type", "Flowrate", "Pressure", "Temperature"];

    #[test]
    fn test_canonical_headers() {
        let columns = validate_headers(CANONICAL).unwrap();
        for (i, field) in Field::ALL.into_iter().enumerate() {
            assert_eq!(columns.index(field), i);
        }
    }

    #[test]
    fn test_header_spelling_tolerance() {
        let columns = validate_headers([
            " EQUIPMENT NAME ",
            "equipment_type",
            "flow-rate",
            "Pressure (bar)",
            "temperature",
        ])
        .unwrap();
        assert_eq!(columns.index(Field::Name), 0);
        assert_eq!(columns.index(Field::Pressure), 3);

        assert!(validate_headers(["equipment_name", "Type", "Flowrate", "Pressure", "Temperature"]).is_ok());
        assert!(validate_headers(["Name", "Category", "Flowrate", "Pressure", "Temperature"]).is_ok());
    }

    #[test]
    fn test_bom_is_stripped() {
        assert_eq!(normalize_header("\u{feff}Equipment Name"), "equipmentname");
    }

    #[test]
    fn test_missing_pressure_reported_alone() {
        let err = validate_headers(["Equipment Name", "Type", "Flowrate", "Temperature"]).unwrap_err();
        assert_eq!(err.missing_fields, [Field::Pressure].into_iter().collect());
    }

    #[test]
    fn test_every_missing_field_reported() {
        let err = validate_headers(["Type", "Notes"]).unwrap_err();
        assert_eq!(
            err.missing_names(),
            vec!["equipment_name", "flowrate", "pressure", "temperature"]
        );

        let err = validate_headers(Vec::<String>::new()).unwrap_err();
        assert_eq!(err.missing_fields.len(), 5);
    }

    #[test]
    fn test_extra_and_duplicate_columns() {
        let columns = validate_headers([
            "Id",
            "Equipment Name",
            "Type",
            "Flowrate",
            "Pressure",
            "Temperature",
            "Flowrate",
        ])
        .unwrap();
        assert_eq!(columns.index(Field::Name), 1);
        assert_eq!(columns.index(Field::Flowrate), 3);
    }

    #[test]
    fn test_cell_short_row_is_empty() {
        let columns = validate_headers(CANONICAL).unwrap();
        let row = csv::StringRecord::from(vec!["P-1", "Pump"]);
        assert_eq!(columns.cell(&row, Field::Category), "Pump");
        assert_eq!(columns.cell(&row, Field::Temperature), "");
    }
}
