//! Logical fields of an equipment dataset.

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One of the five logical columns every dataset must provide.
///
/// Variants are ordered the way the columns conventionally appear in a CSV
/// file (`Equipment Name, Type, Flowrate, Pressure, Temperature`), which is
/// also the order used when reporting missing fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Field {
    /// Equipment name.
    #[cfg_attr(feature = "serde", serde(rename = "equipment_name"))]
    Name,
    /// Equipment type (category).
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    Category,
    /// Flowrate in m³/h.
    #[cfg_attr(feature = "serde", serde(rename = "flowrate"))]
    Flowrate,
    /// Pressure in bar.
    #[cfg_attr(feature = "serde", serde(rename = "pressure"))]
    Pressure,
    /// Temperature in °C.
    #[cfg_attr(feature = "serde", serde(rename = "temperature"))]
    Temperature,
}

impl Field {
    /// All fields in canonical column order.
    pub const ALL: [Field; 5] = [
        Field::Name,
        Field::Category,
        Field::Flowrate,
        Field::Pressure,
        Field::Temperature,
    ];

    /// Machine-readable field name, as used in JSON payloads and errors.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Name => "equipment_name",
            Field::Category => "type",
            Field::Flowrate => "flowrate",
            Field::Pressure => "pressure",
            Field::Temperature => "temperature",
        }
    }

    /// Column header written by exports.
    #[must_use]
    pub fn header(&self) -> &'static str {
        match self {
            Field::Name => "Equipment Name",
            Field::Category => "Type",
            Field::Flowrate => "Flowrate",
            Field::Pressure => "Pressure",
            Field::Temperature => "Temperature",
        }
    }

    /// Whether values of this field must parse as a number.
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        matches!(self, Field::Flowrate | Field::Pressure | Field::Temperature)
    }

    /// Display unit for numeric fields.
    #[must_use]
    pub fn unit(&self) -> Option<&'static str> {
        match self {
            Field::Flowrate => Some("m³/h"),
            Field::Pressure => Some("bar"),
            Field::Temperature => Some("°C"),
            Field::Name | Field::Category => None,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_order() {
        let mut shuffled = vec![Field::Temperature, Field::Name, Field::Pressure];
        shuffled.sort();
        assert_eq!(
            shuffled,
            vec![Field::Name, Field::Pressure, Field::Temperature]
        );
    }

    #[test]
    fn test_numeric_fields() {
        let numeric: Vec<_> = Field::ALL.iter().filter(|f| f.is_numeric()).collect();
        assert_eq!(numeric.len(), 3);
        assert!(!Field::Name.is_numeric());
        assert_eq!(Field::Pressure.unit(), Some("bar"));
        assert_eq!(Field::Category.unit(), None);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde_names_match_as_str() {
        for field in Field::ALL {
            let json = serde_json::to_string(&field).unwrap();
            assert_eq!(json, format!("\"{}\"", field.as_str()));
        }
    }
}
