//! Column type inference for delimited payloads.

use serde::{Deserialize, Serialize};

use super::value::Value;

/// Inferred data type for a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    /// Whole numbers (no decimal point).
    Integer,
    /// Floating-point numbers.
    Float,
    /// Text/string values.
    String,
    /// No non-null values to decide from.
    #[default]
    Unknown,
}

impl ColumnType {
    /// Returns true if this type is numeric.
    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnType::Integer | ColumnType::Float)
    }

    /// Infer a single type from the raw cells of one column.
    ///
    /// Null tokens are skipped. A column is Integer only if every remaining
    /// cell parses as `i64`, Float if every cell parses as `f64`, and String
    /// otherwise.
    pub fn infer<'a>(cells: impl IntoIterator<Item = &'a str>) -> ColumnType {
        let mut inferred = ColumnType::Unknown;

        for cell in cells {
            if is_null_token(cell) {
                continue;
            }
            let trimmed = cell.trim();
            let cell_type = if trimmed.parse::<i64>().is_ok() {
                ColumnType::Integer
            } else if trimmed.parse::<f64>().is_ok() {
                ColumnType::Float
            } else {
                return ColumnType::String;
            };

            inferred = match (inferred, cell_type) {
                (ColumnType::Unknown, t) => t,
                (ColumnType::Integer, ColumnType::Integer) => ColumnType::Integer,
                _ => ColumnType::Float,
            };
        }

        inferred
    }

    /// Convert a raw cell into a value of this type.
    pub fn parse_cell(&self, raw: &str) -> Value {
        if is_null_token(raw) {
            return Value::Null;
        }
        let trimmed = raw.trim();
        match self {
            ColumnType::Integer => trimmed
                .parse::<i64>()
                .map(Value::Integer)
                .unwrap_or_else(|_| Value::Text(raw.to_string())),
            ColumnType::Float => trimmed
                .parse::<f64>()
                .map(Value::Float)
                .unwrap_or_else(|_| Value::Text(raw.to_string())),
            ColumnType::String | ColumnType::Unknown => Value::Text(raw.to_string()),
        }
    }
}

/// Check if a raw cell represents a missing/null value.
pub fn is_null_token(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty()
        || trimmed.eq_ignore_ascii_case("na")
        || trimmed.eq_ignore_ascii_case("n/a")
        || trimmed.eq_ignore_ascii_case("nan")
        || trimmed.eq_ignore_ascii_case("null")
        || trimmed.eq_ignore_ascii_case("none")
        || trimmed.eq_ignore_ascii_case("#n/a")
        || trimmed.eq_ignore_ascii_case("<na>")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_integer_column() {
        assert_eq!(ColumnType::infer(["1", "2", "", "40"]), ColumnType::Integer);
    }

    #[test]
    fn test_infer_float_column_promotes_integers() {
        assert_eq!(ColumnType::infer(["1", "2.5", "NA"]), ColumnType::Float);
    }

    #[test]
    fn test_infer_string_column() {
        assert_eq!(ColumnType::infer(["1", "maize"]), ColumnType::String);
    }

    #[test]
    fn test_infer_all_null() {
        assert_eq!(ColumnType::infer(["", "null"]), ColumnType::Unknown);
    }

    #[test]
    fn test_parse_cell() {
        assert_eq!(ColumnType::Float.parse_cell("3"), Value::Float(3.0));
        assert_eq!(ColumnType::Integer.parse_cell(" 12 "), Value::Integer(12));
        assert_eq!(ColumnType::Integer.parse_cell("N/A"), Value::Null);
        assert_eq!(ColumnType::String.parse_cell("tea"), Value::from("tea"));
    }

    #[test]
    fn test_is_null_token() {
        assert!(is_null_token(""));
        assert!(is_null_token("NA"));
        assert!(is_null_token("NaN"));
        assert!(is_null_token("<NA>"));
        assert!(!is_null_token("0"));
        assert!(!is_null_token("-"));
    }
}
