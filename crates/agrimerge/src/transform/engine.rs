//! Engine that applies transformation operations to a table in place.

use log::debug;

use crate::error::{AgrimergeError, Result};
use crate::input::DataTable;
use crate::schema::{Value, is_null_token, normalize_column_name};

use super::operations::{TransformChange, TransformOperation, TransformResult};

/// Base name for the placeholder used while swapping two columns.
pub const TEMP_SWAP_NAME: &str = "__temp_swap__";

/// Engine for applying transformations to data.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransformEngine;

impl TransformEngine {
    /// Create a new transform engine.
    pub fn new() -> Self {
        Self
    }

    /// Apply a sequence of operations, stopping at the first failure.
    pub fn apply(&self, operations: &[TransformOperation], data: &mut DataTable) -> Result<TransformResult> {
        let mut result = TransformResult::new();
        for op in operations {
            let change = self.apply_operation(op, data)?;
            result.add_change(change);
        }
        Ok(result)
    }

    /// Apply a single transformation operation.
    pub fn apply_operation(&self, op: &TransformOperation, data: &mut DataTable) -> Result<TransformChange> {
        debug!("{}", op.description());
        let (values_changed, columns_renamed) = match op {
            TransformOperation::SwapColumns { first, second } => {
                (0, self.swap_columns(data, first, second)?)
            }
            TransformOperation::RenameColumn { from, to } => {
                data.rename_column(from, to.clone())?;
                (0, 1)
            }
            TransformOperation::Standardize { column, mapping } => {
                let changed = data.try_map_column(column, |_, value| {
                    Ok(match value.as_text().and_then(|text| mapping.get(text)) {
                        Some(corrected) => Value::Text(corrected.clone()),
                        None => value.clone(),
                    })
                })?;
                (changed, 0)
            }
            TransformOperation::Absolute { column } => {
                let changed = data.try_map_column(column, |row, value| absolute(column, row, value))?;
                (changed, 0)
            }
            TransformOperation::NormalizeHeaders => {
                let changed = data
                    .headers()
                    .iter()
                    .filter(|h| normalize_column_name(h) != **h)
                    .count();
                data.rename_headers(normalize_column_name)?;
                (0, changed)
            }
        };

        Ok(TransformChange {
            description: op.description(),
            column: op.column().unwrap_or_default().to_string(),
            values_changed,
            columns_renamed,
        })
    }

    /// Exchange two column names through a temporary placeholder:
    /// first → temp, second → first, temp → second.
    fn swap_columns(&self, data: &mut DataTable, first: &str, second: &str) -> Result<usize> {
        let first_idx = data.require_column(first)?;
        let second_idx = data.require_column(second)?;
        if first_idx == second_idx {
            debug!("'{}' and '{}' are the same column, nothing to swap", first, second);
            return Ok(0);
        }

        let first_name = data.headers()[first_idx].clone();
        let second_name = data.headers()[second_idx].clone();
        let temp = temporary_name(data);

        data.rename_at(first_idx, temp)?;
        data.rename_at(second_idx, first_name)?;
        data.rename_at(first_idx, second_name)?;
        Ok(2)
    }
}

/// A placeholder name no existing column uses.
fn temporary_name(data: &DataTable) -> String {
    let mut temp = TEMP_SWAP_NAME.to_string();
    while data.column_index(&temp).is_some() {
        temp.push('_');
    }
    temp
}

fn absolute(column: &str, row: usize, value: &Value) -> Result<Value> {
    Ok(match value {
        Value::Null => Value::Null,
        Value::Integer(i) => i
            .checked_abs()
            .map(Value::Integer)
            .unwrap_or_else(|| Value::Float((*i as f64).abs())),
        Value::Float(f) => Value::Float(f.abs()),
        Value::Text(text) if is_null_token(text) => Value::Null,
        Value::Text(text) => match value.parse_f64() {
            Some(f) => Value::Float(f.abs()),
            None => {
                return Err(AgrimergeError::NonNumericValue {
                    column: column.to_string(),
                    row,
                    value: text.clone(),
                });
            }
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;

    fn field_table() -> DataTable {
        DataTable::new(
            vec![
                "Field_ID".into(),
                "Crop_type".into(),
                "Soil_type".into(),
                "Elevation".into(),
            ],
            vec![
                vec![Value::Integer(1), "Loamy".into(), "cassava".into(), Value::Float(-648.0)],
                vec![Value::Integer(2), "Sandy".into(), "wheatn".into(), Value::Integer(-3)],
                vec![Value::Integer(3), "Rocky".into(), "teaa".into(), Value::Null],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_swap_columns_exchanges_values() {
        let engine = TransformEngine::new();
        let mut table = field_table();
        let op = TransformOperation::SwapColumns {
            first: "Crop_type".into(),
            second: "Soil_type".into(),
        };
        let change = engine.apply_operation(&op, &mut table).unwrap();

        assert_eq!(change.columns_renamed, 2);
        assert_eq!(table.column_count(), 4);
        assert_eq!(table.value(0, "Crop_type"), Some(&Value::from("cassava")));
        assert_eq!(table.value(0, "Soil_type"), Some(&Value::from("Loamy")));
    }

    #[test]
    fn test_swap_twice_restores_table() {
        let engine = TransformEngine::new();
        let original = field_table();
        let mut table = original.clone();
        let op = TransformOperation::SwapColumns {
            first: "Crop_type".into(),
            second: "Soil_type".into(),
        };
        engine.apply(&[op.clone(), op], &mut table).unwrap();
        assert_eq!(table, original);
    }

    #[test]
    fn test_swap_avoids_existing_temp_column() {
        let engine = TransformEngine::new();
        let mut table = DataTable::new(
            vec!["a".into(), "b".into(), TEMP_SWAP_NAME.into()],
            vec![vec!["A".into(), "B".into(), "T".into()]],
        )
        .unwrap();
        let op = TransformOperation::SwapColumns {
            first: "a".into(),
            second: "b".into(),
        };
        engine.apply_operation(&op, &mut table).unwrap();
        assert_eq!(table.value(0, "a"), Some(&Value::from("B")));
        assert_eq!(table.value(0, TEMP_SWAP_NAME), Some(&Value::from("T")));
    }

    #[test]
    fn test_swap_missing_column_fails() {
        let engine = TransformEngine::new();
        let mut table = field_table();
        let op = TransformOperation::SwapColumns {
            first: "Crop_type".into(),
            second: "Rainfall".into(),
        };
        let result = engine.apply_operation(&op, &mut table);
        assert!(matches!(result, Err(AgrimergeError::MissingColumn { column }) if column == "Rainfall"));
        assert_eq!(table, field_table());
    }

    #[test]
    fn test_standardize_passes_unknown_values() {
        let engine = TransformEngine::new();
        let mut table = field_table();
        let mut mapping = IndexMap::new();
        mapping.insert("wheatn".to_string(), "wheat".to_string());
        mapping.insert("teaa".to_string(), "tea".to_string());
        let op = TransformOperation::Standardize {
            column: "Soil_type".into(),
            mapping,
        };
        let change = engine.apply_operation(&op, &mut table).unwrap();

        assert_eq!(change.values_changed, 2);
        let values: Vec<String> = table
            .column_by_name("Soil_type")
            .unwrap()
            .into_iter()
            .map(|v| v.to_string())
            .collect();
        assert_eq!(values, ["cassava", "wheat", "tea"]);
    }

    #[test]
    fn test_absolute_values() {
        let engine = TransformEngine::new();
        let mut table = field_table();
        let op = TransformOperation::Absolute {
            column: "Elevation".into(),
        };
        engine.apply_operation(&op, &mut table).unwrap();

        assert_eq!(table.value(0, "Elevation"), Some(&Value::Float(648.0)));
        assert_eq!(table.value(1, "Elevation"), Some(&Value::Integer(3)));
        assert_eq!(table.value(2, "Elevation"), Some(&Value::Null));
    }

    #[test]
    fn test_absolute_rejects_text() {
        let engine = TransformEngine::new();
        let mut table = DataTable::new(
            vec!["Elevation".into()],
            vec![vec!["-4.5".into()], vec!["high".into()]],
        )
        .unwrap();
        let op = TransformOperation::Absolute {
            column: "Elevation".into(),
        };
        let result = engine.apply_operation(&op, &mut table);
        assert!(matches!(result, Err(AgrimergeError::NonNumericValue { row: 1, .. })));
        assert_eq!(table.value(0, "Elevation"), Some(&Value::from("-4.5")));
    }

    #[test]
    fn test_absolute_integer_min() {
        let value = absolute("Elevation", 0, &Value::Integer(i64::MIN)).unwrap();
        assert!(matches!(value, Value::Float(f) if f > 0.0));
    }

    #[test]
    fn test_normalize_headers() {
        let engine = TransformEngine::new();
        let mut table = DataTable::new(
            vec![" Weather station ID".into(), "Message".into()],
            vec![],
        )
        .unwrap();
        let change = engine
            .apply_operation(&TransformOperation::NormalizeHeaders, &mut table)
            .unwrap();
        assert_eq!(change.columns_renamed, 1);
        assert_eq!(table.headers(), ["Weather_station_ID", "Message"]);
    }
}
