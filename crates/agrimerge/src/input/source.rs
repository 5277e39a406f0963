//! In-memory tables and source metadata.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AgrimergeError, Result};
use crate::schema::{Value, column_key, is_null_token};

/// Metadata about a fetched source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceMetadata {
    /// Location descriptor (URL, path, or connection).
    pub location: String,
    /// SHA-256 hash of the raw payload (empty for query results).
    pub hash: String,
    /// Payload size in bytes.
    pub size_bytes: u64,
    /// Detected format (csv, tsv, sqlite, etc.).
    pub format: String,
    /// Number of data rows (excluding header).
    pub row_count: usize,
    /// Number of columns.
    pub column_count: usize,
    /// When the fetch completed.
    pub loaded_at: DateTime<Utc>,
}

impl SourceMetadata {
    /// Create metadata for a source that has been fetched.
    pub fn new(
        location: impl Into<String>,
        hash: String,
        size_bytes: u64,
        format: impl Into<String>,
        table: &DataTable,
    ) -> Self {
        Self {
            location: location.into(),
            hash,
            size_bytes,
            format: format.into(),
            row_count: table.row_count(),
            column_count: table.column_count(),
            loaded_at: Utc::now(),
        }
    }
}

/// Represents parsed tabular data.
///
/// Column names are unique and every row holds exactly one value per column.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct DataTable {
    headers: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl DataTable {
    /// Create a new data table.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self> {
        check_unique(&headers)?;
        for (idx, row) in rows.iter().enumerate() {
            if row.len() != headers.len() {
                return Err(AgrimergeError::RowWidth {
                    row: idx,
                    expected: headers.len(),
                    found: row.len(),
                });
            }
        }
        Ok(Self { headers, rows })
    }

    /// Column headers.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Row data (row-major order).
    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    /// Get the number of columns.
    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    /// Get the number of rows (excluding header).
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Exact position of a column.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Position of a column, falling back to a case- and
    /// whitespace-insensitive match when there is no exact one.
    ///
    /// The fallback only resolves if exactly one header matches.
    pub fn resolve_column(&self, name: &str) -> Option<usize> {
        if let Some(idx) = self.column_index(name) {
            return Some(idx);
        }
        let key = column_key(name);
        let mut matches = self
            .headers
            .iter()
            .enumerate()
            .filter(|(_, h)| column_key(h) == key)
            .map(|(idx, _)| idx);
        match (matches.next(), matches.next()) {
            (Some(idx), None) => Some(idx),
            _ => None,
        }
    }

    /// Like [`resolve_column`](Self::resolve_column) but fails when absent.
    pub fn require_column(&self, name: &str) -> Result<usize> {
        self.resolve_column(name)
            .ok_or_else(|| AgrimergeError::missing_column(name))
    }

    /// Check whether a column resolves.
    pub fn has_column(&self, name: &str) -> bool {
        self.resolve_column(name).is_some()
    }

    /// Get all values for a column by index.
    pub fn column_values(&self, index: usize) -> impl Iterator<Item = &Value> {
        self.rows.iter().map(move |row| row.get(index).unwrap_or(&Value::Null))
    }

    /// Get a column by name.
    pub fn column_by_name(&self, name: &str) -> Option<Vec<&Value>> {
        let index = self.resolve_column(name)?;
        Some(self.column_values(index).collect())
    }

    /// Get a specific cell value.
    pub fn get(&self, row: usize, col: usize) -> Option<&Value> {
        self.rows.get(row).and_then(|r| r.get(col))
    }

    /// Get a cell by row position and column name.
    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        let col = self.resolve_column(column)?;
        self.get(row, col)
    }

    /// Rename the column at `index`.
    pub fn rename_at(&mut self, index: usize, to: impl Into<String>) -> Result<()> {
        let to = to.into();
        if self
            .headers
            .iter()
            .enumerate()
            .any(|(idx, h)| idx != index && *h == to)
        {
            return Err(AgrimergeError::DuplicateColumn(to));
        }
        match self.headers.get_mut(index) {
            Some(header) => {
                *header = to;
                Ok(())
            }
            None => Err(AgrimergeError::missing_column(format!("#{}", index))),
        }
    }

    /// Rename a column.
    pub fn rename_column(&mut self, from: &str, to: impl Into<String>) -> Result<()> {
        let index = self.require_column(from)?;
        self.rename_at(index, to)
    }

    /// Replace every header with `f(header)`.
    ///
    /// Fails without modifying the table if two headers would collide.
    pub fn rename_headers(&mut self, f: impl Fn(&str) -> String) -> Result<()> {
        let renamed: Vec<String> = self.headers.iter().map(|h| f(h)).collect();
        check_unique(&renamed)?;
        self.headers = renamed;
        Ok(())
    }

    /// Set a column's values, replacing it in place if it exists or
    /// appending it otherwise.
    ///
    /// An existing column is found with the lenient lookup and takes `name`
    /// as its header.
    pub fn set_column(&mut self, name: impl Into<String>, values: Vec<Value>) -> Result<()> {
        let name = name.into();
        if values.len() != self.rows.len() {
            return Err(AgrimergeError::RowWidth {
                row: values.len().min(self.rows.len()),
                expected: self.rows.len(),
                found: values.len(),
            });
        }

        match self.resolve_column(&name) {
            Some(idx) => {
                self.headers[idx] = name;
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row[idx] = value;
                }
            }
            None => {
                self.headers.push(name);
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row.push(value);
                }
            }
        }
        Ok(())
    }

    /// Replace each value of a column with `f(row, value)`.
    ///
    /// Returns the number of values that changed. If `f` fails on any row
    /// the column is left untouched.
    pub fn try_map_column<F>(&mut self, name: &str, mut f: F) -> Result<usize>
    where
        F: FnMut(usize, &Value) -> Result<Value>,
    {
        let index = self.require_column(name)?;
        let updated: Vec<Value> = self
            .rows
            .iter()
            .enumerate()
            .map(|(row_idx, row)| f(row_idx, &row[index]))
            .collect::<Result<_>>()?;

        let mut changed = 0;
        for (row, value) in self.rows.iter_mut().zip(updated) {
            if row[index] != value {
                row[index] = value;
                changed += 1;
            }
        }
        Ok(changed)
    }

    /// Randomly choose up to `n` rows with a fixed seed.
    ///
    /// Selected rows keep their original relative order.
    pub fn sample(&self, n: usize, seed: u64) -> DataTable {
        if n >= self.rows.len() {
            return self.clone();
        }
        let mut rng = fastrand::Rng::with_seed(seed);
        let mut indices: Vec<usize> = (0..self.rows.len()).collect();
        rng.shuffle(&mut indices);
        indices.truncate(n);
        indices.sort_unstable();

        DataTable {
            headers: self.headers.clone(),
            rows: indices.into_iter().map(|i| self.rows[i].clone()).collect(),
        }
    }

    /// Check if a raw cell represents a missing/null value.
    pub fn is_null_value(value: &str) -> bool {
        is_null_token(value)
    }
}

fn check_unique(headers: &[String]) -> Result<()> {
    let mut seen = HashSet::with_capacity(headers.len());
    for header in headers {
        if !seen.insert(header.as_str()) {
            return Err(AgrimergeError::DuplicateColumn(header.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> DataTable {
        DataTable::new(
            vec!["Field_ID".into(), " Crop type".into(), "Elevation".into()],
            vec![
                vec![Value::Integer(1), "tea".into(), Value::Float(-12.0)],
                vec![Value::Integer(2), "maize".into(), Value::Null],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_new_rejects_duplicate_headers() {
        let result = DataTable::new(vec!["a".into(), "a".into()], vec![]);
        assert!(matches!(result, Err(AgrimergeError::DuplicateColumn(name)) if name == "a"));
    }

    #[test]
    fn test_new_rejects_ragged_rows() {
        let result = DataTable::new(vec!["a".into()], vec![vec![Value::Null, Value::Null]]);
        assert!(matches!(result, Err(AgrimergeError::RowWidth { row: 0, .. })));
    }

    #[test]
    fn test_resolve_column_falls_back_to_normalized_name() {
        let table = table();
        assert_eq!(table.column_index("Crop_type"), None);
        assert_eq!(table.resolve_column("crop_TYPE"), Some(1));
        assert_eq!(table.resolve_column("Soil_type"), None);
    }

    #[test]
    fn test_resolve_column_ambiguous_fallback() {
        let table = DataTable::new(vec!["Crop type".into(), "crop_type ".into()], vec![]).unwrap();
        assert_eq!(table.resolve_column("CROP_TYPE"), None);
    }

    #[test]
    fn test_rename_column_rejects_collision() {
        let mut table = table();
        let result = table.rename_column("Elevation", "Field_ID");
        assert!(matches!(result, Err(AgrimergeError::DuplicateColumn(_))));
        table.rename_column("Elevation", "Altitude").unwrap();
        assert_eq!(table.headers()[2], "Altitude");
    }

    #[test]
    fn test_rename_headers_is_atomic() {
        let mut table = DataTable::new(vec!["a ".into(), "a".into()], vec![]).unwrap();
        let result = table.rename_headers(|h| h.trim().to_string());
        assert!(result.is_err());
        assert_eq!(table.headers(), ["a ", "a"]);
    }

    #[test]
    fn test_set_column_appends_then_replaces() {
        let mut table = table();
        table
            .set_column("Rainfall", vec![Value::Float(1.0), Value::Null])
            .unwrap();
        assert_eq!(table.column_count(), 4);
        table
            .set_column("Rainfall", vec![Value::Float(2.0), Value::Float(3.0)])
            .unwrap();
        assert_eq!(table.column_count(), 4);
        assert_eq!(table.value(1, "Rainfall"), Some(&Value::Float(3.0)));
    }

    #[test]
    fn test_set_column_replaces_whitespace_variant() {
        let mut table = DataTable::new(
            vec!["Weather_station".into(), "Rainfall ".into()],
            vec![vec![Value::Integer(0), "12".into()]],
        )
        .unwrap();
        table.set_column("Rainfall", vec![Value::Float(12.0)]).unwrap();
        assert_eq!(table.headers(), ["Weather_station", "Rainfall"]);
        assert_eq!(table.value(0, "Rainfall"), Some(&Value::Float(12.0)));
    }

    #[test]
    fn test_try_map_column_counts_changes() {
        let mut table = table();
        let changed = table
            .try_map_column("Elevation", |_, v| {
                Ok(v.as_f64().map(|f| Value::Float(f.abs())).unwrap_or(Value::Null))
            })
            .unwrap();
        assert_eq!(changed, 1);
        assert_eq!(table.value(0, "Elevation"), Some(&Value::Float(12.0)));
    }

    #[test]
    fn test_sample_is_seeded_and_ordered() {
        let rows = (0..50).map(|i| vec![Value::Integer(i)]).collect();
        let table = DataTable::new(vec!["id".into()], rows).unwrap();

        let a = table.sample(10, 42);
        let b = table.sample(10, 42);
        assert_eq!(a, b);
        assert_eq!(a.row_count(), 10);

        let ids: Vec<i64> = a
            .column_values(0)
            .filter_map(|v| match v {
                Value::Integer(i) => Some(*i),
                _ => None,
            })
            .collect();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
    }
}
