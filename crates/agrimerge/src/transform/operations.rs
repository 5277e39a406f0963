//! Transformation operations that can be applied to a table.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A transformation operation to apply to data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum TransformOperation {
    /// Exchange the names of two columns.
    SwapColumns { first: String, second: String },

    /// Rename one column.
    RenameColumn { from: String, to: String },

    /// Replace text values in a column based on a mapping.
    Standardize {
        column: String,
        mapping: IndexMap<String, String>,
    },

    /// Replace numeric values with their magnitude.
    Absolute { column: String },

    /// Trim headers and collapse internal whitespace.
    NormalizeHeaders,
}

impl TransformOperation {
    /// Get a human-readable description of the operation.
    pub fn description(&self) -> String {
        match self {
            TransformOperation::SwapColumns { first, second } => {
                format!("Swap columns '{}' ↔ '{}'", first, second)
            }
            TransformOperation::RenameColumn { from, to } => {
                format!("Rename column '{}' → '{}'", from, to)
            }
            TransformOperation::Standardize { column, mapping } => {
                let examples: Vec<String> = mapping
                    .iter()
                    .take(3)
                    .map(|(from, to)| format!("'{}' → '{}'", from, to))
                    .collect();
                format!("Standardize '{}': {}", column, examples.join(", "))
            }
            TransformOperation::Absolute { column } => {
                format!("Absolute values in '{}'", column)
            }
            TransformOperation::NormalizeHeaders => "Normalize column names".to_string(),
        }
    }

    /// Column the operation targets, if any.
    pub fn column(&self) -> Option<&str> {
        match self {
            TransformOperation::SwapColumns { first, .. } => Some(first.as_str()),
            TransformOperation::RenameColumn { from, .. } => Some(from.as_str()),
            TransformOperation::Standardize { column, .. } => Some(column.as_str()),
            TransformOperation::Absolute { column } => Some(column.as_str()),
            TransformOperation::NormalizeHeaders => None,
        }
    }
}

/// Result of applying transformations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransformResult {
    /// Number of operations applied.
    pub operations_applied: usize,

    /// Number of values modified.
    pub values_changed: usize,

    /// Number of columns renamed.
    pub columns_renamed: usize,

    /// Detailed changes for each operation.
    pub changes: Vec<TransformChange>,
}

/// A single change made during transformation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformChange {
    /// Description of the change.
    pub description: String,

    /// Column affected (empty for table-wide operations).
    pub column: String,

    /// Number of values changed.
    pub values_changed: usize,

    /// Number of column names changed.
    pub columns_renamed: usize,
}

impl TransformResult {
    /// Create an empty result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a change to the result.
    pub fn add_change(&mut self, change: TransformChange) {
        self.operations_applied += 1;
        self.values_changed += change.values_changed;
        self.columns_renamed += change.columns_renamed;
        self.changes.push(change);
    }

    /// Append every change from another result.
    pub fn extend(&mut self, other: TransformResult) {
        for change in other.changes {
            self.add_change(change);
        }
    }
}
