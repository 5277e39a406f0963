//! Observation types for data quality findings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Kind of finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObservationType {
    /// An expected column is absent.
    MissingColumn,
    /// The table has no rows or no columns.
    EmptyTable,
    /// A column that must be non-negative holds negative values.
    NegativeValue,
    /// A numeric column holds values that cannot be read as numbers.
    NonNumeric,
    /// A numeric column holds nulls where a value is expected.
    MissingValue,
    /// A categorical column holds values outside its vocabulary.
    UnknownCategory,
}

impl ObservationType {
    /// Get a human-readable label for the observation type.
    pub fn label(&self) -> &'static str {
        match self {
            ObservationType::MissingColumn => "Missing Column",
            ObservationType::EmptyTable => "Empty Table",
            ObservationType::NegativeValue => "Negative Value",
            ObservationType::NonNumeric => "Non-Numeric Value",
            ObservationType::MissingValue => "Missing Value",
            ObservationType::UnknownCategory => "Unknown Category",
        }
    }
}

/// Severity level of an observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational only.
    Info,
    /// Should be reviewed.
    Warning,
    /// Fails validation.
    Error,
}

impl Severity {
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Info => "Info",
            Severity::Warning => "Warning",
            Severity::Error => "Error",
        }
    }
}

/// Evidence supporting an observation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Evidence {
    /// Offending value(s).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    /// Number of occurrences.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub occurrences: Option<usize>,
    /// Percentage of affected rows.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percentage: Option<f64>,
    /// Sample row indices.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub sample_rows: Vec<usize>,
    /// Expected value, range or vocabulary.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<Value>,
}

impl Evidence {
    /// Create empty evidence.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(mut self, value: impl Into<Value>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_occurrences(mut self, count: usize) -> Self {
        self.occurrences = Some(count);
        self
    }

    pub fn with_percentage(mut self, pct: f64) -> Self {
        self.percentage = Some(pct);
        self
    }

    /// Keep at most the first five sample rows.
    pub fn with_sample_rows(mut self, rows: impl IntoIterator<Item = usize>) -> Self {
        self.sample_rows = rows.into_iter().take(5).collect();
        self
    }

    pub fn with_expected(mut self, expected: impl Into<Value>) -> Self {
        self.expected = Some(expected.into());
        self
    }
}

/// A data quality finding about one column or the whole table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Observation {
    /// Unique identifier for this observation.
    pub id: String,
    #[serde(rename = "type")]
    pub observation_type: ObservationType,
    pub severity: Severity,
    /// Affected column name (empty for table-level findings).
    pub column: String,
    pub description: String,
    pub evidence: Evidence,
    pub detected_at: DateTime<Utc>,
    /// What detected this issue.
    pub detector: String,
}

impl Observation {
    /// Create a new observation.
    pub fn new(
        observation_type: ObservationType,
        severity: Severity,
        column: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: generate_observation_id(),
            observation_type,
            severity,
            column: column.into(),
            description: description.into(),
            evidence: Evidence::new(),
            detected_at: Utc::now(),
            detector: String::new(),
        }
    }

    pub fn with_evidence(mut self, evidence: Evidence) -> Self {
        self.evidence = evidence;
        self
    }

    pub fn with_detector(mut self, detector: impl Into<String>) -> Self {
        self.detector = detector.into();
        self
    }
}

/// Generate a unique observation ID.
fn generate_observation_id() -> String {
    use std::sync::atomic::{AtomicU64, Ordering};
    static COUNTER: AtomicU64 = AtomicU64::new(1);
    format!("obs_{:03}", COUNTER.fetch_add(1, Ordering::SeqCst))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_observation() {
        let obs = Observation::new(
            ObservationType::NegativeValue,
            Severity::Error,
            "Elevation",
            "2 negative values",
        )
        .with_detector("non_negative_validator");

        assert!(obs.id.starts_with("obs_"));
        assert_eq!(obs.severity, Severity::Error);
        assert_eq!(obs.column, "Elevation");
    }

    #[test]
    fn test_evidence_truncates_samples() {
        let evidence = Evidence::new()
            .with_occurrences(12)
            .with_sample_rows(0..12);

        assert_eq!(evidence.sample_rows, vec![0, 1, 2, 3, 4]);
        assert_eq!(evidence.occurrences, Some(12));
    }

    #[test]
    fn test_observation_serializes_type_tag() {
        let obs = Observation::new(ObservationType::EmptyTable, Severity::Error, "", "no rows");
        let json = serde_json::to_value(&obs).unwrap();
        assert_eq!(json["type"], "empty_table");
        assert_eq!(json["severity"], "error");
        assert!(json["evidence"].get("sample_rows").is_none());
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Info < Severity::Warning);
        assert!(Severity::Warning < Severity::Error);
    }
}
