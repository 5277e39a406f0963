//! Validators for checking pipeline output tables.

use std::collections::BTreeMap;

use indexmap::IndexSet;
use log::{debug, info};
use serde::Serialize;
use serde_json::json;

use crate::input::DataTable;
use crate::schema::Value;

use super::observation::{Evidence, Observation, ObservationType, Severity};

/// Columns every exported field table carries.
pub const FIELD_COLUMNS: [&str; 8] = [
    "Field_ID",
    "Latitude",
    "Longitude",
    "Crop_type",
    "Annual_yield",
    "Soil_type",
    "Elevation",
    "Farm_management_practices",
];

/// Columns every exported weather table carries.
pub const WEATHER_COLUMNS: [&str; 7] = [
    "Field_ID",
    "Weather_station",
    "Message",
    "Rainfall",
    "Temperature",
    "Pollution_level",
    "Measurement",
];

/// Crop names accepted after correction.
pub const CROP_TYPES: [&str; 6] = ["cassava", "wheat", "tea", "maize", "sorghum", "barley"];

/// Trait for validators.
pub trait Validator {
    /// Detector name recorded on each observation.
    fn name(&self) -> &'static str;

    /// Run validation and return observations.
    fn validate(&self, table: &DataTable) -> Vec<Observation>;
}

/// Checks that expected columns are present.
pub struct RequiredColumnsValidator {
    columns: Vec<String>,
}

impl RequiredColumnsValidator {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }
}

impl Validator for RequiredColumnsValidator {
    fn name(&self) -> &'static str {
        "required_columns_validator"
    }

    fn validate(&self, table: &DataTable) -> Vec<Observation> {
        self.columns
            .iter()
            .filter(|column| table.column_index(column).is_none())
            .map(|column| {
                Observation::new(
                    ObservationType::MissingColumn,
                    Severity::Error,
                    column.as_str(),
                    format!("Missing column: {}", column),
                )
                .with_evidence(Evidence::new().with_expected(json!(self.columns)))
                .with_detector(self.name())
            })
            .collect()
    }
}

/// Checks that the table has at least one row and one column.
pub struct NonEmptyValidator;

impl Validator for NonEmptyValidator {
    fn name(&self) -> &'static str {
        "non_empty_validator"
    }

    fn validate(&self, table: &DataTable) -> Vec<Observation> {
        let mut observations = Vec::new();
        if table.column_count() == 0 {
            observations.push(
                Observation::new(ObservationType::EmptyTable, Severity::Error, "", "Table has no columns")
                    .with_detector(self.name()),
            );
        }
        if table.row_count() == 0 {
            observations.push(
                Observation::new(ObservationType::EmptyTable, Severity::Error, "", "Table has no rows")
                    .with_detector(self.name()),
            );
        }
        observations
    }
}

/// Checks that a numeric column holds no negative values.
///
/// Absent columns are left to [`RequiredColumnsValidator`].
pub struct NonNegativeValidator {
    column: String,
    allow_nulls: bool,
}

impl NonNegativeValidator {
    /// Nulls are reported as warnings.
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            allow_nulls: false,
        }
    }

    /// Ignore nulls entirely.
    pub fn ignoring_nulls(mut self) -> Self {
        self.allow_nulls = true;
        self
    }
}

impl Validator for NonNegativeValidator {
    fn name(&self) -> &'static str {
        "non_negative_validator"
    }

    fn validate(&self, table: &DataTable) -> Vec<Observation> {
        let Some(idx) = table.column_index(&self.column) else {
            return Vec::new();
        };

        let mut negative = Vec::new();
        let mut non_numeric = Vec::new();
        let mut nulls = Vec::new();
        for (row, value) in table.column_values(idx).enumerate() {
            match value {
                Value::Null => nulls.push(row),
                other => match other.parse_f64() {
                    Some(v) if v < 0.0 => negative.push(row),
                    Some(_) => {}
                    None => non_numeric.push(row),
                },
            }
        }

        let total = table.row_count();
        let mut observations = Vec::new();
        if !negative.is_empty() {
            observations.push(self.observation(
                ObservationType::NegativeValue,
                Severity::Error,
                format!("{} negative value(s) in {}", negative.len(), self.column),
                negative,
                total,
            ));
        }
        if !non_numeric.is_empty() {
            observations.push(self.observation(
                ObservationType::NonNumeric,
                Severity::Error,
                format!("{} non-numeric value(s) in {}", non_numeric.len(), self.column),
                non_numeric,
                total,
            ));
        }
        if !nulls.is_empty() && !self.allow_nulls {
            observations.push(self.observation(
                ObservationType::MissingValue,
                Severity::Warning,
                format!("{} missing value(s) in {}", nulls.len(), self.column),
                nulls,
                total,
            ));
        }
        observations
    }
}

impl NonNegativeValidator {
    fn observation(
        &self,
        observation_type: ObservationType,
        severity: Severity,
        description: String,
        rows: Vec<usize>,
        total: usize,
    ) -> Observation {
        let count = rows.len();
        Observation::new(observation_type, severity, self.column.as_str(), description)
            .with_evidence(
                Evidence::new()
                    .with_occurrences(count)
                    .with_percentage(percentage(count, total))
                    .with_sample_rows(rows)
                    .with_expected(json!({ "min": 0 })),
            )
            .with_detector(self.name())
    }
}

/// Checks that a categorical column only holds known values.
///
/// Nulls are not checked. Absent columns are left to
/// [`RequiredColumnsValidator`].
pub struct VocabularyValidator {
    column: String,
    allowed: IndexSet<String>,
}

impl VocabularyValidator {
    pub fn new<I, S>(column: impl Into<String>, allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            column: column.into(),
            allowed: allowed.into_iter().map(Into::into).collect(),
        }
    }
}

impl Validator for VocabularyValidator {
    fn name(&self) -> &'static str {
        "vocabulary_validator"
    }

    fn validate(&self, table: &DataTable) -> Vec<Observation> {
        let Some(idx) = table.column_index(&self.column) else {
            return Vec::new();
        };

        let mut unknown: BTreeMap<String, usize> = BTreeMap::new();
        let mut rows = Vec::new();
        for (row, value) in table.column_values(idx).enumerate() {
            if value.is_null() {
                continue;
            }
            let text = value.to_string();
            if !self.allowed.contains(&text) {
                *unknown.entry(text).or_default() += 1;
                rows.push(row);
            }
        }

        if unknown.is_empty() {
            return Vec::new();
        }

        let count = rows.len();
        let names: Vec<&str> = unknown.keys().map(String::as_str).collect();
        vec![
            Observation::new(
                ObservationType::UnknownCategory,
                Severity::Error,
                self.column.as_str(),
                format!("Invalid {} values found: {}", self.column, names.join(", ")),
            )
            .with_evidence(
                Evidence::new()
                    .with_value(json!(unknown))
                    .with_occurrences(count)
                    .with_percentage(percentage(count, table.row_count()))
                    .with_sample_rows(rows)
                    .with_expected(json!(self.allowed)),
            )
            .with_detector(self.name()),
        ]
    }
}

fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        (count as f64 / total as f64) * 100.0
    }
}

/// Outcome of running a set of validators over one table.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    pub observations: Vec<Observation>,
}

impl ValidationReport {
    /// True when no observation has `Error` severity.
    pub fn passed(&self) -> bool {
        !self
            .observations
            .iter()
            .any(|obs| obs.severity == Severity::Error)
    }

    /// Observations with `Error` severity.
    pub fn errors(&self) -> impl Iterator<Item = &Observation> {
        self.observations
            .iter()
            .filter(|obs| obs.severity == Severity::Error)
    }

    /// Number of observations at the given severity.
    pub fn count(&self, severity: Severity) -> usize {
        self.observations
            .iter()
            .filter(|obs| obs.severity == severity)
            .count()
    }
}

/// Runs a list of validators.
#[derive(Default)]
pub struct ValidationEngine {
    validators: Vec<Box<dyn Validator>>,
}

impl ValidationEngine {
    /// Create an engine with no validators.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a validator.
    pub fn with_validator(mut self, validator: impl Validator + 'static) -> Self {
        self.validators.push(Box::new(validator));
        self
    }

    /// Checks for an exported field table.
    pub fn field_defaults() -> Self {
        Self::new()
            .with_validator(NonEmptyValidator)
            .with_validator(RequiredColumnsValidator::new(FIELD_COLUMNS))
            .with_validator(NonNegativeValidator::new("Elevation"))
            .with_validator(VocabularyValidator::new("Crop_type", CROP_TYPES))
    }

    /// Checks for an exported weather table.
    pub fn weather_defaults() -> Self {
        Self::new()
            .with_validator(NonEmptyValidator)
            .with_validator(RequiredColumnsValidator::new(WEATHER_COLUMNS))
            .with_validator(NonNegativeValidator::new("Rainfall").ignoring_nulls())
    }

    /// Run every validator in order.
    pub fn validate(&self, table: &DataTable) -> ValidationReport {
        let mut observations = Vec::new();
        for validator in &self.validators {
            let found = validator.validate(table);
            debug!("{} reported {} observation(s)", validator.name(), found.len());
            observations.extend(found);
        }
        let report = ValidationReport { observations };
        info!(
            "Validation finished: {} error(s), {} warning(s)",
            report.count(Severity::Error),
            report.count(Severity::Warning)
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_table(elevations: Vec<Value>, crops: Vec<&str>) -> DataTable {
        let headers: Vec<String> = FIELD_COLUMNS.iter().map(|c| c.to_string()).collect();
        let rows = elevations
            .into_iter()
            .zip(crops)
            .enumerate()
            .map(|(i, (elevation, crop))| {
                vec![
                    Value::Integer(i as i64),
                    Value::Float(-7.1),
                    Value::Float(-0.4),
                    crop.into(),
                    Value::Float(0.75),
                    "Loamy".into(),
                    elevation,
                    "Organic".into(),
                ]
            })
            .collect();
        DataTable::new(headers, rows).unwrap()
    }

    #[test]
    fn test_clean_field_table_passes() {
        let table = field_table(
            vec![Value::Float(648.0), Value::Integer(12)],
            vec!["cassava", "tea"],
        );
        let report = ValidationEngine::field_defaults().validate(&table);
        assert!(report.passed(), "{:?}", report.observations);
        assert!(report.observations.is_empty());
    }

    #[test]
    fn test_negative_elevation_fails() {
        let table = field_table(
            vec![Value::Float(-648.0), Value::Integer(12)],
            vec!["cassava", "tea"],
        );
        let report = ValidationEngine::field_defaults().validate(&table);
        assert!(!report.passed());
        let obs: Vec<_> = report.errors().collect();
        assert_eq!(obs.len(), 1);
        assert_eq!(obs[0].observation_type, ObservationType::NegativeValue);
        assert_eq!(obs[0].evidence.sample_rows, vec![0]);
    }

    #[test]
    fn test_null_elevation_warns() {
        let table = field_table(vec![Value::Null, Value::Integer(12)], vec!["cassava", "tea"]);
        let report = ValidationEngine::field_defaults().validate(&table);
        assert!(report.passed());
        assert_eq!(report.count(Severity::Warning), 1);
    }

    #[test]
    fn test_unknown_crop_fails() {
        let table = field_table(
            vec![Value::Integer(1), Value::Integer(2), Value::Integer(3)],
            vec!["cassava", "wheatn", "Loamy"],
        );
        let report = ValidationEngine::field_defaults().validate(&table);
        let obs: Vec<_> = report.errors().collect();
        assert_eq!(obs.len(), 1);
        assert_eq!(obs[0].observation_type, ObservationType::UnknownCategory);
        assert_eq!(obs[0].evidence.occurrences, Some(2));
        assert_eq!(obs[0].evidence.value, Some(json!({ "Loamy": 1, "wheatn": 1 })));
    }

    #[test]
    fn test_missing_columns_and_empty_table() {
        let table = DataTable::new(vec!["Field_ID".into(), "Message".into()], vec![]).unwrap();
        let report = ValidationEngine::weather_defaults().validate(&table);
        assert!(!report.passed());

        let missing: Vec<&str> = report
            .observations
            .iter()
            .filter(|o| o.observation_type == ObservationType::MissingColumn)
            .map(|o| o.column.as_str())
            .collect();
        assert_eq!(
            missing,
            ["Weather_station", "Rainfall", "Temperature", "Pollution_level", "Measurement"]
        );
        assert!(report
            .observations
            .iter()
            .any(|o| o.observation_type == ObservationType::EmptyTable));
    }

    #[test]
    fn test_rainfall_ignores_nulls() {
        let table = DataTable::new(
            vec!["Rainfall".into()],
            vec![vec![Value::Null], vec![Value::Float(0.0)], vec![Value::Float(12.5)]],
        )
        .unwrap();
        let observations = NonNegativeValidator::new("Rainfall")
            .ignoring_nulls()
            .validate(&table);
        assert!(observations.is_empty());
    }

    #[test]
    fn test_non_numeric_values_are_errors() {
        let table = DataTable::new(
            vec!["Elevation".into()],
            vec![vec!["high".into()], vec!["12.5".into()]],
        )
        .unwrap();
        let observations = NonNegativeValidator::new("Elevation").validate(&table);
        assert_eq!(observations.len(), 1);
        assert_eq!(observations[0].observation_type, ObservationType::NonNumeric);
    }
}
