//! Error types for the agrimerge library.

use std::path::PathBuf;
use thiserror::Error;

/// Boxed cause carried by ingestion-boundary errors.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Main error type for agrimerge operations.
#[derive(Debug, Error)]
pub enum AgrimergeError {
    /// The backing store or remote resource could not be reached.
    #[error("Source unavailable '{location}': {source}")]
    SourceUnavailable {
        location: String,
        #[source]
        source: BoxError,
    },

    /// The payload could not be parsed into rows and columns.
    #[error("Malformed source '{location}': {source}")]
    MalformedSource {
        location: String,
        #[source]
        source: BoxError,
    },

    /// The relational store rejected the query.
    #[error("Invalid query '{query}': {source}")]
    InvalidQuery {
        query: String,
        #[source]
        source: rusqlite::Error,
    },

    /// A pipeline step ran before its prerequisite step completed.
    #[error("Cannot run {step}: run {prerequisite} first")]
    NotYetIngested {
        step: &'static str,
        prerequisite: &'static str,
    },

    /// The pipeline finished its sequence without producing a table.
    #[error("Processing incomplete: {0}")]
    ProcessingIncomplete(String),

    /// The weather table has no free-text message column.
    #[error("Weather data does not contain a '{column}' column")]
    MissingMessageColumn { column: String },

    /// A column required by a transform is absent.
    #[error("Column '{column}' not found")]
    MissingColumn { column: String },

    /// Two columns would share a name.
    #[error("Duplicate column '{0}'")]
    DuplicateColumn(String),

    /// A row does not have one value per column.
    #[error("Row {row} has {found} values, expected {expected}")]
    RowWidth {
        row: usize,
        expected: usize,
        found: usize,
    },

    /// A numeric transform met a value that is not a number.
    #[error("Non-numeric value '{value}' in column '{column}' at row {row}")]
    NonNumericValue {
        column: String,
        row: usize,
        value: String,
    },

    /// A configuration key is missing or invalid.
    #[error("Invalid configuration '{key}': {reason}")]
    InvalidConfig { key: String, reason: String },

    /// A pattern rule failed to compile.
    #[error("Invalid pattern for '{rule}': {source}")]
    InvalidPattern {
        rule: String,
        #[source]
        source: regex::Error,
    },

    /// Error reading or writing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error from the CSV library.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML deserialization error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl AgrimergeError {
    pub(crate) fn unavailable(location: impl Into<String>, source: impl Into<BoxError>) -> Self {
        AgrimergeError::SourceUnavailable {
            location: location.into(),
            source: source.into(),
        }
    }

    pub(crate) fn malformed(location: impl Into<String>, source: impl Into<BoxError>) -> Self {
        AgrimergeError::MalformedSource {
            location: location.into(),
            source: source.into(),
        }
    }

    pub(crate) fn missing_column(column: impl Into<String>) -> Self {
        AgrimergeError::MissingColumn {
            column: column.into(),
        }
    }

    pub(crate) fn invalid_config(key: impl Into<String>, reason: impl Into<String>) -> Self {
        AgrimergeError::InvalidConfig {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for agrimerge operations.
pub type Result<T> = std::result::Result<T, AgrimergeError>;
