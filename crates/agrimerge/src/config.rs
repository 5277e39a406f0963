//! Pipeline configuration records.
//!
//! Configurations are closed records: unknown keys are rejected when
//! deserializing, and required keys are checked by `validate` before any
//! processor is built.

use std::path::{Path, PathBuf};
use std::time::Duration;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{AgrimergeError, Result};
use crate::input::DEFAULT_HTTP_TIMEOUT;

/// Environment variable that overrides `field.db_path`.
pub const DB_PATH_ENV: &str = "AGRIMERGE_DB_PATH";

/// Column names used by the field pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FieldColumns {
    /// Join key shared with the mapping table.
    pub field_id: String,
    /// Categorical column corrected with `values_to_rename`.
    pub correction: String,
    /// Numeric column replaced by its magnitude.
    pub absolute: String,
    /// Canonical station reference name.
    pub station: String,
    /// Names the mapping table may use for the station reference.
    pub station_aliases: Vec<String>,
}

impl Default for FieldColumns {
    fn default() -> Self {
        Self {
            field_id: "Field_ID".to_string(),
            correction: "Crop_type".to_string(),
            absolute: "Elevation".to_string(),
            station: "Weather_station".to_string(),
            station_aliases: vec!["Weather_station_ID".to_string()],
        }
    }
}

/// Configuration for the field dataset transformer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldConfig {
    /// SQLite connection descriptor (`sqlite:///file.db` or a path).
    pub db_path: String,
    /// Query that extracts the field survey.
    pub sql_query: String,
    /// The pair of column names to swap. Exactly one entry.
    pub columns_to_rename: IndexMap<String, String>,
    /// Incorrect → corrected categorical values.
    pub values_to_rename: IndexMap<String, String>,
    /// Location of the field → station mapping table.
    pub weather_mapping_csv_path: String,
    #[serde(default)]
    pub columns: FieldColumns,
    /// Timeout for remote mapping downloads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_timeout_secs: Option<u64>,
}

impl FieldConfig {
    /// Check required keys and the swap pair.
    pub fn validate(&self) -> Result<()> {
        require_non_empty("db_path", &self.db_path)?;
        require_non_empty("sql_query", &self.sql_query)?;
        require_non_empty("weather_mapping_csv_path", &self.weather_mapping_csv_path)?;
        require_non_empty("columns.field_id", &self.columns.field_id)?;
        require_non_empty("columns.correction", &self.columns.correction)?;
        require_non_empty("columns.absolute", &self.columns.absolute)?;
        require_non_empty("columns.station", &self.columns.station)?;
        self.swap_pair().map(|_| ())
    }

    /// The two column names to exchange.
    pub fn swap_pair(&self) -> Result<(&str, &str)> {
        if self.columns_to_rename.len() != 1 {
            return Err(AgrimergeError::invalid_config(
                "columns_to_rename",
                format!(
                    "expected exactly one pair, found {}",
                    self.columns_to_rename.len()
                ),
            ));
        }
        let Some((first, second)) = self.columns_to_rename.first() else {
            return Err(AgrimergeError::invalid_config("columns_to_rename", "is empty"));
        };
        require_non_empty("columns_to_rename", first)?;
        require_non_empty("columns_to_rename", second)?;
        if first == second {
            return Err(AgrimergeError::invalid_config(
                "columns_to_rename",
                format!("cannot swap '{}' with itself", first),
            ));
        }
        Ok((first.as_str(), second.as_str()))
    }

    /// HTTP timeout for the mapping download.
    pub fn http_timeout(&self) -> Duration {
        self.http_timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_HTTP_TIMEOUT)
    }
}

/// Column names used by the weather pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WeatherColumns {
    /// Free-text column holding the readings.
    pub message: String,
    /// Canonical station identifier used as the join key.
    pub station: String,
    /// Names either table may use for the station identifier.
    pub station_aliases: Vec<String>,
}

impl Default for WeatherColumns {
    fn default() -> Self {
        Self {
            message: "Message".to_string(),
            station: "Weather_station".to_string(),
            station_aliases: vec!["Weather_station_ID".to_string()],
        }
    }
}

/// Configuration for the weather dataset transformer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WeatherConfig {
    /// Location of the raw station messages.
    pub weather_csv_path: String,
    /// Location of the field → station mapping table.
    pub weather_mapping_csv_path: String,
    /// Measurement name → pattern with at least one capture group.
    pub regex_patterns: IndexMap<String, String>,
    #[serde(default)]
    pub columns: WeatherColumns,
    /// Timeout for remote downloads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_timeout_secs: Option<u64>,
}

impl WeatherConfig {
    /// Check required keys. Patterns are compiled by the processor.
    pub fn validate(&self) -> Result<()> {
        require_non_empty("weather_csv_path", &self.weather_csv_path)?;
        require_non_empty("weather_mapping_csv_path", &self.weather_mapping_csv_path)?;
        require_non_empty("columns.message", &self.columns.message)?;
        require_non_empty("columns.station", &self.columns.station)?;
        if self.regex_patterns.is_empty() {
            return Err(AgrimergeError::invalid_config(
                "regex_patterns",
                "at least one pattern is required",
            ));
        }
        Ok(())
    }

    /// HTTP timeout for remote downloads.
    pub fn http_timeout(&self) -> Duration {
        self.http_timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_HTTP_TIMEOUT)
    }
}

/// Where and how the CLI exports results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub field_csv: Option<PathBuf>,
    pub weather_csv: Option<PathBuf>,
    /// Export a seeded sample of this many rows instead of the full table.
    pub sample_size: Option<usize>,
    pub seed: u64,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            field_csv: None,
            weather_csv: None,
            sample_size: None,
            seed: 42,
        }
    }
}

/// Top-level configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    pub field: FieldConfig,
    pub weather: WeatherConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl PipelineConfig {
    /// Load a YAML or JSON configuration file, apply environment overrides
    /// and validate it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| AgrimergeError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let mut config = if is_json {
            Self::from_json_str(&contents)?
        } else {
            Self::from_yaml_str(&contents)?
        };

        if let Ok(db_path) = std::env::var(DB_PATH_ENV) {
            config.field.db_path = db_path;
        }
        config.validate()?;
        Ok(config)
    }

    /// Parse a YAML document.
    pub fn from_yaml_str(contents: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(contents)?)
    }

    /// Parse a JSON document.
    pub fn from_json_str(contents: &str) -> Result<Self> {
        Ok(serde_json::from_str(contents)?)
    }

    /// Validate both pipeline sections.
    pub fn validate(&self) -> Result<()> {
        self.field.validate()?;
        self.weather.validate()
    }
}

fn require_non_empty(key: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        Err(AgrimergeError::invalid_config(key, "is missing or empty"))
    } else {
        Ok(())
    }
}
