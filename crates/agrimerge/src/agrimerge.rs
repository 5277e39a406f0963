//! Runs both pipelines from one configuration and exports the results.

use std::path::{Path, PathBuf};

use log::info;
use serde::Serialize;

use crate::config::{OutputConfig, PipelineConfig};
use crate::error::{AgrimergeError, Result};
use crate::input::{DataTable, SourceMetadata};
use crate::output;
use crate::pipeline::{FieldDataProcessor, WeatherDataProcessor};
use crate::transform::ExtractionSummary;
use crate::validation::{ValidationEngine, ValidationReport};

/// Tables and reports produced by one run.
#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    /// Field survey with station references.
    pub field: DataTable,
    /// Mapping joined with cleaned station readings.
    pub weather: DataTable,
    pub field_report: ValidationReport,
    pub weather_report: ValidationReport,
    pub summary: RunSummary,
}

/// Counts describing one run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub field_rows: usize,
    pub field_columns: usize,
    pub weather_rows: usize,
    pub weather_columns: usize,
    /// Field rows whose station reference is null.
    pub fields_without_station: usize,
    pub extraction: Vec<ExtractionSummary>,
    pub operations_applied: usize,
    pub sources: Vec<SourceMetadata>,
}

impl RunResult {
    /// True when both tables pass their default checks.
    pub fn passed(&self) -> bool {
        self.field_report.passed() && self.weather_report.passed()
    }
}

/// Entry point that wires configuration, processors, validation and export.
#[derive(Debug, Clone)]
pub struct Agrimerge {
    config: PipelineConfig,
}

impl Agrimerge {
    /// Create a runner from a validated configuration.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Load the configuration file at `path`.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::new(PipelineConfig::load(path)?)
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the field pipeline only.
    pub fn run_field(&self) -> Result<FieldDataProcessor> {
        let mut processor = FieldDataProcessor::new(self.config.field.clone())?;
        processor.process()?;
        Ok(processor)
    }

    /// Run the weather pipeline only.
    pub fn run_weather(&self) -> Result<WeatherDataProcessor> {
        let mut processor = WeatherDataProcessor::new(self.config.weather.clone())?;
        processor.process()?;
        Ok(processor)
    }

    /// Run both pipelines and validate their outputs.
    pub fn run(&self) -> Result<RunResult> {
        let field = self.run_field()?;
        let weather = self.run_weather()?;

        let mut sources = field.sources().to_vec();
        sources.extend_from_slice(weather.sources());
        let extraction = weather.extraction().to_vec();
        let operations_applied =
            field.history().operations_applied + weather.history().operations_applied;

        let station = field.config().columns.station.clone();
        let field = field
            .into_table()
            .ok_or_else(|| AgrimergeError::ProcessingIncomplete("field table is missing".to_string()))?;
        let weather = weather.into_processed_table().ok_or_else(|| {
            AgrimergeError::ProcessingIncomplete("weather table is missing".to_string())
        })?;

        let fields_without_station = field
            .column_by_name(&station)
            .map(|values| values.iter().filter(|v| v.is_null()).count())
            .unwrap_or(field.row_count());

        let summary = RunSummary {
            field_rows: field.row_count(),
            field_columns: field.column_count(),
            weather_rows: weather.row_count(),
            weather_columns: weather.column_count(),
            fields_without_station,
            extraction,
            operations_applied,
            sources,
        };
        info!(
            "Run complete: {} field rows, {} weather rows",
            summary.field_rows, summary.weather_rows
        );

        Ok(RunResult {
            field_report: ValidationEngine::field_defaults().validate(&field),
            weather_report: ValidationEngine::weather_defaults().validate(&weather),
            field,
            weather,
            summary,
        })
    }

    /// Write the tables to the configured output paths.
    ///
    /// Returns the paths written. Tables without a configured path are
    /// skipped.
    pub fn export(&self, result: &RunResult, config: &OutputConfig) -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();
        if let Some(path) = &config.field_csv {
            output::export(&result.field, path, config)?;
            written.push(path.clone());
        }
        if let Some(path) = &config.weather_csv {
            output::export(&result.weather, path, config)?;
            written.push(path.clone());
        }
        Ok(written)
    }
}
