//! Weather station transformer.
//!
//! `load_data` reads the raw station messages and the field → station
//! mapping, `clean_weather_data` extracts one numeric column per configured
//! pattern, and `merge_with_mapping` joins the cleaned readings onto the
//! mapping by station identifier.

use log::{error, info};

use crate::config::WeatherConfig;
use crate::error::{AgrimergeError, Result};
use crate::input::{CsvSource, DataTable, SourceMetadata, TabularSource};
use crate::transform::{
    ExtractionSummary, PatternExtractor, TransformEngine, TransformOperation, TransformResult, left_join,
};

use super::stage::PipelineStage;
use super::station_rename;

/// Cleans station telemetry and attaches it to fields.
pub struct WeatherDataProcessor {
    config: WeatherConfig,
    weather_source: Box<dyn TabularSource>,
    mapping_source: Box<dyn TabularSource>,
    extractor: PatternExtractor,
    engine: TransformEngine,
    weather_table: Option<DataTable>,
    mapping_table: Option<DataTable>,
    processed_table: Option<DataTable>,
    stage: PipelineStage,
    history: TransformResult,
    extraction: Vec<ExtractionSummary>,
    sources: Vec<SourceMetadata>,
}

impl WeatherDataProcessor {
    /// Build a processor that reads from the configured locations.
    pub fn new(config: WeatherConfig) -> Result<Self> {
        config.validate()?;
        let timeout = config.http_timeout();
        let weather = CsvSource::new(config.weather_csv_path.clone()).with_timeout(timeout);
        let mapping = CsvSource::new(config.weather_mapping_csv_path.clone()).with_timeout(timeout);
        Self::with_sources(config, Box::new(weather), Box::new(mapping))
    }

    /// Build a processor over caller-supplied sources.
    ///
    /// Patterns are compiled here, so an invalid pattern is reported before
    /// any data is read.
    pub fn with_sources(
        config: WeatherConfig,
        weather_source: Box<dyn TabularSource>,
        mapping_source: Box<dyn TabularSource>,
    ) -> Result<Self> {
        config.validate()?;
        let extractor = PatternExtractor::from_patterns(&config.regex_patterns)?;
        Ok(Self {
            config,
            weather_source,
            mapping_source,
            extractor,
            engine: TransformEngine::new(),
            weather_table: None,
            mapping_table: None,
            processed_table: None,
            stage: PipelineStage::Uninitialized,
            history: TransformResult::new(),
            extraction: Vec::new(),
            sources: Vec::new(),
        })
    }

    /// Load the station messages and the mapping table.
    ///
    /// Both must load; on failure the processor keeps its previous state.
    pub fn load_data(&mut self) -> Result<()> {
        info!("Loading weather data from {}", self.weather_source.describe());
        let (weather, weather_meta) = self.weather_source.fetch()?;
        info!("Loading weather mapping from {}", self.mapping_source.describe());
        let (mapping, mapping_meta) = self.mapping_source.fetch()?;

        self.weather_table = Some(weather);
        self.mapping_table = Some(mapping);
        self.processed_table = None;
        self.history = TransformResult::new();
        self.extraction.clear();
        self.sources = vec![weather_meta, mapping_meta];
        self.stage = PipelineStage::Loaded;
        info!("Weather data and mapping loaded");
        Ok(())
    }

    /// Add one numeric column per configured pattern.
    pub fn clean_weather_data(&mut self) -> Result<&[ExtractionSummary]> {
        self.stage
            .require(PipelineStage::Loaded, "clean_weather_data", "load_data")?;
        let table = self
            .weather_table
            .as_mut()
            .ok_or_else(|| AgrimergeError::ProcessingIncomplete("weather table is missing".to_string()))?;

        info!("Extracting {} measurement(s) from messages", self.extractor.rules().len());
        self.extraction = self
            .extractor
            .extract_into(table, &self.config.columns.message)?;
        self.stage.advance(PipelineStage::Cleaned);
        Ok(&self.extraction)
    }

    /// Left-join the cleaned readings onto the mapping by station.
    pub fn merge_with_mapping(&mut self) -> Result<&DataTable> {
        self.stage.require(
            PipelineStage::Cleaned,
            "merge_with_mapping",
            "clean_weather_data",
        )?;
        info!("Merging weather data with field mapping...");
        self.merge()
            .inspect_err(|e| error!("Error merging weather data with mapping: {}", e))?;
        self.processed()
    }

    fn merge(&mut self) -> Result<()> {
        let missing = || AgrimergeError::ProcessingIncomplete("weather tables are missing".to_string());
        let mut weather = self.weather_table.clone().ok_or_else(missing)?;
        let mut mapping = self.mapping_table.clone().ok_or_else(missing)?;

        let mut result = TransformResult::new();
        for table in [&mut mapping, &mut weather] {
            result.extend(self.canonicalize(table)?);
        }

        let (merged, stats) = left_join(&mapping, &weather, &self.config.columns.station)?;
        info!(
            "Weather data merged: {} rows, {} field(s) without readings",
            stats.output_rows, stats.unmatched_rows
        );

        self.history.extend(result);
        self.weather_table = Some(weather);
        self.mapping_table = Some(mapping);
        self.processed_table = Some(merged);
        self.stage.advance(PipelineStage::Merged);
        Ok(())
    }

    /// Normalize headers and rename station aliases to the canonical name.
    fn canonicalize(&self, table: &mut DataTable) -> Result<TransformResult> {
        let mut result = self
            .engine
            .apply(&[TransformOperation::NormalizeHeaders], table)?;
        let columns = &self.config.columns;
        if let Some(op) = station_rename(table, &columns.station, &columns.station_aliases) {
            result.add_change(self.engine.apply_operation(&op, table)?);
        }
        Ok(result)
    }

    /// Run every step in order and return the merged table.
    pub fn process(&mut self) -> Result<&DataTable> {
        self.load_data()?;
        self.clean_weather_data()?;
        self.merge_with_mapping()?;
        info!("Weather data processing completed");
        self.processed()
    }

    /// Raw, then cleaned, station messages.
    pub fn weather_table(&self) -> Option<&DataTable> {
        self.weather_table.as_ref()
    }

    pub fn mapping_table(&self) -> Option<&DataTable> {
        self.mapping_table.as_ref()
    }

    /// Mapping joined with cleaned readings, once merged.
    pub fn processed_table(&self) -> Option<&DataTable> {
        self.processed_table.as_ref()
    }

    /// Take ownership of the merged table.
    pub fn into_processed_table(self) -> Option<DataTable> {
        self.processed_table
    }

    pub fn stage(&self) -> PipelineStage {
        self.stage
    }

    pub fn history(&self) -> &TransformResult {
        &self.history
    }

    /// Per-pattern counts from the last extraction.
    pub fn extraction(&self) -> &[ExtractionSummary] {
        &self.extraction
    }

    pub fn sources(&self) -> &[SourceMetadata] {
        &self.sources
    }

    pub fn config(&self) -> &WeatherConfig {
        &self.config
    }

    fn processed(&self) -> Result<&DataTable> {
        self.processed_table
            .as_ref()
            .ok_or_else(|| AgrimergeError::ProcessingIncomplete("weather has not been merged".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WeatherColumns;
    use crate::input::MemorySource;
    use crate::schema::Value;
    use indexmap::IndexMap;

    fn config() -> WeatherConfig {
        let mut regex_patterns = IndexMap::new();
        regex_patterns.insert("Rainfall".to_string(), r"(\d+(\.\d+)?)\s?mm".to_string());
        regex_patterns.insert("Temperature".to_string(), r"(\d+(\.\d+)?)\s?C".to_string());
        regex_patterns.insert(
            "Pollution_level".to_string(),
            r"=\s*(-?\d+(\.\d+)?)|Pollution at \s*(-?\d+(\.\d+)?)".to_string(),
        );
        WeatherConfig {
            weather_csv_path: "weather.csv".to_string(),
            weather_mapping_csv_path: "mapping.csv".to_string(),
            regex_patterns,
            columns: WeatherColumns::default(),
            http_timeout_secs: None,
        }
    }

    fn weather() -> DataTable {
        DataTable::new(
            vec!["Weather station ID".into(), " Message ".into()],
            vec![
                vec![Value::Integer(0), "Recorded rainfall of 12.5 mm today".into()],
                vec![Value::Integer(1), "Temperature reached 22.3 C".into()],
                vec![Value::Integer(1), "Pollution at 0.35".into()],
                vec![Value::Integer(0), "Air quality index = 0.12".into()],
            ],
        )
        .unwrap()
    }

    fn mapping() -> DataTable {
        DataTable::new(
            vec!["Field_ID".into(), "Weather_station_ID".into()],
            vec![
                vec![Value::Integer(1), Value::Integer(0)],
                vec![Value::Integer(2), Value::Integer(1)],
                vec![Value::Integer(3), Value::Integer(9)],
            ],
        )
        .unwrap()
    }

    fn processor() -> WeatherDataProcessor {
        WeatherDataProcessor::with_sources(
            config(),
            Box::new(MemorySource::new("weather", weather())),
            Box::new(MemorySource::new("mapping", mapping())),
        )
        .unwrap()
    }

    #[test]
    fn test_process_extracts_and_merges() {
        let mut processor = processor();
        let merged = processor.process().unwrap().clone();

        assert_eq!(
            merged.headers(),
            [
                "Field_ID",
                "Weather_station",
                "Message",
                "Rainfall",
                "Temperature",
                "Pollution_level"
            ]
        );
        // Two readings per matched station, one null row for station 9.
        assert_eq!(merged.row_count(), 5);
        assert_eq!(merged.value(0, "Rainfall"), Some(&Value::Float(12.5)));
        assert_eq!(merged.value(1, "Pollution_level"), Some(&Value::Float(0.12)));
        assert_eq!(merged.value(2, "Temperature"), Some(&Value::Float(22.3)));
        assert_eq!(merged.value(3, "Pollution_level"), Some(&Value::Float(0.35)));
        assert_eq!(merged.value(4, "Message"), Some(&Value::Null));
        assert_eq!(processor.stage(), PipelineStage::Merged);
        assert_eq!(processor.extraction()[0].extracted, 1);
    }

    #[test]
    fn test_clean_requires_load() {
        let mut processor = processor();
        assert!(matches!(
            processor.clean_weather_data(),
            Err(AgrimergeError::NotYetIngested { prerequisite: "load_data", .. })
        ));
    }

    #[test]
    fn test_merge_requires_clean() {
        let mut processor = processor();
        processor.load_data().unwrap();
        assert!(matches!(
            processor.merge_with_mapping(),
            Err(AgrimergeError::NotYetIngested { prerequisite: "clean_weather_data", .. })
        ));
    }

    #[test]
    fn test_missing_message_column() {
        let table = DataTable::new(
            vec!["Weather_station_ID".into(), "Text".into()],
            vec![vec![Value::Integer(0), "12 mm".into()]],
        )
        .unwrap();
        let mut processor = WeatherDataProcessor::with_sources(
            config(),
            Box::new(MemorySource::new("weather", table)),
            Box::new(MemorySource::new("mapping", mapping())),
        )
        .unwrap();
        processor.load_data().unwrap();
        assert!(matches!(
            processor.clean_weather_data(),
            Err(AgrimergeError::MissingMessageColumn { .. })
        ));
        assert_eq!(processor.stage(), PipelineStage::Loaded);
    }

    #[test]
    fn test_existing_measurement_column_is_replaced() {
        let table = DataTable::new(
            vec!["Weather_station_ID".into(), "Message".into(), "Rainfall ".into()],
            vec![
                vec![Value::Integer(0), "Recorded rainfall of 12.5 mm today".into(), "old".into()],
                vec![Value::Integer(1), "sensor offline".into(), "old".into()],
            ],
        )
        .unwrap();
        let mut processor = WeatherDataProcessor::with_sources(
            config(),
            Box::new(MemorySource::new("weather", table)),
            Box::new(MemorySource::new("mapping", mapping())),
        )
        .unwrap();
        processor.load_data().unwrap();
        processor.clean_weather_data().unwrap();

        let cleaned = processor.weather_table().unwrap();
        assert_eq!(
            cleaned.headers(),
            ["Weather_station_ID", "Message", "Rainfall", "Temperature", "Pollution_level"]
        );
        assert_eq!(cleaned.value(0, "Rainfall"), Some(&Value::Float(12.5)));
        assert_eq!(cleaned.value(1, "Rainfall"), Some(&Value::Null));

        let merged = processor.merge_with_mapping().unwrap();
        assert_eq!(merged.row_count(), 3);
    }

    #[test]
    fn test_invalid_pattern_is_reported_at_construction() {
        let mut config = config();
        config
            .regex_patterns
            .insert("Humidity".to_string(), r"(\d+%".to_string());
        let result = WeatherDataProcessor::with_sources(
            config,
            Box::new(MemorySource::new("weather", weather())),
            Box::new(MemorySource::new("mapping", mapping())),
        );
        assert!(matches!(result, Err(AgrimergeError::InvalidPattern { rule, .. }) if rule == "Humidity"));
    }

    #[test]
    fn test_failed_load_keeps_previous_state() {
        let mut processor = WeatherDataProcessor::with_sources(
            config(),
            Box::new(MemorySource::new("weather", weather())),
            Box::new(CsvSource::new("/definitely/not/here.csv")),
        )
        .unwrap();
        assert!(processor.load_data().is_err());
        assert_eq!(processor.stage(), PipelineStage::Uninitialized);
        assert!(processor.weather_table().is_none());
    }
}
