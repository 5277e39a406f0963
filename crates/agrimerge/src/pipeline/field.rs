//! Field survey transformer.
//!
//! Steps run in order: `ingest_sql_data`, `rename_columns`,
//! `apply_corrections`, `weather_station_mapping`. Each step works on the
//! processor's own table; a failed step leaves the previous table in place.

use log::{error, info, warn};

use crate::config::FieldConfig;
use crate::error::{AgrimergeError, Result};
use crate::input::{CsvSource, DataTable, SourceMetadata, SqlQuerySource, TabularSource};
use crate::transform::{TransformEngine, TransformOperation, TransformResult, left_join};

use super::stage::PipelineStage;
use super::station_rename;

/// Ingests, repairs and enriches the field survey.
pub struct FieldDataProcessor {
    config: FieldConfig,
    source: Box<dyn TabularSource>,
    mapping_source: Box<dyn TabularSource>,
    engine: TransformEngine,
    table: Option<DataTable>,
    stage: PipelineStage,
    history: TransformResult,
    sources: Vec<SourceMetadata>,
}

impl FieldDataProcessor {
    /// Build a processor that reads from the configured database and
    /// mapping location.
    pub fn new(config: FieldConfig) -> Result<Self> {
        config.validate()?;
        let source = SqlQuerySource::new(&config.db_path, config.sql_query.clone())?;
        let mapping = CsvSource::new(config.weather_mapping_csv_path.clone())
            .with_timeout(config.http_timeout());
        Self::with_sources(config, Box::new(source), Box::new(mapping))
    }

    /// Build a processor over caller-supplied sources.
    pub fn with_sources(
        config: FieldConfig,
        source: Box<dyn TabularSource>,
        mapping_source: Box<dyn TabularSource>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            source,
            mapping_source,
            engine: TransformEngine::new(),
            table: None,
            stage: PipelineStage::Uninitialized,
            history: TransformResult::new(),
            sources: Vec::new(),
        })
    }

    /// Run the configured query and keep the result as the working table.
    ///
    /// Re-ingesting discards any earlier work.
    pub fn ingest_sql_data(&mut self) -> Result<&DataTable> {
        info!("Ingesting field data from {}", self.source.describe());
        let (table, metadata) = self.source.fetch()?;
        info!(
            "Successfully loaded {} rows, {} columns",
            table.row_count(),
            table.column_count()
        );

        self.sources.clear();
        self.sources.push(metadata);
        self.history = TransformResult::new();
        self.stage = PipelineStage::Loaded;
        Ok(&*self.table.insert(table))
    }

    /// Exchange the two column names listed in `columns_to_rename`.
    pub fn rename_columns(&mut self) -> Result<()> {
        self.stage
            .require(PipelineStage::Loaded, "rename_columns", "ingest_sql_data")?;
        let (first, second) = self.config.swap_pair()?;
        info!("Swapping columns: {} with {}", first, second);

        let op = TransformOperation::SwapColumns {
            first: first.to_string(),
            second: second.to_string(),
        };
        self.run(&[op])?;
        self.stage.advance(PipelineStage::Repaired);
        Ok(())
    }

    /// Take the magnitude of the elevation column and correct crop names.
    pub fn apply_corrections(&mut self) -> Result<()> {
        self.stage
            .require(PipelineStage::Repaired, "apply_corrections", "rename_columns")?;

        let columns = &self.config.columns;
        let table = self.working_table()?;
        table.require_column(&columns.absolute)?;
        table.require_column(&columns.correction)?;

        info!(
            "Applying corrections to {} and {}",
            columns.absolute, columns.correction
        );
        let ops = [
            TransformOperation::Absolute {
                column: columns.absolute.clone(),
            },
            TransformOperation::Standardize {
                column: columns.correction.clone(),
                mapping: self.config.values_to_rename.clone(),
            },
        ];
        self.run(&ops)?;
        self.stage.advance(PipelineStage::Cleaned);
        Ok(())
    }

    /// Left-join the field → station mapping on the field identifier.
    ///
    /// Every field row is kept; fields with no mapping get a null station.
    pub fn weather_station_mapping(&mut self) -> Result<()> {
        self.stage.require(
            PipelineStage::Cleaned,
            "weather_station_mapping",
            "apply_corrections",
        )?;
        info!("Merging weather station mapping data...");
        self.merge_mapping()
            .inspect_err(|e| error!("Error merging weather mapping data: {}", e))
    }

    fn merge_mapping(&mut self) -> Result<()> {
        let (mapping, metadata) = self.mapping_source.fetch()?;
        let table = self.working_table()?;
        let (mut merged, stats) = left_join(table, &mapping, &self.config.columns.field_id)?;

        let columns = &self.config.columns;
        let ops: Vec<TransformOperation> =
            station_rename(&merged, &columns.station, &columns.station_aliases)
                .into_iter()
                .collect();
        let renamed = self.engine.apply(&ops, &mut merged)?;
        if !merged.has_column(&columns.station) {
            warn!("Mapping did not provide a '{}' column", columns.station);
        }

        info!(
            "Weather mapping data successfully merged: {} of {} fields matched",
            stats.matched_rows,
            stats.output_rows
        );
        self.history.extend(renamed);
        self.sources.push(metadata);
        self.table = Some(merged);
        self.stage.advance(PipelineStage::Merged);
        Ok(())
    }

    /// Run every step in order and return the enriched table.
    pub fn process(&mut self) -> Result<&DataTable> {
        self.ingest_sql_data()?;
        self.rename_columns()?;
        self.apply_corrections()?;
        self.weather_station_mapping()?;
        info!("Field data processing completed in {} operations", self.history.operations_applied);
        self.table
            .as_ref()
            .ok_or_else(|| AgrimergeError::ProcessingIncomplete("field table is missing".to_string()))
    }

    /// Current working table, if ingested.
    pub fn table(&self) -> Option<&DataTable> {
        self.table.as_ref()
    }

    /// Take ownership of the working table.
    pub fn into_table(self) -> Option<DataTable> {
        self.table
    }

    pub fn stage(&self) -> PipelineStage {
        self.stage
    }

    /// Operations applied since the last ingest.
    pub fn history(&self) -> &TransformResult {
        &self.history
    }

    /// Metadata for every source read since the last ingest.
    pub fn sources(&self) -> &[SourceMetadata] {
        &self.sources
    }

    pub fn config(&self) -> &FieldConfig {
        &self.config
    }

    fn working_table(&self) -> Result<&DataTable> {
        self.table
            .as_ref()
            .ok_or_else(|| AgrimergeError::ProcessingIncomplete("field table is missing".to_string()))
    }

    fn run(&mut self, ops: &[TransformOperation]) -> Result<()> {
        let engine = self.engine;
        let table = self
            .table
            .as_mut()
            .ok_or_else(|| AgrimergeError::ProcessingIncomplete("field table is missing".to_string()))?;
        let result = engine.apply(ops, table)?;
        self.history.extend(result);
        Ok(())
    }
}
