//! Agrimerge: ingest, clean and merge agricultural field surveys with
//! weather-station telemetry.
//!
//! Two independent pipelines share one set of table primitives:
//!
//! - **Field**: query a SQLite survey, restore two swapped column names,
//!   take the magnitude of elevations, correct misspelled crop names and
//!   attach each field's weather station.
//! - **Weather**: read free-text station messages, extract one numeric
//!   column per configured pattern and join the readings onto the
//!   field → station mapping.
//!
//! Structural problems (missing columns, unreachable sources, steps run out
//! of order) are errors. Data-quality gaps become nulls and are reported by
//! [`validation`].
//!
//! # Example
//!
//! ```no_run
//! use agrimerge::Agrimerge;
//!
//! let runner = Agrimerge::from_file("pipeline.yaml").unwrap();
//! let result = runner.run().unwrap();
//!
//! println!("Field rows: {}", result.field.row_count());
//! println!("Passed: {}", result.passed());
//! ```

pub mod config;
pub mod error;
pub mod input;
pub mod output;
pub mod pipeline;
pub mod schema;
pub mod transform;
pub mod validation;

mod agrimerge;

pub use crate::agrimerge::{Agrimerge, RunResult, RunSummary};
pub use config::{FieldConfig, OutputConfig, PipelineConfig, WeatherConfig};
pub use error::{AgrimergeError, Result};
pub use input::{DataTable, SourceMetadata, TabularSource};
pub use pipeline::{FieldDataProcessor, PipelineStage, WeatherDataProcessor};
pub use schema::Value;
pub use validation::{Observation, ObservationType, Severity, ValidationEngine, ValidationReport};
