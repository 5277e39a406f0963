//! CLI argument definitions using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Agrimerge: clean and merge field surveys with weather-station telemetry
#[derive(Parser)]
#[command(name = "agrimerge")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run both pipelines, validate and export the results
    Run {
        /// Pipeline configuration (YAML or JSON)
        #[arg(short, long, value_name = "FILE")]
        config: PathBuf,

        /// Output path for the field table (overrides output.field_csv)
        #[arg(long, value_name = "CSV")]
        field_out: Option<PathBuf>,

        /// Output path for the weather table (overrides output.weather_csv)
        #[arg(long, value_name = "CSV")]
        weather_out: Option<PathBuf>,

        /// Export a seeded sample of this many rows
        #[arg(long, value_name = "N")]
        sample: Option<usize>,

        /// Seed for sampling (overrides output.seed)
        #[arg(long)]
        seed: Option<u64>,

        /// Print the run summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run the field pipeline only
    Field {
        /// Pipeline configuration (YAML or JSON)
        #[arg(short, long, value_name = "FILE")]
        config: PathBuf,

        /// Output path for the field table
        #[arg(short, long, value_name = "CSV")]
        output: Option<PathBuf>,
    },

    /// Run the weather pipeline only
    Weather {
        /// Pipeline configuration (YAML or JSON)
        #[arg(short, long, value_name = "FILE")]
        config: PathBuf,

        /// Output path for the merged weather table
        #[arg(short, long, value_name = "CSV")]
        output: Option<PathBuf>,
    },

    /// Validate exported tables
    Validate {
        /// Exported field table
        #[arg(long, value_name = "CSV")]
        field: Option<PathBuf>,

        /// Exported weather table
        #[arg(long, value_name = "CSV")]
        weather: Option<PathBuf>,

        /// Output observations as JSON
        #[arg(long)]
        json: bool,
    },
}
