//! Run command - execute both pipelines, validate and export.

use std::path::PathBuf;

use colored::Colorize;
use log::info;

use agrimerge::{Agrimerge, RunResult};

use super::{print_report, print_table_summary};

pub fn run(
    config: PathBuf,
    field_out: Option<PathBuf>,
    weather_out: Option<PathBuf>,
    sample: Option<usize>,
    seed: Option<u64>,
    json_output: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let runner = Agrimerge::from_file(&config)?;
    info!("Loaded configuration from {}", config.display());

    let mut output = runner.config().output.clone();
    if field_out.is_some() {
        output.field_csv = field_out;
    }
    if weather_out.is_some() {
        output.weather_csv = weather_out;
    }
    if sample.is_some() {
        output.sample_size = sample;
    }
    if let Some(seed) = seed {
        output.seed = seed;
    }

    let result = runner.run()?;
    let written = runner.export(&result, &output)?;

    if json_output {
        let status = serde_json::json!({
            "summary": result.summary,
            "field_report": result.field_report,
            "weather_report": result.weather_report,
            "written": written,
            "passed": result.passed(),
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
        return validation_outcome(&result);
    }

    println!("{}", "Pipeline run complete".green().bold());
    println!();
    print_table_summary("Field", &result.field);
    println!(
        "  Fields without a weather station: {}",
        result.summary.fields_without_station.to_string().yellow()
    );
    print_table_summary("Weather", &result.weather);
    for extraction in &result.summary.extraction {
        println!(
            "  {}: {} extracted, {} missing",
            extraction.column,
            extraction.extracted.to_string().green(),
            extraction.missing.to_string().yellow()
        );
    }
    println!();

    print_report("Field", &result.field_report);
    print_report("Weather", &result.weather_report);
    println!();

    if written.is_empty() {
        println!(
            "No output paths configured. Use {} or {} to export.",
            "--field-out".cyan(),
            "--weather-out".cyan()
        );
    } else {
        for path in &written {
            println!("Wrote {}", path.display().to_string().white().bold());
        }
    }

    validation_outcome(&result)
}

fn validation_outcome(result: &RunResult) -> Result<(), Box<dyn std::error::Error>> {
    let mut failed = Vec::new();
    if !result.field_report.passed() {
        failed.push("Field");
    }
    if !result.weather_report.passed() {
        failed.push("Weather");
    }
    if failed.is_empty() {
        Ok(())
    } else {
        Err(format!("Validation failed for: {}", failed.join(", ")).into())
    }
}
