//! Validate command - check exported tables.

use std::path::{Path, PathBuf};

use agrimerge::input::{CsvSource, TabularSource};
use agrimerge::{ValidationEngine, ValidationReport};

use super::print_report;

fn check(path: &Path, engine: ValidationEngine) -> Result<ValidationReport, Box<dyn std::error::Error>> {
    let (table, _) = CsvSource::new(path.display().to_string()).fetch()?;
    Ok(engine.validate(&table))
}

pub fn run(
    field: Option<PathBuf>,
    weather: Option<PathBuf>,
    json_output: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if field.is_none() && weather.is_none() {
        return Err("Nothing to validate: pass --field and/or --weather".into());
    }

    let mut reports = Vec::new();
    if let Some(path) = &field {
        reports.push(("Field", path, check(path, ValidationEngine::field_defaults())?));
    }
    if let Some(path) = &weather {
        reports.push(("Weather", path, check(path, ValidationEngine::weather_defaults())?));
    }

    if json_output {
        let status: Vec<serde_json::Value> = reports
            .iter()
            .map(|(label, path, report)| {
                serde_json::json!({
                    "table": label.to_lowercase(),
                    "file": path,
                    "passed": report.passed(),
                    "observations": report.observations,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        for (label, path, report) in &reports {
            println!("{}", path.display());
            print_report(label, report);
            println!();
        }
    }

    let failed: Vec<&str> = reports
        .iter()
        .filter(|(_, _, report)| !report.passed())
        .map(|(label, _, _)| *label)
        .collect();
    if failed.is_empty() {
        Ok(())
    } else {
        Err(format!("Validation failed for: {}", failed.join(", ")).into())
    }
}
