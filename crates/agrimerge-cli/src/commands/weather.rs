//! Weather command - run the weather pipeline only.

use std::path::PathBuf;

use colored::Colorize;

use agrimerge::{Agrimerge, output};

use super::print_table_summary;

pub fn run(config: PathBuf, output_path: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let runner = Agrimerge::from_file(&config)?;
    let processor = runner.run_weather()?;

    let table = processor
        .processed_table()
        .ok_or("Weather pipeline finished without a merged table")?;

    println!("{}", "Weather pipeline complete".green().bold());
    print_table_summary("Weather", table);
    for extraction in processor.extraction() {
        println!(
            "  {}: {} extracted, {} missing",
            extraction.column,
            extraction.extracted.to_string().green(),
            extraction.missing.to_string().yellow()
        );
    }

    let target = output_path.or_else(|| runner.config().output.weather_csv.clone());
    if let Some(path) = target {
        output::export(table, &path, &runner.config().output)?;
        println!("Wrote {}", path.display().to_string().white().bold());
    }

    Ok(())
}
