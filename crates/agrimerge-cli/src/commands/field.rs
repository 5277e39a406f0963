//! Field command - run the field pipeline only.

use std::path::PathBuf;

use colored::Colorize;

use agrimerge::{Agrimerge, output};

use super::print_table_summary;

pub fn run(config: PathBuf, output_path: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let runner = Agrimerge::from_file(&config)?;
    let processor = runner.run_field()?;

    let history = processor.history();
    let table = processor
        .table()
        .ok_or("Field pipeline finished without a table")?;

    println!("{}", "Field pipeline complete".green().bold());
    print_table_summary("Field", table);
    println!(
        "  {} operations, {} values changed, {} columns renamed",
        history.operations_applied, history.values_changed, history.columns_renamed
    );
    for change in &history.changes {
        println!("  - {}", change.description);
    }

    let target = output_path.or_else(|| runner.config().output.field_csv.clone());
    if let Some(path) = target {
        output::export(table, &path, &runner.config().output)?;
        println!("Wrote {}", path.display().to_string().white().bold());
    }

    Ok(())
}
