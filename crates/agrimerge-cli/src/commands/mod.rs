//! CLI command implementations.

pub mod field;
pub mod run;
pub mod validate;
pub mod weather;

use colored::Colorize;

use agrimerge::{DataTable, Severity, ValidationReport};

/// Print a validation report for one table.
pub fn print_report(label: &str, report: &ValidationReport) {
    let status = if report.passed() {
        "passed".green().bold()
    } else {
        "failed".red().bold()
    };
    println!("{} {}", format!("{} validation", label).cyan().bold(), status);

    for obs in &report.observations {
        let severity = match obs.severity {
            Severity::Error => obs.severity.label().red(),
            Severity::Warning => obs.severity.label().yellow(),
            Severity::Info => obs.severity.label().blue(),
        };
        let column = if obs.column.is_empty() {
            String::new()
        } else {
            format!("[{}] ", obs.column)
        };
        println!("  {:<8} {}{}", severity, column.white(), obs.description);
    }
}

/// Print the shape of a table.
pub fn print_table_summary(label: &str, table: &DataTable) {
    println!(
        "{} {} rows x {} columns",
        format!("{}:", label).yellow().bold(),
        table.row_count().to_string().white().bold(),
        table.column_count()
    );
    println!("  Columns: {}", table.headers().join(", "));
}
