//! CSV export of pipeline tables.

use std::path::Path;

use log::info;

use crate::config::OutputConfig;
use crate::error::{AgrimergeError, Result};
use crate::input::DataTable;
use crate::schema::Value;

/// Write `table` to `path` as comma-separated values.
///
/// The header row comes first; nulls are written as empty fields.
pub fn write_csv(table: &DataTable, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let file = std::fs::File::create(path).map_err(|e| AgrimergeError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut writer = csv::Writer::from_writer(file);
    write_table(&mut writer, table)?;
    writer.flush().map_err(|e| AgrimergeError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    info!("Wrote {} rows to {}", table.row_count(), path.display());
    Ok(())
}

/// Write `table`, or a seeded sample of it when `sample_size` is set.
///
/// Returns the number of rows written.
pub fn export(table: &DataTable, path: impl AsRef<Path>, config: &OutputConfig) -> Result<usize> {
    match config.sample_size {
        Some(n) => {
            let sample = table.sample(n, config.seed);
            info!(
                "Sampled {} of {} rows (seed {})",
                sample.row_count(),
                table.row_count(),
                config.seed
            );
            write_csv(&sample, path)?;
            Ok(sample.row_count())
        }
        None => {
            write_csv(table, path)?;
            Ok(table.row_count())
        }
    }
}

/// Render `table` as CSV text.
pub fn to_csv_string(table: &DataTable) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    write_table(&mut writer, table)?;
    let bytes = writer
        .into_inner()
        .map_err(|e| AgrimergeError::Csv(e.into_error().into()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn write_table<W: std::io::Write>(writer: &mut csv::Writer<W>, table: &DataTable) -> Result<()> {
    writer.write_record(table.headers())?;
    for row in table.rows() {
        writer.write_record(row.iter().map(render))?;
    }
    Ok(())
}

fn render(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        // Keep integral floats typed as floats on re-read.
        Value::Float(f) if f.is_finite() && f.fract() == 0.0 => format!("{:.1}", f),
        other => other.to_string(),
    }
}
