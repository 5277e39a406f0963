//! Field and weather pipelines.
//!
//! Each processor owns its working tables and runs its steps in a fixed
//! order. Steps fail fast with [`NotYetIngested`](crate::AgrimergeError::NotYetIngested)
//! when their prerequisite has not run; `process` runs the whole sequence.

mod field;
mod stage;
mod weather;

pub use field::FieldDataProcessor;
pub use stage::PipelineStage;
pub use weather::WeatherDataProcessor;

use log::warn;

use crate::input::DataTable;
use crate::transform::TransformOperation;

/// Rename the first alias present in `table` to the canonical station name.
///
/// Both names are matched with the lenient lookup. Returns `None` when the
/// canonical column already exists or no alias is present.
pub(crate) fn station_rename(
    table: &DataTable,
    station: &str,
    aliases: &[String],
) -> Option<TransformOperation> {
    let canonical = table.resolve_column(station);
    let (alias, alias_idx) = aliases
        .iter()
        .filter(|alias| alias.as_str() != station)
        .find_map(|alias| table.resolve_column(alias).map(|idx| (alias, idx)))
        .filter(|(_, idx)| Some(*idx) != canonical)?;

    if canonical.is_some() {
        warn!(
            "Both '{}' and '{}' are present; keeping both columns",
            alias, station
        );
        return None;
    }

    Some(TransformOperation::RenameColumn {
        from: table.headers()[alias_idx].clone(),
        to: station.to_string(),
    })
}
