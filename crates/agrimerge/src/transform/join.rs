//! Left join of two tables on a shared key column.

use std::collections::{HashMap, HashSet};

use log::{info, warn};

use crate::error::Result;
use crate::input::DataTable;
use crate::schema::Value;

/// Suffix for left-side columns whose names collide with right-side ones.
pub const LEFT_SUFFIX: &str = "_x";
/// Suffix for right-side columns whose names collide with left-side ones.
pub const RIGHT_SUFFIX: &str = "_y";

/// Counts describing the outcome of a join.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct JoinStats {
    /// Rows in the output table.
    pub output_rows: usize,
    /// Left rows that matched at least one right row.
    pub matched_rows: usize,
    /// Left rows kept with null right-side columns.
    pub unmatched_rows: usize,
}

/// Keep every row of `left`, attaching the columns of each `right` row whose
/// `key` value matches.
///
/// - Output columns are the left columns followed by the right columns
///   without the key. Non-key names present on both sides get the
///   `_x` / `_y` suffixes.
/// - A left row matching several right rows is repeated once per match, in
///   right-table order. A left row matching nothing appears once with null
///   right-side values.
/// - Null keys never match.
pub fn left_join(left: &DataTable, right: &DataTable, key: &str) -> Result<(DataTable, JoinStats)> {
    let left_key = left.require_column(key)?;
    let right_key = right.require_column(key)?;

    let right_columns: Vec<usize> = (0..right.column_count()).filter(|&i| i != right_key).collect();
    let headers = build_output_headers(left, right, left_key, &right_columns);

    let mut lookup: HashMap<String, Vec<usize>> = HashMap::new();
    for (row_idx, value) in right.column_values(right_key).enumerate() {
        if let Some(k) = value.join_key() {
            lookup.entry(k).or_default().push(row_idx);
        }
    }

    let mut rows = Vec::with_capacity(left.row_count());
    let mut stats = JoinStats::default();

    for row in left.rows() {
        let matches = row[left_key]
            .join_key()
            .and_then(|k| lookup.get(&k))
            .filter(|bucket| !bucket.is_empty());

        match matches {
            Some(bucket) => {
                stats.matched_rows += 1;
                for &right_idx in bucket {
                    let right_row = &right.rows()[right_idx];
                    let mut combined = row.clone();
                    combined.extend(right_columns.iter().map(|&i| right_row[i].clone()));
                    rows.push(combined);
                }
            }
            None => {
                stats.unmatched_rows += 1;
                let mut combined = row.clone();
                combined.extend(right_columns.iter().map(|_| Value::Null));
                rows.push(combined);
            }
        }
    }

    stats.output_rows = rows.len();
    if stats.unmatched_rows > 0 {
        warn!(
            "{} of {} rows had no match on '{}'",
            stats.unmatched_rows,
            left.row_count(),
            key
        );
    }
    info!(
        "Join on '{}' complete: {} output row(s), {} matched row(s)",
        key, stats.output_rows, stats.matched_rows
    );

    Ok((DataTable::new(headers, rows)?, stats))
}

fn build_output_headers(
    left: &DataTable,
    right: &DataTable,
    left_key: usize,
    right_columns: &[usize],
) -> Vec<String> {
    let right_names: HashSet<&str> = right_columns
        .iter()
        .map(|&i| right.headers()[i].as_str())
        .collect();
    let left_names: HashSet<&str> = left.headers().iter().map(String::as_str).collect();

    let mut headers: Vec<String> = left
        .headers()
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            if idx != left_key && right_names.contains(name.as_str()) {
                format!("{}{}", name, LEFT_SUFFIX)
            } else {
                name.clone()
            }
        })
        .collect();

    headers.extend(right_columns.iter().map(|&i| {
        let name = right.headers()[i].as_str();
        if left_names.contains(name) {
            format!("{}{}", name, RIGHT_SUFFIX)
        } else {
            name.to_string()
        }
    }));

    headers
}
