//! Column identifier normalization.

use once_cell::sync::Lazy;
use regex::Regex;

/// Separator used in place of internal whitespace.
pub const SEPARATOR: &str = "_";

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Trim surrounding whitespace and collapse internal runs to `_`.
///
/// `" Weather station ID "` becomes `"Weather_station_ID"`.
pub fn normalize_column_name(name: &str) -> String {
    WHITESPACE_RUN
        .replace_all(name.trim(), SEPARATOR)
        .into_owned()
}

/// Case-insensitive comparison key for a column name.
pub fn column_key(name: &str) -> String {
    normalize_column_name(name).to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_trims_and_collapses() {
        assert_eq!(normalize_column_name("  Weather station  ID "), "Weather_station_ID");
        assert_eq!(normalize_column_name("Message\t"), "Message");
        assert_eq!(normalize_column_name("Field_ID"), "Field_ID");
    }

    #[test]
    fn test_column_key_ignores_case() {
        assert_eq!(column_key(" field_id"), column_key("Field_ID"));
        assert_ne!(column_key("Field ID2"), column_key("Field_ID"));
    }
}
