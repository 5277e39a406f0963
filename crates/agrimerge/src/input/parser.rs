//! CSV/TSV parser with delimiter detection and per-column type inference.

use sha2::{Digest, Sha256};

use crate::error::{AgrimergeError, Result};
use crate::schema::{ColumnType, Value};
use super::source::{DataTable, SourceMetadata};

/// Delimiters to try when auto-detecting.
const DELIMITERS: &[u8] = &[b'\t', b',', b';', b'|'];

/// Parser configuration.
#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// Delimiter to use (None = auto-detect).
    pub delimiter: Option<u8>,
    /// Maximum rows to read (None = all).
    pub max_rows: Option<usize>,
    /// Quote character.
    pub quote: u8,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            delimiter: None,
            max_rows: None,
            quote: b'"',
        }
    }
}

/// Parses delimited payloads into typed tables.
#[derive(Debug, Clone, Default)]
pub struct Parser {
    config: ParserConfig,
}

impl Parser {
    /// Create a new parser with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a parser with custom configuration.
    pub fn with_config(config: ParserConfig) -> Self {
        Self { config }
    }

    /// Parse a raw payload fetched from `location`.
    pub fn parse_payload(&self, location: &str, contents: &[u8]) -> Result<(DataTable, SourceMetadata)> {
        let mut hasher = Sha256::new();
        hasher.update(contents);
        let hash = format!("sha256:{:x}", hasher.finalize());

        let delimiter = match self.config.delimiter {
            Some(d) => d,
            None => detect_delimiter(contents),
        };

        let table = self.parse_bytes(contents, delimiter).map_err(|e| match e {
            AgrimergeError::Csv(source) => AgrimergeError::malformed(location, source),
            AgrimergeError::MalformedSource { source, .. } => {
                AgrimergeError::malformed(location, source)
            }
            other => other,
        })?;

        let format = match delimiter {
            b'\t' => "tsv",
            b',' => "csv",
            b';' => "csv-semicolon",
            b'|' => "psv",
            _ => "delimited",
        };

        let metadata = SourceMetadata::new(location, hash, contents.len() as u64, format, &table);
        Ok((table, metadata))
    }

    /// Parse bytes directly.
    pub(crate) fn parse_bytes(&self, bytes: &[u8], delimiter: u8) -> Result<DataTable> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .quote(self.config.quote)
            .flexible(true)
            .from_reader(bytes);

        let headers: Vec<String> = reader.headers()?.iter().map(|s| s.to_string()).collect();
        if headers.is_empty() || headers.iter().all(|h| h.trim().is_empty()) {
            return Err(AgrimergeError::malformed("", "No columns found"));
        }

        let expected_cols = headers.len();
        let mut raw_rows: Vec<Vec<String>> = Vec::new();

        for (row_idx, result) in reader.records().enumerate() {
            if let Some(max) = self.config.max_rows {
                if row_idx >= max {
                    break;
                }
            }

            let record = result?;
            let mut row: Vec<String> = record.iter().map(|s| s.to_string()).collect();

            // Pad or truncate to the header width
            row.resize(expected_cols, String::new());
            raw_rows.push(row);
        }

        let column_types: Vec<ColumnType> = (0..expected_cols)
            .map(|col| ColumnType::infer(raw_rows.iter().map(|r| r[col].as_str())))
            .collect();

        let rows: Vec<Vec<Value>> = raw_rows
            .iter()
            .map(|row| {
                row.iter()
                    .zip(&column_types)
                    .map(|(cell, column_type)| column_type.parse_cell(cell))
                    .collect()
            })
            .collect();

        DataTable::new(headers, rows)
    }
}

/// Pick the candidate that splits the most sampled lines the same way the
/// header does.
///
/// Ties go to the earlier entry of [`DELIMITERS`]; falls back to a comma.
fn detect_delimiter(bytes: &[u8]) -> u8 {
    let text = String::from_utf8_lossy(bytes);
    let sample: Vec<&str> = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .take(10)
        .collect();
    let Some((header, body)) = sample.split_first() else {
        return b',';
    };

    let mut best = (b',', 0usize, 0usize);
    for &delimiter in DELIMITERS {
        let width = fields_crossed(header, delimiter);
        if width == 0 {
            continue;
        }
        let agreeing = 1 + body
            .iter()
            .filter(|line| fields_crossed(line, delimiter) == width)
            .count();
        if (agreeing, width) > (best.1, best.2) {
            best = (delimiter, agreeing, width);
        }
    }
    best.0
}

/// Number of unquoted `delimiter` bytes in `line`.
fn fields_crossed(line: &str, delimiter: u8) -> usize {
    line.bytes()
        .fold((0, false), |(count, quoted), byte| match byte {
            b'"' => (count, !quoted),
            b if b == delimiter && !quoted => (count + 1, quoted),
            _ => (count, quoted),
        })
        .0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_delimiter_csv() {
        let data = b"a,b,c\n1,2,3\n4,5,6";
        assert_eq!(detect_delimiter(data), b',');
    }

    #[test]
    fn test_detect_delimiter_tsv() {
        let data = b"a\tb\tc\n1\t2\t3\n4\t5\t6";
        assert_eq!(detect_delimiter(data), b'\t');
    }

    #[test]
    fn test_detect_delimiter_ignores_quoted_commas() {
        let data = b"Weather_station;Message\nWS1;\"Rainfall: 4, Temp: 2\"\nWS2;\"x, y\"";
        assert_eq!(detect_delimiter(data), b';');
    }

    #[test]
    fn test_detect_delimiter_prefers_consistent_split() {
        let data = b"Field_ID|Crop_type, variety\n1|tea\n2|maize\n";
        assert_eq!(detect_delimiter(data), b'|');
    }

    #[test]
    fn test_detect_delimiter_defaults_to_comma() {
        assert_eq!(detect_delimiter(b""), b',');
        assert_eq!(detect_delimiter(b"Message\nsensor offline\n"), b',');
    }

    #[test]
    fn test_parse_typed_columns() {
        let parser = Parser::new();
        let data = b"Field_ID,Crop_type,Elevation\n1,tea,-12.5\n2,maize,NA\n3,wheat,40";
        let table = parser.parse_bytes(data, b',').unwrap();

        assert_eq!(table.headers(), ["Field_ID", "Crop_type", "Elevation"]);
        assert_eq!(table.row_count(), 3);
        assert_eq!(table.get(0, 0), Some(&Value::Integer(1)));
        assert_eq!(table.get(0, 1), Some(&Value::from("tea")));
        assert_eq!(table.get(1, 2), Some(&Value::Null));
        assert_eq!(table.get(2, 2), Some(&Value::Float(40.0)));
    }

    #[test]
    fn test_parse_header_only_payload() {
        let parser = Parser::new();
        let table = parser.parse_bytes(b"Field_ID,Weather_station\n", b',').unwrap();
        assert_eq!(table.column_count(), 2);
        assert_eq!(table.row_count(), 0);
    }

    #[test]
    fn test_parse_pads_short_rows() {
        let parser = Parser::new();
        let table = parser.parse_bytes(b"a,b,c\n1,2\n", b',').unwrap();
        assert_eq!(table.get(0, 2), Some(&Value::Null));
    }

    #[test]
    fn test_parse_payload_records_metadata() {
        let parser = Parser::new();
        let (table, meta) = parser
            .parse_payload("mapping.tsv", b"Field_ID\tWeather_station\n1\t0\n")
            .unwrap();
        assert_eq!(meta.format, "tsv");
        assert_eq!(meta.row_count, table.row_count());
        assert!(meta.hash.starts_with("sha256:"));
    }

    #[test]
    fn test_parse_duplicate_header_fails() {
        let parser = Parser::new();
        let result = parser.parse_payload("dup.csv", b"a,a\n1,2\n");
        assert!(matches!(result, Err(AgrimergeError::DuplicateColumn(_))));
    }

    #[test]
    fn test_parse_invalid_utf8_is_malformed() {
        let parser = Parser::new();
        let result = parser.parse_payload("weather.csv", b"Weather_station,Message\n0,\xff\xfe\n");
        assert!(matches!(
            result,
            Err(AgrimergeError::MalformedSource { ref location, .. }) if location == "weather.csv"
        ));
    }

    #[test]
    fn test_parse_empty_payload_is_malformed() {
        let parser = Parser::new();
        match parser.parse_payload("mapping.csv", b"") {
            Err(AgrimergeError::MalformedSource { location, source }) => {
                assert_eq!(location, "mapping.csv");
                assert_eq!(source.to_string(), "No columns found");
            }
            other => panic!("expected malformed source, got {:?}", other.map(|(t, _)| t)),
        }
    }
}
