//! Tabular source adapters: relational queries, delimited files and
//! in-memory tables.
//!
//! Every [`TabularSource::fetch`] acquires its connection or HTTP response
//! and releases it before returning, on success and on failure.

use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{debug, info};
use reqwest::blocking::Client;
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};

use crate::error::{AgrimergeError, Result};
use crate::schema::Value;

use super::parser::{Parser, ParserConfig};
use super::source::{DataTable, SourceMetadata};

/// Default timeout for remote CSV downloads.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(60);

/// Prefix of SQLAlchemy-style SQLite connection strings.
const SQLITE_PREFIX: &str = "sqlite:///";

/// Anything that can produce a table on demand.
pub trait TabularSource {
    /// Fetch the table. Each call opens and releases its own resources.
    fn fetch(&self) -> Result<(DataTable, SourceMetadata)>;

    /// Human-readable location for logs and errors.
    fn describe(&self) -> String;
}

/// Runs a query against a SQLite database.
#[derive(Debug, Clone)]
pub struct SqlQuerySource {
    db_path: PathBuf,
    query: String,
}

impl SqlQuerySource {
    /// Create a source from a connection descriptor and a query.
    ///
    /// The descriptor is either `sqlite:///path/to/file.db` or a bare path.
    pub fn new(connection: &str, query: impl Into<String>) -> Result<Self> {
        let query = query.into();
        if query.trim().is_empty() {
            return Err(AgrimergeError::invalid_config("sql_query", "query is empty"));
        }
        Ok(Self {
            db_path: parse_sqlite_descriptor(connection)?,
            query,
        })
    }

    /// Path of the database file.
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }
}

impl TabularSource for SqlQuerySource {
    fn fetch(&self) -> Result<(DataTable, SourceMetadata)> {
        let location = self.describe();
        debug!("Opening database {}", location);

        let conn = Connection::open_with_flags(&self.db_path, OpenFlags::SQLITE_OPEN_READ_ONLY)
            .map_err(|e| AgrimergeError::unavailable(&location, e))?;

        let (headers, rows) =
            run_query(&conn, &self.query).map_err(|source| AgrimergeError::InvalidQuery {
                query: self.query.clone(),
                source,
            })?;
        drop(conn);

        let table = DataTable::new(headers, rows)?;
        info!("Query returned {} rows from {}", table.row_count(), location);

        let metadata = SourceMetadata::new(location, String::new(), 0, "sqlite", &table);
        Ok((table, metadata))
    }

    fn describe(&self) -> String {
        self.db_path.display().to_string()
    }
}

fn run_query(conn: &Connection, query: &str) -> rusqlite::Result<(Vec<String>, Vec<Vec<Value>>)> {
    let mut stmt = conn.prepare(query)?;
    let column_count = stmt.column_count();
    let headers: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

    let mut rows = Vec::new();
    let mut result_rows = stmt.query([])?;
    while let Some(row) = result_rows.next()? {
        let mut values = Vec::with_capacity(column_count);
        for i in 0..column_count {
            let value = match row.get_ref(i)? {
                ValueRef::Null => Value::Null,
                ValueRef::Integer(n) => Value::Integer(n),
                ValueRef::Real(f) => Value::Float(f),
                ValueRef::Text(t) | ValueRef::Blob(t) => {
                    Value::Text(String::from_utf8_lossy(t).into_owned())
                }
            };
            values.push(value);
        }
        rows.push(values);
    }

    Ok((headers, rows))
}

/// Resolve a SQLite connection descriptor to a file path.
pub fn parse_sqlite_descriptor(descriptor: &str) -> Result<PathBuf> {
    let descriptor = descriptor.trim();
    let path = match descriptor.strip_prefix(SQLITE_PREFIX) {
        Some(rest) => rest,
        None if descriptor.contains("://") => {
            return Err(AgrimergeError::invalid_config(
                "db_path",
                format!("unsupported connection descriptor '{}'", descriptor),
            ));
        }
        None => descriptor,
    };

    if path.is_empty() {
        return Err(AgrimergeError::invalid_config("db_path", "database path is empty"));
    }
    Ok(PathBuf::from(path))
}

/// Reads a delimited file from an `http(s)://` URL or a local path.
#[derive(Debug, Clone)]
pub struct CsvSource {
    location: String,
    parser: Parser,
    timeout: Duration,
}

impl CsvSource {
    /// Create a source with delimiter auto-detection.
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            parser: Parser::new(),
            timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }

    /// Use a custom parser configuration.
    pub fn with_parser(mut self, config: ParserConfig) -> Self {
        self.parser = Parser::with_config(config);
        self
    }

    /// Set the HTTP timeout for remote locations.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Whether the location is fetched over HTTP.
    pub fn is_remote(&self) -> bool {
        let lower = self.location.to_ascii_lowercase();
        lower.starts_with("http://") || lower.starts_with("https://")
    }

    fn read_remote(&self) -> Result<Vec<u8>> {
        let client = Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| AgrimergeError::unavailable(&self.location, e))?;

        let response = client
            .get(&self.location)
            .send()
            .map_err(|e| AgrimergeError::unavailable(&self.location, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AgrimergeError::unavailable(
                &self.location,
                format!("HTTP status {}", status),
            ));
        }

        let bytes = response
            .bytes()
            .map_err(|e| AgrimergeError::unavailable(&self.location, e))?;
        Ok(bytes.to_vec())
    }

    fn read_local(&self) -> Result<Vec<u8>> {
        std::fs::read(&self.location).map_err(|e| AgrimergeError::unavailable(&self.location, e))
    }
}

impl TabularSource for CsvSource {
    fn fetch(&self) -> Result<(DataTable, SourceMetadata)> {
        info!("Reading CSV data from {}", self.location);
        let contents = if self.is_remote() {
            self.read_remote()?
        } else {
            self.read_local()?
        };

        let (table, metadata) = self.parser.parse_payload(&self.location, &contents)?;
        info!("Loaded {} records from {}", table.row_count(), self.location);
        Ok((table, metadata))
    }

    fn describe(&self) -> String {
        self.location.clone()
    }
}

/// Serves a table that is already in memory.
#[derive(Debug, Clone)]
pub struct MemorySource {
    label: String,
    table: DataTable,
}

impl MemorySource {
    /// Wrap a table under a label used in logs.
    pub fn new(label: impl Into<String>, table: DataTable) -> Self {
        Self {
            label: label.into(),
            table,
        }
    }
}

impl TabularSource for MemorySource {
    fn fetch(&self) -> Result<(DataTable, SourceMetadata)> {
        let table = self.table.clone();
        let metadata = SourceMetadata::new(&self.label, String::new(), 0, "memory", &table);
        Ok((table, metadata))
    }

    fn describe(&self) -> String {
        self.label.clone()
    }
}
