//! Input parsing and data source handling.

mod adapter;
mod parser;
mod source;

pub use adapter::{
    CsvSource, DEFAULT_HTTP_TIMEOUT, MemorySource, SqlQuerySource, TabularSource,
    parse_sqlite_descriptor,
};
pub use parser::{Parser, ParserConfig};
pub use source::{DataTable, SourceMetadata};
