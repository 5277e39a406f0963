//! Cell values, column types and column naming.

mod naming;
mod types;
mod value;

pub use naming::{column_key, normalize_column_name};
pub use types::{ColumnType, is_null_token};
pub use value::Value;
