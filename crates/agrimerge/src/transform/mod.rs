//! Table transformations: column repair, value correction, pattern
//! extraction and joins.

mod engine;
mod extract;
mod join;
mod operations;

pub use engine::{TEMP_SWAP_NAME, TransformEngine};
pub use extract::{ExtractionSummary, PatternExtractor, PatternRule, extract_value};
pub use join::{JoinStats, LEFT_SUFFIX, RIGHT_SUFFIX, left_join};
pub use operations::{TransformChange, TransformOperation, TransformResult};
