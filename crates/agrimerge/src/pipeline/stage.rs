//! Processing stages shared by both transformers.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{AgrimergeError, Result};

/// How far a transformer has progressed through its steps.
///
/// Stages are ordered; a step may run once the transformer has reached the
/// stage its prerequisite step produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    /// Nothing loaded yet.
    #[default]
    Uninitialized,
    /// Raw tables ingested.
    Loaded,
    /// Swapped column names restored (field pipeline only).
    Repaired,
    /// Values corrected or measurements extracted.
    Cleaned,
    /// Mapping merged in.
    Merged,
}

impl PipelineStage {
    /// Get a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            PipelineStage::Uninitialized => "uninitialized",
            PipelineStage::Loaded => "loaded",
            PipelineStage::Repaired => "repaired",
            PipelineStage::Cleaned => "cleaned",
            PipelineStage::Merged => "merged",
        }
    }

    /// Fail with `NotYetIngested` unless `required` has been reached.
    pub(crate) fn require(
        self,
        required: PipelineStage,
        step: &'static str,
        prerequisite: &'static str,
    ) -> Result<()> {
        if self >= required {
            Ok(())
        } else {
            Err(AgrimergeError::NotYetIngested { step, prerequisite })
        }
    }

    /// Advance to `stage` without ever moving backwards.
    pub(crate) fn advance(&mut self, stage: PipelineStage) {
        if stage > *self {
            *self = stage;
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_ordering() {
        assert!(PipelineStage::Uninitialized < PipelineStage::Loaded);
        assert!(PipelineStage::Loaded < PipelineStage::Repaired);
        assert!(PipelineStage::Cleaned < PipelineStage::Merged);
    }

    #[test]
    fn test_require_names_prerequisite() {
        let err = PipelineStage::Uninitialized
            .require(PipelineStage::Loaded, "rename_columns", "ingest_sql_data")
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Cannot run rename_columns: run ingest_sql_data first"
        );
        assert!(PipelineStage::Merged
            .require(PipelineStage::Loaded, "rename_columns", "ingest_sql_data")
            .is_ok());
    }

    #[test]
    fn test_advance_never_moves_backwards() {
        let mut stage = PipelineStage::Cleaned;
        stage.advance(PipelineStage::Repaired);
        assert_eq!(stage, PipelineStage::Cleaned);
        stage.advance(PipelineStage::Merged);
        assert_eq!(stage, PipelineStage::Merged);
    }
}
