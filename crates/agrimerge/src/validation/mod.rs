//! Data quality checks for exported pipeline tables.

mod observation;
mod validators;

pub use observation::{Evidence, Observation, ObservationType, Severity};
pub use validators::{
    CROP_TYPES, FIELD_COLUMNS, NonEmptyValidator, NonNegativeValidator, RequiredColumnsValidator,
    ValidationEngine, ValidationReport, Validator, VocabularyValidator, WEATHER_COLUMNS,
};
