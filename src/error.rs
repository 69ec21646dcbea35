//! Error taxonomy for the projection pipeline
//!
//! Two failure classes exist: structurally invalid input data (`DataError`)
//! and scenario parameters outside their valid range (`ConfigError`). Neither
//! is retryable; both surface immediately to the caller.

use thiserror::Error;

/// Invalid or incomplete input tables
#[derive(Error, Debug)]
pub enum DataError {
    #[error("{table}: required column '{column}' is missing")]
    MissingColumn { table: String, column: String },

    #[error("{table}: row {row}, column '{column}': cannot parse '{value}' as a number")]
    InvalidNumber {
        table: String,
        column: String,
        row: usize,
        value: String,
    },

    #[error("invalid tenure {value}: tenure must be a non-negative multiple of 0.5 years")]
    InvalidTenure { value: f64 },

    #[error("no assumptions for industry '{industry}', age bracket '{age_bracket}'")]
    MissingAssumption { industry: String, age_bracket: String },

    #[error("no salary data for industry '{industry}', age bracket '{age_bracket}' in {year}")]
    MissingSalary {
        industry: String,
        age_bracket: String,
        year: i32,
    },

    #[error("industry '{industry}' has no sector mapping in the economic parameters")]
    UnmappedIndustry { industry: String },

    #[error("sector '{sector}' has no multiplier row")]
    MissingSectorMultipliers { sector: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Scenario parameters rejected at the boundary
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{name} = {value} is outside [{min}, {max}]")]
    OutOfRange {
        name: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("invalid projection horizon {start_year}..={end_year}")]
    InvalidHorizon { start_year: i32, end_year: i32 },

    #[error("override target '{industry}' / '{age_bracket}' not found in assumption table")]
    UnknownOverrideTarget { industry: String, age_bracket: String },

    #[error("override value for {field} = {value} must be a fraction in [0, 1]")]
    InvalidRate { field: &'static str, value: f64 },
}

/// Any failure raised by the library
#[derive(Error, Debug)]
pub enum EosgError {
    #[error(transparent)]
    Data(#[from] DataError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<csv::Error> for EosgError {
    fn from(err: csv::Error) -> Self {
        EosgError::Data(DataError::Csv(err))
    }
}

impl From<std::io::Error> for EosgError {
    fn from(err: std::io::Error) -> Self {
        EosgError::Data(DataError::Io(err))
    }
}

pub type Result<T> = std::result::Result<T, EosgError>;
