//! Error types for the survey analysis pipeline.
//!
//! A single `thiserror` hierarchy covers every stage. Errors carry enough
//! context (column name, stratum value, join side) to diagnose bad input
//! data; no stage substitutes a default value for a failed computation,
//! since that would corrupt every statistic computed downstream.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for the analysis pipeline.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// A referenced column is wholly absent from the table.
    #[error("Column '{0}' not found in dataset")]
    ColumnNotFound(String),

    /// A column has no non-missing values to compute from.
    #[error("No valid values found in column '{0}'")]
    NoValidValues(String),

    /// A statistic is undefined for the given input (zero variance, empty
    /// sample, too few complete pairs).
    #[error("Statistic undefined for column '{column}': {reason}")]
    DegenerateStatistic { column: String, reason: String },

    /// An outlier-correction stratum has no non-outlier members, so no
    /// replacement value exists for it.
    #[error("Stratum '{stratum}' of column '{column}' has no non-outlier values to compute a replacement from")]
    DegenerateStratum { column: String, stratum: String },

    /// The join key is missing from one side of a join.
    #[error("Join key '{key}' missing from {side} table")]
    JoinKeyMismatch { key: String, side: String },

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Imputation failed.
    #[error("Failed to impute missing values in column '{column}': {reason}")]
    ImputationFailed { column: String, reason: String },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Relational store error.
    #[error("SQL error: {0}")]
    Sql(#[from] sqlx::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<AnalysisError>,
    },
}

impl AnalysisError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        AnalysisError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Stable error code, embedded in the run-summary report.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ColumnNotFound(_) => "COLUMN_NOT_FOUND",
            Self::NoValidValues(_) => "NO_VALID_VALUES",
            Self::DegenerateStatistic { .. } => "DEGENERATE_STATISTIC",
            Self::DegenerateStratum { .. } => "DEGENERATE_STRATUM",
            Self::JoinKeyMismatch { .. } => "JOIN_KEY_MISMATCH",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::ImputationFailed { .. } => "IMPUTATION_FAILED",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::Sql(_) => "SQL_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Whether the error points at the input data rather than the program
    /// (re-running after fixing the data is the only recovery path).
    pub fn is_data_error(&self) -> bool {
        matches!(
            self,
            Self::ColumnNotFound(_)
                | Self::NoValidValues(_)
                | Self::DegenerateStatistic { .. }
                | Self::DegenerateStratum { .. }
                | Self::JoinKeyMismatch { .. }
        ) || matches!(self, Self::WithContext { source, .. } if source.is_data_error())
    }
}

/// Errors are serialized as `code` + `message`, matching how they appear
/// inside the JSON run summary.
impl Serialize for AnalysisError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("AnalysisError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for analysis operations.
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| AnalysisError::Polars(e).with_context(context))
    }
}
