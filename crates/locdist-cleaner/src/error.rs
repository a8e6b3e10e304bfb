//! Error types for the cleaning pipeline.
//!
//! Every failure that can abort a dataset is a [`CleaningError`]. The batch
//! runner records the error against the dataset and moves on, so errors are
//! serializable to end up in the JSON batch report.

use serde::Serialize;
use serde::ser::SerializeStruct;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for the cleaning pipeline.
#[derive(Error, Debug)]
pub enum CleaningError {
    /// Run was cancelled through the cancellation token.
    #[error("Cleaning cancelled")]
    Cancelled,

    /// File missing, unreadable, or not parseable as CSV.
    #[error("Failed to load '{}': {reason}", file.display())]
    Load { file: PathBuf, reason: String },

    /// Header lacks one or more of the fixed schema columns.
    #[error("Schema mismatch in '{}': missing columns {missing:?}", file.display())]
    SchemaMismatch { file: PathBuf, missing: Vec<String> },

    /// A non-empty numeric field could not be read as a number.
    #[error("Invalid numeric value {value:?} in column '{column}' at row {row}")]
    InvalidNumeric {
        column: String,
        row: usize,
        value: String,
    },

    /// A date or timestamp value failed its strict parse rule.
    #[error("Unparseable value {value:?} in column '{column}'")]
    TemporalParse { column: String, value: String },

    /// A column required by the imputer is absent.
    #[error("Imputer precondition violated: column '{column}' not found")]
    ImputerPrecondition { column: String },

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<CleaningError>,
    },
}

impl CleaningError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        CleaningError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Stable machine-readable code, used in the JSON batch report.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Cancelled => "CANCELLED",
            Self::Load { .. } => "LOAD_ERROR",
            Self::SchemaMismatch { .. } => "SCHEMA_MISMATCH",
            Self::InvalidNumeric { .. } => "INVALID_NUMERIC",
            Self::TemporalParse { .. } => "TEMPORAL_PARSE_ERROR",
            Self::ImputerPrecondition { .. } => "IMPUTER_PRECONDITION",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Check if this error represents a cancellation.
    pub fn is_cancelled(&self) -> bool {
        match self {
            Self::Cancelled => true,
            Self::WithContext { source, .. } => source.is_cancelled(),
            _ => false,
        }
    }

    /// Whether the error belongs to the load family (I/O, CSV structure,
    /// header or numeric typing).
    pub fn is_load_error(&self) -> bool {
        match self {
            Self::Load { .. } | Self::SchemaMismatch { .. } | Self::InvalidNumeric { .. } => true,
            Self::WithContext { source, .. } => source.is_load_error(),
            _ => false,
        }
    }

    /// Errors that point at a schema or programming mistake rather than bad
    /// data in the file.
    pub fn is_precondition(&self) -> bool {
        match self {
            Self::ImputerPrecondition { .. } => true,
            Self::WithContext { source, .. } => source.is_precondition(),
            _ => false,
        }
    }
}

impl From<crate::config::ConfigValidationError> for CleaningError {
    fn from(err: crate::config::ConfigValidationError) -> Self {
        CleaningError::InvalidConfig(err.to_string())
    }
}

/// Errors are serialized as `{ "code": ..., "message": ... }`.
impl Serialize for CleaningError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("CleaningError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for cleaning operations.
pub type Result<T> = std::result::Result<T, CleaningError>;

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
        self.map_err(|e| CleaningError::Polars(e).with_context(context))
    }
}
