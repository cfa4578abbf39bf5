//! Error types for dataset loading and feature preparation.
//!
//! Every variant belongs to one of the [`ErrorKind`] families (not found,
//! validation, domain, internal) so that an interactive front end can decide
//! how to present it without matching on individual variants.
//!
//! Errors are serializable as `{ code, message }` for display in a UI.

use serde::Serialize;
use serde::ser::SerializeStruct;
use std::path::PathBuf;
use thiserror::Error;

/// Broad family an error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    /// A file, column or stored artifact does not exist.
    NotFound,
    /// An input or parameter was rejected before any work was done.
    Validation,
    /// A mathematical operation is undefined for the input values.
    Domain,
    /// I/O, parsing or other unexpected failures.
    Internal,
}

/// The main error type for the processing crate.
#[derive(Error, Debug)]
pub enum ProcessingError {
    /// Source data file does not exist.
    #[error("No data file found at: {}", path.display())]
    FileNotFound { path: PathBuf },

    /// Column was not found in the dataset.
    #[error("Column '{0}' not found in dataset")]
    ColumnNotFound(String),

    /// Column exists but does not hold numeric values.
    #[error("Column '{0}' is not numeric")]
    NotNumeric(String),

    /// A parameter is out of its accepted range.
    #[error("Invalid value for '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    /// The data itself cannot be used for the requested operation.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// A transformation is undefined for some of the column's values.
    #[error("Cannot transform column '{column}': {reason}")]
    Domain { column: String, reason: String },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<ProcessingError>,
    },
}

impl ProcessingError {
    /// Shorthand for [`ProcessingError::InvalidParameter`].
    pub fn invalid_parameter(name: impl Into<String>, reason: impl Into<String>) -> Self {
        ProcessingError::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        ProcessingError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Get error code for frontend handling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::FileNotFound { .. } => "NOT_FOUND",
            Self::ColumnNotFound(_) => "COLUMN_NOT_FOUND",
            Self::NotNumeric(_) => "NOT_NUMERIC",
            Self::InvalidParameter { .. } => "INVALID_PARAMETER",
            Self::InvalidData(_) => "INVALID_DATA",
            Self::Domain { .. } => "DOMAIN_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// The family this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::FileNotFound { .. } => ErrorKind::NotFound,
            Self::ColumnNotFound(_)
            | Self::NotNumeric(_)
            | Self::InvalidParameter { .. }
            | Self::InvalidData(_) => ErrorKind::Validation,
            Self::Domain { .. } => ErrorKind::Domain,
            Self::Io(_) | Self::Polars(_) => ErrorKind::Internal,
            Self::WithContext { source, .. } => source.kind(),
        }
    }
}

/// Serialized as a struct with `code` and `message` fields.
impl Serialize for ProcessingError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("ProcessingError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for processing operations.
pub type Result<T> = std::result::Result<T, ProcessingError>;

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
        self.map_err(|e| ProcessingError::Polars(e).with_context(context))
    }
}
