//! Error types for the climate-learning crate.
//!
//! This module defines [`LearningError`], the main error type used throughout
//! the crate. All public API functions return `Result<T, LearningError>`.
//!
//! # Error Handling
//!
//! Errors are designed to be:
//! - **Descriptive**: Each variant includes context about what went wrong
//! - **Classifiable**: [`kind()`](LearningError::kind) places every error in
//!   one [`ErrorKind`] family, shared with the processing crate
//! - **Displayable**: serialized as `{ code, message }` for a front end
//!
//! # Example
//!
//! ```rust,ignore
//! use climate_learning::{LearningError, ModelStore};
//!
//! match ModelStore::new("models").load::<TrainedModel>("random_forest") {
//!     Err(LearningError::ModelNotFound { path, .. }) => println!("train first: {path}"),
//!     other => { other?; }
//! }
//! ```

pub use climate_processing::ErrorKind;
use climate_processing::ProcessingError;
use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for climate-learning operations.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// without breaking downstream code.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum LearningError {
    /// The requested model kind is not one the trainer knows.
    ///
    /// Supported kinds are "Linear Regression" and "Random Forest".
    #[error("Unsupported model type: '{0}' (expected Linear Regression or Random Forest)")]
    UnsupportedModel(String),

    /// Invalid configuration or hyperparameter.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Invalid data provided for training or inference.
    ///
    /// Common causes:
    /// - Feature columns contain nulls (impute first)
    /// - Feature columns are strings (encode first)
    /// - Feature and target lengths differ
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Fitting could not produce a model.
    #[error("Training failed: {0}")]
    TrainingFailed(String),

    /// No stored artifact exists under this name.
    #[error("Model '{name}' not found at: {path}")]
    ModelNotFound {
        /// Name the artifact was requested under.
        name: String,
        /// Path that was checked.
        path: String,
    },

    /// An error occurred during prediction.
    #[error("Inference error: {0}")]
    InferenceError(String),

    /// Failure in the dataset/feature layer.
    #[error(transparent)]
    Processing(#[from] ProcessingError),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored artifact could not be (de)serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl LearningError {
    /// Get error code for frontend handling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::UnsupportedModel(_) => "UNSUPPORTED_MODEL",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::InvalidData(_) => "INVALID_DATA",
            Self::TrainingFailed(_) => "TRAINING_FAILED",
            Self::ModelNotFound { .. } => "MODEL_NOT_FOUND",
            Self::InferenceError(_) => "INFERENCE_ERROR",
            Self::Processing(e) => e.error_code(),
            Self::Polars(_) => "POLARS_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// The family this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ModelNotFound { .. } => ErrorKind::NotFound,
            Self::UnsupportedModel(_) | Self::InvalidConfig(_) | Self::InvalidData(_) => {
                ErrorKind::Validation
            }
            Self::Processing(e) => e.kind(),
            Self::TrainingFailed(_)
            | Self::InferenceError(_)
            | Self::Polars(_)
            | Self::Io(_)
            | Self::Serialization(_) => ErrorKind::Internal,
        }
    }
}

/// Serialized as a struct with `code` and `message` fields.
impl Serialize for LearningError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("LearningError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for learning operations.
pub type Result<T> = std::result::Result<T, LearningError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            LearningError::UnsupportedModel("SVM".to_string()).error_code(),
            "UNSUPPORTED_MODEL"
        );
        let missing = LearningError::ModelNotFound {
            name: "random_forest".to_string(),
            path: "models/random_forest.json".to_string(),
        };
        assert_eq!(missing.error_code(), "MODEL_NOT_FOUND");
        assert_eq!(missing.kind(), ErrorKind::NotFound);
        assert!(missing.to_string().contains("models/random_forest.json"));
    }

    #[test]
    fn test_processing_errors_keep_their_code() {
        let inner = ProcessingError::FileNotFound {
            path: PathBuf::from("data/sentiment_data/positive.csv"),
        };
        let error: LearningError = inner.into();
        assert_eq!(error.error_code(), "NOT_FOUND");
        assert_eq!(error.kind(), ErrorKind::NotFound);
        assert!(error.to_string().contains("positive.csv"));
    }

    #[test]
    fn test_unsupported_model_is_validation() {
        let error = LearningError::UnsupportedModel("XGBoost".to_string());
        assert_eq!(error.kind(), ErrorKind::Validation);
        assert!(error.to_string().contains("XGBoost"));
    }

    #[test]
    fn test_error_serialization() {
        let error = LearningError::InvalidData("nulls in 'humidity'".to_string());
        let json = serde_json::to_value(&error).unwrap();
        assert_eq!(json["code"], "INVALID_DATA");
        assert_eq!(json["message"], "Invalid data: nulls in 'humidity'");
    }
}
