//! Configuration for model storage and the sentiment pipeline.
//!
//! # Example
//!
//! ```rust,ignore
//! use climate_learning::LearningConfig;
//!
//! let config = LearningConfig::builder()
//!     .models_dir("artifacts")
//!     .sentiment_data_dir("data/sentiment_data")
//!     .build()?;
//! ```

use crate::error::LearningError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default directory for persisted model artifacts.
pub const DEFAULT_MODELS_DIR: &str = "models";

/// Default directory holding the labelled sentiment word lists.
pub const DEFAULT_SENTIMENT_DATA_DIR: &str = "data/sentiment_data";

/// Default artifact name of the sentiment model.
pub const DEFAULT_SENTIMENT_MODEL_NAME: &str = "sentiment_model";

/// Configuration for the learning side of the pipeline.
///
/// Use [`LearningConfig::builder()`] to create a validated configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LearningConfig {
    /// Directory where trained models are saved.
    ///
    /// Default: `models`
    pub models_dir: PathBuf,

    /// Directory containing the positive and negative word lists.
    ///
    /// Default: `data/sentiment_data`
    pub sentiment_data_dir: PathBuf,

    /// File name of the positive list inside `sentiment_data_dir`.
    ///
    /// Default: `positive.csv`
    pub positive_file: String,

    /// File name of the negative list inside `sentiment_data_dir`.
    ///
    /// Default: `negative.csv`
    pub negative_file: String,

    /// Column holding the text in both lists.
    ///
    /// Default: `Word`
    pub text_column: String,

    /// Name the sentiment model is stored under.
    ///
    /// Default: `sentiment_model`
    pub sentiment_model_name: String,

    /// Fraction of the sentiment corpus held out for evaluation.
    ///
    /// Must be in range `(0.0, 1.0)`. Default: 0.2
    pub test_size: f64,

    /// Random seed for the stratified split.
    ///
    /// Default: 42
    pub random_seed: u64,
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            models_dir: PathBuf::from(DEFAULT_MODELS_DIR),
            sentiment_data_dir: PathBuf::from(DEFAULT_SENTIMENT_DATA_DIR),
            positive_file: "positive.csv".to_string(),
            negative_file: "negative.csv".to_string(),
            text_column: "Word".to_string(),
            sentiment_model_name: DEFAULT_SENTIMENT_MODEL_NAME.to_string(),
            test_size: 0.2,
            random_seed: 42,
        }
    }
}

impl LearningConfig {
    /// Create a new configuration builder.
    pub fn builder() -> LearningConfigBuilder {
        LearningConfigBuilder::default()
    }

    /// Path of the positive word list.
    pub fn positive_path(&self) -> PathBuf {
        self.sentiment_data_dir.join(&self.positive_file)
    }

    /// Path of the negative word list.
    pub fn negative_path(&self) -> PathBuf {
        self.sentiment_data_dir.join(&self.negative_file)
    }

    /// Check every field, returning the first problem found.
    pub fn validate(&self) -> Result<(), LearningError> {
        if self.test_size <= 0.0 || self.test_size >= 1.0 {
            return Err(LearningError::InvalidConfig(
                "test_size must be between 0.0 and 1.0 (exclusive)".to_string(),
            ));
        }

        for (field, value) in [
            ("positive_file", &self.positive_file),
            ("negative_file", &self.negative_file),
            ("text_column", &self.text_column),
            ("sentiment_model_name", &self.sentiment_model_name),
        ] {
            if value.trim().is_empty() {
                return Err(LearningError::InvalidConfig(format!(
                    "{field} must not be empty"
                )));
            }
        }

        Ok(())
    }
}

/// Builder for [`LearningConfig`].
#[derive(Debug, Default)]
pub struct LearningConfigBuilder {
    config: LearningConfig,
}

impl LearningConfigBuilder {
    /// Set the model artifact directory.
    pub fn models_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.models_dir = dir.into();
        self
    }

    /// Set the directory containing the sentiment word lists.
    pub fn sentiment_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.sentiment_data_dir = dir.into();
        self
    }

    /// Set the positive and negative list file names.
    pub fn sentiment_files(
        mut self,
        positive: impl Into<String>,
        negative: impl Into<String>,
    ) -> Self {
        self.config.positive_file = positive.into();
        self.config.negative_file = negative.into();
        self
    }

    /// Set the text column name.
    pub fn text_column(mut self, column: impl Into<String>) -> Self {
        self.config.text_column = column.into();
        self
    }

    /// Set the artifact name of the sentiment model.
    pub fn sentiment_model_name(mut self, name: impl Into<String>) -> Self {
        self.config.sentiment_model_name = name.into();
        self
    }

    /// Set the held-out fraction for the sentiment corpus.
    pub fn test_size(mut self, size: f64) -> Self {
        self.config.test_size = size;
        self
    }

    /// Set the random seed.
    pub fn random_seed(mut self, seed: u64) -> Self {
        self.config.random_seed = seed;
        self
    }

    /// Build the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`LearningError::InvalidConfig`] if:
    /// - `test_size` is not in range `(0.0, 1.0)`
    /// - a file, column or model name is empty
    pub fn build(self) -> Result<LearningConfig, LearningError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LearningConfig::default();
        assert_eq!(config.models_dir, PathBuf::from("models"));
        assert_eq!(
            config.positive_path(),
            PathBuf::from("data/sentiment_data/positive.csv")
        );
        assert_eq!(
            config.negative_path(),
            PathBuf::from("data/sentiment_data/negative.csv")
        );
        assert_eq!(config.text_column, "Word");
        assert_eq!(config.sentiment_model_name, "sentiment_model");
    }

    #[test]
    fn test_builder() {
        let config = LearningConfig::builder()
            .models_dir("/tmp/models")
            .sentiment_files("pos.csv", "neg.csv")
            .text_column("text")
            .random_seed(7)
            .build()
            .unwrap();

        assert_eq!(config.models_dir, PathBuf::from("/tmp/models"));
        assert!(config.positive_path().ends_with("pos.csv"));
        assert_eq!(config.text_column, "text");
        assert_eq!(config.random_seed, 7);
    }

    #[test]
    fn test_invalid_test_size() {
        for size in [0.0, 1.0, -0.1, 1.5] {
            let result = LearningConfig::builder().test_size(size).build();
            assert!(result.unwrap_err().to_string().contains("test_size"));
        }
    }

    #[test]
    fn test_empty_names_rejected() {
        let result = LearningConfig::builder().text_column(" ").build();
        assert!(result.unwrap_err().to_string().contains("text_column"));

        let result = LearningConfig::builder().sentiment_model_name("").build();
        assert!(result.is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: LearningConfig = serde_json::from_str(r#"{"models_dir": "out"}"#).unwrap();
        assert_eq!(config.models_dir, PathBuf::from("out"));
        assert_eq!(config.test_size, 0.2);
    }
}
