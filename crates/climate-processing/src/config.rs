//! Configuration for dataset loading and train/test preparation.
//!
//! Use [`ProcessingConfig::builder()`] for a validated configuration.
//!
//! ```rust,ignore
//! use climate_processing::ProcessingConfig;
//!
//! let config = ProcessingConfig::builder()
//!     .data_path("data/processed_data.csv")
//!     .target_column("avg_max_temp")
//!     .test_size(0.25)
//!     .build()?;
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default dataset location, relative to the working directory.
pub const DEFAULT_DATA_PATH: &str = "data/processed_data.csv";

/// Default supervised-learning target.
pub const DEFAULT_TARGET_COLUMN: &str = "avg_max_temp";

/// Column normalised to integers on load.
pub const DEFAULT_YEAR_COLUMN: &str = "year";

/// Default held-out fraction.
pub const DEFAULT_TEST_SIZE: f64 = 0.2;

/// Default seed for every random decision in the pipeline.
pub const DEFAULT_RANDOM_SEED: u64 = 42;

/// Configuration for the processing side of the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingConfig {
    /// Dataset used when no explicit path is given.
    /// Default: "data/processed_data.csv"
    pub data_path: PathBuf,

    /// Column cast to integer on load, if present.
    /// Default: "year"
    pub year_column: String,

    /// Target column for supervised learning.
    /// Default: "avg_max_temp"
    pub target_column: String,

    /// Fraction of rows held out for testing, exclusive range (0.0, 1.0).
    /// Default: 0.2
    pub test_size: f64,

    /// Seed for the train/test shuffle.
    /// Default: 42
    pub random_seed: u64,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            year_column: DEFAULT_YEAR_COLUMN.to_string(),
            target_column: DEFAULT_TARGET_COLUMN.to_string(),
            test_size: DEFAULT_TEST_SIZE,
            random_seed: DEFAULT_RANDOM_SEED,
        }
    }
}

impl ProcessingConfig {
    /// Create a new configuration builder.
    pub fn builder() -> ProcessingConfigBuilder {
        ProcessingConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(ConfigValidationError::InvalidTestSize(self.test_size));
        }

        if self.target_column.trim().is_empty() {
            return Err(ConfigValidationError::EmptyField("target_column"));
        }

        if self.year_column.trim().is_empty() {
            return Err(ConfigValidationError::EmptyField("year_column"));
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid test size: {0} (must be strictly between 0.0 and 1.0)")]
    InvalidTestSize(f64),

    #[error("Field '{0}' must not be empty")]
    EmptyField(&'static str),
}

/// Builder for [`ProcessingConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct ProcessingConfigBuilder {
    data_path: Option<PathBuf>,
    year_column: Option<String>,
    target_column: Option<String>,
    test_size: Option<f64>,
    random_seed: Option<u64>,
}

impl ProcessingConfigBuilder {
    /// Set the default dataset path.
    pub fn data_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_path = Some(path.into());
        self
    }

    /// Set the column normalised to integers on load.
    pub fn year_column(mut self, column: impl Into<String>) -> Self {
        self.year_column = Some(column.into());
        self
    }

    /// Set the target column.
    pub fn target_column(mut self, column: impl Into<String>) -> Self {
        self.target_column = Some(column.into());
        self
    }

    /// Set the held-out fraction.
    ///
    /// # Arguments
    /// * `test_size` - Value strictly between 0.0 and 1.0 (e.g., 0.2 = 20%)
    pub fn test_size(mut self, test_size: f64) -> Self {
        self.test_size = Some(test_size);
        self
    }

    /// Set the shuffle seed.
    pub fn random_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `ProcessingConfig` or an error if validation fails.
    pub fn build(self) -> Result<ProcessingConfig, ConfigValidationError> {
        let config = ProcessingConfig {
            data_path: self
                .data_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_PATH)),
            year_column: self
                .year_column
                .unwrap_or_else(|| DEFAULT_YEAR_COLUMN.to_string()),
            target_column: self
                .target_column
                .unwrap_or_else(|| DEFAULT_TARGET_COLUMN.to_string()),
            test_size: self.test_size.unwrap_or(DEFAULT_TEST_SIZE),
            random_seed: self.random_seed.unwrap_or(DEFAULT_RANDOM_SEED),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ProcessingConfig::default();
        assert_eq!(config.data_path, PathBuf::from("data/processed_data.csv"));
        assert_eq!(config.target_column, "avg_max_temp");
        assert_eq!(config.year_column, "year");
        assert_eq!(config.test_size, 0.2);
        assert_eq!(config.random_seed, 42);
    }

    #[test]
    fn test_builder_custom_values() {
        let config = ProcessingConfig::builder()
            .data_path("other.csv")
            .target_column("precipitation")
            .test_size(0.3)
            .random_seed(7)
            .build()
            .unwrap();

        assert_eq!(config.data_path, PathBuf::from("other.csv"));
        assert_eq!(config.target_column, "precipitation");
        assert_eq!(config.test_size, 0.3);
        assert_eq!(config.random_seed, 7);
    }

    #[test]
    fn test_validation_rejects_test_size_bounds() {
        for bad in [0.0, 1.0, -0.1, 1.5] {
            let result = ProcessingConfig::builder().test_size(bad).build();
            assert!(matches!(
                result,
                Err(ConfigValidationError::InvalidTestSize(_))
            ));
        }
    }

    #[test]
    fn test_validation_rejects_empty_target() {
        let result = ProcessingConfig::builder().target_column("  ").build();
        assert!(matches!(
            result,
            Err(ConfigValidationError::EmptyField("target_column"))
        ));
    }

    #[test]
    fn test_config_from_json() {
        let json = r#"{
            "data_path": "data/climate.csv",
            "year_column": "yr",
            "target_column": "avg_min_temp",
            "test_size": 0.25,
            "random_seed": 11
        }"#;

        let config: ProcessingConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.year_column, "yr");
        assert_eq!(config.target_column, "avg_min_temp");
        assert_eq!(config.test_size, 0.25);
        assert!(config.validate().is_ok());
    }
}
