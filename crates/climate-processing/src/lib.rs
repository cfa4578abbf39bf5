//! Climate Dataset Processing Library
//!
//! Loading, feature engineering and train/test preparation for tabular
//! climate data, built on Polars.
//!
//! # Overview
//!
//! - **Loading**: CSV datasets with year normalisation and an explicit,
//!   caller-owned [`DatasetCache`]
//! - **Feature engineering**: imputation, one-hot encoding, interaction
//!   terms, binning and log/sqrt transformations, each returning a new frame
//! - **Preparation**: seeded train/test splits and a [`StandardScaler`]
//!   fitted on the training partition only
//! - **Exploration**: summary statistics, missing counts and correlations
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use climate_processing::{DatasetLoader, ProcessingConfig, features, preprocess};
//!
//! let config = ProcessingConfig::default();
//! let df = DatasetLoader::new(&config).load(None)?;
//!
//! let df = features::impute(&df, features::ImputeStrategy::Median)?;
//! let df = features::encode_categorical(&df)?;
//!
//! let prepared = preprocess::prepare_with_config(&df, &config)?;
//! println!("{} training rows", prepared.x_train.height());
//! ```
//!
//! # Error Handling
//!
//! All operations return [`Result<T>`] with [`ProcessingError`]. Each error
//! carries a stable [`error_code`](ProcessingError::error_code) and an
//! [`ErrorKind`] family for presentation.

pub mod config;
pub mod error;
pub mod explore;
pub mod features;
pub mod loader;
pub mod preprocess;
pub mod utils;

pub use config::{ConfigValidationError, ProcessingConfig, ProcessingConfigBuilder};
pub use error::{ErrorKind, ProcessingError, Result, ResultExt};
pub use features::{FeatureStep, ImputeStrategy, Transformation, apply_steps};
pub use loader::{DatasetCache, DatasetLoader, read_csv};
pub use preprocess::{
    PreparedData, SplitSettings, StandardScaler, TrainTestSplit, prepare, prepare_with_config,
};

// Re-export polars for convenience
pub use polars;
