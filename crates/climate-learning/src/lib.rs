//! climate-learning: regression training, evaluation and text sentiment
//! classification for climate data.
//!
//! This crate picks up where `climate-processing` stops: it takes a prepared
//! train/test split, fits a regression model, evaluates it on the held-out
//! rows and stores it by name. A separate pipeline classifies short
//! statements as positive or negative.
//!
//! # Features
//!
//! - **Regression models**: ordinary least squares and random forests,
//!   selected through a closed [`ModelSpec`]
//! - **Evaluation**: RMSE/MSE/MAE/R², classification reports and
//!   actual-vs-predicted data
//! - **Model store**: named JSON artifacts under a models directory
//! - **Sentiment**: TF-IDF over unigrams and bigrams with logistic
//!   regression, bundled into one [`SentimentModel`]
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use climate_learning::{ModelSpec, ModelStore, evaluation, trainer};
//! use climate_processing::{DatasetLoader, ProcessingConfig, features, preprocess};
//!
//! let config = ProcessingConfig::default();
//! let df = DatasetLoader::new(&config).load(None)?;
//! let df = features::encode_categorical(&features::impute(&df, features::ImputeStrategy::Mean)?)?;
//! let prepared = preprocess::prepare_with_config(&df, &config)?;
//!
//! let spec = ModelSpec::from_kind("Random Forest".parse()?);
//! let model = trainer::train_prepared(&prepared, &spec)?;
//! let (_, metrics) = evaluation::evaluate_regression(&model, &prepared.x_test, &prepared.y_test)?;
//! println!("{metrics}");
//!
//! ModelStore::new("models").save(model.kind.artifact_name(), &model)?;
//! ```
//!
//! # Architecture
//!
//! ```text
//! DataFrame ──► PreparedData ──► trainer::train ──► TrainedModel ──► ModelStore
//!                                                        │
//!                                                        ▼
//!                                            evaluation::evaluate_regression
//!
//! word lists ──► sentiment::load_corpus ──► sentiment::train ──► SentimentModel
//! ```
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T>`] with [`LearningError`]:
//!
//! - [`LearningError::UnsupportedModel`] - Unknown model kind
//! - [`LearningError::InvalidData`] - Features or labels cannot be used
//! - [`LearningError::ModelNotFound`] - Nothing stored under a name
//! - [`LearningError::Processing`] - Errors from `climate-processing`
//!
//! See [`LearningError`] for the complete list.

pub mod config;
pub mod error;
pub mod estimators;
pub mod evaluation;
pub mod linalg;
pub mod model;
pub mod sentiment;
pub mod store;
pub mod text;
pub mod trainer;
pub mod types;

// Re-export public API
//
// Configuration types
pub use config::{LearningConfig, LearningConfigBuilder};

// Error types
pub use error::{ErrorKind, LearningError, Result};

// Model types
pub use model::{Estimator, TrainedModel};
pub use trainer::{LinearRegressionParams, ModelKind, ModelSpec, RandomForestParams};

// Storage
pub use store::ModelStore;

// Sentiment pipeline
pub use sentiment::{CorpusRow, Sentiment, SentimentModel, SentimentTraining};

// Result and metrics types
pub use types::{ActualVsPredicted, ClassMetrics, ClassificationReport, ModelInfo, RegressionMetrics};
