//! Model training.
//!
//! The trainer dispatches on a closed [`ModelSpec`]: each variant carries the
//! hyperparameters of its estimator, so the set of trainable models is checked
//! at compile time. Free-form model names (from a CLI or UI) go through
//! [`ModelKind::from_str`], which is the only place an unsupported kind can
//! appear.
//!
//! # Example
//!
//! ```rust,ignore
//! use climate_learning::trainer::{self, ModelKind, ModelSpec};
//!
//! let kind: ModelKind = "Random Forest".parse()?;
//! let model = trainer::train_prepared(&prepared, &ModelSpec::from_kind(kind))?;
//! ```

use crate::error::{LearningError, Result};
use crate::estimators::{LinearRegression, RandomForestRegressor, Regressor, TreeParams};
use crate::linalg::{column_names, frame_to_matrix};
use crate::model::{Estimator, TrainedModel};
use chrono::Utc;
use climate_processing::PreparedData;
use ndarray::Array1;
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::info;

// =============================================================================
// Model kinds
// =============================================================================

/// Supported regression model families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    LinearRegression,
    RandomForest,
}

impl ModelKind {
    /// All supported kinds.
    pub const ALL: [ModelKind; 2] = [ModelKind::LinearRegression, ModelKind::RandomForest];

    /// Name the trained model is stored under.
    pub fn artifact_name(&self) -> &'static str {
        match self {
            ModelKind::LinearRegression => "linear_regression",
            ModelKind::RandomForest => "random_forest",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelKind::LinearRegression => write!(f, "Linear Regression"),
            ModelKind::RandomForest => write!(f, "Random Forest"),
        }
    }
}

impl FromStr for ModelKind {
    type Err = LearningError;

    /// Accepts display names and artifact names, case-insensitively.
    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_lowercase().replace(['_', '-'], " ");
        match normalized.as_str() {
            "linear regression" => Ok(ModelKind::LinearRegression),
            "random forest" => Ok(ModelKind::RandomForest),
            _ => Err(LearningError::UnsupportedModel(s.to_string())),
        }
    }
}

// =============================================================================
// Hyperparameters
// =============================================================================

/// Hyperparameters for [`ModelKind::LinearRegression`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinearRegressionParams {
    pub fit_intercept: bool,
}

impl Default for LinearRegressionParams {
    fn default() -> Self {
        Self {
            fit_intercept: true,
        }
    }
}

/// Hyperparameters for [`ModelKind::RandomForest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RandomForestParams {
    /// Number of trees.
    ///
    /// Default: 100
    pub n_estimators: usize,

    /// Maximum tree depth; `None` grows until leaves are pure.
    pub max_depth: Option<usize>,

    /// Minimum samples required to split a node.
    ///
    /// Default: 2
    pub min_samples_split: usize,

    /// Minimum samples in each leaf.
    ///
    /// Default: 1
    pub min_samples_leaf: usize,

    /// Seed for bootstrap sampling.
    ///
    /// Default: 42
    pub random_state: u64,
}

impl Default for RandomForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            random_state: 42,
        }
    }
}

/// A model kind together with its hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum ModelSpec {
    LinearRegression(LinearRegressionParams),
    RandomForest(RandomForestParams),
}

impl Default for ModelSpec {
    fn default() -> Self {
        ModelSpec::LinearRegression(LinearRegressionParams::default())
    }
}

impl ModelSpec {
    /// Default hyperparameters for `kind`.
    pub fn from_kind(kind: ModelKind) -> Self {
        match kind {
            ModelKind::LinearRegression => {
                ModelSpec::LinearRegression(LinearRegressionParams::default())
            }
            ModelKind::RandomForest => ModelSpec::RandomForest(RandomForestParams::default()),
        }
    }

    /// The family this spec trains.
    pub fn kind(&self) -> ModelKind {
        match self {
            ModelSpec::LinearRegression(_) => ModelKind::LinearRegression,
            ModelSpec::RandomForest(_) => ModelKind::RandomForest,
        }
    }

    /// Check hyperparameter ranges.
    pub fn validate(&self) -> Result<()> {
        if let ModelSpec::RandomForest(params) = self {
            if params.n_estimators == 0 {
                return Err(LearningError::InvalidConfig(
                    "n_estimators must be at least 1".to_string(),
                ));
            }
            if params.max_depth == Some(0) {
                return Err(LearningError::InvalidConfig(
                    "max_depth must be at least 1".to_string(),
                ));
            }
            if params.min_samples_split < 2 {
                return Err(LearningError::InvalidConfig(
                    "min_samples_split must be at least 2".to_string(),
                ));
            }
            if params.min_samples_leaf == 0 {
                return Err(LearningError::InvalidConfig(
                    "min_samples_leaf must be at least 1".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Hyperparameters as a JSON object, for reporting and storage.
    pub fn hyperparameters(&self) -> serde_json::Map<String, serde_json::Value> {
        let value = match self {
            ModelSpec::LinearRegression(params) => serde_json::to_value(params),
            ModelSpec::RandomForest(params) => serde_json::to_value(params),
        };
        match value {
            Ok(serde_json::Value::Object(map)) => map,
            _ => serde_json::Map::new(),
        }
    }

    fn build_estimator(&self) -> Estimator {
        match self {
            ModelSpec::LinearRegression(params) => Estimator::Linear(
                LinearRegression::new().with_fit_intercept(params.fit_intercept),
            ),
            ModelSpec::RandomForest(params) => Estimator::Forest(
                RandomForestRegressor::new(params.n_estimators)
                    .with_tree_params(TreeParams {
                        max_depth: params.max_depth,
                        min_samples_split: params.min_samples_split,
                        min_samples_leaf: params.min_samples_leaf,
                    })
                    .with_random_state(params.random_state),
            ),
        }
    }
}

// =============================================================================
// Training
// =============================================================================

/// Fit the model described by `spec` on every column of `x_train`.
///
/// Each call is independent; nothing is retained between calls.
///
/// # Errors
///
/// - [`LearningError::InvalidConfig`] for out-of-range hyperparameters
/// - [`LearningError::InvalidData`] for non-numeric or null features, or a
///   target whose length differs from the row count
/// - [`LearningError::TrainingFailed`] if the estimator cannot be fitted
pub fn train(
    x_train: &DataFrame,
    y_train: &[f64],
    target_column: &str,
    spec: &ModelSpec,
) -> Result<TrainedModel> {
    spec.validate()?;

    let feature_names = column_names(x_train);
    let x = frame_to_matrix(x_train, &feature_names)?;
    let y = Array1::from_vec(y_train.to_vec());

    info!(
        "Training {} on {} rows, {} features (target '{}')",
        spec.kind(),
        x.nrows(),
        x.ncols(),
        target_column
    );

    let mut estimator = spec.build_estimator();
    estimator.fit(&x, &y)?;

    info!("Finished training {}", spec.kind());

    Ok(TrainedModel {
        kind: spec.kind(),
        feature_names,
        target_column: target_column.to_string(),
        estimator,
        scaler: None,
        split: None,
        hyperparameters: spec.hyperparameters(),
        trained_at: Utc::now(),
    })
}

/// Train on the training partition of `data`, bundling its fitted scaler
/// and the settings of its split.
pub fn train_prepared(data: &PreparedData, spec: &ModelSpec) -> Result<TrainedModel> {
    let mut model = train(&data.x_train, &data.y_train, &data.target, spec)?;
    model.scaler = Some(data.scaler.clone());
    model.split = Some(data.settings);
    Ok(model)
}
