//! Fitted model artifacts for inference and persistence.
//!
//! A [`TrainedModel`] is produced by [`train`](crate::trainer::train) and is
//! immutable afterwards. It carries everything inference needs:
//!
//! - the fitted [`Estimator`]
//! - the ordered feature names the estimator was fitted on
//! - optionally the [`StandardScaler`] fitted on the training partition, so
//!   unscaled frames can be fed to [`predict_raw()`](TrainedModel::predict_raw)
//!
//! # Example
//!
//! ```rust,ignore
//! use climate_learning::{ModelStore, TrainedModel};
//!
//! let store = ModelStore::new("models");
//! let model: TrainedModel = store.load("random_forest")?;
//!
//! let predictions = model.predict(&prepared.x_test)?;
//! for (feature, importance) in model.feature_importance().iter().take(5) {
//!     println!("{feature}: {importance:.3}");
//! }
//! ```
//!
//! # Serialization
//!
//! Models serialize with serde; [`ModelStore`](crate::store::ModelStore)
//! stores them as JSON. The format is only meant to be read back by this
//! crate.

use crate::error::{LearningError, Result};
use crate::estimators::{LinearRegression, RandomForestRegressor, Regressor};
use crate::linalg::frame_to_matrix;
use crate::trainer::ModelKind;
use crate::types::ModelInfo;
use chrono::{DateTime, Utc};
use climate_processing::{SplitSettings, StandardScaler};
use ndarray::{Array1, Array2};
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};

/// A fitted regression estimator of one of the supported kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Estimator {
    Linear(LinearRegression),
    Forest(RandomForestRegressor),
}

impl Estimator {
    fn as_regressor(&self) -> &dyn Regressor {
        match self {
            Estimator::Linear(model) => model,
            Estimator::Forest(model) => model,
        }
    }
}

impl Regressor for Estimator {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        match self {
            Estimator::Linear(model) => model.fit(x, y),
            Estimator::Forest(model) => model.fit(x, y),
        }
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        self.as_regressor().predict(x)
    }

    fn feature_importance(&self) -> Option<Array1<f64>> {
        self.as_regressor().feature_importance()
    }
}

/// A trained regression model ready for inference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedModel {
    /// Which estimator family this is.
    pub kind: ModelKind,

    /// Feature columns, in the order the estimator expects them.
    pub feature_names: Vec<String>,

    /// Column the model predicts.
    pub target_column: String,

    /// The fitted estimator.
    pub estimator: Estimator,

    /// Scaler fitted on the training partition, when the features were scaled.
    pub scaler: Option<StandardScaler>,

    /// Test fraction and seed of the split the model was trained on, so
    /// evaluation can hold out the same rows.
    #[serde(default)]
    pub split: Option<SplitSettings>,

    /// Hyperparameters the model was trained with.
    pub hyperparameters: serde_json::Map<String, serde_json::Value>,

    /// When training finished.
    pub trained_at: DateTime<Utc>,
}

impl TrainedModel {
    /// Predict one value per row of `df`.
    ///
    /// `df` must already be preprocessed the same way as the training
    /// features (encoded, imputed and scaled). Extra columns are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`LearningError::InvalidData`] if a feature column is missing,
    /// non-numeric or contains nulls.
    pub fn predict(&self, df: &DataFrame) -> Result<Vec<f64>> {
        let x = frame_to_matrix(df, &self.feature_names)?;
        Ok(self.predict_matrix(&x)?.to_vec())
    }

    /// Predict from unscaled features, applying the bundled scaler first.
    ///
    /// Behaves like [`predict()`](Self::predict) when no scaler is bundled.
    pub fn predict_raw(&self, df: &DataFrame) -> Result<Vec<f64>> {
        match &self.scaler {
            Some(scaler) => self.predict(&scaler.transform(df)?),
            None => self.predict(df),
        }
    }

    /// Predict from a matrix whose columns follow [`feature_names`](Self::feature_names).
    pub fn predict_matrix(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if x.ncols() != self.feature_names.len() {
            return Err(LearningError::InferenceError(format!(
                "expected {} features, got {}",
                self.feature_names.len(),
                x.ncols()
            )));
        }
        self.estimator.predict(x)
    }

    /// Feature importances paired with their names, most important first.
    ///
    /// Forests report impurity-based importances; linear models report the
    /// normalised absolute coefficients. Empty if the estimator has none.
    pub fn feature_importance(&self) -> Vec<(String, f64)> {
        let Some(importance) = self.estimator.feature_importance() else {
            return Vec::new();
        };

        let mut pairs: Vec<(String, f64)> = self
            .feature_names
            .iter()
            .cloned()
            .zip(importance.iter().copied())
            .collect();
        pairs.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        pairs
    }

    /// Summary of this model as stored under `name`.
    pub fn info(&self, name: &str) -> ModelInfo {
        ModelInfo {
            name: name.to_string(),
            model_type: self.kind.to_string(),
            target_column: self.target_column.clone(),
            n_features: self.feature_names.len(),
            trained_at: self.trained_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trainer::{ModelSpec, RandomForestParams, train};
    use polars::prelude::*;

    fn features() -> DataFrame {
        df![
            "rain" => [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0],
            "humidity" => [50.0, 40.0, 55.0, 45.0, 60.0, 52.0, 48.0, 58.0],
        ]
        .unwrap()
    }

    fn target() -> Vec<f64> {
        vec![3.0, 5.0, 7.0, 9.0, 11.0, 13.0, 15.0, 17.0]
    }

    #[test]
    fn test_predict_selects_columns_by_name() {
        let model = train(&features(), &target(), "temp", &ModelSpec::default()).unwrap();

        let reordered = features().select(["humidity", "rain"]).unwrap();
        let a = model.predict(&features()).unwrap();
        let b = model.predict(&reordered).unwrap();
        assert_eq!(a, b);
        assert!((a[0] - 3.0).abs() < 1e-8);
    }

    #[test]
    fn test_missing_feature_is_invalid_data() {
        let model = train(&features(), &target(), "temp", &ModelSpec::default()).unwrap();
        let partial = features().select(["rain"]).unwrap();

        let err = model.predict(&partial).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_DATA");
        assert!(err.to_string().contains("humidity"));
    }

    #[test]
    fn test_forest_importance_is_sorted() {
        let spec = ModelSpec::RandomForest(RandomForestParams {
            n_estimators: 10,
            ..RandomForestParams::default()
        });
        let model = train(&features(), &target(), "temp", &spec).unwrap();

        let importance = model.feature_importance();
        assert_eq!(importance.len(), 2);
        assert_eq!(importance[0].0, "rain");
        assert!(importance[0].1 >= importance[1].1);
    }

    #[test]
    fn test_info() {
        let model = train(&features(), &target(), "temp", &ModelSpec::default()).unwrap();
        let info = model.info("linear_regression");
        assert_eq!(info.model_type, "Linear Regression");
        assert_eq!(info.target_column, "temp");
        assert_eq!(info.n_features, 2);
    }
}
