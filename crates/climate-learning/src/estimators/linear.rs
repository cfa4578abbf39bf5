//! Ordinary least squares linear regression.

use super::{Regressor, check_shapes};
use crate::error::{LearningError, Result};
use crate::linalg::solve_least_squares;
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// Linear regression fitted by least squares on centred data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearRegression {
    /// Whether to fit an intercept
    pub fit_intercept: bool,
    coefficients: Option<Array1<f64>>,
    intercept: f64,
}

impl Default for LinearRegression {
    fn default() -> Self {
        Self::new()
    }
}

impl LinearRegression {
    pub fn new() -> Self {
        Self {
            fit_intercept: true,
            coefficients: None,
            intercept: 0.0,
        }
    }

    /// Enable/disable fitting intercept
    pub fn with_fit_intercept(mut self, fit_intercept: bool) -> Self {
        self.fit_intercept = fit_intercept;
        self
    }

    /// Fitted coefficients, one per feature.
    pub fn coefficients(&self) -> Option<&Array1<f64>> {
        self.coefficients.as_ref()
    }

    /// Fitted intercept (0.0 when not fitting one).
    pub fn intercept(&self) -> f64 {
        self.intercept
    }
}

impl Regressor for LinearRegression {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_shapes(x, y)?;

        let (x_fit, y_fit, offsets) = if self.fit_intercept {
            let x_mean = x
                .mean_axis(Axis(0))
                .ok_or_else(|| LearningError::InvalidData("no training rows".to_string()))?;
            let y_mean = y.mean().unwrap_or(0.0);
            let x_centered = x - &x_mean.view().insert_axis(Axis(0));
            let y_centered = y - y_mean;
            (x_centered, y_centered, Some((x_mean, y_mean)))
        } else {
            (x.clone(), y.clone(), None)
        };

        let coefficients = solve_least_squares(&x_fit, &y_fit).ok_or_else(|| {
            LearningError::TrainingFailed(
                "feature matrix is singular; remove duplicated columns".to_string(),
            )
        })?;

        self.intercept = match offsets {
            Some((x_mean, y_mean)) => y_mean - coefficients.dot(&x_mean),
            None => 0.0,
        };
        self.coefficients = Some(coefficients);
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let coefficients = self
            .coefficients
            .as_ref()
            .ok_or_else(|| LearningError::InferenceError("model is not fitted".to_string()))?;
        if x.ncols() != coefficients.len() {
            return Err(LearningError::InferenceError(format!(
                "expected {} features, got {}",
                coefficients.len(),
                x.ncols()
            )));
        }
        Ok(x.dot(coefficients) + self.intercept)
    }

    /// Absolute coefficients, normalised to sum to 1.
    fn feature_importance(&self) -> Option<Array1<f64>> {
        let abs = self.coefficients.as_ref()?.mapv(f64::abs);
        let total = abs.sum();
        Some(if total > 0.0 { abs / total } else { abs })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_fits_exact_line() {
        let x = array![[0.0], [1.0], [2.0], [3.0], [4.0]];
        let y = x.column(0).mapv(|v| 2.0 * v + 1.0);

        let mut model = LinearRegression::new();
        model.fit(&x, &y).unwrap();

        let coef = model.coefficients().unwrap();
        assert!((coef[0] - 2.0).abs() < 1e-10);
        assert!((model.intercept() - 1.0).abs() < 1e-10);

        let preds = model.predict(&array![[10.0]]).unwrap();
        assert!((preds[0] - 21.0).abs() < 1e-9);
    }

    #[test]
    fn test_without_intercept() {
        let x = array![[1.0], [2.0], [3.0]];
        let y = array![3.0, 6.0, 9.0];

        let mut model = LinearRegression::new().with_fit_intercept(false);
        model.fit(&x, &y).unwrap();
        assert_eq!(model.intercept(), 0.0);
        assert!((model.coefficients().unwrap()[0] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn test_unfitted_and_shape_errors() {
        let model = LinearRegression::new();
        assert!(model.predict(&array![[1.0]]).is_err());

        let mut model = LinearRegression::new();
        let err = model.fit(&array![[1.0], [2.0]], &array![1.0]).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_DATA");
    }

    #[test]
    fn test_constant_feature_gets_zero_coefficient() {
        let x = array![[5.0, 0.0], [5.0, 1.0], [5.0, 2.0], [5.0, 3.0]];
        let y = array![1.0, 3.0, 5.0, 7.0];

        let mut model = LinearRegression::new();
        model.fit(&x, &y).unwrap();

        let coef = model.coefficients().unwrap();
        assert_eq!(coef[0], 0.0);
        assert!((coef[1] - 2.0).abs() < 1e-10);
        assert!((model.intercept() - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_only_constant_features_predict_the_mean() {
        let x = array![[0.0], [0.0], [0.0], [0.0]];
        let y = array![1.0, 2.0, 3.0, 4.0];

        let mut model = LinearRegression::new();
        model.fit(&x, &y).unwrap();

        assert_eq!(model.coefficients().unwrap()[0], 0.0);
        let preds = model.predict(&array![[0.0], [7.0]]).unwrap();
        assert!((preds[0] - 2.5).abs() < 1e-12);
        assert!((preds[1] - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_feature_importance_normalised() {
        let x = array![[1.0, 0.0], [0.0, 1.0], [1.0, 1.0], [2.0, 3.0]];
        let y = x.column(0).mapv(|v| 3.0 * v) - x.column(1).mapv(|v| v);

        let mut model = LinearRegression::new();
        model.fit(&x, &y).unwrap();
        let importance = model.feature_importance().unwrap();
        assert!((importance.sum() - 1.0).abs() < 1e-12);
        assert!((importance[0] - 0.75).abs() < 1e-9);
    }
}
