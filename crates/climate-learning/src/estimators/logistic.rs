//! Binary logistic regression over sparse feature rows.

use crate::error::{LearningError, Result};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Sparse row: `(feature index, value)` pairs with distinct indices.
pub type SparseRow = Vec<(usize, f64)>;

/// Scores at or below this are treated as the negative class.
pub const DECISION_TOLERANCE: f64 = 1e-9;

/// L2-regularised logistic regression trained by full-batch gradient descent.
///
/// Minimises the mean log-loss plus `‖w‖² / (2·C·n)`; the intercept is not
/// penalised.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    /// Inverse regularisation strength
    pub c: f64,
    pub max_iter: usize,
    /// Stop when the gradient norm falls below this
    pub tol: f64,
    pub learning_rate: f64,
    coefficients: Option<Array1<f64>>,
    intercept: f64,
    n_iter: usize,
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self::new()
    }
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

fn sparse_dot(row: &[(usize, f64)], weights: &Array1<f64>) -> f64 {
    row.iter().map(|&(j, v)| weights[j] * v).sum()
}

impl LogisticRegression {
    pub fn new() -> Self {
        Self {
            c: 1.0,
            max_iter: 1000,
            tol: 1e-6,
            learning_rate: 1.0,
            coefficients: None,
            intercept: 0.0,
            n_iter: 0,
        }
    }

    pub fn with_c(mut self, c: f64) -> Self {
        self.c = c;
        self
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn coefficients(&self) -> Option<&Array1<f64>> {
        self.coefficients.as_ref()
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// Iterations run by the last fit.
    pub fn n_iter(&self) -> usize {
        self.n_iter
    }

    /// Fit on `rows` with labels in {0, 1}; features are indexed `0..n_features`.
    pub fn fit(&mut self, rows: &[SparseRow], y: &[u8], n_features: usize) -> Result<()> {
        if rows.len() != y.len() {
            return Err(LearningError::InvalidData(format!(
                "{} rows but {} labels",
                rows.len(),
                y.len()
            )));
        }
        if rows.is_empty() {
            return Err(LearningError::InvalidData("no training rows".to_string()));
        }
        if y.iter().any(|&label| label > 1) {
            return Err(LearningError::InvalidData(
                "labels must be 0 or 1".to_string(),
            ));
        }
        if self.c <= 0.0 {
            return Err(LearningError::InvalidConfig("C must be positive".to_string()));
        }
        if let Some(j) = rows.iter().flatten().map(|&(j, _)| j).find(|&j| j >= n_features) {
            return Err(LearningError::InvalidData(format!(
                "feature index {j} out of range for {n_features} features"
            )));
        }

        let n = rows.len() as f64;
        let l2 = 1.0 / (self.c * n);
        let mut weights = Array1::zeros(n_features);
        let mut bias = 0.0;
        let mut iterations = 0;

        for _ in 0..self.max_iter {
            iterations += 1;
            let mut grad_w = &weights * l2;
            let mut grad_b = 0.0;

            for (row, &label) in rows.iter().zip(y) {
                let error = sigmoid(sparse_dot(row, &weights) + bias) - f64::from(label);
                for &(j, v) in row {
                    grad_w[j] += error * v / n;
                }
                grad_b += error / n;
            }

            let grad_norm = (grad_w.mapv(|g| g * g).sum() + grad_b * grad_b).sqrt();
            if grad_norm < self.tol {
                break;
            }

            weights.scaled_add(-self.learning_rate, &grad_w);
            bias -= self.learning_rate * grad_b;
        }

        self.coefficients = Some(weights);
        self.intercept = bias;
        self.n_iter = iterations;
        Ok(())
    }

    /// Raw score `w·x + b` for one row.
    pub fn decision_function(&self, row: &[(usize, f64)]) -> Result<f64> {
        let weights = self
            .coefficients
            .as_ref()
            .ok_or_else(|| LearningError::InferenceError("model is not fitted".to_string()))?;
        if row.iter().any(|&(j, _)| j >= weights.len()) {
            return Err(LearningError::InferenceError(
                "feature index out of range".to_string(),
            ));
        }
        Ok(sparse_dot(row, weights) + self.intercept)
    }

    /// Probability of the positive class.
    pub fn predict_proba(&self, row: &[(usize, f64)]) -> Result<f64> {
        Ok(sigmoid(self.decision_function(row)?))
    }

    /// Predicted label; a score within the tolerance of zero is negative.
    pub fn predict(&self, row: &[(usize, f64)]) -> Result<u8> {
        Ok(u8::from(self.decision_function(row)? > DECISION_TOLERANCE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_separable_features() {
        let rows = vec![
            vec![(0, 1.0)],
            vec![(0, 1.0)],
            vec![(1, 1.0)],
            vec![(1, 1.0)],
        ];
        let y = vec![1, 1, 0, 0];

        let mut model = LogisticRegression::new();
        model.fit(&rows, &y, 2).unwrap();

        assert_eq!(model.predict(&[(0, 1.0)]).unwrap(), 1);
        assert_eq!(model.predict(&[(1, 1.0)]).unwrap(), 0);
        assert!(model.predict_proba(&[(0, 1.0)]).unwrap() > 0.5);
        let coef = model.coefficients().unwrap();
        assert!(coef[0] > 0.0 && coef[1] < 0.0);
    }

    #[test]
    fn test_balanced_empty_row_is_negative() {
        let rows = vec![vec![(0, 1.0)], vec![(1, 1.0)]];
        let mut model = LogisticRegression::new();
        model.fit(&rows, &[1, 0], 3).unwrap();

        assert!(model.intercept().abs() < DECISION_TOLERANCE);
        assert_eq!(model.predict(&[]).unwrap(), 0);
        assert_eq!(model.predict(&[(2, 1.0)]).unwrap(), 0);
    }

    #[test]
    fn test_regularisation_shrinks_weights() {
        let rows = vec![vec![(0, 1.0)], vec![(1, 1.0)]];
        let mut loose = LogisticRegression::new().with_c(100.0);
        let mut tight = LogisticRegression::new().with_c(0.01);
        loose.fit(&rows, &[1, 0], 2).unwrap();
        tight.fit(&rows, &[1, 0], 2).unwrap();

        assert!(loose.coefficients().unwrap()[0] > tight.coefficients().unwrap()[0]);
    }

    #[test]
    fn test_invalid_inputs() {
        let mut model = LogisticRegression::new();
        assert!(model.fit(&[vec![(0, 1.0)]], &[2], 1).is_err());
        assert!(model.fit(&[vec![(5, 1.0)]], &[1], 1).is_err());
        assert!(model.fit(&[], &[], 1).is_err());
        assert!(LogisticRegression::new().predict(&[]).is_err());
    }
}
