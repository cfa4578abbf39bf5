//! Estimators implemented on `ndarray`.
//!
//! - [`LinearRegression`]: ordinary least squares
//! - [`DecisionTreeRegressor`] / [`RandomForestRegressor`]: variance-reduction trees
//! - [`LogisticRegression`]: binary classifier over sparse rows, used by the
//!   sentiment pipeline

mod forest;
mod linear;
mod logistic;
mod tree;

pub use forest::RandomForestRegressor;
pub use linear::LinearRegression;
pub use logistic::{DECISION_TOLERANCE, LogisticRegression, SparseRow};
pub use tree::{DecisionTreeRegressor, TreeNode, TreeParams};

use crate::error::{LearningError, Result};
use ndarray::{Array1, Array2};

/// A regression estimator over dense feature matrices.
pub trait Regressor {
    /// Fit on `x` (rows are samples) and targets `y`.
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()>;

    /// Predict one value per row of `x`.
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>>;

    /// Relative importance of each feature, summing to 1 when defined.
    fn feature_importance(&self) -> Option<Array1<f64>>;
}

pub(crate) fn check_shapes(x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
    if x.nrows() != y.len() {
        return Err(LearningError::InvalidData(format!(
            "feature matrix has {} rows but target has {} values",
            x.nrows(),
            y.len()
        )));
    }
    if x.nrows() == 0 {
        return Err(LearningError::InvalidData("no training rows".to_string()));
    }
    if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
        return Err(LearningError::InvalidData(
            "features and target must be finite".to_string(),
        ));
    }
    Ok(())
}
