//! Random forest regressor: bagged regression trees.

use super::tree::{DecisionTreeRegressor, TreeParams};
use super::{Regressor, check_shapes};
use crate::error::{LearningError, Result};
use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Ensemble of regression trees, each grown on a bootstrap sample.
///
/// Tree `t` draws its sample from `StdRng::seed_from_u64(random_state + t)`,
/// so a fixed `random_state` gives an identical forest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForestRegressor {
    pub n_estimators: usize,
    pub tree_params: TreeParams,
    pub bootstrap: bool,
    pub random_state: u64,
    trees: Vec<DecisionTreeRegressor>,
    feature_importances: Option<Array1<f64>>,
}

impl Default for RandomForestRegressor {
    fn default() -> Self {
        Self::new(100)
    }
}

impl RandomForestRegressor {
    pub fn new(n_estimators: usize) -> Self {
        Self {
            n_estimators,
            tree_params: TreeParams::default(),
            bootstrap: true,
            random_state: 42,
            trees: Vec::new(),
            feature_importances: None,
        }
    }

    pub fn with_tree_params(mut self, params: TreeParams) -> Self {
        self.tree_params = params;
        self
    }

    pub fn with_bootstrap(mut self, bootstrap: bool) -> Self {
        self.bootstrap = bootstrap;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    /// Fitted trees.
    pub fn trees(&self) -> &[DecisionTreeRegressor] {
        &self.trees
    }
}

impl Regressor for RandomForestRegressor {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_shapes(x, y)?;
        if self.n_estimators == 0 {
            return Err(LearningError::InvalidConfig(
                "n_estimators must be at least 1".to_string(),
            ));
        }

        let n_samples = x.nrows();
        let mut trees = Vec::with_capacity(self.n_estimators);
        let mut importances: Array1<f64> = Array1::zeros(x.ncols());

        for t in 0..self.n_estimators {
            let rows: Vec<usize> = if self.bootstrap {
                let mut rng = StdRng::seed_from_u64(self.random_state.wrapping_add(t as u64));
                (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect()
            } else {
                (0..n_samples).collect()
            };

            let mut tree = DecisionTreeRegressor::new(self.tree_params);
            tree.fit_rows(x, y, &rows)?;
            if let Some(imp) = tree.feature_importance() {
                importances += &imp;
            }
            trees.push(tree);
        }

        let total = importances.sum();
        if total > 0.0 {
            importances /= total;
        }

        debug!(
            "Fitted random forest: {} trees, {} samples, {} features",
            trees.len(),
            n_samples,
            x.ncols()
        );
        self.trees = trees;
        self.feature_importances = Some(importances);
        Ok(())
    }

    /// Mean of the trees' predictions.
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.trees.is_empty() {
            return Err(LearningError::InferenceError("model is not fitted".to_string()));
        }

        let mut sum: Array1<f64> = Array1::zeros(x.nrows());
        for tree in &self.trees {
            sum += &tree.predict(x)?;
        }
        Ok(sum / self.trees.len() as f64)
    }

    fn feature_importance(&self) -> Option<Array1<f64>> {
        self.feature_importances.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn data() -> (Array2<f64>, Array1<f64>) {
        let x = Array2::from_shape_fn((40, 2), |(i, j)| if j == 0 { i as f64 } else { (i % 3) as f64 });
        let y = x.column(0).mapv(|v| if v < 20.0 { 1.0 } else { 5.0 });
        (x, y)
    }

    #[test]
    fn test_forest_learns_step() {
        let (x, y) = data();
        let mut forest = RandomForestRegressor::new(10);
        forest.fit(&x, &y).unwrap();

        assert_eq!(forest.trees().len(), 10);
        let preds = forest.predict(&array![[2.0, 0.0], [35.0, 1.0]]).unwrap();
        assert!((preds[0] - 1.0).abs() < 0.5);
        assert!((preds[1] - 5.0).abs() < 0.5);

        let importance = forest.feature_importance().unwrap();
        assert!(importance[0] > importance[1]);
        assert!((importance.sum() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_same_seed_same_forest() {
        let (x, y) = data();
        let mut a = RandomForestRegressor::new(5).with_random_state(7);
        let mut b = RandomForestRegressor::new(5).with_random_state(7);
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();

        assert_eq!(a, b);
    }

    #[test]
    fn test_without_bootstrap_trees_agree() {
        let (x, y) = data();
        let mut forest = RandomForestRegressor::new(3).with_bootstrap(false);
        forest.fit(&x, &y).unwrap();

        assert_eq!(forest.predict(&x).unwrap(), y);
    }

    #[test]
    fn test_zero_trees_rejected() {
        let (x, y) = data();
        let mut forest = RandomForestRegressor::new(0);
        assert_eq!(forest.fit(&x, &y).unwrap_err().error_code(), "INVALID_CONFIG");
    }

    #[test]
    fn test_unfitted_predict_fails() {
        let forest = RandomForestRegressor::default();
        assert!(forest.predict(&array![[1.0, 2.0]]).is_err());
    }
}
