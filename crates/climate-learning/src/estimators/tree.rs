//! Regression tree using variance reduction (MSE criterion).

use super::{Regressor, check_shapes};
use crate::error::{LearningError, Result};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Tree node. Children are indices into the tree's node arena.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TreeNode {
    Leaf {
        value: f64,
        n_samples: usize,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
        n_samples: usize,
    },
}

/// Growth limits shared by trees and forests.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TreeParams {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
        }
    }
}

/// Decision tree regressor.
///
/// Nodes are stored flat so that deep trees serialize without nesting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTreeRegressor {
    pub params: TreeParams,
    nodes: Vec<TreeNode>,
    n_features: usize,
    feature_importances: Option<Array1<f64>>,
}

impl Default for DecisionTreeRegressor {
    fn default() -> Self {
        Self::new(TreeParams::default())
    }
}

/// Rows still waiting for a node, and where that node hangs.
struct PendingNode {
    rows: Vec<usize>,
    depth: usize,
    /// Parent node index and whether this is its left child.
    parent: Option<(usize, bool)>,
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    gain: f64,
}

impl DecisionTreeRegressor {
    pub fn new(params: TreeParams) -> Self {
        Self {
            params,
            nodes: Vec::new(),
            n_features: 0,
            feature_importances: None,
        }
    }

    /// Number of nodes in the fitted tree.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Depth of the fitted tree (a single leaf has depth 0).
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut pending = if self.nodes.is_empty() { vec![] } else { vec![(0, 0)] };
        while let Some((idx, depth)) = pending.pop() {
            deepest = deepest.max(depth);
            if let TreeNode::Split { left, right, .. } = &self.nodes[idx] {
                pending.push((*left, depth + 1));
                pending.push((*right, depth + 1));
            }
        }
        deepest
    }

    /// Fit on the rows of `x`/`y` selected by `indices` (repeats allowed).
    pub fn fit_rows(&mut self, x: &Array2<f64>, y: &Array1<f64>, indices: &[usize]) -> Result<()> {
        check_shapes(x, y)?;
        if indices.is_empty() {
            return Err(LearningError::InvalidData(
                "cannot fit a tree on zero rows".to_string(),
            ));
        }
        if self.params.min_samples_split < 2 || self.params.min_samples_leaf < 1 {
            return Err(LearningError::InvalidConfig(
                "min_samples_split must be >= 2 and min_samples_leaf >= 1".to_string(),
            ));
        }

        self.n_features = x.ncols();
        self.nodes.clear();
        let mut importances = vec![0.0; x.ncols()];
        self.grow(x, y, indices.to_vec(), &mut importances);

        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            importances.iter_mut().for_each(|v| *v /= total);
        }
        self.feature_importances = Some(Array1::from_vec(importances));
        Ok(())
    }

    /// Grow the tree for `indices` depth-first with an explicit work list, so
    /// unbounded depth cannot exhaust the call stack. Nodes are laid out in
    /// pre-order: a parent precedes its left subtree, which precedes its
    /// right subtree.
    fn grow(
        &mut self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: Vec<usize>,
        importances: &mut [f64],
    ) {
        let mut pending = vec![PendingNode {
            rows: indices,
            depth: 0,
            parent: None,
        }];

        while let Some(node) = pending.pop() {
            let idx = self.nodes.len();
            if let Some((parent, is_left)) = node.parent {
                if let TreeNode::Split { left, right, .. } = &mut self.nodes[parent] {
                    if is_left {
                        *left = idx;
                    } else {
                        *right = idx;
                    }
                }
            }

            let n_samples = node.rows.len();
            let value = node.rows.iter().map(|&i| y[i]).sum::<f64>() / n_samples as f64;

            let stop = n_samples < self.params.min_samples_split
                || n_samples < 2 * self.params.min_samples_leaf
                || self.params.max_depth.is_some_and(|d| node.depth >= d);
            let candidate = if stop {
                None
            } else {
                self.best_split(x, y, &node.rows)
            };

            let Some(split) = candidate else {
                self.nodes.push(TreeNode::Leaf { value, n_samples });
                continue;
            };

            importances[split.feature] += split.gain;
            let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = node
                .rows
                .iter()
                .partition(|&&i| x[[i, split.feature]] <= split.threshold);

            // Children are linked once they are placed.
            self.nodes.push(TreeNode::Split {
                feature: split.feature,
                threshold: split.threshold,
                left: idx,
                right: idx,
                n_samples,
            });
            pending.push(PendingNode {
                rows: right_rows,
                depth: node.depth + 1,
                parent: Some((idx, false)),
            });
            pending.push(PendingNode {
                rows: left_rows,
                depth: node.depth + 1,
                parent: Some((idx, true)),
            });
        }
    }

    /// Split with the largest reduction in summed squared error.
    fn best_split(&self, x: &Array2<f64>, y: &Array1<f64>, indices: &[usize]) -> Option<SplitCandidate> {
        let n = indices.len();
        let total_sum: f64 = indices.iter().map(|&i| y[i]).sum();
        let total_sq: f64 = indices.iter().map(|&i| y[i] * y[i]).sum();
        let parent_sse = total_sq - total_sum * total_sum / n as f64;
        let min_leaf = self.params.min_samples_leaf;

        let mut best: Option<SplitCandidate> = None;
        let mut order = indices.to_vec();

        for feature in 0..x.ncols() {
            order.sort_by(|&a, &b| x[[a, feature]].total_cmp(&x[[b, feature]]));

            let mut left_sum = 0.0;
            let mut left_sq = 0.0;
            for k in 0..n - 1 {
                let yi = y[order[k]];
                left_sum += yi;
                left_sq += yi * yi;

                let here = x[[order[k], feature]];
                let next = x[[order[k + 1], feature]];
                if here == next {
                    continue;
                }

                let left_n = k + 1;
                let right_n = n - left_n;
                if left_n < min_leaf || right_n < min_leaf {
                    continue;
                }

                let right_sum = total_sum - left_sum;
                let right_sq = total_sq - left_sq;
                let children_sse = (left_sq - left_sum * left_sum / left_n as f64)
                    + (right_sq - right_sum * right_sum / right_n as f64);
                let gain = parent_sse - children_sse;

                if gain > 1e-12 && best.as_ref().is_none_or(|b| gain > b.gain) {
                    best = Some(SplitCandidate {
                        feature,
                        threshold: (here + next) / 2.0,
                        gain,
                    });
                }
            }
        }

        best
    }

    fn predict_row(&self, row: ndarray::ArrayView1<f64>) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                TreeNode::Leaf { value, .. } => return *value,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    idx = if row[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }
}

impl Regressor for DecisionTreeRegressor {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        let indices: Vec<usize> = (0..x.nrows()).collect();
        self.fit_rows(x, y, &indices)
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.nodes.is_empty() {
            return Err(LearningError::InferenceError("model is not fitted".to_string()));
        }
        if x.ncols() != self.n_features {
            return Err(LearningError::InferenceError(format!(
                "expected {} features, got {}",
                self.n_features,
                x.ncols()
            )));
        }
        Ok(x.rows().into_iter().map(|row| self.predict_row(row)).collect())
    }

    fn feature_importance(&self) -> Option<Array1<f64>> {
        self.feature_importances.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_step_function() {
        let x = array![[1.0], [2.0], [3.0], [10.0], [11.0], [12.0]];
        let y = array![5.0, 5.0, 5.0, 20.0, 20.0, 20.0];

        let mut tree = DecisionTreeRegressor::default();
        tree.fit(&x, &y).unwrap();

        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.node_count(), 3);
        let preds = tree.predict(&array![[0.0], [6.4], [6.6], [100.0]]).unwrap();
        assert_eq!(preds, array![5.0, 5.0, 20.0, 20.0]);
    }

    #[test]
    fn test_max_depth_limits_growth() {
        let x = Array2::from_shape_fn((16, 1), |(i, _)| i as f64);
        let y = x.column(0).mapv(|v| v * v);

        let mut tree = DecisionTreeRegressor::new(TreeParams {
            max_depth: Some(2),
            ..TreeParams::default()
        });
        tree.fit(&x, &y).unwrap();
        assert_eq!(tree.depth(), 2);
    }

    #[test]
    fn test_unlimited_depth_memorises_training_rows() {
        let x = array![[0.0, 1.0], [1.0, 0.0], [2.0, 2.0], [3.0, 1.0]];
        let y = array![1.0, -1.0, 4.0, 0.5];

        let mut tree = DecisionTreeRegressor::default();
        tree.fit(&x, &y).unwrap();
        assert_eq!(tree.predict(&x).unwrap(), y);
    }

    #[test]
    fn test_large_unlimited_tree_is_preorder() {
        let n = 5000;
        let x = Array2::from_shape_fn((n, 1), |(i, _)| i as f64);
        let y = x.column(0).mapv(|v| v + (v * 0.37).sin() * 0.4);

        let mut tree = DecisionTreeRegressor::default();
        tree.fit(&x, &y).unwrap();

        assert_eq!(tree.predict(&x).unwrap(), y);
        for (idx, node) in tree.nodes.iter().enumerate() {
            if let TreeNode::Split { left, right, .. } = node {
                assert_eq!(*left, idx + 1);
                assert!(right > left);
            }
        }
        assert!(tree.depth() >= 12);
    }

    #[test]
    fn test_importance_points_at_informative_feature() {
        let x = array![[0.0, 7.0], [0.0, 3.0], [1.0, 7.0], [1.0, 3.0]];
        let y = array![0.0, 0.0, 10.0, 10.0];

        let mut tree = DecisionTreeRegressor::default();
        tree.fit(&x, &y).unwrap();
        assert_eq!(tree.feature_importance().unwrap(), array![1.0, 0.0]);
    }

    #[test]
    fn test_constant_target_is_single_leaf() {
        let x = array![[1.0], [2.0], [3.0]];
        let y = array![4.0, 4.0, 4.0];

        let mut tree = DecisionTreeRegressor::default();
        tree.fit(&x, &y).unwrap();
        assert_eq!(tree.node_count(), 1);
    }

    #[test]
    fn test_serde_round_trip_predicts_identically() {
        let x = Array2::from_shape_fn((30, 2), |(i, j)| ((i * 7 + j * 3) % 11) as f64);
        let y = x.column(0).to_owned() - x.column(1).mapv(|v| v * 0.5);

        let mut tree = DecisionTreeRegressor::default();
        tree.fit(&x, &y).unwrap();
        let json = serde_json::to_string(&tree).unwrap();
        let restored: DecisionTreeRegressor = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.predict(&x).unwrap(), tree.predict(&x).unwrap());
    }
}
