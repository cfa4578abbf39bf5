//! Model evaluation on held-out data.
//!
//! - [`evaluate_regression`]: predictions plus [`RegressionMetrics`]
//! - [`classification_report`]: per-class precision/recall/F1 with averages
//! - [`actual_vs_predicted`]: scatter data with an identity line

use crate::error::{LearningError, Result};
use crate::model::TrainedModel;
use crate::types::{ActualVsPredicted, ClassMetrics, ClassificationReport, RegressionMetrics};
use polars::prelude::DataFrame;
use std::collections::HashMap;
use tracing::info;

/// Compute MSE, RMSE, MAE and R² of `y_pred` against `y_true`.
///
/// When `y_true` has zero variance R² is 1.0 for a perfect prediction and
/// 0.0 otherwise.
pub fn regression_metrics(y_true: &[f64], y_pred: &[f64]) -> Result<RegressionMetrics> {
    if y_true.len() != y_pred.len() {
        return Err(LearningError::InvalidData(format!(
            "{} actual values but {} predictions",
            y_true.len(),
            y_pred.len()
        )));
    }
    if y_true.is_empty() {
        return Err(LearningError::InvalidData(
            "cannot evaluate on zero rows".to_string(),
        ));
    }

    let n = y_true.len() as f64;
    let mean = y_true.iter().sum::<f64>() / n;

    let mut ss_res = 0.0;
    let mut abs_err = 0.0;
    let mut ss_tot = 0.0;
    for (&actual, &predicted) in y_true.iter().zip(y_pred) {
        let residual = actual - predicted;
        ss_res += residual * residual;
        abs_err += residual.abs();
        ss_tot += (actual - mean).powi(2);
    }

    let mse = ss_res / n;
    let r2 = if ss_tot > 0.0 {
        1.0 - ss_res / ss_tot
    } else if ss_res == 0.0 {
        1.0
    } else {
        0.0
    };

    Ok(RegressionMetrics {
        mse,
        rmse: mse.sqrt(),
        mae: abs_err / n,
        r2,
    })
}

/// Predict `x` with `model` and score the predictions against `y`.
pub fn evaluate_regression(
    model: &TrainedModel,
    x: &DataFrame,
    y: &[f64],
) -> Result<(Vec<f64>, RegressionMetrics)> {
    let predictions = model.predict(x)?;
    let metrics = regression_metrics(y, &predictions)?;
    info!("Evaluated {} on {} rows: {}", model.kind, y.len(), metrics);
    Ok((predictions, metrics))
}

/// Build a classification report over `labels`, in the given order.
///
/// Precision, recall and F1 are 0.0 where their denominator is zero.
pub fn classification_report<L>(y_true: &[L], y_pred: &[L], labels: &[L]) -> Result<ClassificationReport>
where
    L: Eq + std::hash::Hash + ToString,
{
    if y_true.len() != y_pred.len() {
        return Err(LearningError::InvalidData(format!(
            "{} actual labels but {} predictions",
            y_true.len(),
            y_pred.len()
        )));
    }
    if y_true.is_empty() {
        return Err(LearningError::InvalidData(
            "cannot evaluate on zero rows".to_string(),
        ));
    }

    let position: HashMap<&L, usize> = labels.iter().enumerate().map(|(i, l)| (l, i)).collect();
    let mut true_positive = vec![0usize; labels.len()];
    let mut predicted = vec![0usize; labels.len()];
    let mut support = vec![0usize; labels.len()];
    let mut correct = 0usize;

    for (actual, guess) in y_true.iter().zip(y_pred) {
        if actual == guess {
            correct += 1;
        }
        if let Some(&i) = position.get(actual) {
            support[i] += 1;
            if actual == guess {
                true_positive[i] += 1;
            }
        }
        if let Some(&i) = position.get(guess) {
            predicted[i] += 1;
        }
    }

    let ratio = |num: usize, den: usize| if den == 0 { 0.0 } else { num as f64 / den as f64 };

    let classes: Vec<(String, ClassMetrics)> = labels
        .iter()
        .enumerate()
        .map(|(i, label)| {
            let precision = ratio(true_positive[i], predicted[i]);
            let recall = ratio(true_positive[i], support[i]);
            let f1_score = if precision + recall > 0.0 {
                2.0 * precision * recall / (precision + recall)
            } else {
                0.0
            };
            (
                label.to_string(),
                ClassMetrics {
                    precision,
                    recall,
                    f1_score,
                    support: support[i],
                },
            )
        })
        .collect();

    let total_support: usize = support.iter().sum();
    let n_classes = classes.len().max(1) as f64;
    let average = |weight: &dyn Fn(&ClassMetrics) -> f64, denom: f64| {
        let mut sums = (0.0, 0.0, 0.0);
        for (_, m) in &classes {
            let w = weight(m);
            sums.0 += w * m.precision;
            sums.1 += w * m.recall;
            sums.2 += w * m.f1_score;
        }
        if denom > 0.0 {
            (sums.0 / denom, sums.1 / denom, sums.2 / denom)
        } else {
            (0.0, 0.0, 0.0)
        }
    };

    let (p, r, f) = average(&|_| 1.0, n_classes);
    let macro_avg = ClassMetrics {
        precision: p,
        recall: r,
        f1_score: f,
        support: total_support,
    };
    let (p, r, f) = average(&|m| m.support as f64, total_support as f64);
    let weighted_avg = ClassMetrics {
        precision: p,
        recall: r,
        f1_score: f,
        support: total_support,
    };

    Ok(ClassificationReport {
        classes,
        accuracy: correct as f64 / y_true.len() as f64,
        macro_avg,
        weighted_avg,
    })
}

/// Pair actual values with predictions for an actual-vs-predicted plot.
///
/// The identity line spans the range of the actual values.
pub fn actual_vs_predicted(actual: &[f64], predicted: &[f64]) -> Result<ActualVsPredicted> {
    if actual.len() != predicted.len() {
        return Err(LearningError::InvalidData(format!(
            "{} actual values but {} predictions",
            actual.len(),
            predicted.len()
        )));
    }

    let min = actual.iter().copied().fold(f64::INFINITY, f64::min);
    let max = actual.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let identity = if actual.is_empty() { (0.0, 0.0) } else { (min, max) };

    Ok(ActualVsPredicted {
        points: actual.iter().copied().zip(predicted.iter().copied()).collect(),
        identity,
    })
}
