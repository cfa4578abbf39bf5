//! Report types returned by training and evaluation.
//!
//! # Overview
//!
//! - [`RegressionMetrics`]: error and variance-explained scores
//! - [`ClassificationReport`]: per-class precision/recall/F1 with averages
//! - [`ActualVsPredicted`]: points for an actual-vs-predicted scatter
//! - [`ModelInfo`]: metadata about a stored model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Regression metrics from model evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionMetrics {
    /// Mean Squared Error.
    pub mse: f64,

    /// Root Mean Squared Error, in target units.
    pub rmse: f64,

    /// Mean Absolute Error.
    pub mae: f64,

    /// R-squared (coefficient of determination).
    ///
    /// 1.0 is a perfect fit; can be negative for models worse than the mean.
    pub r2: f64,
}

impl fmt::Display for RegressionMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RMSE: {:.4}  MSE: {:.4}  MAE: {:.4}  R²: {:.4}",
            self.rmse, self.mse, self.mae, self.r2
        )
    }
}

/// Precision, recall and F1 for one class (or an average over classes).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    /// Number of true instances.
    pub support: usize,
}

/// Classification report in the usual per-class layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    /// Per-class metrics, ordered by class label.
    pub classes: Vec<(String, ClassMetrics)>,

    /// Fraction of correct predictions.
    pub accuracy: f64,

    /// Unweighted mean over classes.
    pub macro_avg: ClassMetrics,

    /// Mean over classes weighted by support.
    pub weighted_avg: ClassMetrics,
}

impl ClassificationReport {
    /// Metrics for one class label.
    pub fn class(&self, label: &str) -> Option<&ClassMetrics> {
        self.classes
            .iter()
            .find(|(name, _)| name == label)
            .map(|(_, metrics)| metrics)
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:>14} {:>10} {:>10} {:>10} {:>10}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        for (label, m) in &self.classes {
            writeln!(
                f,
                "{:>14} {:>10.2} {:>10.2} {:>10.2} {:>10}",
                label, m.precision, m.recall, m.f1_score, m.support
            )?;
        }
        let total = self.weighted_avg.support;
        writeln!(f)?;
        writeln!(
            f,
            "{:>14} {:>10} {:>10} {:>10.2} {:>10}",
            "accuracy", "", "", self.accuracy, total
        )?;
        for (label, m) in [("macro avg", &self.macro_avg), ("weighted avg", &self.weighted_avg)] {
            writeln!(
                f,
                "{:>14} {:>10.2} {:>10.2} {:>10.2} {:>10}",
                label, m.precision, m.recall, m.f1_score, m.support
            )?;
        }
        Ok(())
    }
}

/// Data behind an actual-vs-predicted scatter plot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActualVsPredicted {
    /// `(actual, predicted)` pairs.
    pub points: Vec<(f64, f64)>,

    /// Range `(min, max)` of the actual values, drawn as the identity line.
    pub identity: (f64, f64),
}

/// Metadata about a stored model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Artifact name in the model store.
    pub name: String,

    /// Human-readable model type.
    pub model_type: String,

    /// Target the model predicts.
    pub target_column: String,

    /// Number of input features.
    pub n_features: usize,

    /// When training finished.
    pub trained_at: DateTime<Utc>,
}
