//! Standardisation of numeric feature columns.

use crate::error::{ProcessingError, Result};
use crate::utils::{float_series, is_numeric_dtype, numeric_values, require_column};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Zero-mean, unit-variance scaling with statistics captured at fit time.
///
/// Only numeric columns are scaled; boolean indicators and strings pass
/// through. Once fitted the scaler is read-only: [`transform`](Self::transform)
/// never updates the stored statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    columns: Vec<String>,
    means: Vec<f64>,
    scales: Vec<f64>,
    n_samples: usize,
}

impl StandardScaler {
    /// Capture per-column mean and population standard deviation from `df`.
    ///
    /// Nulls are ignored. A column with zero variance gets a scale of 1.0.
    pub fn fit(df: &DataFrame) -> Result<Self> {
        let mut columns = Vec::new();
        let mut means = Vec::new();
        let mut scales = Vec::new();

        for column in df.get_columns() {
            if !is_numeric_dtype(column.dtype()) {
                continue;
            }
            let values = numeric_values(column.as_materialized_series())?;
            let present: Vec<f64> = values.into_iter().flatten().collect();
            if present.is_empty() {
                return Err(ProcessingError::InvalidData(format!(
                    "column '{}' has no values to fit a scaler on",
                    column.name()
                )));
            }

            let n = present.len() as f64;
            let mean = present.iter().sum::<f64>() / n;
            let variance = present.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
            let std = variance.sqrt();

            columns.push(column.name().to_string());
            means.push(mean);
            scales.push(if std > f64::EPSILON { std } else { 1.0 });
        }

        debug!("Fitted scaler on {} column(s), {} rows", columns.len(), df.height());
        Ok(Self {
            columns,
            means,
            scales,
            n_samples: df.height(),
        })
    }

    /// Apply the fitted statistics to `df`, returning a new frame.
    ///
    /// Scaled columns become `Float64`; other columns are untouched.
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        let mut out = df.clone();
        for ((name, mean), scale) in self.columns.iter().zip(&self.means).zip(&self.scales) {
            let series = require_column(df, name)?;
            let scaled: Vec<Option<f64>> = numeric_values(series)?
                .into_iter()
                .map(|v| v.map(|x| (x - mean) / scale))
                .collect();
            out.replace(name, float_series(name, scaled))?;
        }
        Ok(out)
    }

    /// Fit on `df` and transform it.
    pub fn fit_transform(df: &DataFrame) -> Result<(Self, DataFrame)> {
        let scaler = Self::fit(df)?;
        let scaled = scaler.transform(df)?;
        Ok((scaler, scaled))
    }

    /// Names of the scaled columns, in fit order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Fitted mean of each scaled column.
    pub fn means(&self) -> &[f64] {
        &self.means
    }

    /// Fitted scale (standard deviation, or 1.0) of each scaled column.
    pub fn scales(&self) -> &[f64] {
        &self.scales
    }

    /// Number of rows the scaler was fitted on.
    pub fn n_samples(&self) -> usize {
        self.n_samples
    }

    /// Fitted `(mean, scale)` for `column`.
    pub fn stats(&self, column: &str) -> Option<(f64, f64)> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|i| (self.means[i], self.scales[i]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn floats(df: &DataFrame, col: &str) -> Vec<f64> {
        df.column(col)
            .unwrap()
            .f64()
            .unwrap()
            .into_iter()
            .flatten()
            .collect()
    }

    #[test]
    fn test_fit_transform_standardises() {
        let df = df![
            "temp" => [1.0, 2.0, 3.0, 4.0],
            "coastal" => [true, false, true, false],
        ]
        .unwrap();

        let (scaler, out) = StandardScaler::fit_transform(&df).unwrap();
        assert_eq!(scaler.columns(), &["temp".to_string()]);
        assert_eq!(scaler.n_samples(), 4);

        let scaled = floats(&out, "temp");
        let mean: f64 = scaled.iter().sum::<f64>() / 4.0;
        let var: f64 = scaled.iter().map(|v| v * v).sum::<f64>() / 4.0;
        assert!(mean.abs() < 1e-12);
        assert!((var - 1.0).abs() < 1e-12);
        assert_eq!(out.column("coastal").unwrap().dtype(), &DataType::Boolean);
    }

    #[test]
    fn test_constant_column_scales_by_one() {
        let df = df!["flat" => [5i64, 5, 5]].unwrap();

        let (scaler, out) = StandardScaler::fit_transform(&df).unwrap();
        assert_eq!(scaler.stats("flat"), Some((5.0, 1.0)));
        assert_eq!(floats(&out, "flat"), vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_transform_uses_fitted_statistics() {
        let train = df!["x" => [0.0, 2.0]].unwrap();
        let test = df!["x" => [100.0, 102.0]].unwrap();

        let scaler = StandardScaler::fit(&train).unwrap();
        let before = scaler.clone();
        let out = scaler.transform(&test).unwrap();

        assert_eq!(scaler, before);
        assert_eq!(floats(&out, "x"), vec![99.0, 101.0]);
    }

    #[test]
    fn test_transform_missing_column() {
        let scaler = StandardScaler::fit(&df!["x" => [1.0, 2.0]].unwrap()).unwrap();
        let other = df!["y" => [1.0]].unwrap();

        assert!(matches!(
            scaler.transform(&other),
            Err(ProcessingError::ColumnNotFound(_))
        ));
    }
}
