//! Exploratory statistics over a loaded dataset.
//!
//! Summaries, missing-value counts, correlations and the raw series behind
//! time-series and distribution views.

use crate::error::{ProcessingError, Result};
use crate::utils::{
    mean, numeric_column_names, numeric_values, quantile_sorted, require_numeric, sample_std,
};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Descriptive statistics of one numeric column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSummary {
    pub column: String,
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub q25: Option<f64>,
    pub median: Option<f64>,
    pub q75: Option<f64>,
    pub max: Option<f64>,
}

/// Pearson correlations between numeric columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    /// Row-major, `values[i][j]` correlates `columns[i]` with `columns[j]`.
    pub values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    /// Correlation between two named columns.
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.columns.iter().position(|c| c == a)?;
        let j = self.columns.iter().position(|c| c == b)?;
        Some(self.values[i][j])
    }
}

/// Summaries of every numeric column, in frame order.
pub fn basic_stats(df: &DataFrame) -> Result<Vec<ColumnSummary>> {
    numeric_column_names(df)
        .into_iter()
        .map(|name| {
            let mut present: Vec<f64> = require_numeric(df, &name)?.into_iter().flatten().collect();
            present.sort_by(f64::total_cmp);

            Ok(ColumnSummary {
                count: present.len(),
                mean: mean(&present),
                std: sample_std(&present),
                min: present.first().copied(),
                q25: quantile_sorted(&present, 0.25),
                median: quantile_sorted(&present, 0.5),
                q75: quantile_sorted(&present, 0.75),
                max: present.last().copied(),
                column: name,
            })
        })
        .collect()
}

/// Null count of every column, in frame order.
pub fn missing_counts(df: &DataFrame) -> Vec<(String, usize)> {
    df.get_columns()
        .iter()
        .map(|c| (c.name().to_string(), c.null_count()))
        .collect()
}

/// Pearson correlation matrix over the numeric columns.
///
/// Each pair uses the rows where both values are present. Pairs without
/// variance are NaN.
pub fn correlation_matrix(df: &DataFrame) -> Result<CorrelationMatrix> {
    let columns = numeric_column_names(df);
    let data: Vec<Vec<Option<f64>>> = columns
        .iter()
        .map(|name| require_numeric(df, name))
        .collect::<Result<_>>()?;

    let n = columns.len();
    let mut values = vec![vec![f64::NAN; n]; n];
    for i in 0..n {
        for j in i..n {
            let r = pearson(&data[i], &data[j]);
            values[i][j] = r;
            values[j][i] = r;
        }
    }

    debug!("Computed {}x{} correlation matrix", n, n);
    Ok(CorrelationMatrix { columns, values })
}

fn pearson(a: &[Option<f64>], b: &[Option<f64>]) -> f64 {
    let pairs: Vec<(f64, f64)> = a
        .iter()
        .zip(b)
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .collect();
    if pairs.len() < 2 {
        return f64::NAN;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;

    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (x, y) in &pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return f64::NAN;
    }
    cov / (var_x.sqrt() * var_y.sqrt())
}

/// `(x, y)` points for a line plot, rows with a null dropped, sorted by x.
pub fn time_series(df: &DataFrame, x_col: &str, y_col: &str) -> Result<Vec<(f64, f64)>> {
    let xs = require_numeric(df, x_col)?;
    let ys = require_numeric(df, y_col)?;

    let mut points: Vec<(f64, f64)> = xs
        .into_iter()
        .zip(ys)
        .filter_map(|(x, y)| Some((x?, y?)))
        .collect();
    points.sort_by(|a, b| a.0.total_cmp(&b.0));
    Ok(points)
}

/// Non-null values of a numeric column.
pub fn distribution(df: &DataFrame, column: &str) -> Result<Vec<f64>> {
    let series = df
        .column(column)
        .map_err(|_| ProcessingError::ColumnNotFound(column.to_string()))?;
    if !crate::utils::is_numeric_dtype(series.dtype()) {
        return Err(ProcessingError::NotNumeric(column.to_string()));
    }
    Ok(numeric_values(series.as_materialized_series())?
        .into_iter()
        .flatten()
        .collect())
}
