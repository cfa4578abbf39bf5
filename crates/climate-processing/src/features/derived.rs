//! Derived columns: interaction terms, equal-width bins and monotonic
//! transformations.

use crate::error::{ProcessingError, Result};
use crate::utils::{float_series, require_numeric};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Accepted bin counts for [`bin`].
pub const BIN_RANGE: std::ops::RangeInclusive<usize> = 2..=10;

/// Monotonic transformation applied by [`transform`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transformation {
    /// `ln(1 + x)`, defined for x > -1.
    Log,
    /// Square root, defined for x >= 0.
    Sqrt,
}

impl Transformation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Transformation::Log => "log",
            Transformation::Sqrt => "sqrt",
        }
    }
}

impl fmt::Display for Transformation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Transformation {
    type Err = ProcessingError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "log" | "log1p" => Ok(Transformation::Log),
            "sqrt" => Ok(Transformation::Sqrt),
            other => Err(ProcessingError::invalid_parameter(
                "transformation",
                format!("unknown transformation '{other}' (expected log or sqrt)"),
            )),
        }
    }
}

/// Add `{a}_x_{b}`, the elementwise product of two numeric columns.
pub fn interaction(df: &DataFrame, a: &str, b: &str) -> Result<DataFrame> {
    let left = require_numeric(df, a)?;
    let right = require_numeric(df, b)?;

    let product: Vec<Option<f64>> = left
        .iter()
        .zip(&right)
        .map(|(l, r)| match (l, r) {
            (Some(l), Some(r)) => Some(l * r),
            _ => None,
        })
        .collect();

    let name = format!("{a}_x_{b}");
    let mut out = df.clone();
    out.with_column(float_series(&name, product))?;
    debug!("Created interaction column '{}'", name);
    Ok(out)
}

/// Add `{column}_binned`, assigning each value to one of `bins` equal-width
/// intervals spanning the column's range.
///
/// Intervals are right-closed; the lowest edge is pushed down by 0.1% of the
/// range so the minimum falls inside the first interval. Labels read
/// `(lo, hi]`. Nulls stay null.
pub fn bin(df: &DataFrame, column: &str, bins: usize) -> Result<DataFrame> {
    if !BIN_RANGE.contains(&bins) {
        return Err(ProcessingError::invalid_parameter(
            "bins",
            format!(
                "{bins} is outside {}..={}",
                BIN_RANGE.start(),
                BIN_RANGE.end()
            ),
        ));
    }

    let values = require_numeric(df, column)?;
    let edges = bin_edges(&values, bins).ok_or_else(|| {
        ProcessingError::InvalidData(format!("column '{column}' has no values to bin"))
    })?;

    let labels: Vec<String> = edges
        .windows(2)
        .map(|w| format!("({:.3}, {:.3}]", w[0], w[1]))
        .collect();

    let binned: Vec<Option<&str>> = values
        .iter()
        .map(|v| v.map(|x| labels[bin_index(&edges, x)].as_str()))
        .collect();

    let name = format!("{column}_binned");
    let mut out = df.clone();
    out.with_column(Series::new(name.as_str().into(), binned))?;
    debug!("Binned '{}' into {} intervals", column, bins);
    Ok(out)
}

/// Equal-width edges over the non-null range, or `None` without values.
fn bin_edges(values: &[Option<f64>], bins: usize) -> Option<Vec<f64>> {
    let present = values.iter().flatten().copied();
    let (mut lo, mut hi) = present.fold(None, |acc: Option<(f64, f64)>, x| match acc {
        None => Some((x, x)),
        Some((lo, hi)) => Some((lo.min(x), hi.max(x))),
    })?;

    if lo == hi {
        // Constant column: widen symmetrically so there is a range to split.
        let pad = if lo == 0.0 { 0.001 } else { 0.001 * lo.abs() };
        lo -= pad;
        hi += pad;
        let step = (hi - lo) / bins as f64;
        return Some((0..=bins).map(|i| lo + step * i as f64).collect());
    }

    let step = (hi - lo) / bins as f64;
    let mut edges: Vec<f64> = (0..=bins).map(|i| lo + step * i as f64).collect();
    edges[bins] = hi;
    edges[0] -= (hi - lo) * 0.001;
    Some(edges)
}

/// Index of the right-closed interval containing `x`.
fn bin_index(edges: &[f64], x: f64) -> usize {
    let last = edges.len() - 2;
    edges[1..]
        .iter()
        .position(|&upper| x <= upper)
        .unwrap_or(last)
        .min(last)
}

/// Add `{column}_{log|sqrt}` with the transformed values.
///
/// Values outside the transformation's domain are rejected rather than
/// producing NaN or infinities.
pub fn transform(df: &DataFrame, column: &str, kind: Transformation) -> Result<DataFrame> {
    let values = require_numeric(df, column)?;

    let offending = values.iter().flatten().filter(|&&x| match kind {
        Transformation::Log => x <= -1.0,
        Transformation::Sqrt => x < 0.0,
    });
    let count = offending.count();
    if count > 0 {
        let reason = match kind {
            Transformation::Log => format!("log requires values greater than -1 ({count} value(s) out of range)"),
            Transformation::Sqrt => format!("sqrt requires non-negative values ({count} negative value(s))"),
        };
        return Err(ProcessingError::Domain {
            column: column.to_string(),
            reason,
        });
    }

    let transformed: Vec<Option<f64>> = values
        .iter()
        .map(|v| {
            v.map(|x| match kind {
                Transformation::Log => x.ln_1p(),
                Transformation::Sqrt => x.sqrt(),
            })
        })
        .collect();

    let name = format!("{column}_{kind}");
    let mut out = df.clone();
    out.with_column(float_series(&name, transformed))?;
    debug!("Applied {} transformation to '{}'", kind, column);
    Ok(out)
}
