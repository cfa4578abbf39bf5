//! Dense linear algebra helpers and DataFrame → matrix conversion.

use crate::error::{LearningError, Result};
use climate_processing::utils::{is_boolean_dtype, is_numeric_dtype, numeric_values};
use ndarray::{Array1, Array2, Axis};
use polars::prelude::DataFrame;

/// Build a row-major feature matrix from `columns` of `df`, in order.
///
/// Numeric columns are cast to `f64` and booleans become 0/1. Missing
/// columns, string columns and nulls are rejected.
pub fn frame_to_matrix(df: &DataFrame, columns: &[String]) -> Result<Array2<f64>> {
    let n_rows = df.height();
    let mut matrix = Array2::zeros((n_rows, columns.len()));

    for (j, name) in columns.iter().enumerate() {
        let column = df.column(name).map_err(|_| {
            LearningError::InvalidData(format!("feature column '{name}' is missing"))
        })?;
        if !is_numeric_dtype(column.dtype()) && !is_boolean_dtype(column.dtype()) {
            return Err(LearningError::InvalidData(format!(
                "feature column '{name}' has type {} (encode categorical columns first)",
                column.dtype()
            )));
        }

        let values = numeric_values(column.as_materialized_series())?;
        for (i, value) in values.into_iter().enumerate() {
            matrix[[i, j]] = value.ok_or_else(|| {
                LearningError::InvalidData(format!(
                    "feature column '{name}' has a missing value at row {i} (impute first)"
                ))
            })?;
        }
    }

    Ok(matrix)
}

/// Column names of `df`, in order.
pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect()
}

/// Columns whose root mean square is at or below this are treated as zero.
const ZERO_COLUMN_RMS: f64 = 1e-10;

/// Solve the normal equations `(XᵀX) w = Xᵀy`.
///
/// All-zero columns (constant features once centred) carry no information
/// and get a coefficient of 0, the minimum-norm least-squares answer; the
/// remaining columns are solved with Cholesky, falling back to Gauss–Jordan
/// elimination. `None` when the remaining system is still singular.
pub fn solve_least_squares(x: &Array2<f64>, y: &Array1<f64>) -> Option<Array1<f64>> {
    let n_rows = x.nrows().max(1) as f64;
    let xtx = x.t().dot(x);
    let xty = x.t().dot(y);

    let active: Vec<usize> = (0..x.ncols())
        .filter(|&j| (xtx[[j, j]] / n_rows).sqrt() > ZERO_COLUMN_RMS)
        .collect();
    if active.len() == x.ncols() {
        return cholesky_solve(&xtx, &xty).or_else(|| gauss_jordan_solve(&xtx, &xty));
    }

    let reduced_xtx = xtx.select(Axis(0), &active).select(Axis(1), &active);
    let reduced_xty = xty.select(Axis(0), &active);
    let reduced = if active.is_empty() {
        Array1::zeros(0)
    } else {
        cholesky_solve(&reduced_xtx, &reduced_xty)
            .or_else(|| gauss_jordan_solve(&reduced_xtx, &reduced_xty))?
    };

    let mut coefficients = Array1::zeros(x.ncols());
    for (&j, &w) in active.iter().zip(reduced.iter()) {
        coefficients[j] = w;
    }
    Some(coefficients)
}

/// Solve a symmetric positive-definite system `Ax = b`.
///
/// A matrix that is not positive definite is retried once with a tiny ridge
/// on the diagonal.
pub fn cholesky_solve(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    let n = a.nrows();
    if n != a.ncols() || n != b.len() {
        return None;
    }

    cholesky_factor(a)
        .or_else(|| {
            let ridge = 1e-8 * a.diag().iter().map(|v| v.abs()).sum::<f64>() / n.max(1) as f64;
            let mut regularised = a.clone();
            for k in 0..n {
                regularised[[k, k]] += ridge;
            }
            cholesky_factor(&regularised)
        })
        .map(|l| cholesky_substitute(&l, b))
}

/// Lower-triangular `L` with `A = L Lᵀ`, or `None` if `A` is not positive definite.
fn cholesky_factor(a: &Array2<f64>) -> Option<Array2<f64>> {
    let n = a.nrows();
    let mut l = Array2::zeros((n, n));

    for i in 0..n {
        for j in 0..=i {
            let mut sum = 0.0;
            for k in 0..j {
                sum += l[[i, k]] * l[[j, k]];
            }

            if i == j {
                let diag = a[[i, i]] - sum;
                if diag <= 0.0 {
                    return None;
                }
                l[[i, j]] = diag.sqrt();
            } else {
                l[[i, j]] = (a[[i, j]] - sum) / l[[j, j]];
            }
        }
    }

    Some(l)
}

fn cholesky_substitute(l: &Array2<f64>, b: &Array1<f64>) -> Array1<f64> {
    let n = l.nrows();

    // Forward substitution: L y = b
    let mut y = Array1::zeros(n);
    for i in 0..n {
        let mut sum = 0.0;
        for j in 0..i {
            sum += l[[i, j]] * y[j];
        }
        y[i] = (b[i] - sum) / l[[i, i]];
    }

    // Backward substitution: Lᵀ x = y
    let mut x = Array1::zeros(n);
    for i in (0..n).rev() {
        let mut sum = 0.0;
        for j in (i + 1)..n {
            sum += l[[j, i]] * x[j];
        }
        x[i] = (y[i] - sum) / l[[i, i]];
    }

    x
}

/// Solve `Ax = b` by Gauss–Jordan elimination with partial pivoting.
pub fn gauss_jordan_solve(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    let n = a.nrows();
    if n != a.ncols() || n != b.len() {
        return None;
    }

    // Augmented matrix [A | b]
    let mut aug = Array2::zeros((n, n + 1));
    for i in 0..n {
        for j in 0..n {
            aug[[i, j]] = a[[i, j]];
        }
        aug[[i, n]] = b[i];
    }

    for col in 0..n {
        let mut pivot_row = col;
        for row in col + 1..n {
            if aug[[row, col]].abs() > aug[[pivot_row, col]].abs() {
                pivot_row = row;
            }
        }

        if pivot_row != col {
            for j in 0..=n {
                aug.swap([col, j], [pivot_row, j]);
            }
        }

        if aug[[col, col]].abs() < 1e-10 {
            return None;
        }

        let pivot = aug[[col, col]];
        for j in 0..=n {
            aug[[col, j]] /= pivot;
        }

        for row in 0..n {
            if row != col {
                let factor = aug[[row, col]];
                for j in 0..=n {
                    aug[[row, j]] -= factor * aug[[col, j]];
                }
            }
        }
    }

    Some(aug.column(n).to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use polars::prelude::*;

    fn assert_close(a: &Array1<f64>, b: &Array1<f64>) {
        for (x, y) in a.iter().zip(b) {
            assert!((x - y).abs() < 1e-9, "{a} != {b}");
        }
    }

    #[test]
    fn test_cholesky_solve() {
        let a = array![[4.0, 2.0], [2.0, 3.0]];
        let b = array![2.0, 1.0];

        let x = cholesky_solve(&a, &b).unwrap();
        assert_close(&a.dot(&x), &b);
    }

    #[test]
    fn test_gauss_jordan_matches_cholesky() {
        let a = array![[6.0, 2.0, 1.0], [2.0, 5.0, 2.0], [1.0, 2.0, 4.0]];
        let b = array![1.0, 2.0, 3.0];

        let x1 = cholesky_solve(&a, &b).unwrap();
        let x2 = gauss_jordan_solve(&a, &b).unwrap();
        assert_close(&x1, &x2);
    }

    #[test]
    fn test_gauss_jordan_singular() {
        let a = array![[1.0, 2.0], [2.0, 4.0]];
        assert!(gauss_jordan_solve(&a, &array![1.0, 2.0]).is_none());
    }

    #[test]
    fn test_least_squares_exact_fit() {
        // y = 3a - b
        let x = array![[1.0, 0.0], [0.0, 1.0], [1.0, 1.0], [2.0, 1.0]];
        let y = array![3.0, -1.0, 2.0, 5.0];

        let w = solve_least_squares(&x, &y).unwrap();
        assert_close(&w, &array![3.0, -1.0]);
    }

    #[test]
    fn test_frame_to_matrix() {
        let df = df![
            "a" => [1i64, 2],
            "flag" => [true, false],
            "b" => [0.5, 1.5],
        ]
        .unwrap();

        let m = frame_to_matrix(&df, &["b".to_string(), "flag".to_string()]).unwrap();
        assert_eq!(m, array![[0.5, 1.0], [1.5, 0.0]]);
    }

    #[test]
    fn test_frame_to_matrix_rejects_nulls_and_strings() {
        let df = df![
            "a" => [Some(1.0), None],
            "s" => ["x", "y"],
        ]
        .unwrap();

        let err = frame_to_matrix(&df, &["a".to_string()]).unwrap_err();
        assert!(err.to_string().contains("impute"));
        let err = frame_to_matrix(&df, &["s".to_string()]).unwrap_err();
        assert!(err.to_string().contains("encode"));
        assert!(frame_to_matrix(&df, &["zzz".to_string()]).is_err());
    }
}
