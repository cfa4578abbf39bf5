//! Seeded train/test partitioning of row indices.

use crate::error::{ProcessingError, Result};
use crate::utils::index_chunked;
use polars::prelude::DataFrame;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Disjoint train/test row indices covering every row exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainTestSplit {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

impl TrainTestSplit {
    /// Total number of rows covered.
    pub fn len(&self) -> usize {
        self.train.len() + self.test.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Select the train and test rows of `df`.
    pub fn apply(&self, df: &DataFrame) -> Result<(DataFrame, DataFrame)> {
        if df.height() != self.len() {
            return Err(ProcessingError::InvalidData(format!(
                "split covers {} rows but the frame has {}",
                self.len(),
                df.height()
            )));
        }
        let train = df.take(&index_chunked(&self.train))?;
        let test = df.take(&index_chunked(&self.test))?;
        Ok((train, test))
    }
}

fn check_test_size(test_size: f64) -> Result<()> {
    if test_size > 0.0 && test_size < 1.0 {
        Ok(())
    } else {
        Err(ProcessingError::invalid_parameter(
            "test_size",
            format!("{test_size} must be strictly between 0 and 1"),
        ))
    }
}

/// Shuffle `0..n_rows` with `seed` and hold out `ceil(test_size * n_rows)`.
///
/// The same `(n_rows, test_size, seed)` always yields the same split.
pub fn train_test_split(n_rows: usize, test_size: f64, seed: u64) -> Result<TrainTestSplit> {
    check_test_size(test_size)?;

    let n_test = (test_size * n_rows as f64).ceil() as usize;
    if n_test == 0 || n_test >= n_rows {
        return Err(ProcessingError::InvalidData(format!(
            "cannot split {n_rows} row(s) with test size {test_size}: both partitions need at least one row"
        )));
    }

    let mut indices: Vec<usize> = (0..n_rows).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let train = indices.split_off(n_test);
    Ok(TrainTestSplit {
        train,
        test: indices,
    })
}

/// Split so each class keeps roughly its proportion in both partitions.
///
/// Every class contributes `round(test_size * count)` rows to the test
/// partition, clamped so both partitions receive at least one row of it.
/// A class with fewer than two rows cannot be stratified and is rejected.
pub fn stratified_split<T>(labels: &[T], test_size: f64, seed: u64) -> Result<TrainTestSplit>
where
    T: Ord + Clone + std::fmt::Debug,
{
    check_test_size(test_size)?;

    let mut classes: BTreeMap<T, Vec<usize>> = BTreeMap::new();
    for (i, label) in labels.iter().enumerate() {
        classes.entry(label.clone()).or_default().push(i);
    }

    if let Some((label, rows)) = classes.iter().find(|(_, rows)| rows.len() < 2) {
        return Err(ProcessingError::InvalidData(format!(
            "class {label:?} has {} example(s); stratified splitting needs at least 2 per class",
            rows.len()
        )));
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::with_capacity(labels.len());
    let mut test = Vec::new();

    for rows in classes.values_mut() {
        rows.shuffle(&mut rng);
        let count = rows.len();
        let n_test = ((test_size * count as f64).round() as usize).clamp(1, count - 1);
        test.extend_from_slice(&rows[..n_test]);
        train.extend_from_slice(&rows[n_test..]);
    }

    train.shuffle(&mut rng);
    test.shuffle(&mut rng);
    Ok(TrainTestSplit { train, test })
}
