//! Train/test preparation: split rows, isolate the target, scale features.
//!
//! The scaler is fitted on the training partition only and then applied,
//! unchanged, to both partitions.

mod scaler;
mod split;

pub use scaler::StandardScaler;
pub use split::{TrainTestSplit, stratified_split, train_test_split};

use crate::config::ProcessingConfig;
use crate::error::{ProcessingError, Result};
use crate::utils::require_numeric;
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Test fraction and seed a split was made with; enough to recreate it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplitSettings {
    pub test_size: f64,
    pub seed: u64,
}

/// Output of [`prepare`]: scaled feature frames, targets and fitted state.
#[derive(Debug, Clone)]
pub struct PreparedData {
    pub x_train: DataFrame,
    pub x_test: DataFrame,
    pub y_train: Vec<f64>,
    pub y_test: Vec<f64>,
    pub scaler: StandardScaler,
    pub split: TrainTestSplit,
    pub settings: SplitSettings,
    pub target: String,
}

impl PreparedData {
    /// Feature column names, in frame order.
    pub fn feature_names(&self) -> Vec<String> {
        self.x_train
            .get_column_names()
            .iter()
            .map(|name| name.to_string())
            .collect()
    }
}

/// Split `df` into scaled train/test features and numeric targets.
///
/// The target must be a numeric column without nulls.
pub fn prepare(df: &DataFrame, target: &str, test_size: f64, seed: u64) -> Result<PreparedData> {
    let y: Vec<f64> = require_numeric(df, target)?
        .into_iter()
        .enumerate()
        .map(|(row, v)| {
            v.ok_or_else(|| {
                ProcessingError::InvalidData(format!(
                    "target column '{target}' is missing a value at row {row}"
                ))
            })
        })
        .collect::<Result<_>>()?;

    let features = df.drop(target)?;
    if features.width() == 0 {
        return Err(ProcessingError::InvalidData(format!(
            "no feature columns remain after removing target '{target}'"
        )));
    }

    let split = train_test_split(df.height(), test_size, seed)?;
    let (train, test) = split.apply(&features)?;

    let scaler = StandardScaler::fit(&train)?;
    let x_train = scaler.transform(&train)?;
    let x_test = scaler.transform(&test)?;

    let y_train = split.train.iter().map(|&i| y[i]).collect();
    let y_test = split.test.iter().map(|&i| y[i]).collect();

    info!(
        "Prepared data for '{}': {} train rows, {} test rows, {} features",
        target,
        x_train.height(),
        x_test.height(),
        x_train.width()
    );

    Ok(PreparedData {
        x_train,
        x_test,
        y_train,
        y_test,
        scaler,
        split,
        settings: SplitSettings { test_size, seed },
        target: target.to_string(),
    })
}

/// [`prepare`] using the target, test size and seed from `config`.
pub fn prepare_with_config(df: &DataFrame, config: &ProcessingConfig) -> Result<PreparedData> {
    prepare(df, &config.target_column, config.test_size, config.random_seed)
}
